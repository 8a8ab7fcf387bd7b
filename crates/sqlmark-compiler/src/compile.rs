//! Compile pipeline: sources and a schema in, query catalog out.
//!
//! Modules are parsed in parallel, and every query of a module is resolved
//! in parallel, on a bounded `rayon` pool. The catalog merge runs on the
//! calling thread once all workers are done.

use rayon::prelude::*;
use sqlmark_core::SchemaCatalog;
use tracing::{debug, trace};

use crate::analyze::{ResolvedQuery, resolve_query};
use crate::cancel::CancellationToken;
use crate::catalog::{Catalog, CatalogBuilder, CompiledModule, QueryOrigin};
use crate::diagnostics::Diagnostics;
use crate::parser::parse_module;
use crate::source_map::{Source, SourceMap};
use crate::{Error, Result};

/// Suffix that marks a query as streaming.
pub const DEFAULT_STREAM_SUFFIX: &str = "_stream";

#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Worker threads. `None` uses the available parallelism.
    pub threads: Option<usize>,
    pub stream_suffix: String,
    /// Treat warnings as errors.
    pub strict: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            threads: None,
            stream_suffix: DEFAULT_STREAM_SUFFIX.to_string(),
            strict: false,
        }
    }
}

pub struct CompileBuilder<'a> {
    sources: &'a SourceMap,
    schema: &'a SchemaCatalog,
    config: CompileConfig,
    cancellation: CancellationToken,
}

impl<'a> CompileBuilder<'a> {
    pub fn new(sources: &'a SourceMap, schema: &'a SchemaCatalog) -> Self {
        Self {
            sources,
            schema,
            config: CompileConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads);
        self
    }

    pub fn with_stream_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.stream_suffix = suffix.into();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Run the whole pipeline.
    ///
    /// Query-level failures end up in [`Compilation::diagnostics`]; the outer
    /// `Result` only carries cancellation and pool setup failures.
    pub fn run(self) -> Result<Compilation> {
        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.config.threads {
            pool = pool.num_threads(threads);
        }
        let pool = pool
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        debug!(
            modules = self.sources.len(),
            threads = pool.current_num_threads(),
            "compiling"
        );

        let sources: Vec<Source<'_>> = self.sources.iter().collect();
        let modules = pool.install(|| {
            sources
                .into_par_iter()
                .map(|source| self.compile_module(source))
                .collect::<Result<Vec<_>>>()
        })?;

        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut diagnostics = Diagnostics::new();
        let mut builder = CatalogBuilder::new();
        for (module, module_diagnostics) in modules {
            diagnostics.extend(module_diagnostics);
            builder = builder.add_module(module);
        }
        let (catalog, merge_diagnostics) = builder.finish();
        diagnostics.extend(merge_diagnostics);
        diagnostics.sort();

        debug!(
            entries = catalog.len(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "catalog merged"
        );

        Ok(Compilation {
            catalog,
            diagnostics,
            strict: self.config.strict,
        })
    }

    fn compile_module(&self, source: Source<'_>) -> Result<(CompiledModule, Diagnostics)> {
        let module = source.kind.module_name();
        let mut diagnostics = Diagnostics::new();
        let parsed = parse_module(
            source.id,
            source.content,
            &self.config.stream_suffix,
            &mut diagnostics,
        );
        debug!(module = %module, queries = parsed.len(), "parsed module");

        let declared = parsed
            .iter()
            .map(|q| QueryOrigin {
                name: q.descriptor.name.clone(),
                source: q.source,
                name_range: q.spans.name,
            })
            .collect();

        let outcomes: Vec<(Option<ResolvedQuery>, Diagnostics)> = parsed
            .par_iter()
            .map(|query| {
                let mut query_diagnostics = Diagnostics::new();
                let resolved = resolve_query(query, self.schema, &mut query_diagnostics);
                trace!(
                    module = %module,
                    query = %query.descriptor.name,
                    resolved = resolved.is_some(),
                    "resolved query"
                );
                if self.cancellation.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                Ok((resolved, query_diagnostics))
            })
            .collect::<Result<_>>()?;

        let mut resolved = Vec::with_capacity(outcomes.len());
        for (query, query_diagnostics) in outcomes {
            diagnostics.extend(query_diagnostics);
            resolved.extend(query);
        }

        let compiled = CompiledModule {
            source: source.id,
            module,
            declared,
            resolved,
        };
        Ok((compiled, diagnostics))
    }
}

/// Result of a compile pass: the merged catalog and every diagnostic.
#[derive(Debug, Clone)]
pub struct Compilation {
    catalog: Catalog,
    diagnostics: Diagnostics,
    strict: bool,
}

impl Compilation {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// No errors, and no warnings in strict mode.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors() && !(self.strict && self.diagnostics.has_warnings())
    }

    /// The catalog, if the pass succeeded.
    pub fn into_catalog(self) -> Result<Catalog> {
        if self.is_valid() {
            Ok(self.catalog)
        } else {
            Err(Error::CompileFailed(self.diagnostics))
        }
    }

    pub fn into_parts(self) -> (Catalog, Diagnostics) {
        (self.catalog, self.diagnostics)
    }
}

/// Compile with the default configuration.
pub fn compile(sources: &SourceMap, schema: &SchemaCatalog) -> Result<Compilation> {
    CompileBuilder::new(sources, schema).run()
}
