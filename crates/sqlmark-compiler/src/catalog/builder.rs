//! Catalog builder: merges compiled modules into one namespace.
//!
//! Two passes:
//! 1. Record every parsed query name, resolved or not
//! 2. Report each name defined more than once, once

use indexmap::IndexMap;
use rowan::TextRange;

use super::{Catalog, CatalogEntry};
use crate::analyze::ResolvedQuery;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Span};
use crate::source_map::SourceId;

/// Where a parsed query was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOrigin {
    pub name: String,
    pub source: SourceId,
    pub name_range: TextRange,
}

/// Output of one module's pipeline run.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub source: SourceId,
    /// Module name recorded in catalog entries.
    pub module: String,
    /// Every successfully parsed query, in declaration order.
    pub declared: Vec<QueryOrigin>,
    /// Queries that also resolved, in declaration order.
    pub resolved: Vec<ResolvedQuery>,
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
    occurrences: IndexMap<String, Vec<Span>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a module. Modules must be added in catalog order.
    pub fn add_module(mut self, module: CompiledModule) -> Self {
        for origin in module.declared {
            self.occurrences
                .entry(origin.name)
                .or_default()
                .push(Span::new(origin.source, origin.name_range));
        }

        for query in module.resolved {
            if self.catalog.contains(&query.descriptor.name) {
                continue;
            }
            let entry = CatalogEntry::new(module.module.clone(), query);
            self.catalog.entries.insert(entry.name.clone(), entry);
        }
        self
    }

    /// Finish the merge. The catalog is only usable when no error was reported.
    pub fn finish(self) -> (Catalog, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        for (name, spans) in &self.occurrences {
            let [first, second, rest @ ..] = spans.as_slice() else {
                continue;
            };
            let mut builder = diagnostics
                .report(second.source, DiagnosticKind::DuplicateQueryName, second.range)
                .message(name)
                .related_to("first defined here", *first);
            for other in rest {
                builder = builder.related_to("also defined here", *other);
            }
            builder.emit();
        }
        (self.catalog, diagnostics)
    }
}
