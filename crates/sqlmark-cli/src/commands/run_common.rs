//! Shared plumbing for the commands that compile against a schema.

use std::path::Path;

use sqlmark_compiler::{CompileBuilder, Compilation, SourceMap};

use super::query_loader::{QueryInput, load_queries};
use super::schema_loader::load_schema;

/// Print `error: ...` and exit with status 1.
pub fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {msg}");
    std::process::exit(1);
}

pub fn load_sources_or_exit(input: &QueryInput) -> SourceMap {
    let sources = load_queries(input).unwrap_or_else(|e| fail(e));
    if sources.is_empty() {
        fail("no query modules to compile");
    }
    sources
}

pub struct CompileOptions<'a> {
    pub schema: &'a Path,
    pub stream_suffix: &'a str,
    pub threads: Option<usize>,
    pub strict: bool,
}

/// Compile `sources`, exiting on fatal errors. Diagnostics are left to the caller.
pub fn compile_or_exit(sources: &SourceMap, options: &CompileOptions<'_>) -> Compilation {
    let schema = load_schema(options.schema).unwrap_or_else(|e| fail(e));

    let mut builder = CompileBuilder::new(sources, &schema)
        .with_stream_suffix(options.stream_suffix)
        .with_strict(options.strict);
    if let Some(threads) = options.threads {
        builder = builder.with_threads(threads);
    }
    builder.run().unwrap_or_else(|e| fail(e))
}

/// Render diagnostics to stderr, if there are any.
pub fn print_diagnostics(compilation: &Compilation, sources: &SourceMap, color: bool) {
    let diagnostics = compilation.diagnostics();
    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics.render_colored(sources, color));
    }
}
