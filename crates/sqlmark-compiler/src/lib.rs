//! sqlmark compiler: annotated SQL modules in, typed query catalog out.
//!
//! This crate provides the compilation pipeline for annotated SQL:
//! - `parser` - annotation lexer and query descriptor parser
//! - `analyze` - parameter binder and schema-bound type resolver
//! - `catalog` - query catalog and duplicate detection
//! - `compile` - parallel pipeline driver
//! - `diagnostics` - error reporting

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
pub mod cancel;
pub mod catalog;
pub mod compile;
pub mod diagnostics;
pub mod parser;
pub mod source_map;

#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod source_map_tests;
#[cfg(test)]
pub mod test_utils;

pub use cancel::CancellationToken;
pub use catalog::{Catalog, CatalogEntry};
pub use compile::{CompileBuilder, CompileConfig, Compilation, DEFAULT_STREAM_SUFFIX, compile};
pub use diagnostics::{DiagnosticKind, DiagnosticRecord, Diagnostics, DiagnosticsPrinter, Severity, Span};
pub use source_map::{SourceId, SourceKind, SourceMap};

/// Errors that stop a compile pass without producing a catalog.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The pass was cancelled through its [`CancellationToken`].
    #[error("compilation cancelled")]
    Cancelled,

    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),

    #[error(
        "compilation failed with {} errors and {} warnings",
        .0.error_count(),
        .0.warning_count()
    )]
    CompileFailed(Diagnostics),
}

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, Error>;
