//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so commands compose the same
//! definitions.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Query module file, directory of modules, or `-` for stdin (positional).
pub fn queries_path_arg() -> Arg {
    Arg::new("queries_path")
        .value_name("QUERIES")
        .value_parser(value_parser!(PathBuf))
        .help("Query module, directory of .sql modules, or - for stdin")
}

/// Inline module text (-q/--query).
pub fn query_text_arg() -> Arg {
    Arg::new("query_text")
        .short('q')
        .long("query")
        .value_name("TEXT")
        .allow_hyphen_values(true)
        .conflicts_with("queries_path")
        .help("Inline module text")
}

/// Schema catalog JSON (--schema).
pub fn schema_arg() -> Arg {
    Arg::new("schema")
        .long("schema")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Schema catalog JSON file")
}

/// Streaming query suffix (--stream-suffix).
pub fn stream_suffix_arg() -> Arg {
    Arg::new("stream_suffix")
        .long("stream-suffix")
        .value_name("SUFFIX")
        .default_value(sqlmark_compiler::DEFAULT_STREAM_SUFFIX)
        .help("Query name suffix that marks a streaming query")
}

/// Worker threads (-j/--threads).
pub fn threads_arg() -> Arg {
    Arg::new("threads")
        .short('j')
        .long("threads")
        .value_name("N")
        .value_parser(value_parser!(usize))
        .help("Worker threads (default: available parallelism)")
}

/// Colorize output (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Treat warnings as errors (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Treat warnings as errors")
}

/// Write output to file (-o/--output).
pub fn output_file_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write output to file")
}

/// Output compact JSON (--compact).
pub fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .action(ArgAction::SetTrue)
        .help("Output compact JSON instead of pretty-printed")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .global(true)
        .help("Verbosity level (-v for debug, -vv for trace; RUST_LOG overrides)")
}
