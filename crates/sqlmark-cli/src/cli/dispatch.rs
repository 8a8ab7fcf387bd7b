//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! `*Params` structs hold what clap parsed; `Into<*Args>` resolves terminal
//! dependent choices (color) before a command runs.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::catalog::CatalogArgs;
use crate::commands::check::CheckArgs;
use crate::commands::parse::ParseArgs;
use crate::commands::query_loader::QueryInput;

pub struct CheckParams {
    pub queries_path: Option<PathBuf>,
    pub query_text: Option<String>,
    pub schema: PathBuf,
    pub stream_suffix: String,
    pub threads: Option<usize>,
    pub strict: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            queries_path: m.get_one::<PathBuf>("queries_path").cloned(),
            query_text: m.get_one::<String>("query_text").cloned(),
            schema: schema_path(m),
            stream_suffix: stream_suffix(m),
            threads: m.get_one::<usize>("threads").copied(),
            strict: m.get_flag("strict"),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            input: QueryInput::new(p.queries_path, p.query_text),
            schema: p.schema,
            stream_suffix: p.stream_suffix,
            threads: p.threads,
            strict: p.strict,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CatalogParams {
    pub queries_path: Option<PathBuf>,
    pub query_text: Option<String>,
    pub schema: PathBuf,
    pub stream_suffix: String,
    pub threads: Option<usize>,
    pub strict: bool,
    pub output: Option<PathBuf>,
    pub compact: bool,
    pub color: ColorChoice,
}

impl CatalogParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            queries_path: m.get_one::<PathBuf>("queries_path").cloned(),
            query_text: m.get_one::<String>("query_text").cloned(),
            schema: schema_path(m),
            stream_suffix: stream_suffix(m),
            threads: m.get_one::<usize>("threads").copied(),
            strict: m.get_flag("strict"),
            output: m.get_one::<PathBuf>("output").cloned(),
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<CatalogParams> for CatalogArgs {
    fn from(p: CatalogParams) -> Self {
        Self {
            input: QueryInput::new(p.queries_path, p.query_text),
            schema: p.schema,
            stream_suffix: p.stream_suffix,
            threads: p.threads,
            strict: p.strict,
            output: p.output,
            compact: p.compact,
            color: p.color.should_colorize(),
        }
    }
}

pub struct ParseParams {
    pub queries_path: Option<PathBuf>,
    pub query_text: Option<String>,
    pub stream_suffix: String,
    pub color: ColorChoice,
}

impl ParseParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            queries_path: m.get_one::<PathBuf>("queries_path").cloned(),
            query_text: m.get_one::<String>("query_text").cloned(),
            stream_suffix: stream_suffix(m),
            color: parse_color(m),
        }
    }
}

impl From<ParseParams> for ParseArgs {
    fn from(p: ParseParams) -> Self {
        Self {
            input: QueryInput::new(p.queries_path, p.query_text),
            stream_suffix: p.stream_suffix,
            color: p.color.should_colorize(),
        }
    }
}

/// `-v` count, readable from the root or any subcommand matches.
pub fn verbosity(m: &ArgMatches) -> u8 {
    let nested = m
        .subcommand()
        .map_or(0, |(_, sub)| sub.get_count("verbose"));
    m.get_count("verbose").max(nested)
}

fn schema_path(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("schema")
        .cloned()
        .unwrap_or_default()
}

fn stream_suffix(m: &ArgMatches) -> String {
    m.get_one::<String>("stream_suffix")
        .cloned()
        .unwrap_or_else(|| sqlmark_compiler::DEFAULT_STREAM_SUFFIX.to_string())
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
