use std::fmt::Write as _;

use sqlmark_compiler::parser::parse_module;
use sqlmark_compiler::{Diagnostics, SourceMap};

use super::query_loader::QueryInput;
use super::run_common::load_sources_or_exit;

pub struct ParseArgs {
    pub input: QueryInput,
    pub stream_suffix: String,
    pub color: bool,
}

pub fn run(args: ParseArgs) {
    let sources = load_sources_or_exit(&args.input);
    let (listing, diagnostics) = format_headers(&sources, &args.stream_suffix);

    print!("{listing}");
    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics.render_colored(&sources, args.color));
    }
    if diagnostics.has_errors() {
        std::process::exit(1);
    }
}

/// One line per module, followed by the canonical header of each query it declares.
pub fn format_headers(sources: &SourceMap, stream_suffix: &str) -> (String, Diagnostics) {
    let mut out = String::new();
    let mut diagnostics = Diagnostics::new();

    for source in sources.iter() {
        let queries = parse_module(source.id, source.content, stream_suffix, &mut diagnostics);
        let _ = writeln!(out, "{}", source.kind.module_name());
        for query in &queries {
            let _ = write!(out, "  {}", query.descriptor);
            if query.descriptor.streaming {
                out.push_str("  (streaming)");
            }
            out.push('\n');
        }
    }

    diagnostics.sort();
    (out, diagnostics)
}
