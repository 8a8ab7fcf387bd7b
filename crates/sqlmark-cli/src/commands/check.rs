use std::path::PathBuf;

use super::query_loader::QueryInput;
use super::run_common::{CompileOptions, compile_or_exit, load_sources_or_exit, print_diagnostics};

pub struct CheckArgs {
    pub input: QueryInput,
    pub schema: PathBuf,
    pub stream_suffix: String,
    pub threads: Option<usize>,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let sources = load_sources_or_exit(&args.input);
    let compilation = compile_or_exit(
        &sources,
        &CompileOptions {
            schema: &args.schema,
            stream_suffix: &args.stream_suffix,
            threads: args.threads,
            strict: args.strict,
        },
    );

    print_diagnostics(&compilation, &sources, args.color);
    if !compilation.is_valid() {
        std::process::exit(1);
    }

    // Silent on success apart from warnings (like cargo check)
}
