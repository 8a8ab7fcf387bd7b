use std::fs;
use std::path::PathBuf;

use sqlmark_compiler::Catalog;

use super::query_loader::QueryInput;
use super::run_common::{CompileOptions, compile_or_exit, fail, load_sources_or_exit, print_diagnostics};

pub struct CatalogArgs {
    pub input: QueryInput,
    pub schema: PathBuf,
    pub stream_suffix: String,
    pub threads: Option<usize>,
    pub strict: bool,
    pub output: Option<PathBuf>,
    pub compact: bool,
    pub color: bool,
}

pub fn run(args: CatalogArgs) {
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
    let catalog = match compilation.into_catalog() {
        Ok(catalog) => catalog,
        Err(_) => std::process::exit(1),
    };

    let json = to_json(&catalog, args.compact).unwrap_or_else(|e| fail(e));
    match &args.output {
        Some(path) => {
            fs::write(path, json + "\n")
                .unwrap_or_else(|e| fail(format!("failed to write '{}': {e}", path.display())));
        }
        None => println!("{json}"),
    }
}

pub fn to_json(catalog: &Catalog, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(catalog)
    } else {
        serde_json::to_string_pretty(catalog)
    }
}
