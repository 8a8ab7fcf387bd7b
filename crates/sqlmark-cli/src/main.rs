mod cli;
mod commands;

use tracing_subscriber::EnvFilter;

use cli::{CatalogParams, CheckParams, ParseParams, build_cli, verbosity};

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(verbosity(&matches));

    match matches.subcommand() {
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into());
        }
        Some(("catalog", m)) => {
            let params = CatalogParams::from_matches(m);
            commands::catalog::run(params.into());
        }
        Some(("parse", m)) => {
            let params = ParseParams::from_matches(m);
            commands::parse::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("warn,sqlmark={level},sqlmark_compiler={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0)
        .init();
}
