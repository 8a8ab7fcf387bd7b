//! Command builders for the CLI.
//!
//! Each command is built from the shared arg builders in `args.rs`.

use clap::Command;

use super::args::*;

/// Query input args shared by every command.
fn with_query_args(cmd: Command) -> Command {
    cmd.arg(queries_path_arg())
        .arg(query_text_arg())
        .arg(stream_suffix_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("sqlmark")
        .about("Typed query catalogs from annotated SQL modules")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(check_command())
        .subcommand(catalog_command())
        .subcommand(parse_command())
}

/// Compile modules and report diagnostics.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Compile query modules against a schema and report diagnostics")
        .override_usage(
            "\
  sqlmark check <QUERIES> --schema <FILE>
  sqlmark check -q <TEXT> --schema <FILE>",
        )
        .after_help(
            r#"EXAMPLES:
  sqlmark check queries/ --schema schema.json           # every .sql module
  sqlmark check books.sql --schema schema.json --strict # warnings fail too
  cat books.sql | sqlmark check - --schema schema.json  # stdin"#,
        )
        .arg(schema_arg())
        .arg(strict_arg())
        .arg(threads_arg())
        .arg(color_arg());

    with_query_args(cmd)
}

/// Compile modules and print the query catalog.
pub fn catalog_command() -> Command {
    let cmd = Command::new("catalog")
        .about("Compile query modules and print the query catalog as JSON")
        .override_usage(
            "\
  sqlmark catalog <QUERIES> --schema <FILE> [-o <FILE>]
  sqlmark catalog -q <TEXT> --schema <FILE>",
        )
        .after_help(
            r#"EXAMPLES:
  sqlmark catalog queries/ --schema schema.json
  sqlmark catalog queries/ --schema schema.json -o catalog.json --compact"#,
        )
        .arg(schema_arg())
        .arg(strict_arg())
        .arg(threads_arg())
        .arg(output_file_arg())
        .arg(compact_arg())
        .arg(color_arg());

    with_query_args(cmd)
}

/// Parse headers only, no schema needed.
pub fn parse_command() -> Command {
    let cmd = Command::new("parse")
        .about("Parse query headers and print them in canonical form")
        .override_usage(
            "\
  sqlmark parse <QUERIES>
  sqlmark parse -q <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  sqlmark parse queries/
  sqlmark parse -q '--! books ?{}
SELECT * FROM Book;'"#,
        )
        .arg(color_arg());

    with_query_args(cmd)
}
