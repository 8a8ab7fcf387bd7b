//! Tests for CLI dispatch: arg parsing and params extraction.

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{catalog_command, check_command, parse_command};
use crate::commands::catalog::CatalogArgs;
use crate::commands::query_loader::QueryInput;

#[test]
fn check_extracts_params() {
    let m = check_command()
        .try_get_matches_from([
            "check", "queries/", "--schema", "schema.json", "--strict", "-j", "4",
        ])
        .unwrap();
    let params = CheckParams::from_matches(&m);

    assert_eq!(params.queries_path, Some(PathBuf::from("queries/")));
    assert_eq!(params.query_text, None);
    assert_eq!(params.schema, PathBuf::from("schema.json"));
    assert_eq!(params.stream_suffix, "_stream");
    assert_eq!(params.threads, Some(4));
    assert!(params.strict);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn check_requires_schema() {
    let result = check_command().try_get_matches_from(["check", "queries/"]);
    let err = result.err().unwrap();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn inline_query_may_start_with_header_marker() {
    let m = check_command()
        .try_get_matches_from(["check", "-q", "--! books\nSELECT 1;", "--schema", "s.json"])
        .unwrap();
    let params = CheckParams::from_matches(&m);
    assert_eq!(params.query_text.as_deref(), Some("--! books\nSELECT 1;"));
    assert_eq!(params.queries_path, None);
}

#[test]
fn inline_query_conflicts_with_path() {
    let result = check_command().try_get_matches_from([
        "check", "queries/", "-q", "--! a\nSELECT 1;", "--schema", "s.json",
    ]);
    let err = result.err().unwrap();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn catalog_extracts_output_options() {
    let m = catalog_command()
        .try_get_matches_from([
            "catalog",
            "-",
            "--schema",
            "schema.json",
            "-o",
            "catalog.json",
            "--compact",
            "--color",
            "never",
            "--stream-suffix",
            "_iter",
        ])
        .unwrap();
    let args: CatalogArgs = CatalogParams::from_matches(&m).into();

    assert_eq!(args.input, QueryInput::Stdin);
    assert_eq!(args.output, Some(PathBuf::from("catalog.json")));
    assert!(args.compact);
    assert!(!args.color);
    assert_eq!(args.stream_suffix, "_iter");
    assert_eq!(args.threads, None);
    assert!(!args.strict);
}

#[test]
fn parse_needs_no_schema() {
    let m = parse_command()
        .try_get_matches_from(["parse", "books.sql", "--color", "always"])
        .unwrap();
    let params = ParseParams::from_matches(&m);
    assert_eq!(params.queries_path, Some(PathBuf::from("books.sql")));
    assert_eq!(params.color, ColorChoice::Always);
}

#[test]
fn parse_rejects_schema_flag() {
    let result = parse_command().try_get_matches_from(["parse", "a.sql", "--schema", "s.json"]);
    assert!(result.is_err());
}

#[test]
fn invalid_color_rejected() {
    let result = parse_command().try_get_matches_from(["parse", "a.sql", "--color", "sometimes"]);
    let err = result.err().unwrap();
    assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
}

#[test]
fn verbosity_counts_anywhere() {
    let m = build_cli()
        .try_get_matches_from(["sqlmark", "parse", "a.sql", "-vv"])
        .unwrap();
    assert_eq!(verbosity(&m), 2);

    let m = build_cli()
        .try_get_matches_from(["sqlmark", "-v", "parse", "a.sql"])
        .unwrap();
    assert_eq!(verbosity(&m), 1);

    let m = build_cli()
        .try_get_matches_from(["sqlmark", "parse", "a.sql"])
        .unwrap();
    assert_eq!(verbosity(&m), 0);
}

#[test]
fn subcommand_required() {
    let result = build_cli().try_get_matches_from(["sqlmark"]);
    assert!(result.is_err());
}

#[test]
fn color_choice_is_explicit_when_forced() {
    assert!(ColorChoice::Always.should_colorize());
    assert!(!ColorChoice::Never.should_colorize());
}
