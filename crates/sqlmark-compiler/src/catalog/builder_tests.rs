use indoc::indoc;
use serde_json::json;

use super::*;
use crate::analyze::resolve_query;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::parse_module;
use crate::source_map::{SourceId, SourceMap};
use crate::test_utils::{BOOKSTORE_MODULE, bookstore_schema};

fn compile_module(sources: &SourceMap, id: SourceId, diagnostics: &mut Diagnostics) -> CompiledModule {
    let schema = bookstore_schema();
    let parsed = parse_module(id, sources.content(id), "_stream", diagnostics);
    CompiledModule {
        source: id,
        module: sources.module_name(id),
        declared: parsed
            .iter()
            .map(|q| QueryOrigin {
                name: q.descriptor.name.clone(),
                source: q.source,
                name_range: q.spans.name,
            })
            .collect(),
        resolved: parsed
            .iter()
            .filter_map(|q| resolve_query(q, &schema, diagnostics))
            .collect(),
    }
}

fn build(sources: &SourceMap) -> (Catalog, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut builder = CatalogBuilder::new();
    for source in sources.iter() {
        builder = builder.add_module(compile_module(sources, source.id, &mut diagnostics));
    }
    let (catalog, merged) = builder.finish();
    diagnostics.extend(merged);
    (catalog, diagnostics)
}

#[test]
fn bookstore_catalog() {
    let mut sources = SourceMap::new();
    sources.add_file("queries/bookstore.sql", BOOKSTORE_MODULE);
    let (catalog, diagnostics) = build(&sources);

    assert!(diagnostics.is_empty(), "{:?}", diagnostics.kinds());
    insta::assert_snapshot!(catalog.names().collect::<Vec<_>>().join("\n"), @r"
    authors
    authors_stream
    books
    books_from_author_id
    author_name_by_id
    authors_by_name
    select_everything
    select_composite_field
    insert_book
    author_by_id
    ");
    assert!(catalog.iter().all(|e| e.module == "bookstore"));
}

#[test]
fn streaming_variant_is_independent() {
    let sources = SourceMap::one_liner(BOOKSTORE_MODULE);
    let (catalog, _) = build(&sources);

    let plain = catalog.get("authors").unwrap();
    let stream = catalog.get("authors_stream").unwrap();
    assert!(!plain.streaming);
    assert!(stream.streaming);
    assert_eq!(plain.columns, stream.columns);
    assert_eq!(plain.sql, stream.sql);
    assert_eq!(plain.cardinality, stream.cardinality);
}

#[test]
fn naming_hints() {
    let sources = SourceMap::one_liner(BOOKSTORE_MODULE);
    let (catalog, _) = build(&sources);

    let entry = catalog.get("books_from_author_id").unwrap();
    assert_eq!(entry.row_struct.as_deref(), Some("BooksFromAuthorId"));
    assert_eq!(entry.params_struct.as_deref(), Some("BooksFromAuthorIdParams"));
    assert!(!entry.row_is_copy);
    assert!(entry.params_are_copy);

    let entry = catalog.get("books").unwrap();
    assert_eq!(entry.params_struct, None);

    let entry = catalog.get("insert_book").unwrap();
    assert_eq!(entry.result, ResultKind::Execute);
    assert_eq!(entry.row_struct, None);
    assert_eq!(entry.params_struct.as_deref(), Some("InsertBookParams"));
    assert!(!entry.params_are_copy);
}

#[test]
fn duplicates_within_a_module() {
    let sources = SourceMap::one_liner(indoc! {"
        --! books
        SELECT Title FROM Book;

        --! books
        SELECT Id FROM Book;

        --! books
        SELECT * FROM Book;
    "});
    let (catalog, diagnostics) = build(&sources);

    assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::DuplicateQueryName]);
    let diag = diagnostics.iter().next().unwrap();
    assert_eq!(diag.message(), "query `books` is defined more than once");
    assert_eq!(sources.line_col(diag.span().source, diag.span().range.start()), (4, 5));
    let related: Vec<_> = diag.related().iter().map(|r| r.message()).collect();
    assert_eq!(related, vec!["first defined here", "also defined here"]);

    // first occurrence wins
    let entry = catalog.get("books").unwrap();
    assert_eq!(entry.sql, "SELECT Title FROM Book;");
    assert_eq!(catalog.len(), 1);
}

#[test]
fn duplicates_across_modules() {
    let mut sources = SourceMap::new();
    let first = sources.add_file("a.sql", "--! books\nSELECT Title FROM Book;\n");
    let second = sources.add_file("b.sql", "--! authors\nSELECT * FROM Author;\n--! books\nSELECT Id FROM Book;\n");
    let (catalog, diagnostics) = build(&sources);

    assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::DuplicateQueryName]);
    let diag = diagnostics.iter().next().unwrap();
    assert_eq!(diag.span().source, second);
    assert_eq!(diag.related()[0].span().source, first);

    assert_eq!(catalog.get("books").unwrap().module, "a");
    assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["books", "authors"]);
}

#[test]
fn duplicates_include_unresolved_queries() {
    let sources = SourceMap::one_liner(indoc! {"
        --! books
        SELECT Nope FROM Book;

        --! books
        SELECT Title FROM Book;
    "});
    let (catalog, diagnostics) = build(&sources);

    assert_eq!(
        diagnostics.kinds(),
        vec![DiagnosticKind::UnknownColumn, DiagnosticKind::DuplicateQueryName]
    );
    assert!(catalog.contains("books"));
}

#[test]
fn serializes_as_array() {
    let sources = SourceMap::one_liner("--! books_from_author_id(id)\nSELECT Title FROM Book WHERE Id = :id;");
    let (catalog, diagnostics) = build(&sources);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.kinds());

    let value = serde_json::to_value(&catalog).unwrap();
    let entry = &value[0];
    assert_eq!(entry["name"], "books_from_author_id");
    assert_eq!(entry["module"], "<query>");
    assert_eq!(entry["binding_style"], json!({ "kind": "explicit_list", "of": ["id"] }));
    assert_eq!(entry["cardinality"], "many");
    assert_eq!(entry["result"], "rows");
    assert_eq!(entry["rewritten_sql"], "SELECT Title FROM Book WHERE Id = $1;");
    assert_eq!(entry["params"][0]["key"], json!({ "named": "id" }));
    assert_eq!(entry["params"][0]["type"], json!({ "kind": "scalar", "of": "int4" }));
    assert_eq!(entry["params"][0]["name"], "id");
    assert_eq!(entry["params"][0]["rust_type"], "i32");
    assert_eq!(entry["columns"][0]["name"], "Title");
    assert!(entry.get("source").is_none());
}
