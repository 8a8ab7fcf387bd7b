use indoc::indoc;

use crate::analyze::ParamKey;
use crate::parser::{BindingStyle, Cardinality, OptionalKind};
use crate::test_utils::{BOOKSTORE_MODULE, bookstore_schema};
use crate::{CancellationToken, CompileBuilder, DiagnosticKind, Error, SourceMap, compile};

#[test]
fn bookstore_compiles() {
    let mut sources = SourceMap::new();
    sources.add_file("bookstore.sql", BOOKSTORE_MODULE);
    let schema = bookstore_schema();

    let compilation = compile(&sources, &schema).unwrap();
    assert!(compilation.is_valid());
    assert!(compilation.diagnostics().is_empty());

    let catalog = compilation.into_catalog().unwrap();
    assert_eq!(catalog.len(), 10);

    let books = catalog.get("books").unwrap();
    assert!(books.params.is_empty());
    assert_eq!(books.columns.len(), 1);
    assert_eq!(books.columns[0].name, "Title");
    assert_eq!(books.binding_style, BindingStyle::Implicit);
    assert_eq!(books.cardinality, Cardinality::Many);

    let by_author = catalog.get("books_from_author_id").unwrap();
    assert_eq!(by_author.params.len(), 1);
    assert_eq!(by_author.params[0].key, ParamKey::Named("id".into()));
    assert_eq!(by_author.params[0].ty.to_string(), "int4");

    let by_name = catalog.get("authors_by_name").unwrap();
    assert_eq!(
        by_name.binding_style,
        BindingStyle::PositionalOptional(OptionalKind::Named("name".into()))
    );
    assert!(by_name.params[0].optional);
    assert_eq!(by_name.params[0].ty.to_string(), "varchar");

    assert_eq!(catalog.get("author_by_id").unwrap().cardinality, Cardinality::ExactlyOne);
    assert_eq!(catalog.get("author_name_by_id").unwrap().cardinality, Cardinality::AtMostOne);
}

#[test]
fn thread_count_does_not_change_the_catalog() {
    let mut sources = SourceMap::new();
    sources.add_file("bookstore.sql", BOOKSTORE_MODULE);
    sources.add_file("extra.sql", "--! titles\nSELECT Title FROM Book;\n");
    let schema = bookstore_schema();

    let single = CompileBuilder::new(&sources, &schema)
        .with_threads(1)
        .run()
        .unwrap()
        .into_catalog()
        .unwrap();
    let many = CompileBuilder::new(&sources, &schema)
        .with_threads(4)
        .run()
        .unwrap()
        .into_catalog()
        .unwrap();

    let single: Vec<_> = single.iter().cloned().collect();
    let many: Vec<_> = many.iter().cloned().collect();
    assert_eq!(single, many);
    assert_eq!(single.last().unwrap().name, "titles");
}

#[test]
fn failures_are_isolated_per_query() {
    let sources = SourceMap::one_liner(indoc! {"
        --! broken
        SELECT Nope FROM Book;

        --! fine
        SELECT Title FROM Book;

        --! also_broken
        SELECT * FROM Book WHERE Id = $1 AND Title = $3;
    "});
    let schema = bookstore_schema();

    let compilation = compile(&sources, &schema).unwrap();
    assert!(!compilation.is_valid());
    assert_eq!(
        compilation.diagnostics().kinds(),
        vec![
            DiagnosticKind::UnknownColumn,
            DiagnosticKind::NonContiguousPositionalParameters,
        ]
    );
    assert_eq!(compilation.catalog().names().collect::<Vec<_>>(), vec!["fine"]);

    let Err(Error::CompileFailed(diagnostics)) = compilation.into_catalog() else {
        panic!("expected a failed compilation");
    };
    assert_eq!(diagnostics.error_count(), 2);
}

#[test]
fn duplicates_across_modules_fail_the_build() {
    let mut sources = SourceMap::new();
    sources.add_file("a.sql", "--! books\nSELECT Title FROM Book;\n");
    sources.add_file("b.sql", "--! books\nSELECT Id FROM Book;\n");
    let schema = bookstore_schema();

    let compilation = compile(&sources, &schema).unwrap();
    assert_eq!(
        compilation.diagnostics().kinds(),
        vec![DiagnosticKind::DuplicateQueryName]
    );
    let records = compilation.diagnostics().records(&sources);
    assert_eq!(records[0].module, "b");
    assert_eq!((records[0].line, records[0].column), (1, 5));
    assert!(compilation.into_catalog().is_err());
}

#[test]
fn warnings_fail_only_in_strict_mode() {
    let sources = SourceMap::one_liner("--! q(id, unused)\nSELECT Title FROM Book WHERE Id = :id;");
    let schema = bookstore_schema();

    let lenient = compile(&sources, &schema).unwrap();
    assert!(lenient.is_valid());
    assert!(lenient.diagnostics().has_warnings());
    assert_eq!(lenient.catalog().get("q").unwrap().params.len(), 1);

    let strict = CompileBuilder::new(&sources, &schema)
        .with_strict(true)
        .run()
        .unwrap();
    assert!(!strict.is_valid());
    let err = strict.into_catalog().unwrap_err();
    assert_eq!(err.to_string(), "compilation failed with 0 errors and 1 warnings");
}

#[test]
fn custom_stream_suffix() {
    let sources = SourceMap::one_liner("--! authors_iter\nSELECT * FROM Author;\n--! authors_stream\nSELECT * FROM Author;");
    let schema = bookstore_schema();

    let catalog = CompileBuilder::new(&sources, &schema)
        .with_stream_suffix("_iter")
        .run()
        .unwrap()
        .into_catalog()
        .unwrap();
    assert!(catalog.get("authors_iter").unwrap().streaming);
    assert!(!catalog.get("authors_stream").unwrap().streaming);
}

#[test]
fn cancelled_pass_publishes_nothing() {
    let sources = SourceMap::one_liner(BOOKSTORE_MODULE);
    let schema = bookstore_schema();
    let token = CancellationToken::new();
    token.cancel();

    let result = CompileBuilder::new(&sources, &schema)
        .with_cancellation(token.clone())
        .run();
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(token.is_cancelled());
}

#[test]
fn empty_session() {
    let sources = SourceMap::new();
    let schema = bookstore_schema();

    let compilation = compile(&sources, &schema).unwrap();
    assert!(compilation.is_valid());
    assert!(compilation.catalog().is_empty());
}
