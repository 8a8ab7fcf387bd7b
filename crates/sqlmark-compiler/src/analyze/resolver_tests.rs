use super::*;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::Cardinality;
use crate::source_map::SourceMap;
use crate::test_utils::{BOOKSTORE_MODULE, bookstore_schema, parse_one_liner};

fn resolve_src(src: &str) -> (Option<ResolvedQuery>, Diagnostics) {
    let sources = SourceMap::one_liner(src);
    let (_, queries, mut diagnostics) = parse_one_liner(&sources);
    assert_eq!(queries.len(), 1, "{:?}", diagnostics.kinds());
    let schema = bookstore_schema();
    let resolved = resolve_query(&queries[0], &schema, &mut diagnostics);
    (resolved, diagnostics)
}

fn resolved(src: &str) -> ResolvedQuery {
    let (resolved, diagnostics) = resolve_src(src);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.kinds());
    resolved.unwrap()
}

fn failure(src: &str) -> (DiagnosticKind, String) {
    let (resolved, diagnostics) = resolve_src(src);
    assert!(resolved.is_none());
    let diag = diagnostics.iter().next().expect("an error");
    (diag.kind(), diag.message().to_string())
}

fn columns(query: &ResolvedQuery) -> String {
    query
        .columns
        .iter()
        .map(|c| format!("{} {}{}", c.name, c.ty, if c.nullable { "?" } else { "" }))
        .collect::<Vec<_>>()
        .join("\n")
}

fn params(query: &ResolvedQuery) -> String {
    query
        .params
        .iter()
        .map(|p| format!("{}@{} {}", p.key, p.slot, p.ty))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn bookstore_module_resolves() {
    let sources = SourceMap::one_liner(BOOKSTORE_MODULE);
    let (_, queries, mut diagnostics) = parse_one_liner(&sources);
    let schema = bookstore_schema();
    let resolved: Vec<_> = queries
        .iter()
        .filter_map(|q| resolve_query(q, &schema, &mut diagnostics))
        .collect();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.kinds());
    assert_eq!(resolved.len(), queries.len());
}

#[test]
fn single_column() {
    let q = resolved("--! books\nSELECT Title FROM Book;");
    assert_eq!(q.result, ResultKind::Rows);
    assert!(q.params.is_empty());
    insta::assert_snapshot!(columns(&q), @"Title text");
    assert_eq!(q.columns[0].rust_type.as_deref(), Some("String"));
    assert!(!q.columns[0].is_copy);
}

#[test]
fn join_with_named_parameter() {
    let q = resolved(indoc::indoc! {"
        --! books_from_author_id(id)
        SELECT Book.Title
        FROM BookAuthor
        INNER JOIN Author ON Author.Id = BookAuthor.AuthorId
        INNER JOIN Book ON Book.Id = BookAuthor.BookId
        WHERE Author.Id = :id;
    "});
    insta::assert_snapshot!(columns(&q), @"Title text");
    insta::assert_snapshot!(params(&q), @":id@1 int4");
    assert_eq!(q.params[0].rust_type.as_deref(), Some("i32"));
    assert!(q.params[0].is_copy);
    assert!(q.rewritten_sql.ends_with("WHERE Author.Id = $1;"));
}

#[test]
fn star_keeps_declaration_order() {
    let q = resolved("--! authors\nSELECT * FROM Author;");
    insta::assert_snapshot!(columns(&q), @r"
    Id int4
    Name text
    Country text
    ");
}

#[test]
fn qualified_star_with_alias() {
    let q = resolved("--! q\nSELECT a.* FROM Author a, Book;");
    assert_eq!(q.columns.len(), 3);

    let (kind, message) = failure("--! q\nSELECT x.* FROM Author;");
    assert_eq!(kind, DiagnosticKind::UnknownRelation);
    assert_eq!(message, "`x` is not a known relation");
}

#[test]
fn case_insensitive_and_quoted_names() {
    let q = resolved("--! q\nselect title from book;");
    insta::assert_snapshot!(columns(&q), @"Title text");

    let q = resolved("--! q\nSELECT \"Title\" FROM \"Book\";");
    insta::assert_snapshot!(columns(&q), @"Title text");

    let (kind, _) = failure("--! q\nSELECT \"title\" FROM Book;");
    assert_eq!(kind, DiagnosticKind::UnknownColumn);
}

#[test]
fn hinted_optional_parameter() {
    let q = resolved("--! authors_by_name ?{name}\nSELECT Id, Name FROM Author WHERE Name = (:name)::varchar;");
    insta::assert_snapshot!(params(&q), @":name@1 varchar");
    assert!(q.params[0].optional);
    assert_eq!(q.descriptor.cardinality, Cardinality::Many);
}

#[test]
fn positional_parameter_from_comparison() {
    let q = resolved("--! author_name_by_id ?{}\nSELECT Author.Name FROM Author WHERE Author.Id = $1;");
    insta::assert_snapshot!(params(&q), @"$1@1 int4");
    assert_eq!(q.descriptor.cardinality, Cardinality::AtMostOne);
    assert_eq!(q.rewritten_sql, q.sql);
}

#[test]
fn explicit_list_over_positional_body() {
    let q = resolved("--! name_by_author_id(author_id)\nSELECT Name FROM Author WHERE Id = $1;");
    insta::assert_snapshot!(params(&q), @"$1@1 int4");
    assert_eq!(q.params[0].name, "author_id");
    assert!(q.params[0].declared);
}

#[test]
fn placeholders_in_odd_comments_and_dollar_strings() {
    let q = resolved(
        "--! q\n/* uses $2 **/ SELECT Name FROM Author WHERE Name <> $$a:b$$ AND Id = $1;",
    );
    insta::assert_snapshot!(params(&q), @"$1@1 int4");
}

#[test]
fn parameter_contexts() {
    let q = resolved(indoc::indoc! {"
        --! q
        SELECT Id FROM Author
        WHERE :id = Id
          AND Country IN (:a, :b)
          AND Name NOT LIKE :pattern
          AND Id BETWEEN :lo AND :hi
        LIMIT :limit OFFSET :offset;
    "});
    insta::assert_snapshot!(params(&q), @r"
    :id@1 int4
    :a@2 text
    :b@3 text
    :pattern@4 text
    :lo@5 int4
    :hi@6 int4
    :limit@7 int8
    :offset@8 int8
    ");
}

#[test]
fn parameter_in_subquery() {
    let q = resolved(indoc::indoc! {"
        --! q
        SELECT Title FROM Book
        WHERE Id IN (SELECT BookId FROM BookAuthor WHERE AuthorId = :author);
    "});
    insta::assert_snapshot!(params(&q), @":author@1 int4");
    insta::assert_snapshot!(columns(&q), @"Title text");
}

#[test]
fn left_join_makes_columns_nullable() {
    let q = resolved(indoc::indoc! {"
        --! q
        SELECT Author.Name, Book.Title
        FROM Author
        LEFT JOIN BookAuthor ON BookAuthor.AuthorId = Author.Id
        LEFT JOIN Book ON Book.Id = BookAuthor.BookId;
    "});
    insta::assert_snapshot!(columns(&q), @r"
    Name text
    Title text?
    ");
    assert_eq!(q.columns[1].rust_type.as_deref(), Some("Option<String>"));
}

#[test]
fn right_join_makes_earlier_relations_nullable() {
    let q = resolved("--! q\nSELECT Author.Id, Book.Id FROM Author RIGHT JOIN Book ON Book.Id = Author.Id;");
    insta::assert_snapshot!(columns(&q), @r"
    Id int4?
    Id int4
    ");
}

#[test]
fn composites_and_enums() {
    let q = resolved("--! select_everything\nSELECT * FROM custom_table;");
    insta::assert_snapshot!(columns(&q), @r"
    col1 custom_composite?
    col2 spongebob_character?
    ");
    assert_eq!(
        q.columns[0].rust_type.as_deref(),
        Some("Option<types::CustomComposite>")
    );
    assert!(!q.columns[0].is_copy);
    assert!(q.columns[1].is_copy);

    let q = resolved("--! q\nSELECT (col1).wow, (col1).nice FROM custom_table;");
    insta::assert_snapshot!(columns(&q), @r"
    wow text?
    nice spongebob_character?
    ");
}

#[test]
fn unknown_composite_field() {
    let (kind, message) = failure("--! q\nSELECT (col1).nope FROM custom_table;");
    assert_eq!(kind, DiagnosticKind::UnknownCompositeField);
    assert_eq!(
        message,
        "unknown composite field: `custom_composite` has no field `nope`"
    );
}

#[test]
fn literals_counts_and_casts() {
    let q = resolved(indoc::indoc! {"
        --! q
        SELECT count(*), 1, 'a', 2.5, true, Id::int8, 'x'::text AS label, Name author_name
        FROM Author;
    "});
    insta::assert_snapshot!(columns(&q), @r"
    count int8
    ?column? int4
    ?column? text
    ?column? numeric
    ?column? bool
    Id int8
    label text
    author_name text
    ");
}

#[test]
fn insert_is_executed() {
    let q = resolved("--! insert_book(title)\nINSERT INTO Book (Title) VALUES (:title);");
    assert_eq!(q.result, ResultKind::Execute);
    assert!(q.columns.is_empty());
    insta::assert_snapshot!(params(&q), @":title@1 text");
    assert_eq!(q.rewritten_sql, "INSERT INTO Book (Title) VALUES ($1);");
}

#[test]
fn insert_without_column_list() {
    let q = resolved("--! q\nINSERT INTO Book VALUES (:id, :title), ($1, $2);");
    insta::assert_snapshot!(params(&q), @r"
    $1@1 int4
    $2@2 text
    :id@3 int4
    :title@4 text
    ");
}

#[test]
fn insert_into_unknown_column() {
    let (kind, message) = failure("--! q\nINSERT INTO Book (Nope) VALUES (:x);");
    assert_eq!(kind, DiagnosticKind::UnknownColumn);
    assert_eq!(message, "`Book.Nope` is not a column of any relation in scope");
}

#[test]
fn update_returning() {
    let q = resolved("--! q\nUPDATE Author SET Name = :name WHERE Id = :id RETURNING Id, Name;");
    assert_eq!(q.result, ResultKind::Rows);
    insta::assert_snapshot!(params(&q), @r"
    :name@1 text
    :id@2 int4
    ");
    insta::assert_snapshot!(columns(&q), @r"
    Id int4
    Name text
    ");
}

#[test]
fn delete_is_executed() {
    let q = resolved("--! q\nDELETE FROM Author WHERE Id = $1;");
    assert_eq!(q.result, ResultKind::Execute);
    insta::assert_snapshot!(params(&q), @"$1@1 int4");
}

#[test]
fn unknown_relation() {
    let (kind, message) = failure("--! q\nSELECT * FROM Nope;");
    assert_eq!(kind, DiagnosticKind::UnknownRelation);
    assert_eq!(message, "`Nope` is not a known relation");
}

#[test]
fn unknown_column() {
    let (kind, message) = failure("--! q\nSELECT Nope FROM Author;");
    assert_eq!(kind, DiagnosticKind::UnknownColumn);
    assert_eq!(message, "`Nope` is not a column of any relation in scope");
}

#[test]
fn ambiguous_column() {
    let (kind, message) = failure("--! q\nSELECT Id FROM Author, Book;");
    assert_eq!(kind, DiagnosticKind::AmbiguousColumn);
    assert_eq!(message, "column `Id` exists in more than one relation");

    resolved("--! q\nSELECT Author.Id FROM Author, Book;");
}

#[test]
fn unresolved_parameter_type() {
    let (kind, message) = failure("--! q\nSELECT Id FROM Author WHERE lower(Name) = :n;");
    assert_eq!(kind, DiagnosticKind::UnresolvedParameterType);
    assert_eq!(
        message,
        "cannot infer type of `:n`; compare it to a column or add a cast"
    );

    let q = resolved("--! q\nSELECT Id FROM Author WHERE lower(Name) = :n::text;");
    insta::assert_snapshot!(params(&q), @":n@1 text");
}

#[test]
fn ambiguous_parameter_type() {
    let (resolved, diagnostics) = resolve_src("--! q\nSELECT Id FROM Author WHERE Id = :x OR Name = :x;");
    assert!(resolved.is_none());
    assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::AmbiguousParameterType]);
    let diag = diagnostics.iter().next().unwrap();
    assert_eq!(
        diag.message(),
        "parameter is compared against different types: `:x` is used as `int4` and `text`"
    );
    assert_eq!(diag.related().len(), 1);
}

#[test]
fn unknown_type_hint() {
    let (kind, message) = failure("--! q\nSELECT Id FROM Author WHERE Id = :x::nope;");
    assert_eq!(kind, DiagnosticKind::UnknownType);
    assert_eq!(message, "`nope` is not a known type");
}

#[test]
fn unsupported_expression() {
    let (kind, message) = failure("--! q\nSELECT Id + 1 FROM Author;");
    assert_eq!(kind, DiagnosticKind::UnsupportedExpression);
    assert_eq!(
        message,
        "unsupported expression: `Id + 1` has no inferable type; add a cast"
    );

    let q = resolved("--! q\nSELECT (Id + 1)::int4 AS next FROM Author;");
    insta::assert_snapshot!(columns(&q), @"next int4?");
}
