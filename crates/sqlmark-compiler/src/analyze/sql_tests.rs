use rowan::TextSize;

use super::sql::Sql;

fn sql(text: &str) -> Sql<'_> {
    Sql::new(text, TextSize::from(0))
}

fn type_at(text: &str, i: usize) -> Option<(String, usize)> {
    sql(text).type_name(i).map(|(t, next)| (t.name, next))
}

#[test]
fn type_names() {
    assert_eq!(type_at("x::INT4", 2), Some(("int4".into(), 3)));
    assert_eq!(type_at("x::double precision", 2), Some(("double precision".into(), 4)));
    assert_eq!(type_at("x::character varying(20)", 2), Some(("varchar".into(), 7)));
    assert_eq!(type_at("x::timestamp with time zone", 2), Some(("timestamptz".into(), 6)));
    assert_eq!(type_at("x::numeric(10, 2)[]", 2), Some(("numeric[]".into(), 10)));
    assert_eq!(type_at("x::public.mood", 2), Some(("mood".into(), 5)));
    assert_eq!(type_at(r#"x::"Mood""#, 2), Some((r#""Mood""#.into(), 3)));
    assert_eq!(type_at("x::", 2), None);
}

#[test]
fn quoted_identifiers_unescape() {
    let s = sql(r#"SELECT "say ""hi""" FROM t"#);
    let ident = s.ident(1).unwrap();
    assert_eq!(ident.name, r#"say "hi""#);
    assert!(ident.exact);
    assert!(!s.ident(3).unwrap().exact);
}

#[test]
fn ident_matching() {
    let s = sql(r#"name "Name""#);
    let unquoted = s.ident(0).unwrap();
    let quoted = s.ident(1).unwrap();
    assert!(unquoted.matches("NAME"));
    assert!(quoted.matches("Name"));
    assert!(!quoted.matches("name"));
}

#[test]
fn parens_and_contexts() {
    let s = sql("SELECT a FROM t WHERE b IN ( SELECT c FROM u )");
    assert_eq!(s.partner(7), Some(12));
    assert_eq!(s.partner(12), Some(7));
    assert_eq!(s.query_context(9), Some(7));
    assert_eq!(s.query_context(3), None);
    assert!(s.opens_subquery(7));
}

#[test]
fn function_parens_are_not_subqueries() {
    let s = sql("SELECT lower(name) FROM t");
    assert_eq!(s.query_context(3), None);
    assert!(s.is_call(2));
}

#[test]
fn unwrap_parens_skips_calls() {
    let s = sql("= ((:x))");
    assert_eq!(s.unwrap_parens(3, 3), (1, 5));

    let s = sql("lower(:x)");
    assert_eq!(s.unwrap_parens(2, 2), (2, 2));
}

#[test]
fn split_commas_respects_nesting() {
    let s = sql("a, f(b, c), d");
    assert_eq!(s.split_commas(0, s.len()), vec![(0, 1), (2, 8), (9, 10)]);
}

#[test]
fn clause_keywords() {
    let s = sql("SELECT x FROM t AS alias WHERE");
    assert!(s.is_clause_keyword(0));
    assert!(!s.is_clause_keyword(1));
    assert!(s.is_clause_keyword(4));
    assert!(!s.is_clause_keyword(5));
    assert!(s.is_keyword(6, "WHERE"));
}
