//! Result columns of a statement.
//!
//! The projection is the `SELECT` list of a query, or the `RETURNING` list
//! of a data-modifying statement. Statements with neither are executed for
//! their row count.

use rowan::TextRange;
use sqlmark_core::{ScalarKind, SchemaType};

use super::binder::{ParamKey, Parameter};
use super::resolver::{ColumnName, ProjectedColumn, ResultKind, Resolver};
use super::scope::LookupError;
use crate::diagnostics::DiagnosticKind;
use crate::parser::token::TokenKind;

/// Column name for expressions that do not carry one.
const ANONYMOUS_COLUMN: &str = "?column?";

const SELECT_LIST_END: &[&str] = &[
    "from", "into", "where", "group", "having", "window", "order", "limit", "offset", "fetch",
    "for", "union", "except", "intersect",
];

/// Why an expression did not resolve. Nothing is reported until the caller
/// knows no other reading (such as a trailing alias) applies.
enum ExprError {
    Unsupported,
    Failed {
        kind: DiagnosticKind,
        range: TextRange,
        detail: String,
    },
}

struct Expr {
    name: String,
    ty: SchemaType,
    nullable: bool,
}

pub(crate) fn project(
    resolver: &mut Resolver<'_, '_, '_>,
    params: &[Parameter],
) -> Option<(ResultKind, Vec<ProjectedColumn>)> {
    let Some((lo, hi)) = projection_range(resolver) else {
        return Some((ResultKind::Execute, Vec::new()));
    };

    let mut columns = Vec::new();
    let mut failed = false;
    for (a, b) in resolver.sql.split_commas(lo, hi) {
        match item(resolver, params, a, b) {
            Some(mut found) => columns.append(&mut found),
            None => failed = true,
        }
    }
    (!failed).then_some((ResultKind::Rows, columns))
}

/// Token range of the top-level projection list.
fn projection_range(resolver: &Resolver<'_, '_, '_>) -> Option<(usize, usize)> {
    let sql = resolver.sql;
    let top = |i: usize| sql.enclosing(i).is_none();
    let statement = (0..sql.len()).find(|&i| {
        top(i)
            && ["select", "insert", "update", "delete", "values"]
                .iter()
                .any(|kw| sql.is_keyword(i, kw))
    })?;
    let end_of_statement = (statement..sql.len())
        .find(|&i| top(i) && sql.is(i, TokenKind::Semicolon))
        .unwrap_or(sql.len());

    if sql.is_keyword(statement, "select") {
        let mut lo = statement + 1;
        if sql.is_keyword(lo, "all") {
            lo += 1;
        } else if sql.is_keyword(lo, "distinct") {
            lo += 1;
            if sql.is_keyword(lo, "on")
                && let Some(close) = sql.partner(lo + 1)
            {
                lo = close + 1;
            }
        }
        let hi = (lo..end_of_statement)
            .find(|&i| top(i) && SELECT_LIST_END.iter().any(|kw| sql.is_keyword(i, kw)))
            .unwrap_or(end_of_statement);
        return Some((lo, hi));
    }

    if sql.is_keyword(statement, "values") {
        return None;
    }
    let returning = (statement..end_of_statement).find(|&i| top(i) && sql.is_keyword(i, "returning"))?;
    Some((returning + 1, end_of_statement))
}

/// Columns of one projection item. `None` after reporting an error.
fn item(
    resolver: &mut Resolver<'_, '_, '_>,
    params: &[Parameter],
    a: usize,
    b: usize,
) -> Option<Vec<ProjectedColumn>> {
    let sql = resolver.sql;

    if b == a + 1 && sql.is(a, TokenKind::Star) {
        let columns = resolver
            .scope
            .statement_entries()
            .flat_map(|entry| {
                entry.relation.columns.iter().map(|c| {
                    ProjectedColumn::new(c.name.clone(), c.ty.clone(), c.nullable || entry.nullable)
                })
            })
            .collect();
        return Some(columns);
    }

    if b == a + 3
        && sql.is(a + 1, TokenKind::Dot)
        && sql.is(a + 2, TokenKind::Star)
        && let Some(qualifier) = sql.ident(a)
    {
        let Some(entry) = resolver
            .scope
            .statement_entries()
            .find(|e| e.answers_to(&qualifier))
        else {
            resolver
                .diagnostics
                .report(resolver.source, DiagnosticKind::UnknownRelation, qualifier.range)
                .message(&qualifier.name)
                .emit();
            return None;
        };
        let columns = entry
            .relation
            .columns
            .iter()
            .map(|c| ProjectedColumn::new(c.name.clone(), c.ty.clone(), c.nullable || entry.nullable))
            .collect();
        return Some(columns);
    }

    let attempt = |alias: Option<usize>, end: usize| match expr(resolver, params, a, end) {
        Ok(found) => {
            let name = alias
                .and_then(|i| sql.ident(i))
                .map_or(found.name, |ident| ident.name);
            Ok(ProjectedColumn::new(name, found.ty, found.nullable))
        }
        Err(e) => Err(e),
    };

    let explicit_alias = b >= a + 3 && sql.is_keyword(b - 2, "as") && sql.ident(b - 1).is_some();
    let result = if explicit_alias {
        attempt(Some(b - 1), b - 2)
    } else {
        match attempt(None, b) {
            Err(ExprError::Unsupported)
                if b >= a + 2
                    && sql.kind(b - 1).is_some_and(|k| k.is_word())
                    && !sql.is_clause_keyword(b - 1)
                    && !matches!(
                        sql.kind(b - 2),
                        Some(TokenKind::Dot | TokenKind::DoubleColon)
                    ) =>
            {
                attempt(Some(b - 1), b - 1)
            }
            other => other,
        }
    };

    match result {
        Ok(column) => Some(vec![column]),
        Err(ExprError::Unsupported) => {
            let range = sql.span_of(a, b);
            resolver
                .diagnostics
                .report(resolver.source, DiagnosticKind::UnsupportedExpression, range)
                .message(format!("`{}` has no inferable type; add a cast", sql.slice(range)))
                .emit();
            None
        }
        Err(ExprError::Failed {
            kind,
            range,
            detail,
        }) => {
            resolver
                .diagnostics
                .report(resolver.source, kind, range)
                .message(detail)
                .emit();
            None
        }
    }
}

fn expr(
    resolver: &Resolver<'_, '_, '_>,
    params: &[Parameter],
    a: usize,
    b: usize,
) -> Result<Expr, ExprError> {
    let sql = resolver.sql;
    if a >= b {
        return Err(ExprError::Unsupported);
    }

    // `expr::type`
    let level = sql.enclosing(a);
    let cast = (a + 1..b)
        .rev()
        .find(|&i| sql.is(i, TokenKind::DoubleColon) && sql.enclosing(i) == level);
    if let Some(c) = cast
        && let Some((type_name, next)) = sql.type_name(c + 1)
        && next == b
    {
        let Some(ty) = resolver.schema.resolve_type_name(&type_name.name) else {
            return Err(ExprError::Failed {
                kind: DiagnosticKind::UnknownType,
                range: type_name.range,
                detail: type_name.name,
            });
        };
        return match expr(resolver, params, a, c) {
            Ok(inner) => Ok(Expr {
                name: inner.name,
                ty,
                nullable: inner.nullable,
            }),
            Err(ExprError::Unsupported) => Ok(Expr {
                name: type_display_name(&ty),
                ty,
                nullable: true,
            }),
            Err(failed) => Err(failed),
        };
    }

    if b == a + 1 {
        return single_token(resolver, params, a);
    }

    if let Some((name, next)) = column_path(resolver, a)
        && next == b
    {
        return lookup(resolver, a, &name);
    }

    // count(...)
    if sql.is_keyword(a, "count") && sql.is(a + 1, TokenKind::ParenOpen) && sql.partner(a + 1) == Some(b - 1) {
        return Ok(Expr {
            name: "count".to_string(),
            ty: SchemaType::scalar(ScalarKind::Int8),
            nullable: false,
        });
    }

    if sql.is(a, TokenKind::ParenOpen)
        && let Some(close) = sql.partner(a)
        && close < b
    {
        if close == b - 1 {
            return expr(resolver, params, a + 1, close);
        }
        return field_access(resolver, params, a, close, b);
    }

    Err(ExprError::Unsupported)
}

/// `(composite).field[.field...]`
fn field_access(
    resolver: &Resolver<'_, '_, '_>,
    params: &[Parameter],
    open: usize,
    close: usize,
    b: usize,
) -> Result<Expr, ExprError> {
    let sql = resolver.sql;
    let mut fields = Vec::new();
    let mut i = close + 1;
    while i < b {
        if !sql.is(i, TokenKind::Dot) {
            return Err(ExprError::Unsupported);
        }
        let field = sql.ident(i + 1).ok_or(ExprError::Unsupported)?;
        fields.push(field);
        i += 2;
    }
    if i != b {
        return Err(ExprError::Unsupported);
    }

    let mut current = expr(resolver, params, open + 1, close)?;
    for field in fields {
        let Some(found) = current.ty.field(&field.name) else {
            return Err(ExprError::Failed {
                kind: DiagnosticKind::UnknownCompositeField,
                range: field.range,
                detail: format!("`{}` has no field `{}`", current.ty, field.name),
            });
        };
        current = Expr {
            name: found.name.clone(),
            ty: found.ty.clone(),
            nullable: true,
        };
    }
    Ok(current)
}

fn single_token(
    resolver: &Resolver<'_, '_, '_>,
    params: &[Parameter],
    a: usize,
) -> Result<Expr, ExprError> {
    let sql = resolver.sql;
    let literal = |kind| {
        Ok(Expr {
            name: ANONYMOUS_COLUMN.to_string(),
            ty: SchemaType::scalar(kind),
            nullable: false,
        })
    };
    match sql.kind(a) {
        Some(TokenKind::Number) if sql.text(a).contains('.') => literal(ScalarKind::Numeric),
        Some(TokenKind::Number) => literal(ScalarKind::Int4),
        Some(TokenKind::StringLiteral) => literal(ScalarKind::Text),
        Some(TokenKind::Ident) if sql.is_keyword(a, "true") || sql.is_keyword(a, "false") => {
            literal(ScalarKind::Bool)
        }
        Some(kind) if kind.is_param() => {
            let key = ParamKey::from_token(kind, sql.text(a)).ok_or(ExprError::Unsupported)?;
            let param = params
                .iter()
                .find(|p| p.key == key && p.ty.is_resolved())
                .ok_or(ExprError::Unsupported)?;
            Ok(Expr {
                name: param.name.clone(),
                ty: param.ty.clone(),
                nullable: false,
            })
        }
        Some(kind) if kind.is_word() && !sql.is_clause_keyword(a) => {
            let (name, _) = column_path(resolver, a).ok_or(ExprError::Unsupported)?;
            lookup(resolver, a, &name)
        }
        _ => Err(ExprError::Unsupported),
    }
}

/// `col` or `q.col` at `a`, without the trailing-token checks of a comparison operand.
fn column_path(resolver: &Resolver<'_, '_, '_>, a: usize) -> Option<(ColumnName, usize)> {
    let sql = resolver.sql;
    if sql.is_clause_keyword(a) {
        return None;
    }
    let first = sql.ident(a)?;
    if sql.is(a + 1, TokenKind::Dot) {
        let column = sql.ident(a + 2)?;
        return Some((
            ColumnName {
                qualifier: Some(first),
                column,
            },
            a + 3,
        ));
    }
    Some((
        ColumnName {
            qualifier: None,
            column: first,
        },
        a + 1,
    ))
}

fn lookup(resolver: &Resolver<'_, '_, '_>, at: usize, name: &ColumnName) -> Result<Expr, ExprError> {
    match resolver
        .scope
        .lookup(resolver.sql, at, name.qualifier.as_ref(), &name.column)
    {
        Ok(found) => Ok(Expr {
            name: found.column.name.clone(),
            ty: found.column.ty.clone(),
            nullable: found.nullable,
        }),
        Err(error) => {
            let kind = match error {
                LookupError::Unknown => DiagnosticKind::UnknownColumn,
                LookupError::Ambiguous => DiagnosticKind::AmbiguousColumn,
            };
            let range = match &name.qualifier {
                Some(q) => q.range.cover(name.column.range),
                None => name.column.range,
            };
            Err(ExprError::Failed {
                kind,
                range,
                detail: name.display(),
            })
        }
    }
}

/// Column name of a cast whose operand is not a column: the type's own name.
fn type_display_name(ty: &SchemaType) -> String {
    match ty {
        SchemaType::Array(_) => ANONYMOUS_COLUMN.to_string(),
        other => other.to_string(),
    }
}
