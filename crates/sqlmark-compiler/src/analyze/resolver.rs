//! Schema-bound type resolver.
//!
//! Types every parameter from the column it is compared against (or its
//! cast), and every projected column from the schema. Any error aborts the
//! query; other queries are unaffected.

use indexmap::IndexMap;
use rowan::TextRange;
use serde::Serialize;
use sqlmark_core::{ScalarKind, SchemaCatalog, SchemaType};

use super::binder::{ParamKey, Parameter, bind};
use super::projection::project;
use super::scope::{LookupError, Scope, build_scope};
use super::sql::{Ident, Sql};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Span};
use crate::parser::token::TokenKind;
use crate::parser::{ParsedQuery, QueryDescriptor};
use crate::source_map::SourceId;

/// A column of the query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SchemaType,
    pub nullable: bool,
    /// Rust type of the decoded value, `Option<_>` when nullable.
    pub rust_type: Option<String>,
    pub is_copy: bool,
}

impl ProjectedColumn {
    pub fn new(name: impl Into<String>, ty: SchemaType, nullable: bool) -> Self {
        let rust_type = ty
            .rust_type()
            .map(|t| if nullable { format!("Option<{t}>") } else { t });
        Self {
            name: name.into(),
            is_copy: ty.is_copy(),
            rust_type,
            ty,
            nullable,
        }
    }
}

/// What a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Rows,
    /// No projection: the accessor returns the affected row count.
    Execute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub descriptor: QueryDescriptor,
    pub source: SourceId,
    pub name_range: TextRange,
    pub params: Vec<Parameter>,
    pub columns: Vec<ProjectedColumn>,
    pub result: ResultKind,
    pub sql: String,
    pub rewritten_sql: String,
}

/// Bind and resolve one query. `None` when any error was reported.
pub fn resolve_query(
    query: &ParsedQuery<'_>,
    schema: &SchemaCatalog,
    diagnostics: &mut Diagnostics,
) -> Option<ResolvedQuery> {
    let sql = Sql::new(query.body, query.body_range.start());
    let bound = bind(query, &sql, diagnostics)?;
    let scope = build_scope(&sql, schema, query.source, diagnostics)?;

    let errors_before = diagnostics.error_count();
    let mut resolver = Resolver {
        sql: &sql,
        schema,
        scope: &scope,
        source: query.source,
        diagnostics,
    };

    let mut params = bound.params;
    resolver.type_params(&mut params);
    let projection = project(&mut resolver, &params);

    if resolver.diagnostics.error_count() > errors_before {
        return None;
    }
    let (result, columns) = projection?;

    Some(ResolvedQuery {
        descriptor: query.descriptor.clone(),
        source: query.source,
        name_range: query.spans.name,
        params,
        columns,
        result,
        sql: bound.sql,
        rewritten_sql: bound.rewritten_sql,
    })
}

pub(crate) struct Resolver<'a, 's, 'c> {
    pub sql: &'a Sql<'s>,
    pub schema: &'c SchemaCatalog,
    pub scope: &'a Scope<'c>,
    pub source: SourceId,
    pub diagnostics: &'a mut Diagnostics,
}

/// `[qualifier.]column` as written.
pub(crate) struct ColumnName {
    pub qualifier: Option<Ident>,
    pub column: Ident,
}

impl ColumnName {
    pub fn display(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q.name, self.column.name),
            None => self.column.name.clone(),
        }
    }
}

impl Resolver<'_, '_, '_> {
    pub fn report_lookup(&mut self, error: LookupError, name: &ColumnName, range: TextRange) {
        let kind = match error {
            LookupError::Unknown => DiagnosticKind::UnknownColumn,
            LookupError::Ambiguous => DiagnosticKind::AmbiguousColumn,
        };
        self.diagnostics
            .report(self.source, kind, range)
            .message(name.display())
            .emit();
    }

    /// Column reference ending at token `end` (inclusive): `col` or `q.col`.
    fn column_ending_at(&self, end: usize) -> Option<(ColumnName, usize)> {
        let sql = self.sql;
        let column = sql.ident(end)?;
        if sql.is_clause_keyword(end) {
            return None;
        }
        let (qualifier, start) = if end >= 2 && sql.is(end - 1, TokenKind::Dot) {
            (Some(sql.ident(end - 2)?), end - 2)
        } else {
            (None, end)
        };
        if start > 0
            && matches!(
                sql.kind(start - 1),
                Some(TokenKind::Dot | TokenKind::DoubleColon)
            )
        {
            return None;
        }
        Some((ColumnName { qualifier, column }, start))
    }

    /// Column reference starting at token `start`: `col` or `q.col`.
    pub fn column_at(&self, start: usize) -> Option<(ColumnName, usize)> {
        let sql = self.sql;
        let first = sql.ident(start)?;
        if sql.is_clause_keyword(start) {
            return None;
        }
        let (name, next) = if sql.is(start + 1, TokenKind::Dot) {
            let column = sql.ident(start + 2)?;
            (
                ColumnName {
                    qualifier: Some(first),
                    column,
                },
                start + 3,
            )
        } else {
            (
                ColumnName {
                    qualifier: None,
                    column: first,
                },
                start + 1,
            )
        };
        if matches!(
            sql.kind(next),
            Some(TokenKind::ParenOpen | TokenKind::Dot | TokenKind::DoubleColon)
        ) {
            return None;
        }
        Some((name, next))
    }

    /// Type of the column at `name`, reporting lookup failures.
    fn column_type(&mut self, at: usize, name: &ColumnName, range: TextRange) -> Option<SchemaType> {
        match self
            .scope
            .lookup(self.sql, at, name.qualifier.as_ref(), &name.column)
        {
            Ok(found) => Some(found.column.ty.clone()),
            Err(error) => {
                self.report_lookup(error, name, range);
                None
            }
        }
    }

    /// Token range `lo..=hi` of the operand a placeholder forms together
    /// with its cast: `:x`, `(:x)::t` or `CAST(:x AS t)`.
    fn param_operand(&self, i: usize) -> (usize, usize) {
        let sql = self.sql;
        let (lo, hi) = sql.unwrap_parens(i, i);
        if sql.is(hi + 1, TokenKind::DoubleColon)
            && let Some((_, next)) = sql.type_name(hi + 2)
        {
            return (lo, next - 1);
        }
        if i >= 2
            && sql.is(i - 1, TokenKind::ParenOpen)
            && sql.is_keyword(i - 2, "cast")
            && let Some(close) = sql.partner(i - 1)
        {
            return (i - 2, close);
        }
        (i, i)
    }

    /// The type the context of a placeholder expects, if any.
    fn context_type(&mut self, i: usize) -> Option<(SchemaType, TextRange)> {
        let sql = self.sql;
        let (lo, hi) = self.param_operand(i);
        let here = sql.span(i);

        if lo > 0 && (sql.is_keyword(lo - 1, "limit") || sql.is_keyword(lo - 1, "offset")) {
            return Some((SchemaType::scalar(ScalarKind::Int8), here));
        }

        // `col <op> :x`
        if lo >= 2 && is_comparison(sql, lo - 1) {
            let mut end = lo - 2;
            if end > 0 && sql.is_keyword(end, "not") {
                end -= 1;
            }
            if let Some((name, start)) = self.column_ending_at(end) {
                let range = sql.span_of(start, end + 1);
                return self.column_type(end, &name, range).map(|ty| (ty, here));
            }
        }

        // `:x <op> col`
        let mut op = hi + 1;
        if sql.is_keyword(op, "not") {
            op += 1;
        }
        if is_comparison(sql, op)
            && let Some((name, next)) = self.column_at(op + 1)
        {
            let range = sql.span_of(op + 1, next);
            return self.column_type(op + 1, &name, range).map(|ty| (ty, here));
        }

        // `col BETWEEN :a AND :b`
        if lo >= 2 && sql.is_keyword(lo - 1, "between") {
            return self.between_column(lo - 1).map(|ty| (ty, here));
        }
        if lo >= 3 && sql.is_keyword(lo - 1, "and") {
            let mut k = lo - 2;
            while k > 0 && !sql.is_clause_keyword(k) {
                k -= 1;
            }
            if sql.is_keyword(k, "between") {
                return self.between_column(k).map(|ty| (ty, here));
            }
        }

        // `col IN (:a, :b)`
        if lo > 0
            && matches!(sql.kind(lo - 1), Some(TokenKind::ParenOpen | TokenKind::Comma))
            && matches!(sql.kind(hi + 1), Some(TokenKind::ParenClose | TokenKind::Comma))
            && let Some(open) = sql.enclosing(lo)
            && open > 0
            && sql.is_keyword(open - 1, "in")
        {
            let mut end = open.checked_sub(2)?;
            if sql.is_keyword(end, "not") {
                end = end.checked_sub(1)?;
            }
            if let Some((name, start)) = self.column_ending_at(end) {
                let range = sql.span_of(start, end + 1);
                return self.column_type(end, &name, range).map(|ty| (ty, here));
            }
        }

        // `INSERT INTO t (c1, c2) VALUES (:a, :b)`
        if let Some(insert) = &self.scope.insert {
            for &(open, close) in &insert.tuples {
                if lo <= open || hi >= close {
                    continue;
                }
                let items = sql.split_commas(open + 1, close);
                if let Some(idx) = items.iter().position(|&(a, b)| a == lo && b == hi + 1) {
                    return insert
                        .columns
                        .get(idx)
                        .map(|column| (column.ty.clone(), here));
                }
            }
        }

        None
    }

    fn between_column(&mut self, between: usize) -> Option<SchemaType> {
        let mut end = between.checked_sub(1)?;
        if self.sql.is_keyword(end, "not") {
            end = end.checked_sub(1)?;
        }
        let (name, start) = self.column_ending_at(end)?;
        let range = self.sql.span_of(start, end + 1);
        self.column_type(end, &name, range)
    }

    /// Give every parameter a type: its cast hint, else the type its contexts agree on.
    fn type_params(&mut self, params: &mut [Parameter]) {
        let sql = self.sql;
        let mut contexts: IndexMap<ParamKey, Vec<(SchemaType, TextRange)>> = IndexMap::new();
        for i in 0..sql.len() {
            let Some(kind) = sql.kind(i).filter(|k| k.is_param()) else {
                continue;
            };
            let Some(key) = ParamKey::from_token(kind, sql.text(i)) else {
                continue;
            };
            let hinted = params
                .iter()
                .any(|p| p.key == key && p.type_hint.is_some());
            if hinted {
                continue;
            }
            if let Some(found) = self.context_type(i) {
                contexts.entry(key).or_default().push(found);
            }
        }

        for param in params.iter_mut() {
            if let Some(hint) = &param.type_hint {
                match self.schema.resolve_type_name(&hint.name) {
                    Some(ty) => param.set_type(ty),
                    None => {
                        self.diagnostics
                            .report(self.source, DiagnosticKind::UnknownType, hint.range)
                            .message(&hint.name)
                            .emit();
                    }
                }
                continue;
            }

            let Some(found) = contexts.get(&param.key).filter(|c| !c.is_empty()) else {
                self.diagnostics
                    .report(
                        self.source,
                        DiagnosticKind::UnresolvedParameterType,
                        param.occurrences[0],
                    )
                    .message(param.key.to_string())
                    .emit();
                continue;
            };

            let (first, first_range) = &found[0];
            if let Some((other, range)) = found.iter().find(|(ty, _)| ty != first) {
                self.diagnostics
                    .report(self.source, DiagnosticKind::AmbiguousParameterType, *range)
                    .message(format!("`{}` is used as `{first}` and `{other}`", param.key))
                    .related_to(format!("used as `{first}` here"), Span::new(self.source, *first_range))
                    .emit();
                continue;
            }
            param.set_type(first.clone());
        }
    }
}

fn is_comparison(sql: &Sql<'_>, i: usize) -> bool {
    sql.kind(i).is_some_and(|k| k.is_comparison())
        || sql.is_keyword(i, "like")
        || sql.is_keyword(i, "ilike")
}
