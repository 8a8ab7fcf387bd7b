//! Relation scope of a statement.
//!
//! Relations come from `FROM`, `JOIN`, `UPDATE`, `INSERT INTO` and
//! `DELETE FROM`. Each entry remembers the subquery it belongs to, so column
//! lookups prefer the innermost query and fall back outwards.

use rowan::TextRange;
use sqlmark_core::{Column, Relation, SchemaCatalog};

use super::sql::{Ident, Sql};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::token::TokenKind;
use crate::source_map::SourceId;

#[derive(Debug, Clone)]
pub struct ScopeEntry<'c> {
    pub relation: &'c Relation,
    pub alias: Option<Ident>,
    /// Columns are nullable because of an outer join.
    pub nullable: bool,
    /// Subquery paren the relation belongs to, `None` at statement level.
    pub context: Option<usize>,
    pub range: TextRange,
}

impl ScopeEntry<'_> {
    pub fn answers_to(&self, qualifier: &Ident) -> bool {
        match &self.alias {
            Some(alias) => qualifier.matches(&alias.name),
            None => qualifier.matches(&self.relation.name),
        }
    }
}

/// Column list and `VALUES` tuples of an `INSERT`.
#[derive(Debug, Clone)]
pub struct InsertTarget<'c> {
    pub columns: Vec<&'c Column>,
    /// `(open, close)` paren indices of every tuple.
    pub tuples: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct Scope<'c> {
    pub entries: Vec<ScopeEntry<'c>>,
    pub insert: Option<InsertTarget<'c>>,
}

/// A column found in scope.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRef<'c> {
    pub column: &'c Column,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Unknown,
    Ambiguous,
}

impl<'c> Scope<'c> {
    /// Entries visible from the top-level projection.
    pub fn statement_entries(&self) -> impl Iterator<Item = &ScopeEntry<'c>> {
        self.entries.iter().filter(|e| e.context.is_none())
    }

    /// Find `[qualifier.]column` as seen from token `at`.
    pub fn lookup(
        &self,
        sql: &Sql<'_>,
        at: usize,
        qualifier: Option<&Ident>,
        column: &Ident,
    ) -> Result<ColumnRef<'c>, LookupError> {
        let mut context = sql.query_context(at);
        loop {
            let mut found: Vec<ColumnRef<'c>> = self
                .entries
                .iter()
                .filter(|e| e.context == context)
                .filter(|e| qualifier.is_none_or(|q| e.answers_to(q)))
                .filter_map(|e| {
                    e.relation
                        .column(&column.name, column.exact)
                        .map(|c| ColumnRef {
                            column: c,
                            nullable: c.nullable || e.nullable,
                        })
                })
                .collect();
            match found.len() {
                0 => {}
                1 => return Ok(found.remove(0)),
                _ => return Err(LookupError::Ambiguous),
            }
            match context {
                Some(open) => context = sql.query_context(open),
                None => return Err(LookupError::Unknown),
            }
        }
    }
}

struct ScopeBuilder<'a, 's, 'c> {
    sql: &'a Sql<'s>,
    schema: &'c SchemaCatalog,
    source: SourceId,
    diagnostics: &'a mut Diagnostics,
    scope: Scope<'c>,
    failed: bool,
}

/// Collect the relations of a statement. `None` when a relation is unknown.
pub fn build_scope<'c>(
    sql: &Sql<'_>,
    schema: &'c SchemaCatalog,
    source: SourceId,
    diagnostics: &mut Diagnostics,
) -> Option<Scope<'c>> {
    let mut builder = ScopeBuilder {
        sql,
        schema,
        source,
        diagnostics,
        scope: Scope::default(),
        failed: false,
    };
    builder.run();
    (!builder.failed).then_some(builder.scope)
}

impl<'c> ScopeBuilder<'_, '_, 'c> {
    fn run(&mut self) {
        let sql = self.sql;
        for i in 0..sql.len() {
            if self.failed {
                return;
            }
            if !self.at_clause_level(i) {
                continue;
            }
            if sql.is_keyword(i, "from") {
                self.from_list(i + 1);
            } else if sql.is_keyword(i, "join") {
                self.join(i);
            } else if sql.is_keyword(i, "update") && self.starts_statement(i) {
                self.table_ref(i + 1, false);
            } else if sql.is_keyword(i, "into") && i > 0 && sql.is_keyword(i - 1, "insert") {
                self.insert(i + 1);
            }
        }
    }

    /// Clause keywords inside function calls (`extract(x FROM y)`) do not count.
    fn at_clause_level(&self, i: usize) -> bool {
        match self.sql.enclosing(i) {
            None => true,
            Some(open) => self.sql.opens_subquery(open),
        }
    }

    fn starts_statement(&self, i: usize) -> bool {
        i == 0
            || matches!(
                self.sql.kind(i - 1),
                Some(TokenKind::ParenOpen | TokenKind::ParenClose | TokenKind::Semicolon)
            )
    }

    fn from_list(&mut self, start: usize) {
        let mut next = start;
        while let Some(after) = self.table_ref(next, false) {
            if !self.sql.is(after, TokenKind::Comma) {
                return;
            }
            next = after + 1;
        }
    }

    fn join(&mut self, at: usize) {
        let sql = self.sql;
        let mut side = at;
        if side > 0 && sql.is_keyword(side - 1, "outer") {
            side -= 1;
        }
        let kind = if side > 0 {
            sql.text(side - 1).to_ascii_lowercase()
        } else {
            String::new()
        };
        let context = sql.query_context(at);

        if matches!(kind.as_str(), "right" | "full") {
            for entry in self.scope.entries.iter_mut().filter(|e| e.context == context) {
                entry.nullable = true;
            }
        }
        self.table_ref(at + 1, matches!(kind.as_str(), "left" | "full"));
    }

    /// Parse one relation reference at `start`. Returns the index after it.
    fn table_ref(&mut self, start: usize, nullable: bool) -> Option<usize> {
        let sql = self.sql;
        let mut i = start;
        while sql.is_keyword(i, "only") || sql.is_keyword(i, "lateral") {
            i += 1;
        }

        // derived tables carry no schema information
        if sql.is(i, TokenKind::ParenOpen) {
            let close = sql.partner(i)?;
            return Some(self.skip_alias(close + 1));
        }

        if sql.is_clause_keyword(i) {
            return None;
        }
        let (_, next) = sql.object_name(i)?;

        // set-returning function
        if sql.is(next, TokenKind::ParenOpen) {
            let close = sql.partner(next)?;
            return Some(self.skip_alias(close + 1));
        }

        self.named_relation(i, nullable)
    }

    /// Register the relation named at `i`, with its alias.
    fn named_relation(&mut self, i: usize, nullable: bool) -> Option<usize> {
        let sql = self.sql;
        let (name, next) = sql.object_name(i)?;
        let Some(relation) = self.schema.relation(&name.name, name.exact) else {
            self.diagnostics
                .report(self.source, DiagnosticKind::UnknownRelation, name.range)
                .message(&name.name)
                .emit();
            self.failed = true;
            return None;
        };

        let (alias, after) = self.alias(next);
        self.scope.entries.push(ScopeEntry {
            relation,
            alias,
            nullable,
            context: sql.query_context(i),
            range: name.range,
        });
        Some(after)
    }

    fn alias(&self, at: usize) -> (Option<Ident>, usize) {
        let sql = self.sql;
        let (alias, mut next) = if sql.is_keyword(at, "as") {
            (sql.ident(at + 1), at + 2)
        } else if sql.kind(at).is_some_and(|k| k.is_word()) && !sql.is_clause_keyword(at) {
            (sql.ident(at), at + 1)
        } else {
            (None, at)
        };
        if alias.is_none() {
            return (None, at);
        }
        // column alias list: `AS t(a, b)`
        if sql.is(next, TokenKind::ParenOpen)
            && let Some(close) = sql.partner(next)
        {
            next = close + 1;
        }
        (alias, next)
    }

    fn skip_alias(&self, at: usize) -> usize {
        self.alias(at).1
    }

    fn insert(&mut self, start: usize) {
        let sql = self.sql;
        let Some(after) = self.named_relation(start, false) else {
            return;
        };
        let Some(entry) = self.scope.entries.last() else {
            return;
        };
        let relation = entry.relation;

        let mut next = after;
        let mut columns: Vec<&'c Column> = Vec::new();
        if sql.is(next, TokenKind::ParenOpen)
            && let Some(close) = sql.partner(next)
        {
            for (lo, hi) in sql.split_commas(next + 1, close) {
                let Some(ident) = sql.ident(lo).filter(|_| hi == lo + 1) else {
                    continue;
                };
                match relation.column(&ident.name, ident.exact) {
                    Some(column) => columns.push(column),
                    None => {
                        self.diagnostics
                            .report(self.source, DiagnosticKind::UnknownColumn, ident.range)
                            .message(format!("{}.{}", relation.name, ident.name))
                            .emit();
                        self.failed = true;
                        return;
                    }
                }
            }
            next = close + 1;
        } else {
            columns = relation.columns.iter().collect();
        }

        let mut tuples = Vec::new();
        if sql.is_keyword(next, "values") {
            let mut k = next + 1;
            while let Some(close) = sql.partner(k).filter(|_| sql.is(k, TokenKind::ParenOpen)) {
                tuples.push((k, close));
                if !sql.is(close + 1, TokenKind::Comma) {
                    break;
                }
                k = close + 2;
            }
        }

        self.scope.insert = Some(InsertTarget { columns, tuples });
    }
}
