//! Parameter binder.
//!
//! Collects placeholders from a query body, checks them against the header,
//! assigns slots and records inline cast hints. The output does not depend
//! on the schema.

use std::fmt;

use indexmap::IndexMap;
use rowan::TextRange;
use serde::Serialize;
use sqlmark_core::{ScalarKind, SchemaType};

use super::sql::{Sql, TypeName};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Span};
use crate::parser::token::TokenKind;
use crate::parser::{BindingStyle, OptionalKind, ParsedQuery};

/// Identity of a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    /// `$N`
    Positional(u32),
    /// `:name`
    Named(String),
}

impl ParamKey {
    /// Key of a placeholder token. `None` for a position that overflows.
    pub fn from_token(kind: TokenKind, text: &str) -> Option<Self> {
        match kind {
            TokenKind::PositionalParam => text[1..].parse().ok().map(Self::Positional),
            TokenKind::NamedParam => Some(Self::Named(text[1..].to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(n) => write!(f, "${n}"),
            Self::Named(name) => write!(f, ":{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeHint {
    pub name: String,
    #[serde(skip)]
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub key: ParamKey,
    /// Name for generated code: the placeholder name, the explicit-list name
    /// of a positional slot, or `argN`.
    pub name: String,
    /// Position in the rewritten SQL, 1-based.
    pub slot: u32,
    pub declared: bool,
    pub optional: bool,
    pub type_hint: Option<TypeHint>,
    #[serde(rename = "type")]
    pub ty: SchemaType,
    pub rust_type: Option<String>,
    pub is_copy: bool,
    #[serde(skip)]
    pub occurrences: Vec<TextRange>,
}

impl Parameter {
    fn new(key: ParamKey) -> Self {
        let name = match &key {
            ParamKey::Positional(n) => format!("arg{n}"),
            ParamKey::Named(name) => name.clone(),
        };
        Self {
            key,
            name,
            slot: 0,
            declared: false,
            optional: false,
            type_hint: None,
            ty: SchemaType::Unresolved,
            rust_type: None,
            is_copy: false,
            occurrences: Vec::new(),
        }
    }

    pub(crate) fn set_type(&mut self, ty: SchemaType) {
        self.rust_type = ty.rust_type();
        self.is_copy = ty.is_copy();
        self.ty = ty;
    }
}

/// Binder output: the slot-ordered parameter table and both SQL texts.
#[derive(Debug, Clone)]
pub struct BoundQuery {
    pub params: Vec<Parameter>,
    pub sql: String,
    pub rewritten_sql: String,
}

impl BoundQuery {
    pub fn param(&self, key: &ParamKey) -> Option<&Parameter> {
        self.params.iter().find(|p| p.key == *key)
    }
}

/// Bind the placeholders of `query`. `None` when an error was reported.
pub fn bind(query: &ParsedQuery<'_>, sql: &Sql<'_>, diagnostics: &mut Diagnostics) -> Option<BoundQuery> {
    let source = query.source;
    let descriptor = &query.descriptor;
    let errors_before = diagnostics.error_count();

    let mut found: IndexMap<ParamKey, Parameter> = IndexMap::new();
    for i in 0..sql.len() {
        let Some(kind) = sql.kind(i).filter(|k| k.is_param()) else {
            continue;
        };
        let Some(key) = ParamKey::from_token(kind, sql.text(i)) else {
            diagnostics
                .report(source, DiagnosticKind::NonContiguousPositionalParameters, sql.span(i))
                .message(format!("`{}` is out of range", sql.text(i)))
                .emit();
            continue;
        };

        let param = found
            .entry(key.clone())
            .or_insert_with(|| Parameter::new(key));
        param.occurrences.push(sql.span(i));

        let Some(hint) = cast_hint(sql, i) else {
            continue;
        };
        match param.type_hint.clone() {
            None => {
                param.type_hint = Some(TypeHint {
                    name: hint.name,
                    range: hint.range,
                })
            }
            Some(prev) if canonical_type(&prev.name) != canonical_type(&hint.name) => {
                diagnostics
                    .report(source, DiagnosticKind::ConflictingTypeHints, hint.range)
                    .message(format!("`{}` is cast to `{}` and `{}`", param.key, prev.name, hint.name))
                    .related_to("first cast here", Span::new(source, prev.range))
                    .emit();
            }
            Some(_) => {}
        }
    }

    check_positions(query, &found, diagnostics);

    let declared = descriptor.declared_names();
    // An explicit list over a purely positional body names the slots in order.
    let slot_names: &[String] = match &descriptor.binding_style {
        BindingStyle::ExplicitList(names)
            if !found.keys().any(|k| matches!(k, ParamKey::Named(_))) =>
        {
            names
        }
        _ => &[],
    };
    let checks_declarations = matches!(
        descriptor.binding_style,
        BindingStyle::ExplicitList(_) | BindingStyle::PositionalOptional(OptionalKind::Named(_))
    );
    if checks_declarations {
        for param in found.values() {
            if let ParamKey::Named(name) = &param.key
                && !declared.contains(name)
            {
                diagnostics
                    .report(source, DiagnosticKind::UndeclaredParameter, param.occurrences[0])
                    .message(name)
                    .emit();
            }
        }
        for (idx, (name, range)) in declared.iter().zip(&query.spans.declared).enumerate() {
            let names_slot = idx < slot_names.len()
                && found.contains_key(&ParamKey::Positional(idx as u32 + 1));
            if !names_slot && !found.contains_key(&ParamKey::Named(name.clone())) {
                diagnostics
                    .report(source, DiagnosticKind::UnusedDeclaredParameter, *range)
                    .message(name)
                    .emit();
            }
        }
    }

    if let BindingStyle::PositionalOptional(OptionalKind::Count(expected)) = descriptor.binding_style
        && found.len() != expected as usize
    {
        let range = query.spans.optional.unwrap_or(query.spans.name);
        diagnostics
            .report(source, DiagnosticKind::ParameterCountMismatch, range)
            .message(format!(
                "header declares {expected} optional parameters, body uses {}",
                found.len()
            ))
            .emit();
    }

    if diagnostics.error_count() > errors_before {
        return None;
    }

    let max_position = found
        .keys()
        .filter_map(|k| match k {
            ParamKey::Positional(n) => Some(*n),
            ParamKey::Named(_) => None,
        })
        .max()
        .unwrap_or(0);

    // Named parameters follow the positional ones: header order when declared,
    // first occurrence otherwise.
    let mut named: Vec<String> = found
        .keys()
        .filter_map(|k| match k {
            ParamKey::Named(name) => Some(name.clone()),
            ParamKey::Positional(_) => None,
        })
        .collect();
    if checks_declarations {
        named.sort_by_key(|name| declared.iter().position(|d| d == name));
    }

    let counted = matches!(
        descriptor.binding_style,
        BindingStyle::PositionalOptional(OptionalKind::Count(_))
    );
    let mut params: Vec<Parameter> = found.into_values().collect();
    for param in &mut params {
        param.optional = descriptor.is_optional();
        match &param.key {
            ParamKey::Positional(n) => {
                param.slot = *n;
                param.declared = counted;
                if let Some(name) = (*n as usize).checked_sub(1).and_then(|i| slot_names.get(i)) {
                    param.name = name.clone();
                    param.declared = true;
                }
            }
            ParamKey::Named(name) => {
                let order = named.iter().position(|n| n == name).unwrap_or(0) as u32;
                param.slot = max_position + 1 + order;
                param.declared = counted || declared.contains(name);
            }
        }
    }
    params.sort_by_key(|p| p.slot);

    let rewritten_sql = rewrite(query, sql, &params);
    Some(BoundQuery {
        params,
        sql: query.body.trim().to_string(),
        rewritten_sql: rewritten_sql.trim().to_string(),
    })
}

fn check_positions(
    query: &ParsedQuery<'_>,
    found: &IndexMap<ParamKey, Parameter>,
    diagnostics: &mut Diagnostics,
) {
    let mut positions: Vec<(u32, TextRange)> = found
        .values()
        .filter_map(|p| match p.key {
            ParamKey::Positional(n) => Some((n, p.occurrences[0])),
            ParamKey::Named(_) => None,
        })
        .collect();
    positions.sort_by_key(|(n, _)| *n);

    let mut expected = 1;
    for (n, range) in positions {
        if n == 0 {
            diagnostics
                .report(query.source, DiagnosticKind::NonContiguousPositionalParameters, range)
                .message("positions start at `$1`")
                .emit();
            continue;
        }
        if n > expected {
            let missing = if n - expected == 1 {
                format!("`${expected}` is never used")
            } else {
                format!("`${expected}` to `${}` are never used", n - 1)
            };
            diagnostics
                .report(query.source, DiagnosticKind::NonContiguousPositionalParameters, range)
                .message(missing)
                .emit();
        }
        expected = n + 1;
    }
}

/// Cast applied directly to the placeholder at `i`:
/// `:x::t`, `(:x)::t` or `CAST(:x AS t)`.
fn cast_hint(sql: &Sql<'_>, i: usize) -> Option<TypeName> {
    let (lo, hi) = sql.unwrap_parens(i, i);
    if sql.is(hi + 1, TokenKind::DoubleColon) {
        return sql.type_name(hi + 2).map(|(ty, _)| ty);
    }
    if lo >= 2
        && sql.is(lo - 1, TokenKind::ParenOpen)
        && sql.is_keyword(lo - 2, "cast")
        && sql.is_keyword(hi + 1, "as")
    {
        let (ty, next) = sql.type_name(hi + 2)?;
        if sql.partner(lo - 1) == Some(next) {
            return Some(ty);
        }
    }
    None
}

/// Spelling-independent form of a type name, so `int` and `int4` agree.
fn canonical_type(name: &str) -> String {
    let mut base = name;
    let mut dims = 0;
    while let Some(inner) = base.strip_suffix("[]") {
        base = inner;
        dims += 1;
    }
    let base = match ScalarKind::from_sql_name(base) {
        Some(kind) => kind.sql_name().to_string(),
        None => base.to_ascii_lowercase(),
    };
    format!("{base}{}", "[]".repeat(dims))
}

/// The body with every named placeholder replaced by its `$slot`.
fn rewrite(query: &ParsedQuery<'_>, sql: &Sql<'_>, params: &[Parameter]) -> String {
    let base = query.body_range.start();
    let mut out = String::with_capacity(query.body.len());
    let mut cursor = 0usize;
    for i in 0..sql.len() {
        if !sql.is(i, TokenKind::NamedParam) {
            continue;
        }
        let Some(key) = ParamKey::from_token(TokenKind::NamedParam, sql.text(i)) else {
            continue;
        };
        let Some(param) = params.iter().find(|p| p.key == key) else {
            continue;
        };
        let range = sql.span(i) - base;
        out.push_str(&query.body[cursor..usize::from(range.start())]);
        out.push_str(&format!("${}", param.slot));
        cursor = usize::from(range.end());
    }
    out.push_str(&query.body[cursor..]);
    out
}
