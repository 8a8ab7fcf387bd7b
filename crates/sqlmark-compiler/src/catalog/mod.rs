//! Query catalog: every resolved query of a compilation, keyed by name.
//!
//! The catalog is the hand-off to an accessor emitter. Entries keep module
//! order, then declaration order, and serialize as a JSON array.

mod builder;

#[cfg(test)]
mod builder_tests;

pub use builder::{CatalogBuilder, CompiledModule, QueryOrigin};

use indexmap::IndexMap;
use rowan::TextRange;
use serde::{Serialize, Serializer};
use sqlmark_core::utils::to_pascal_case;

use crate::analyze::{Parameter, ProjectedColumn, ResolvedQuery, ResultKind};
use crate::parser::{BindingStyle, Cardinality};
use crate::source_map::SourceId;

/// One fully resolved query, with naming hints for generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub module: String,
    #[serde(skip)]
    pub source: SourceId,
    #[serde(skip)]
    pub name_range: TextRange,
    pub binding_style: BindingStyle,
    pub cardinality: Cardinality,
    pub streaming: bool,
    pub result: ResultKind,
    /// Struct a row decodes into. `None` for queries executed for their row count.
    pub row_struct: Option<String>,
    /// Struct bundling the arguments. `None` without parameters.
    pub params_struct: Option<String>,
    pub row_is_copy: bool,
    pub params_are_copy: bool,
    pub params: Vec<Parameter>,
    pub columns: Vec<ProjectedColumn>,
    pub sql: String,
    pub rewritten_sql: String,
}

impl CatalogEntry {
    pub fn new(module: impl Into<String>, query: ResolvedQuery) -> Self {
        let type_name = to_pascal_case(&query.descriptor.name);
        let rows = query.result == ResultKind::Rows;
        Self {
            row_struct: rows.then(|| type_name.clone()),
            params_struct: (!query.params.is_empty()).then(|| format!("{type_name}Params")),
            row_is_copy: rows && query.columns.iter().all(|c| c.is_copy),
            params_are_copy: query.params.iter().all(|p| p.is_copy),
            name: query.descriptor.name,
            module: module.into(),
            source: query.source,
            name_range: query.name_range,
            binding_style: query.descriptor.binding_style,
            cardinality: query.descriptor.cardinality,
            streaming: query.descriptor.streaming,
            result: query.result,
            params: query.params,
            columns: query.columns,
            sql: query.sql,
            rewritten_sql: query.rewritten_sql,
        }
    }
}

/// Read-only collection of catalog entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in module order, then declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Query names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = indexmap::map::Values<'a, String, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
