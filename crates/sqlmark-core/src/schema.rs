//! Schema catalog: relations, their ordered columns, and named user types.
//!
//! The catalog is read-only once built and shared by every resolver worker.
//! Relation and type lookups accept an `exact` flag: quoted SQL identifiers
//! must match exactly, unquoted ones match case-insensitively.

use indexmap::IndexMap;

use crate::SchemaError;
use crate::types::{ScalarKind, SchemaType};

/// A column of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: SchemaType,
    pub nullable: bool,
}

/// A table or view with columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, ty: SchemaType, nullable: bool) -> Self {
        self.columns.push(Column {
            name: name.into(),
            ty,
            nullable,
        });
        self
    }

    pub fn column(&self, name: &str, exact: bool) -> Option<&Column> {
        find_named(&self.columns, name, exact, |c| &c.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    relations: IndexMap<String, Relation>,
    /// Composite and enum types by name.
    types: IndexMap<String, SchemaType>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relation(&mut self, relation: Relation) -> Result<(), SchemaError> {
        if self.relations.contains_key(&relation.name) {
            return Err(SchemaError::DuplicateName(relation.name));
        }
        self.relations.insert(relation.name.clone(), relation);
        Ok(())
    }

    /// Register a composite or enum type under its own name.
    pub fn add_type(&mut self, ty: SchemaType) -> Result<(), SchemaError> {
        let name = match &ty {
            SchemaType::Composite { name, .. } | SchemaType::Enum { name, .. } => name.clone(),
            other => return Err(SchemaError::NotANamedType(other.to_string())),
        };
        if self.types.contains_key(&name) {
            return Err(SchemaError::DuplicateName(name));
        }
        self.types.insert(name, ty);
        Ok(())
    }

    /// Chainable form of [`add_relation`](Self::add_relation) for tests and fixtures.
    pub fn with_relation(mut self, relation: Relation) -> Result<Self, SchemaError> {
        self.add_relation(relation)?;
        Ok(self)
    }

    /// Chainable form of [`add_type`](Self::add_type).
    pub fn with_type(mut self, ty: SchemaType) -> Result<Self, SchemaError> {
        self.add_type(ty)?;
        Ok(self)
    }

    pub fn relation(&self, name: &str, exact: bool) -> Option<&Relation> {
        if let Some(rel) = self.relations.get(name) {
            return Some(rel);
        }
        if exact {
            return None;
        }
        self.relations
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn named_type(&self, name: &str, exact: bool) -> Option<&SchemaType> {
        if let Some(ty) = self.types.get(name) {
            return Some(ty);
        }
        if exact {
            return None;
        }
        self.types
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, ty)| ty)
    }

    /// Resolve a SQL type name as written in a cast or a schema file.
    ///
    /// Accepts base type aliases, registered composite/enum names,
    /// a `[]` suffix for arrays, and a `(n[, m])` modifier which is ignored.
    pub fn resolve_type_name(&self, name: &str) -> Option<SchemaType> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return self.resolve_type_name(element).map(SchemaType::array);
        }
        let base = match name.find('(') {
            Some(idx) if name.ends_with(')') => name[..idx].trim_end(),
            _ => name,
        };
        if let Some(kind) = ScalarKind::from_sql_name(base) {
            return Some(SchemaType::scalar(kind));
        }
        let (unquoted, exact) = match base.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(inner) => (inner, true),
            None => (base, false),
        };
        self.named_type(unquoted, exact).cloned()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty() && self.types.is_empty()
    }
}

fn find_named<'a, T>(
    items: &'a [T],
    name: &str,
    exact: bool,
    key: impl Fn(&T) -> &String,
) -> Option<&'a T> {
    if let Some(found) = items.iter().find(|it| key(it) == name) {
        return Some(found);
    }
    if exact {
        return None;
    }
    items.iter().find(|it| key(it).eq_ignore_ascii_case(name))
}
