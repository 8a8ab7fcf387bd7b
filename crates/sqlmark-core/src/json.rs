//! JSON deserialization for schema catalog files.
//!
//! Object key order is significant: it is the declared column order of each
//! relation and the field order of each composite, so every map is an `IndexMap`.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::SchemaError;
use crate::schema::{Relation, SchemaCatalog};
use crate::types::{Field, SchemaType};

impl SchemaCatalog {
    /// Parse a schema catalog from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_json::from_str(json).map_err(SchemaError::Json)?;
        raw.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default)]
    relations: IndexMap<String, Vec<RawColumn>>,
    #[serde(default)]
    composites: IndexMap<String, Vec<RawField>>,
    #[serde(default)]
    enums: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default = "nullable_by_default")]
    nullable: bool,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

fn nullable_by_default() -> bool {
    true
}

impl RawSchema {
    fn build(&self) -> Result<SchemaCatalog, SchemaError> {
        let mut catalog = SchemaCatalog::new();

        for (name, variants) in &self.enums {
            catalog.add_type(SchemaType::enumeration(name.clone(), variants.clone()))?;
        }

        // Composites may reference each other in any order.
        let mut resolving = Vec::new();
        for name in self.composites.keys() {
            self.define_composite(name, &mut catalog, &mut resolving)?;
        }

        for (rel_name, columns) in &self.relations {
            let mut relation = Relation::new(rel_name.clone());
            for col in columns {
                let ty = catalog.resolve_type_name(&col.type_name).ok_or_else(|| {
                    SchemaError::UnknownType {
                        owner: format!("{rel_name}.{}", col.name),
                        type_name: col.type_name.clone(),
                    }
                })?;
                relation = relation.with_column(col.name.clone(), ty, col.nullable);
            }
            catalog.add_relation(relation)?;
        }

        Ok(catalog)
    }

    /// Declared composite a type name refers to, matched the way
    /// `SchemaCatalog::resolve_type_name` matches named types.
    fn composite_named(&self, name: &str) -> Option<&str> {
        let (name, exact) = match name.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(inner) => (inner, true),
            None => (name, false),
        };
        if let Some((key, _)) = self.composites.get_key_value(name) {
            return Some(key);
        }
        if exact {
            return None;
        }
        self.composites
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    fn define_composite(
        &self,
        name: &str,
        catalog: &mut SchemaCatalog,
        resolving: &mut Vec<String>,
    ) -> Result<(), SchemaError> {
        if catalog.named_type(name, true).is_some() {
            return Ok(());
        }
        if resolving.iter().any(|n| n == name) {
            return Err(SchemaError::RecursiveComposite(name.to_string()));
        }
        resolving.push(name.to_string());

        let mut fields = Vec::new();
        for raw in &self.composites[name] {
            let element = raw.type_name.trim().trim_end_matches("[]").trim_end();
            if let Some(dependency) = self.composite_named(element) {
                self.define_composite(dependency, catalog, resolving)?;
            }
            let ty = catalog.resolve_type_name(&raw.type_name).ok_or_else(|| {
                SchemaError::UnknownType {
                    owner: format!("{name}.{}", raw.name),
                    type_name: raw.type_name.clone(),
                }
            })?;
            fields.push(Field::new(raw.name.clone(), ty));
        }

        resolving.pop();
        catalog.add_type(SchemaType::composite(name, fields))
    }
}
