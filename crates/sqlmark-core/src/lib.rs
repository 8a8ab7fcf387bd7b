#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for sqlmark schema information.
//!
//! Two layers:
//! - **Deserialization layer**: 1:1 mapping to the schema JSON file
//! - **Catalog layer**: ordered relations, columns and named types used by
//!   the compiler to type parameters and projections

mod json;
pub mod schema;
pub mod types;
pub mod utils;


pub use schema::{Column, Relation, SchemaCatalog};
pub use types::{Field, ScalarKind, SchemaType};

/// Error while building a schema catalog.
#[derive(Debug)]
pub enum SchemaError {
    Json(serde_json::Error),
    /// A column or field references a type that is neither a base type nor declared.
    UnknownType { owner: String, type_name: String },
    /// A composite contains itself, directly or through other composites.
    RecursiveComposite(String),
    DuplicateName(String),
    /// Only composites and enums can be registered as named types.
    NotANamedType(String),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "schema JSON parse error: {e}"),
            Self::UnknownType { owner, type_name } => {
                write!(f, "`{owner}` has unknown type `{type_name}`")
            }
            Self::RecursiveComposite(name) => {
                write!(f, "composite type `{name}` contains itself")
            }
            Self::DuplicateName(name) => write!(f, "`{name}` is declared more than once"),
            Self::NotANamedType(ty) => write!(f, "`{ty}` is not a composite or enum type"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}
