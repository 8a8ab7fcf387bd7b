//! Type system shared by the schema catalog and the compiler.
//!
//! A [`SchemaType`] is what a column, composite field, or query parameter
//! resolves to. Scalars cover the base types a relational engine ships with;
//! composites and enums are user-defined and referenced by name.

use std::fmt;

use serde::Serialize;

use crate::utils::to_pascal_case;

/// Built-in base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    /// Single-byte `"char"`.
    Char,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Varchar,
    Bytea,
    Uuid,
    Json,
    Jsonb,
    Date,
    Time,
    Timestamp,
    Timestamptz,
    Inet,
    Macaddr,
}

impl ScalarKind {
    /// Resolve a SQL type name, including common aliases (`integer`, `bigint`, ...).
    ///
    /// Matching is case-insensitive. Returns `None` for names that are not base types.
    pub fn from_sql_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let kind = match lowered.as_str() {
            "bool" | "boolean" => Self::Bool,
            "char" | "\"char\"" => Self::Char,
            "int2" | "smallint" | "smallserial" => Self::Int2,
            "int4" | "int" | "integer" | "serial" => Self::Int4,
            "int8" | "bigint" | "bigserial" => Self::Int8,
            "float4" | "real" => Self::Float4,
            "float8" | "double precision" => Self::Float8,
            "numeric" | "decimal" => Self::Numeric,
            "text" => Self::Text,
            "varchar" | "character varying" => Self::Varchar,
            "bytea" => Self::Bytea,
            "uuid" => Self::Uuid,
            "json" => Self::Json,
            "jsonb" => Self::Jsonb,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::Timestamptz,
            "inet" => Self::Inet,
            "macaddr" => Self::Macaddr,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical SQL name.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Int2 => "int2",
            Self::Int4 => "int4",
            Self::Int8 => "int8",
            Self::Float4 => "float4",
            Self::Float8 => "float8",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Varchar => "varchar",
            Self::Bytea => "bytea",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Timestamptz => "timestamptz",
            Self::Inet => "inet",
            Self::Macaddr => "macaddr",
        }
    }

    /// Owned Rust type an accessor should decode this scalar into.
    pub fn rust_type(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "i8",
            Self::Int2 => "i16",
            Self::Int4 => "i32",
            Self::Int8 => "i64",
            Self::Float4 => "f32",
            Self::Float8 => "f64",
            Self::Numeric => "rust_decimal::Decimal",
            Self::Text | Self::Varchar => "String",
            Self::Bytea => "Vec<u8>",
            Self::Uuid => "uuid::Uuid",
            Self::Json | Self::Jsonb => "serde_json::Value",
            Self::Date => "time::Date",
            Self::Time => "time::Time",
            Self::Timestamp => "time::PrimitiveDateTime",
            Self::Timestamptz => "time::OffsetDateTime",
            Self::Inet => "std::net::IpAddr",
            Self::Macaddr => "eui48::MacAddress",
        }
    }

    pub fn is_copy(self) -> bool {
        !matches!(
            self,
            Self::Text | Self::Varchar | Self::Bytea | Self::Json | Self::Jsonb
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A named member of a composite type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SchemaType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: SchemaType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Semantic type of a column, field, or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum SchemaType {
    Scalar(ScalarKind),
    Composite { name: String, fields: Vec<Field> },
    Enum { name: String, variants: Vec<String> },
    Array(Box<SchemaType>),
    /// Placeholder before resolution. Never present in a successfully built catalog.
    #[default]
    Unresolved,
}

impl SchemaType {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    pub fn composite(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::Composite {
            name: name.into(),
            fields,
        }
    }

    pub fn enumeration(name: impl Into<String>, variants: Vec<String>) -> Self {
        Self::Enum {
            name: name.into(),
            variants,
        }
    }

    pub fn array(element: SchemaType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Unresolved => false,
            Self::Scalar(_) | Self::Enum { .. } => true,
            Self::Composite { fields, .. } => fields.iter().all(|f| f.ty.is_resolved()),
            Self::Array(inner) => inner.is_resolved(),
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Look up a field of a composite type. Exact match wins over a case-insensitive one.
    pub fn field(&self, name: &str) -> Option<&Field> {
        let Self::Composite { fields, .. } = self else {
            return None;
        };
        fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }

    /// Owned Rust type path for an emitter. `None` while unresolved.
    pub fn rust_type(&self) -> Option<String> {
        match self {
            Self::Scalar(kind) => Some(kind.rust_type().to_string()),
            Self::Composite { name, .. } | Self::Enum { name, .. } => {
                Some(format!("types::{}", to_pascal_case(name)))
            }
            Self::Array(inner) => inner.rust_type().map(|t| format!("Vec<{t}>")),
            Self::Unresolved => None,
        }
    }

    /// Whether the decoded Rust value is `Copy`.
    ///
    /// Composites are `Copy` only when every field is.
    pub fn is_copy(&self) -> bool {
        match self {
            Self::Scalar(kind) => kind.is_copy(),
            Self::Enum { .. } => true,
            Self::Composite { fields, .. } => fields.iter().all(|f| f.ty.is_copy()),
            Self::Array(_) | Self::Unresolved => false,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Composite { name, .. } | Self::Enum { name, .. } => f.write_str(name),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Unresolved => f.write_str("<unresolved>"),
        }
    }
}
