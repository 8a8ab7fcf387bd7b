use std::fmt;

use rowan::TextRange;
use serde::Serialize;

use crate::source_map::SourceId;

/// How runtime parameters of a query are discovered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum BindingStyle {
    /// Placeholders found in the body define the parameters.
    #[default]
    Implicit,
    /// `name(a, b)`: the header lists every named parameter.
    ExplicitList(Vec<String>),
    /// `?{...}` with an argument: parameters are optional at call time.
    PositionalOptional(OptionalKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalKind {
    /// `?{N}`: exactly N optional parameters.
    Count(u32),
    /// `?{name}`: the single named parameter the query accepts.
    Named(String),
}

/// Expected row-count contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Many,
    AtMostOne,
    ExactlyOne,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDescriptor {
    pub name: String,
    pub binding_style: BindingStyle,
    pub cardinality: Cardinality,
    pub streaming: bool,
}

impl QueryDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding_style: BindingStyle::Implicit,
            cardinality: Cardinality::Many,
            streaming: false,
        }
    }

    /// Names the header declares, in declaration order.
    pub fn declared_names(&self) -> &[String] {
        match &self.binding_style {
            BindingStyle::ExplicitList(names) => names,
            BindingStyle::PositionalOptional(OptionalKind::Named(name)) => {
                std::slice::from_ref(name)
            }
            _ => &[],
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.binding_style, BindingStyle::PositionalOptional(_))
    }
}

/// Prints the canonical header, without the marker.
impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let counted = match &self.binding_style {
            BindingStyle::Implicit => false,
            BindingStyle::ExplicitList(names) => {
                write!(f, "({})", names.join(", "))?;
                false
            }
            BindingStyle::PositionalOptional(OptionalKind::Count(n)) => {
                write!(f, " ?{{{n}}}")?;
                true
            }
            BindingStyle::PositionalOptional(OptionalKind::Named(name)) => {
                write!(f, " ?{{{name}}}")?;
                false
            }
        };
        match self.cardinality {
            Cardinality::AtMostOne if !counted => f.write_str(" ?{}"),
            Cardinality::ExactlyOne => f.write_str(" !{}"),
            _ => Ok(()),
        }
    }
}

/// Where the pieces of a header sit in the module text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpans {
    pub header: TextRange,
    pub name: TextRange,
    /// One range per declared name, parallel to `QueryDescriptor::declared_names`.
    pub declared: Vec<TextRange>,
    /// The argument-bearing `?{...}` marker.
    pub optional: Option<TextRange>,
}

/// A descriptor together with the body it annotates.
#[derive(Debug, Clone)]
pub struct ParsedQuery<'s> {
    pub descriptor: QueryDescriptor,
    pub spans: HeaderSpans,
    pub source: SourceId,
    pub body: &'s str,
    pub body_range: TextRange,
}
