//! Parameter binding and schema-bound type resolution.
//!
//! Neither stage parses SQL in general: they work on the significant token
//! stream and recover only what typing needs (clauses, comparisons, casts,
//! projection items).

mod binder;
mod projection;
mod resolver;
mod scope;
mod sql;

#[cfg(test)]
mod resolver_tests;
#[cfg(test)]
mod sql_tests;

pub use binder::{BoundQuery, ParamKey, Parameter, TypeHint, bind};
pub use resolver::{ProjectedColumn, ResolvedQuery, ResultKind, resolve_query};
pub use sql::Sql;
