pub mod catalog;
pub mod check;
pub mod parse;
pub mod query_loader;
pub mod run_common;
pub mod schema_loader;
