use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sqlmark_core::{SchemaCatalog, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("failed to read schema '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid schema '{}': {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

pub fn load_schema(path: &Path) -> Result<SchemaCatalog, SchemaLoadError> {
    let json = fs::read_to_string(path).map_err(|source| SchemaLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = SchemaCatalog::from_json(&json).map_err(|source| SchemaLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        relations = schema.relations().count(),
        types = schema.types().count(),
        "loaded schema"
    );
    Ok(schema)
}
