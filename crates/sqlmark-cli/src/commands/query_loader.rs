use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sqlmark_compiler::SourceMap;

/// Where query modules come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    Text(String),
    Stdin,
    Path(PathBuf),
    Missing,
}

impl QueryInput {
    pub fn new(path: Option<PathBuf>, text: Option<String>) -> Self {
        match (text, path) {
            (Some(text), _) => Self::Text(text),
            (None, Some(path)) if path.as_os_str() == "-" => Self::Stdin,
            (None, Some(path)) => Self::Path(path),
            (None, None) => Self::Missing,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("queries are required: use a positional path, - for stdin, or -q/--query")]
    Missing,

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no .sql files found in '{}'", .0.display())]
    EmptyDirectory(PathBuf),
}

pub fn load_queries(input: &QueryInput) -> Result<SourceMap, LoadError> {
    match input {
        QueryInput::Text(text) => Ok(SourceMap::one_liner(text)),
        QueryInput::Stdin => load_stdin(),
        QueryInput::Path(path) if path.is_dir() => load_directory(path),
        QueryInput::Path(path) => load_file(path),
        QueryInput::Missing => Err(LoadError::Missing),
    }
}

fn load_stdin() -> Result<SourceMap, LoadError> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(LoadError::Stdin)?;
    let mut map = SourceMap::new();
    map.add_stdin(&buf);
    Ok(map)
}

fn load_file(path: &Path) -> Result<SourceMap, LoadError> {
    let mut map = SourceMap::new();
    map.add_file(&path.to_string_lossy(), &read(path)?);
    Ok(map)
}

fn load_directory(dir: &Path) -> Result<SourceMap, LoadError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| LoadError::Read {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "sql"))
        .collect();

    if paths.is_empty() {
        return Err(LoadError::EmptyDirectory(dir.to_path_buf()));
    }

    // Module order is catalog order.
    paths.sort();

    let mut map = SourceMap::new();
    for path in paths {
        map.add_file(&path.to_string_lossy(), &read(&path)?);
    }
    Ok(map)
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}
