// lnd-config/src/record.rs
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: invalid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}: unsupported record format (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, RecordError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(RecordError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

pub fn load(path: &Path) -> Result<Value, RecordError> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record = match format {
        Format::Yaml => serde_yaml::from_str(&content).map_err(|source| RecordError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
        Format::Json => serde_json::from_str(&content).map_err(|source| RecordError::Json {
            path: path.to_path_buf(),
            source,
        })?,
    };
    tracing::debug!(path = %path.display(), ?format, "loaded record");
    Ok(record)
}

/// Writes `record` next to `path` and renames it into place, so a reader
/// never sees a half-written file.
pub fn save(path: &Path, record: &Value) -> Result<(), RecordError> {
    let format = Format::from_path(path)?;
    let content = match format {
        Format::Yaml => serde_yaml::to_string(record).map_err(|source| RecordError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
        Format::Json => {
            let mut s =
                serde_json::to_string_pretty(record).map_err(|source| RecordError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            s.push('\n');
            s
        }
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let io_err = |source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, content).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    tracing::debug!(path = %path.display(), ?format, "saved record");
    Ok(())
}
