use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading the scene collaborator's data.
///
/// This is the only error the core ever propagates; everything past a
/// successful load degrades to a no-op instead.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unable to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scene XML")]
    Xml(#[from] roxmltree::Error),
    #[error("<{0}> tag is missing")]
    MissingTag(&'static str),
    #[error("failed to parse number {0:?}")]
    InvalidNumber(String),
    #[error("vector {0:?} must have exactly three components")]
    InvalidVector(String),
    #[error("expected true or false, found {0:?}")]
    InvalidBool(String),
    #[error("invalid mesh {}: {message}", path.display())]
    Mesh { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
