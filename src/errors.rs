use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a storage backend.
///
/// These never cross the `SessionStore` accessors: reads degrade to the
/// field default and writes are dropped, both with a warning.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage io error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to read menu definition at {path}")]
    MenuRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed menu definition: {0}")]
    MenuFormat(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid_value(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
        }
    }
}
