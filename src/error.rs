use std::path::PathBuf;

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read dictionary {path}: {source}")]
    DictionaryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dictionary entry at {path}:{line}: {reason}")]
    InvalidDictionary {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Dictionary {0} contains no tokens")]
    EmptyDictionary(PathBuf),

    #[error("Failed to read stop token file {path}: {source}")]
    StopTokensUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shard {0} is unavailable")]
    ShardUnavailable(usize),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Check if this error was raised while building the engine from its options
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::DictionaryUnreadable { .. }
                | EngineError::InvalidDictionary { .. }
                | EngineError::EmptyDictionary(_)
                | EngineError::StopTokensUnreadable { .. }
                | EngineError::InvalidConfig(_)
        )
    }
}
