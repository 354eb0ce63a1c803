use thiserror::Error;

use crate::core::config::ConfigError;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown {kind} collection: {name}")]
    UnknownCollection { kind: &'static str, name: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, KernelError>;
