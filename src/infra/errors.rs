// src/infra/errors.rs — Error types for Arbor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArborError {
    // Provider errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // Oracle outcomes the search absorbs (never returned from a search)
    #[error("Oracle unavailable: {message}")]
    OracleUnavailable { message: String },

    #[error("Search time budget exhausted")]
    DeadlineExceeded,

    #[error("Malformed {what} output: {output:?}")]
    MalformedOutput { what: String, output: String },

    // User errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Infra
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArborError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ArborError::Provider {
                retriable: true,
                ..
            } | ArborError::RateLimited { .. }
        )
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ArborError::Config(_))
    }

    pub fn config(message: impl Into<String>) -> Self {
        ArborError::Config(message.into())
    }
}
