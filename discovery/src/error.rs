use std::{io, path::PathBuf};

use patentsview::builder::PatentsViewBuilderError;
use patentsview::PatentsViewError;
use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Unable to load the application configuration file {path:?}")]
    ApplicationConfig { path: PathBuf, source: io::Error },
    #[error("Unable to parse contents of {path}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unable to create configuration file {path}: {reason}")]
    ConfigFileCreation { path: PathBuf, reason: String },
    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnvironment { name: String, value: String },
    #[error("PatentsView error: {0}")]
    PatentsView(String),
    #[error("PatentsView rate limit exceeded")]
    RateLimited { retry_after: Option<u64> },
    #[error("Unable to connect to the database: {0}")]
    Connection(String),
    #[error("SQL dbms error: {0}")]
    Sql(String),
    #[error("Unable to create database SQL schema: {0}")]
    Schema(String),
    #[error("Patent not found")]
    PatentNotFound(String),
    #[error("Could not make sense of input: {0}")]
    BadInput(String),
    #[error("Mutex locking error")]
    LockPoisoned,
    #[error("Command '{command}' failed: {reason}")]
    Command { command: String, reason: String },
    #[error("I/O error")]
    Io(#[from] io::Error),
}

impl From<tokio_postgres::Error> for DiscoveryError {
    fn from(err: tokio_postgres::Error) -> Self {
        DiscoveryError::Sql(format!("Postgres error {err}"))
    }
}

impl From<PatentsViewError> for DiscoveryError {
    fn from(err: PatentsViewError) -> Self {
        match err {
            PatentsViewError::RateLimited { retry_after } => {
                DiscoveryError::RateLimited { retry_after }
            }
            other => DiscoveryError::PatentsView(format!("{other}")),
        }
    }
}

impl From<PatentsViewBuilderError> for DiscoveryError {
    fn from(err: PatentsViewBuilderError) -> Self {
        DiscoveryError::PatentsView(format!("{err}"))
    }
}

impl<T> From<std::sync::PoisonError<T>> for DiscoveryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        DiscoveryError::LockPoisoned
    }
}
