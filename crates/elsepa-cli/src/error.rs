use elsepa::core::io::input::InputError;
use elsepa::core::settings::SettingsError;
use elsepa::engine::config::ConfigError;
use elsepa::engine::error::EngineError;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<InputError> for CliError {
    fn from(e: InputError) -> Self {
        CliError::Other(e.into())
    }
}

impl CliError {
    pub fn parsing(path: &Path, source: impl Into<anyhow::Error>) -> Self {
        CliError::FileParsing {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}
