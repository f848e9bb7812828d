use super::config::ConfigError;
use crate::core::io::input::InputError;
use crate::core::io::output::OutputError;
use crate::core::settings::SettingsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid run configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid settings: {source}")]
    Settings {
        #[from]
        source: SettingsError,
    },

    #[error("Failed to prepare the input deck: {source}")]
    Input {
        #[from]
        source: InputError,
    },

    #[error("Failed to read output file '{path}': {source}", path = path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: OutputError,
    },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Container operation '{operation}' failed: {message}")]
    Container {
        operation: &'static str,
        message: String,
    },
}

impl EngineError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { context, source }
    }
}
