use super::value::Value;
use crate::core::units::UnitError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Invalid model definition at '{path}': {reason}")]
    SchemaDefinition { path: String, reason: String },

    #[error("Setting '{path}' is obligatory but was not given")]
    MissingObligatoryField { path: String },

    #[error("Type-check for setting '{path}' failed ({check}): {value}")]
    ValidationFailed {
        path: String,
        value: Value,
        check: String,
    },

    #[error("Setting '{path}' should be {expected}, found {found}")]
    NestedTypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("No setting at '{path}'")]
    UnknownPath { path: String },

    #[error("Setting '{path}' is not declared by the model")]
    UndeclaredField { path: String },

    #[error("Invalid settings path: '{path}'")]
    InvalidPath { path: String },

    #[error("Could not convert setting '{path}': {source}")]
    Conversion {
        path: String,
        #[source]
        source: ConversionError,
    },
}

/// Failure of a field's parser or transformer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot interpret '{0}'")]
    Unparsable(String),
}
