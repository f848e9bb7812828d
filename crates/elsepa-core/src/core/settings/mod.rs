//! Hierarchical settings with schema-driven defaults and validation.
//!
//! A [`Settings`] tree holds the user's values. A [`Model`] mirrors its shape
//! with a [`Type`] per field, describing the default, the check and the
//! conversions used when reading raw input or writing the input deck.
//! [`validate_and_fill`] turns a partial tree into a complete, checked one.

mod error;
mod model;
pub mod predicates;
mod tree;
mod validation;
mod value;

pub use error::{ConversionError, SettingsError};
pub use model::{Conversion, DefaultValue, DerivedDefault, Model, ModelEntry, Type};
pub use predicates::Predicate;
pub use tree::{Entry, Lookup, Settings};
pub use validation::{
    UndeclaredKeys, ValidationOptions, apply_parsers, check_only, check_only_with, parse_to_model,
    validate_and_fill, validate_and_fill_with,
};
pub use value::Value;
