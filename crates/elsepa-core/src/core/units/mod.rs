//! Physical units and quantities.
//!
//! Units carry a [`Dimensions`] vector of SI base-dimension exponents plus a scale
//! relative to the coherent SI unit, so `cm` and `m` share a dimensionality but
//! differ in scale. A [`UnitRegistry`] maps names to units and parses compound
//! expressions such as `cm**2/sr`; it is built explicitly and passed to whatever
//! needs it rather than living in a global.

mod dimensions;
mod quantity;
mod registry;

pub use dimensions::Dimensions;
pub use quantity::{Quantity, Unit};
pub use registry::{UnitRegistry, convert, parse_fortran_float};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Malformed unit expression '{text}': {reason}")]
    Syntax { text: String, reason: String },

    #[error("Cannot convert from '{from}' ({from_dims}) to '{to}' ({to_dims})")]
    DimensionMismatch {
        from: String,
        from_dims: Dimensions,
        to: String,
        to_dims: Dimensions,
    },

    #[error("Malformed quantity: '{0}'")]
    InvalidQuantity(String),
}
