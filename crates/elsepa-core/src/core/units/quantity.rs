use super::UnitError;
use super::dimensions::Dimensions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named physical unit: a dimensionality and a scale relative to the coherent
/// SI unit of that dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    symbol: String,
    dims: Dimensions,
    scale: f64,
}

impl Unit {
    pub fn new(symbol: impl Into<String>, dims: Dimensions, scale: f64) -> Self {
        Self {
            symbol: symbol.into(),
            dims,
            scale,
        }
    }

    pub fn dimensionless() -> Self {
        Self::new("", Dimensions::NONE, 1.0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_dimensionless()
    }

    /// Same dimensionality, any scale.
    pub fn is_compatible_with(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Product of two units, `None` when a dimension exponent overflows.
    pub fn multiply(&self, other: &Unit) -> Option<Unit> {
        Some(Unit {
            symbol: join_symbols(&self.symbol, "*", &other.symbol),
            dims: self.dims.multiply(&other.dims)?,
            scale: self.scale * other.scale,
        })
    }

    pub fn divide(&self, other: &Unit) -> Option<Unit> {
        let numerator = if self.symbol.is_empty() {
            "1"
        } else {
            self.symbol.as_str()
        };
        Some(Unit {
            symbol: join_symbols(numerator, "/", &other.symbol),
            dims: self.dims.divide(&other.dims)?,
            scale: self.scale / other.scale,
        })
    }

    pub fn power(&self, exponent: i8) -> Option<Unit> {
        let symbol = match (self.symbol.is_empty(), exponent) {
            (true, _) => String::new(),
            (false, 1) => self.symbol.clone(),
            (false, _) if self.symbol.contains(['*', '/']) => {
                format!("({})**{}", self.symbol, exponent)
            }
            (false, _) => format!("{}**{}", self.symbol, exponent),
        };
        Some(Unit {
            symbol,
            dims: self.dims.power(exponent)?,
            scale: self.scale.powi(exponent as i32),
        })
    }
}

fn join_symbols(left: &str, op: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (_, true) => left.to_string(),
        (true, false) => right.to_string(),
        (false, false) => format!("{}{}{}", left, op, right),
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A magnitude tagged with a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn dimensions(&self) -> Dimensions {
        self.unit.dimensions()
    }

    /// Bare magnitude expressed in `target`.
    pub fn magnitude_in(&self, target: &Unit) -> Result<f64, UnitError> {
        if !self.unit.is_compatible_with(target) {
            return Err(UnitError::DimensionMismatch {
                from: self.unit.symbol().to_string(),
                from_dims: self.unit.dimensions(),
                to: target.symbol().to_string(),
                to_dims: target.dimensions(),
            });
        }
        Ok(self.magnitude * self.unit.scale() / target.scale())
    }

    pub fn to(&self, target: &Unit) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(self.magnitude_in(target)?, target.clone()))
    }
}

/// Magnitudes outside this range are written in exponent notation.
const PLAIN_RANGE: std::ops::Range<f64> = 1e-3..1e6;

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.magnitude.abs();
        if magnitude == 0.0 || !magnitude.is_finite() || PLAIN_RANGE.contains(&magnitude) {
            write!(f, "{}", self.magnitude)?;
        } else {
            write!(f, "{:e}", self.magnitude)?;
        }
        if !self.unit.symbol().is_empty() {
            write!(f, " {}", self.unit.symbol())?;
        }
        Ok(())
    }
}
