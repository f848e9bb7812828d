use serde::{Deserialize, Serialize};
use std::fmt;

/// Exponents of the SI base dimensions.
///
/// Two units share a dimensionality when every exponent matches, regardless of
/// their scale (centimeters and meters are both `[length]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminosity: i8,
}

impl Dimensions {
    pub const NONE: Dimensions = Dimensions::new(0, 0, 0, 0, 0, 0, 0);
    pub const LENGTH: Dimensions = Dimensions::new(1, 0, 0, 0, 0, 0, 0);
    pub const MASS: Dimensions = Dimensions::new(0, 1, 0, 0, 0, 0, 0);
    pub const TIME: Dimensions = Dimensions::new(0, 0, 1, 0, 0, 0, 0);
    pub const CURRENT: Dimensions = Dimensions::new(0, 0, 0, 1, 0, 0, 0);
    pub const TEMPERATURE: Dimensions = Dimensions::new(0, 0, 0, 0, 1, 0, 0);
    pub const AMOUNT: Dimensions = Dimensions::new(0, 0, 0, 0, 0, 1, 0);
    pub const LUMINOSITY: Dimensions = Dimensions::new(0, 0, 0, 0, 0, 0, 1);

    pub const AREA: Dimensions = Dimensions::new(2, 0, 0, 0, 0, 0, 0);
    pub const VOLUME: Dimensions = Dimensions::new(3, 0, 0, 0, 0, 0, 0);
    pub const ENERGY: Dimensions = Dimensions::new(2, 1, -2, 0, 0, 0, 0);
    pub const FORCE: Dimensions = Dimensions::new(1, 1, -2, 0, 0, 0, 0);
    pub const CHARGE: Dimensions = Dimensions::new(0, 0, 1, 1, 0, 0, 0);
    pub const VOLTAGE: Dimensions = Dimensions::new(2, 1, -3, -1, 0, 0, 0);
    pub const MAGNETIC_FLUX_DENSITY: Dimensions = Dimensions::new(0, 1, -2, -1, 0, 0, 0);

    pub const fn new(
        length: i8,
        mass: i8,
        time: i8,
        current: i8,
        temperature: i8,
        amount: i8,
        luminosity: i8,
    ) -> Self {
        Self {
            length,
            mass,
            time,
            current,
            temperature,
            amount,
            luminosity,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }

    /// Sum of exponents, or `None` if any exponent leaves the `i8` range.
    pub fn multiply(&self, other: &Dimensions) -> Option<Dimensions> {
        self.combine(other, i8::checked_add)
    }

    pub fn divide(&self, other: &Dimensions) -> Option<Dimensions> {
        self.multiply(&other.power(-1)?)
    }

    pub fn power(&self, exponent: i8) -> Option<Dimensions> {
        self.combine(&Self::NONE, |exp, _| exp.checked_mul(exponent))
    }

    fn combine(&self, other: &Dimensions, op: impl Fn(i8, i8) -> Option<i8>) -> Option<Dimensions> {
        Some(Dimensions {
            length: op(self.length, other.length)?,
            mass: op(self.mass, other.mass)?,
            time: op(self.time, other.time)?,
            current: op(self.current, other.current)?,
            temperature: op(self.temperature, other.temperature)?,
            amount: op(self.amount, other.amount)?,
            luminosity: op(self.luminosity, other.luminosity)?,
        })
    }

    fn components(&self) -> [(&'static str, i8); 7] {
        [
            ("length", self.length),
            ("mass", self.mass),
            ("time", self.time),
            ("current", self.current),
            ("temperature", self.temperature),
            ("substance", self.amount),
            ("luminosity", self.luminosity),
        ]
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts: Vec<String> = self
            .components()
            .iter()
            .filter(|(_, exp)| *exp != 0)
            .map(|(name, exp)| {
                if *exp == 1 {
                    format!("[{}]", name)
                } else {
                    format!("[{}]^{}", name, exp)
                }
            })
            .collect();
        write!(f, "{}", parts.join(" * "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_is_mass_times_length_squared_over_time_squared() {
        let velocity = Dimensions::LENGTH.divide(&Dimensions::TIME).unwrap();
        let energy = Dimensions::MASS.multiply(&velocity.power(2).unwrap());
        assert_eq!(energy, Some(Dimensions::ENERGY));
    }

    #[test]
    fn volume_is_cubed_length() {
        assert_eq!(Dimensions::LENGTH.power(3), Some(Dimensions::VOLUME));
    }

    #[test]
    fn exponent_overflow_yields_none() {
        let big = Dimensions::LENGTH.power(100).unwrap();
        assert_eq!(big.multiply(&big), None);
        assert_eq!(big.power(2), None);
        assert_eq!(Dimensions::new(0, 0, -128, 0, 0, 0, 0).power(-1), None);
        assert_eq!(Dimensions::NONE.divide(&Dimensions::new(0, 0, -128, 0, 0, 0, 0)), None);
    }

    #[test]
    fn display_lists_nonzero_exponents() {
        assert_eq!(Dimensions::NONE.to_string(), "dimensionless");
        assert_eq!(Dimensions::LENGTH.to_string(), "[length]");
        assert_eq!(
            Dimensions::ENERGY.to_string(),
            "[length]^2 * [mass] * [time]^-2"
        );
    }
}
