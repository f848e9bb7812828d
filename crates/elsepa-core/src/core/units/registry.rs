use super::UnitError;
use super::dimensions::Dimensions;
use super::quantity::{Quantity, Unit};
use phf::{Map, phf_map};
use std::collections::HashMap;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
struct UnitDef {
    dims: Dimensions,
    scale: f64,
}

const fn def(dims: Dimensions, scale: f64) -> UnitDef {
    UnitDef { dims, scale }
}

const ELECTRON_VOLT: f64 = 1.602_176_634e-19;
const HARTREE: f64 = 4.359_744_722_207_1e-18;
const BOHR_RADIUS: f64 = 5.291_772_109_03e-11;

static BUILTIN_UNITS: Map<&'static str, UnitDef> = phf_map! {
    // length
    "m" => def(Dimensions::LENGTH, 1.0), "meter" => def(Dimensions::LENGTH, 1.0),
    "metre" => def(Dimensions::LENGTH, 1.0),
    "km" => def(Dimensions::LENGTH, 1e3), "kilometer" => def(Dimensions::LENGTH, 1e3),
    "cm" => def(Dimensions::LENGTH, 1e-2), "centimeter" => def(Dimensions::LENGTH, 1e-2),
    "mm" => def(Dimensions::LENGTH, 1e-3), "millimeter" => def(Dimensions::LENGTH, 1e-3),
    "um" => def(Dimensions::LENGTH, 1e-6), "μm" => def(Dimensions::LENGTH, 1e-6),
    "micrometer" => def(Dimensions::LENGTH, 1e-6),
    "nm" => def(Dimensions::LENGTH, 1e-9), "nanometer" => def(Dimensions::LENGTH, 1e-9),
    "pm" => def(Dimensions::LENGTH, 1e-12), "picometer" => def(Dimensions::LENGTH, 1e-12),
    "angstrom" => def(Dimensions::LENGTH, 1e-10), "Å" => def(Dimensions::LENGTH, 1e-10),
    "Angstrom" => def(Dimensions::LENGTH, 1e-10),
    "barn" => def(Dimensions::AREA, 1e-28),
    // mass
    "kg" => def(Dimensions::MASS, 1.0), "kilogram" => def(Dimensions::MASS, 1.0),
    "g" => def(Dimensions::MASS, 1e-3), "gram" => def(Dimensions::MASS, 1e-3),
    // time
    "s" => def(Dimensions::TIME, 1.0), "sec" => def(Dimensions::TIME, 1.0),
    "second" => def(Dimensions::TIME, 1.0),
    "ms" => def(Dimensions::TIME, 1e-3), "us" => def(Dimensions::TIME, 1e-6),
    "ns" => def(Dimensions::TIME, 1e-9), "fs" => def(Dimensions::TIME, 1e-15),
    // other base dimensions
    "A" => def(Dimensions::CURRENT, 1.0), "ampere" => def(Dimensions::CURRENT, 1.0),
    "K" => def(Dimensions::TEMPERATURE, 1.0), "kelvin" => def(Dimensions::TEMPERATURE, 1.0),
    "mol" => def(Dimensions::AMOUNT, 1.0), "mole" => def(Dimensions::AMOUNT, 1.0),
    "cd" => def(Dimensions::LUMINOSITY, 1.0), "candela" => def(Dimensions::LUMINOSITY, 1.0),
    // energy
    "J" => def(Dimensions::ENERGY, 1.0), "joule" => def(Dimensions::ENERGY, 1.0),
    "erg" => def(Dimensions::ENERGY, 1e-7),
    "eV" => def(Dimensions::ENERGY, ELECTRON_VOLT),
    "electron_volt" => def(Dimensions::ENERGY, ELECTRON_VOLT),
    "meV" => def(Dimensions::ENERGY, ELECTRON_VOLT * 1e-3),
    "keV" => def(Dimensions::ENERGY, ELECTRON_VOLT * 1e3),
    "MeV" => def(Dimensions::ENERGY, ELECTRON_VOLT * 1e6),
    "GeV" => def(Dimensions::ENERGY, ELECTRON_VOLT * 1e9),
    "hartree" => def(Dimensions::ENERGY, HARTREE), "Hartree" => def(Dimensions::ENERGY, HARTREE),
    "E_h" => def(Dimensions::ENERGY, HARTREE),
    "rydberg" => def(Dimensions::ENERGY, HARTREE / 2.0), "Ry" => def(Dimensions::ENERGY, HARTREE / 2.0),
    // electromagnetic and mechanical
    "N" => def(Dimensions::FORCE, 1.0), "newton" => def(Dimensions::FORCE, 1.0),
    "C" => def(Dimensions::CHARGE, 1.0), "coulomb" => def(Dimensions::CHARGE, 1.0),
    "V" => def(Dimensions::VOLTAGE, 1.0), "volt" => def(Dimensions::VOLTAGE, 1.0),
    "T" => def(Dimensions::MAGNETIC_FLUX_DENSITY, 1.0),
    "tesla" => def(Dimensions::MAGNETIC_FLUX_DENSITY, 1.0),
    // angles are dimensionless
    "rad" => def(Dimensions::NONE, 1.0), "radian" => def(Dimensions::NONE, 1.0),
    "deg" => def(Dimensions::NONE, PI / 180.0), "degree" => def(Dimensions::NONE, PI / 180.0),
    "sr" => def(Dimensions::NONE, 1.0), "steradian" => def(Dimensions::NONE, 1.0),
    "dimensionless" => def(Dimensions::NONE, 1.0),
};

/// Unit definitions used to interpret unit strings.
///
/// The registry is an ordinary value: construct one, extend it with
/// [`UnitRegistry::define`] and pass it to whatever needs to parse units. It is
/// read-only once shared, so an `Arc<UnitRegistry>` can be handed to predicates
/// and transformers on other threads.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    custom: HashMap<String, Unit>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Built-in units plus the definitions the ELSEPA outputs rely on
    /// (`bohr_radius`, `gauss`, `room_temperature` and their short names).
    pub fn new() -> Self {
        let mut registry = Self::bare();
        let bohr = Unit::new("bohr_radius", Dimensions::LENGTH, BOHR_RADIUS);
        registry.define("bohr_radius", bohr.clone());
        registry.define("a0", bohr.clone());
        registry.define("a_0", bohr.clone());
        registry.define("bohr", bohr);

        let gauss = Unit::new("gauss", Dimensions::MAGNETIC_FLUX_DENSITY, 1e-4);
        registry.define("gauss", gauss.clone());
        registry.define("G", gauss);

        let room = Unit::new("room_temperature", Dimensions::TEMPERATURE, 297.0);
        registry.define("room_temperature", room.clone());
        registry.define("T_room", room);
        registry
    }

    /// Built-in units only.
    pub fn bare() -> Self {
        Self {
            custom: HashMap::new(),
        }
    }

    /// Registers `name` as a unit. Later definitions shadow earlier ones and
    /// built-ins.
    pub fn define(&mut self, name: &str, unit: Unit) {
        self.custom
            .insert(name.to_string(), unit.with_symbol(name.to_string()));
    }

    pub fn lookup(&self, name: &str) -> Option<Unit> {
        if let Some(unit) = self.custom.get(name) {
            return Some(unit.clone());
        }
        BUILTIN_UNITS
            .get(name)
            .map(|d| Unit::new(name, d.dims, d.scale))
    }

    /// Parses expressions like `cm`, `cm**3`, `cm^2/sr`, `eV*s`, `1/cm` or
    /// `(kg m)/s**2`.
    pub fn parse_unit(&self, text: &str) -> Result<Unit, UnitError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" {
            return Ok(Unit::dimensionless());
        }
        let tokens = tokenize(trimmed)?;
        let mut parser = UnitParser {
            registry: self,
            tokens: &tokens,
            pos: 0,
            text: trimmed,
        };
        let unit = parser.expression()?;
        if parser.pos != tokens.len() {
            return Err(UnitError::Syntax {
                text: trimmed.to_string(),
                reason: "unbalanced parentheses".to_string(),
            });
        }
        Ok(unit)
    }

    pub fn dimensionality(&self, text: &str) -> Result<Dimensions, UnitError> {
        Ok(self.parse_unit(text)?.dimensions())
    }

    pub fn quantity(&self, magnitude: f64, unit: &str) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(magnitude, self.parse_unit(unit)?))
    }

    /// Parses `"<number> <unit>"`. A bare number takes `default_unit`, or is
    /// dimensionless when none is given.
    pub fn parse_quantity(
        &self,
        text: &str,
        default_unit: Option<&Unit>,
    ) -> Result<Quantity, UnitError> {
        let trimmed = text.trim();
        let (number, unit) = match trimmed.find(char::is_whitespace) {
            Some(pos) => (&trimmed[..pos], trimmed[pos..].trim()),
            None => (trimmed, ""),
        };
        let magnitude = parse_fortran_float(number)
            .ok_or_else(|| UnitError::InvalidQuantity(text.to_string()))?;
        let unit = if unit.is_empty() {
            default_unit.cloned().unwrap_or_else(Unit::dimensionless)
        } else {
            self.parse_unit(unit)?
        };
        Ok(Quantity::new(magnitude, unit))
    }
}

/// Magnitude of `quantity` expressed in `target`.
pub fn convert(quantity: &Quantity, target: &Unit) -> Result<f64, UnitError> {
    quantity.magnitude_in(target)
}

/// Accepts Fortran double-precision exponents (`1.0D+02`).
pub fn parse_fortran_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(v) = text.parse::<f64>() {
        return Some(v);
    }
    text.replace(['D', 'd'], "e").parse::<f64>().ok()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Number(f64),
    Mul,
    Div,
    Pow(i8),
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Token>, UnitError> {
    let syntax = |reason: &str| UnitError::Syntax {
        text: text.to_string(),
        reason: reason.to_string(),
    };
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Div);
                i += 1;
            }
            '*' | '^' => {
                let is_pow = c == '^' || chars.get(i + 1) == Some(&'*');
                i += if c == '*' && is_pow { 2 } else { 1 };
                if !is_pow {
                    tokens.push(Token::Mul);
                    continue;
                }
                while chars.get(i).is_some_and(|c| c.is_whitespace()) {
                    i += 1;
                }
                let start = i;
                if matches!(chars.get(i), Some('-') | Some('+')) {
                    i += 1;
                }
                while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                    i += 1;
                }
                let exponent: String = chars[start..i].iter().collect();
                let exponent = exponent
                    .parse::<i8>()
                    .map_err(|_| syntax("expected an integer exponent"))?;
                tokens.push(Token::Pow(exponent));
            }
            '·' => {
                tokens.push(Token::Mul);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while chars.get(i).is_some_and(|c| c.is_ascii_digit() || *c == '.') {
                    i += 1;
                }
                if let Some(len) = exponent_suffix(&chars[i..]) {
                    i += len;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = parse_fortran_float(&literal)
                    .ok_or_else(|| syntax("malformed numeric factor"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while chars
                    .get(i)
                    .is_some_and(|c| c.is_alphanumeric() || *c == '_')
                {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            _ => return Err(syntax(&format!("unexpected character '{}'", c))),
        }
    }
    Ok(tokens)
}

/// Length of an `e-3` / `D+02` style exponent at the start of `rest`, if any.
/// A letter not followed by digits starts a unit name instead (`2eV`).
fn exponent_suffix(rest: &[char]) -> Option<usize> {
    if !matches!(rest.first(), Some('e' | 'E' | 'd' | 'D')) {
        return None;
    }
    let sign = usize::from(matches!(rest.get(1), Some('-' | '+')));
    let digits = rest[1 + sign..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    (digits > 0).then_some(1 + sign + digits)
}

struct UnitParser<'a> {
    registry: &'a UnitRegistry,
    tokens: &'a [Token],
    pos: usize,
    text: &'a str,
}

impl UnitParser<'_> {
    fn expression(&mut self) -> Result<Unit, UnitError> {
        let mut acc = self.term()?;
        loop {
            match self.tokens.get(self.pos) {
                Some(Token::Mul) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = self.checked(acc.multiply(&rhs))?;
                }
                Some(Token::Div) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = self.checked(acc.divide(&rhs))?;
                }
                Some(Token::Name(_)) | Some(Token::Number(_)) | Some(Token::LParen) => {
                    let rhs = self.term()?;
                    acc = self.checked(acc.multiply(&rhs))?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<Unit, UnitError> {
        let base = self.atom()?;
        if let Some(Token::Pow(exponent)) = self.tokens.get(self.pos) {
            self.pos += 1;
            return self.checked(base.power(*exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Unit, UnitError> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Name(name)) => self
                .registry
                .lookup(&name)
                .ok_or(UnitError::UnknownUnit(name)),
            Some(Token::Number(value)) => Ok(Unit::new("", Dimensions::NONE, value)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.tokens.get(self.pos) {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.syntax("missing closing parenthesis")),
                }
            }
            _ => Err(self.syntax("expected a unit name")),
        }
    }

    fn checked(&self, unit: Option<Unit>) -> Result<Unit, UnitError> {
        unit.ok_or_else(|| self.syntax("dimension exponent out of range"))
    }

    fn syntax(&self, reason: &str) -> UnitError {
        UnitError::Syntax {
            text: self.text.to_string(),
            reason: reason.to_string(),
        }
    }
}
