//! Composable checks over setting values.
//!
//! A [`Predicate`] is a named boolean function of a [`Value`]. Predicates are
//! combined with [`Predicate::and`], [`Predicate::or`] and [`Predicate::negate`];
//! the combined name records the structure, which is what validation errors
//! report.

use super::value::Value;
use crate::core::units::{Dimensions, Unit, UnitError, UnitRegistry};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

type CheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Predicate {
    name: String,
    check: CheckFn,
}

impl Predicate {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, value: &Value) -> bool {
        (self.check)(value)
    }

    pub fn and(self, other: Predicate) -> Predicate {
        let name = format!("({} & {})", self.name, other.name);
        Predicate::new(name, move |v| self.evaluate(v) && other.evaluate(v))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        let name = format!("({} | {})", self.name, other.name);
        Predicate::new(name, move |v| self.evaluate(v) || other.evaluate(v))
    }

    pub fn negate(self) -> Predicate {
        let name = format!("~{}", self.name);
        Predicate::new(name, move |v| !self.evaluate(v))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub fn is_integer() -> Predicate {
    Predicate::new("is_integer", |v| matches!(v, Value::Integer(_)))
}

pub fn is_number() -> Predicate {
    Predicate::new("is_number", |v| {
        matches!(v, Value::Integer(_) | Value::Float(_))
    })
}

pub fn is_string() -> Predicate {
    Predicate::new("is_string", |v| matches!(v, Value::Text(_)))
}

pub fn is_none() -> Predicate {
    Predicate::new("is_none", Value::is_none)
}

pub fn is_sequence() -> Predicate {
    Predicate::new("is_sequence", |v| matches!(v, Value::List(_)))
}

/// Passes when the value equals `expected`; integers and floats compare numerically.
pub fn equals(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    let name = format!("is_({})", expected);
    Predicate::new(name, move |v| v.loosely_equals(&expected))
}

/// Numeric membership in the half-open interval `[low, high)`.
pub fn in_range(low: f64, high: f64) -> Predicate {
    let name = format!("in_range({}, {})", low, high);
    Predicate::new(name, move |v| {
        v.as_float().is_some_and(|x| x >= low && x < high)
    })
}

/// A quantity whose unit has the same dimensionality as `unit`.
pub fn has_dimension(unit: &Unit) -> Predicate {
    let name = format!("has_units({})", unit.dimensions());
    has_dimensions_named(name, unit.dimensions())
}

/// Like [`has_dimension`], with the reference unit given as text.
pub fn has_units(registry: &UnitRegistry, unit: &str) -> Result<Predicate, UnitError> {
    Ok(has_dimension(&registry.parse_unit(unit)?))
}

fn has_dimensions_named(name: String, dims: Dimensions) -> Predicate {
    Predicate::new(name, move |v| {
        v.as_quantity().is_some_and(|q| q.dimensions() == dims)
    })
}

pub fn is_energy() -> Predicate {
    has_dimensions_named("is_energy".into(), Dimensions::ENERGY)
}

pub fn is_length() -> Predicate {
    has_dimensions_named("is_length".into(), Dimensions::LENGTH)
}

pub fn is_volume() -> Predicate {
    has_dimensions_named("is_volume".into(), Dimensions::VOLUME)
}

/// A list whose every element satisfies `element`. An empty list passes.
pub fn is_sequence_of(element: Predicate) -> Predicate {
    let name = format!("is_list_of({})", element.name);
    Predicate::new(name, move |v| {
        v.as_list()
            .is_some_and(|items| items.iter().all(|item| element.evaluate(item)))
    })
}

pub fn non_empty() -> Predicate {
    Predicate::new("non_empty", |v| match v {
        Value::List(items) => !items.is_empty(),
        Value::Text(s) => !s.is_empty(),
        Value::Settings(s) => !s.is_empty(),
        _ => false,
    })
}

pub fn file_exists() -> Predicate {
    Predicate::new("file_exists", |v| {
        v.as_str().is_some_and(|path| Path::new(path).exists())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::Quantity;
    use tempfile::NamedTempFile;

    fn ev(magnitude: f64) -> Value {
        let registry = UnitRegistry::new();
        Value::Quantity(registry.quantity(magnitude, "eV").unwrap())
    }

    #[test]
    fn conjunction_requires_both() {
        let p = is_integer().and(in_range(0.0, 3.0));
        assert!(p.evaluate(&Value::Integer(2)));
        assert!(!p.evaluate(&Value::Integer(3)));
        assert!(!p.evaluate(&Value::Float(1.0)));
    }

    #[test]
    fn disjunction_accepts_either() {
        let p = is_none().or(is_string());
        assert!(p.evaluate(&Value::None));
        assert!(p.evaluate(&Value::from("abc")));
        assert!(!p.evaluate(&Value::Integer(1)));
    }

    #[test]
    fn negation_inverts() {
        let p = is_none().negate();
        assert!(!p.evaluate(&Value::None));
        assert!(p.evaluate(&Value::Integer(0)));
        assert_eq!(p.name(), "~is_none");
    }

    #[test]
    fn combined_names_record_structure() {
        let p = is_integer().and(is_none().or(is_string()));
        assert_eq!(p.name(), "(is_integer & (is_none | is_string))");
    }

    #[test]
    fn range_upper_bound_is_exclusive() {
        let p = in_range(1.0, 104.0);
        assert!(p.evaluate(&Value::Integer(1)));
        assert!(p.evaluate(&Value::Integer(103)));
        assert!(!p.evaluate(&Value::Integer(104)));
        assert!(!p.evaluate(&Value::from("5")));
    }

    #[test]
    fn equals_compares_numerically() {
        let p = equals(1);
        assert!(p.evaluate(&Value::Float(1.0)));
        assert!(!p.evaluate(&Value::Integer(2)));
    }

    #[test]
    fn dimension_checks_ignore_scale() {
        assert!(is_energy().evaluate(&ev(100.0)));
        let registry = UnitRegistry::new();
        let hartree = Value::Quantity(registry.quantity(1.0, "hartree").unwrap());
        assert!(is_energy().evaluate(&hartree));
        assert!(!is_length().evaluate(&hartree));
        assert!(!is_energy().evaluate(&Value::Float(100.0)));
    }

    #[test]
    fn has_dimension_of_meter_accepts_any_length() {
        let registry = UnitRegistry::new();
        let p = has_dimension(&registry.parse_unit("m").unwrap());
        let length = |text: &str| Value::Quantity(registry.parse_quantity(text, None).unwrap());

        assert!(p.evaluate(&length("3 cm")));
        assert!(p.evaluate(&length("0.5 mm")));
        assert!(!p.evaluate(&length("2 s")));
        assert!(!p.evaluate(&length("7")));
        assert!(!p.evaluate(&Value::Float(7.0)));
    }

    #[test]
    fn has_units_parses_reference_unit() {
        let registry = UnitRegistry::new();
        let p = has_units(&registry, "cm**3").unwrap();
        let q = Quantity::new(1.0, registry.parse_unit("angstrom**3").unwrap());
        assert!(p.evaluate(&Value::Quantity(q)));
        assert!(has_units(&registry, "furlong").is_err());
    }

    #[test]
    fn sequence_of_checks_every_element() {
        let p = is_sequence_of(is_energy()).and(non_empty());
        assert!(p.evaluate(&Value::List(vec![ev(100.0), ev(200.0)])));
        assert!(!p.evaluate(&Value::List(vec![ev(100.0), Value::Integer(1)])));
        assert!(!p.evaluate(&Value::List(vec![])));
        assert!(!p.evaluate(&ev(100.0)));
    }

    #[test]
    fn file_exists_checks_the_filesystem() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().into_owned();
        assert!(file_exists().evaluate(&Value::from(path)));
        assert!(!file_exists().evaluate(&Value::from("/definitely/not/here.den")));
    }
}
