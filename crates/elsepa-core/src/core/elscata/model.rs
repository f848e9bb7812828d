use crate::core::settings::predicates::{
    equals, in_range, is_energy, is_integer, is_length, is_none, is_number, is_sequence_of,
    is_volume, non_empty,
};
use crate::core::settings::{ConversionError, Model, Settings, SettingsError, Type, Value};
use crate::core::units::{Quantity, Unit, UnitError, UnitRegistry};
use std::sync::Arc;

/// Keywords in the order the program documents them.
pub const KEYWORDS: [&str; 16] = [
    "IZ", "MNUCL", "NELEC", "MELEC", "MUFFIN", "RMUF", "IELEC", "MEXCH", "MCPOL", "VPOLA",
    "VPOLB", "MABS", "VABSA", "VABSD", "IHEF", "EV",
];

/// Converts quantities (or lists of them) to bare magnitudes in `unit`. Bare
/// numbers and `None` pass through unchanged.
fn magnitude_in(unit: Unit) -> impl Fn(&Value) -> Result<Value, ConversionError> + Send + Sync {
    move |value: &Value| convert_magnitude(value, &unit)
}

fn convert_magnitude(value: &Value, unit: &Unit) -> Result<Value, ConversionError> {
    match value {
        Value::Quantity(q) => Ok(Value::Float(q.magnitude_in(unit)?)),
        Value::List(items) => items
            .iter()
            .map(|item| convert_magnitude(item, unit))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Value::None | Value::Integer(_) | Value::Float(_) => Ok(value.clone()),
        other => Err(ConversionError::UnexpectedValue {
            expected: "quantity",
            found: other.kind(),
        }),
    }
}

/// Reads quantities from raw input: numbers are taken in `unit`, text such as
/// `"100 eV"` is parsed with `units`.
fn quantity_in(
    unit: Unit,
    units: Arc<UnitRegistry>,
) -> impl Fn(&Value) -> Result<Value, ConversionError> + Send + Sync {
    move |value: &Value| match value {
        Value::Integer(_) | Value::Float(_) => Ok(Value::Quantity(Quantity::new(
            value.as_float().unwrap_or_default(),
            unit.clone(),
        ))),
        Value::Text(text) => Ok(Value::Quantity(units.parse_quantity(text, Some(&unit))?)),
        Value::Quantity(_) | Value::None => Ok(value.clone()),
        other => Err(ConversionError::UnexpectedValue {
            expected: "number or quantity",
            found: other.kind(),
        }),
    }
}

fn one_of(a: i64, b: i64) -> crate::core::settings::Predicate {
    equals(a).or(equals(b))
}

/// The settings model for the `elscata` program.
///
/// `NELEC` defaults to `IZ` (a neutral atom). Quantity fields accept either
/// quantities or bare numbers in the program's unit and are written as bare
/// numbers in cm, cm**3 or eV.
pub fn elscata_model(units: &UnitRegistry) -> Result<Model, SettingsError> {
    let resolve = |text: &str| -> Result<Unit, SettingsError> {
        units.parse_unit(text).map_err(|e: UnitError| SettingsError::SchemaDefinition {
            path: text.to_string(),
            reason: e.to_string(),
        })
    };
    let cm = resolve("cm")?;
    let cm3 = resolve("cm**3")?;
    let ev = resolve("eV")?;
    let shared = Arc::new(units.clone());

    Model::new()
        .field(
            "IZ",
            Type::new("atomic number").obligatory().check(is_integer()),
        )?
        .field(
            "MNUCL",
            Type::new("rho_n (1=P, 2=U, 3=F, 4=Uu)")
                .with_default(3)
                .check(is_integer().and(in_range(1.0, 5.0))),
        )?
        .field(
            "NELEC",
            Type::new("number of bound electrons")
                .derived_default(|node: &Settings| node.value("IZ").cloned().unwrap_or_default())
                .check(is_none().or(is_integer())),
        )?
        .field(
            "MELEC",
            Type::new("rho_e (1=TFM, 2=TFD, 3=DHFS, 4=DF, 5=file)")
                .with_default(4)
                .check(is_integer().and(in_range(1.0, 6.0))),
        )?
        .field(
            "MUFFIN",
            Type::new("0=free atom, 1=muffin-tin model")
                .with_default(0)
                .check(one_of(0, 1)),
        )?
        .field(
            "RMUF",
            Type::new("muffin-tin radius (cm)")
                .check(is_none().or(is_length()))
                .transformer(magnitude_in(cm.clone()))
                .parser(quantity_in(cm, shared.clone())),
        )?
        .field(
            "IELEC",
            Type::new("-1=electron, +1=positron")
                .with_default(-1)
                .check(one_of(-1, 1)),
        )?
        .field(
            "MEXCH",
            Type::new("V_ex (0=none, 1=FM, 2=TF, 3=RT)")
                .with_default(1)
                .check(is_integer().and(in_range(0.0, 4.0))),
        )?
        .field(
            "MCPOL",
            Type::new("V_cp (0=none, 1=B, 2=LDA)")
                .with_default(0)
                .check(is_integer().and(in_range(0.0, 3.0))),
        )?
        .field(
            "VPOLA",
            Type::new("atomic polarizability (cm**3)")
                .check(is_none().or(is_volume()))
                .transformer(magnitude_in(cm3.clone()))
                .parser(quantity_in(cm3, shared.clone())),
        )?
        .field(
            "VPOLB",
            Type::new("b_pol parameter")
                .with_default(-1)
                .check(is_number()),
        )?
        .field(
            "MABS",
            Type::new("W_abs (0=none, 1=LDA)")
                .with_default(0)
                .check(one_of(0, 1)),
        )?
        .field(
            "VABSA",
            Type::new("absorption-potential strength, Aabs")
                .with_default(2.0)
                .check(is_number()),
        )?
        .field(
            "VABSD",
            Type::new("energy gap DELTA (eV)")
                .with_default(Quantity::new(-1.0, ev.clone()))
                .check(is_energy())
                .transformer(magnitude_in(ev.clone()))
                .parser(quantity_in(ev.clone(), shared.clone())),
        )?
        .field(
            "IHEF",
            Type::new("high-E factorization (0=no, 1=yes, 2=Born)")
                .with_default(1)
                .check(is_number().and(in_range(0.0, 3.0))),
        )?
        .field(
            "EV",
            Type::new("kinetic energy (eV)")
                .obligatory()
                .repeated()
                .check(is_sequence_of(is_energy()).and(non_empty()))
                .transformer(magnitude_in(ev.clone()))
                .parser(quantity_in(ev, shared)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::input::InputDeck;
    use crate::core::settings::{parse_to_model, validate_and_fill};

    fn model() -> Model {
        elscata_model(&UnitRegistry::new()).unwrap()
    }

    fn gold() -> Settings {
        let units = UnitRegistry::new();
        Settings::new()
            .with("IZ", 79)
            .unwrap()
            .with(
                "EV",
                vec![
                    units.quantity(100.0, "eV").unwrap(),
                    units.quantity(1.0, "keV").unwrap(),
                ],
            )
            .unwrap()
    }

    #[test]
    fn model_declares_every_keyword_in_order() {
        let model = model();
        let paths: Vec<String> = model.fields().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, KEYWORDS);
    }

    #[test]
    fn nelec_defaults_to_atomic_number() {
        let filled = validate_and_fill(&gold(), &model()).unwrap();
        assert_eq!(filled.value("NELEC"), Some(&Value::Integer(79)));
        assert_eq!(filled.value("MELEC"), Some(&Value::Integer(4)));
        assert_eq!(filled.value("RMUF"), Some(&Value::None));
    }

    #[test]
    fn energies_are_required() {
        let settings = Settings::new().with("IZ", 79).unwrap();
        assert_eq!(
            validate_and_fill(&settings, &model()).unwrap_err(),
            SettingsError::MissingObligatoryField { path: "EV".into() }
        );
        let empty = settings.with("EV", Vec::<Value>::new()).unwrap();
        assert!(matches!(
            validate_and_fill(&empty, &model()),
            Err(SettingsError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn invalid_choices_are_rejected() {
        let settings = gold().with("IELEC", 0).unwrap();
        assert!(matches!(
            validate_and_fill(&settings, &model()),
            Err(SettingsError::ValidationFailed { ref path, .. }) if path == "IELEC"
        ));
    }

    #[test]
    fn deck_converts_quantities_to_program_units() {
        let units = UnitRegistry::new();
        let settings = gold()
            .with("MUFFIN", 1)
            .unwrap()
            .with("RMUF", units.quantity(2.0, "cm").unwrap())
            .unwrap();
        let deck = InputDeck::new(Arc::new(model()));
        let text = deck.render(&settings).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "IZ      79         atomic number");
        assert!(lines.contains(&"RMUF    2.0        muffin-tin radius (cm)"));
        assert!(lines.contains(&"VABSD  -1.0        energy gap DELTA (eV)"));
        assert_eq!(lines[lines.len() - 2], "EV      1.0000e+02 kinetic energy (eV)");
        assert_eq!(lines[lines.len() - 1], "EV      1.0000e+03");
    }

    #[test]
    fn text_sources_parse_into_quantities() {
        let raw = Settings::new()
            .with("IZ", 6)
            .unwrap()
            .with("EV", vec![Value::from("100 eV"), Value::from(2.5)])
            .unwrap()
            .with("VABSD", "-2 eV")
            .unwrap();
        let parsed = parse_to_model(&raw, &model()).unwrap();
        let energies = parsed.value("EV").unwrap().as_list().unwrap();
        assert_eq!(energies[1].as_quantity().unwrap().magnitude(), 2.5);
        assert_eq!(
            parsed.value("VABSD").unwrap().as_quantity().unwrap().magnitude(),
            -2.0
        );
    }

    #[test]
    fn quantities_of_the_wrong_dimension_fail_the_check() {
        let units = UnitRegistry::new();
        let settings = gold()
            .with("RMUF", units.quantity(3.0, "eV").unwrap())
            .unwrap();
        assert!(matches!(
            validate_and_fill(&settings, &model()),
            Err(SettingsError::ValidationFailed { ref path, .. }) if path == "RMUF"
        ));
    }
}
