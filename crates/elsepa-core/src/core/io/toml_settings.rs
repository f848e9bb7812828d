use super::input::InputError;
use super::traits::DataFile;
use crate::core::settings::{Settings, SettingsError, Value};
use std::io::{BufRead, Read, Write};

/// Settings stored as a TOML document: tables become nested nodes.
///
/// TOML has no null, so `None` values are left out when writing, and
/// quantities are written as `"<magnitude> <unit>"` strings for a field parser
/// to pick up again.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlSettings;

impl DataFile for TomlSettings {
    type Data = Settings;
    type Error = InputError;

    fn read_from(&self, reader: &mut impl BufRead) -> Result<Settings, InputError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let table: toml::Table = toml::from_str(&text)?;
        settings_from_table(&table).map_err(InputError::from)
    }

    fn write_to(&self, settings: &Settings, writer: &mut impl Write) -> Result<(), InputError> {
        let text = toml::to_string(&settings_to_table(settings))?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Converts a TOML table into a settings tree.
///
/// Keys must be plain names. A quoted key holding a `.` (`"a.b" = 1`) could
/// never be addressed as a path and is rejected.
pub fn settings_from_table(table: &toml::Table) -> Result<Settings, SettingsError> {
    table
        .iter()
        .map(|(key, value)| {
            if key.is_empty() || key.contains('.') {
                return Err(SettingsError::InvalidPath { path: key.clone() });
            }
            Ok((key.clone(), value_from_toml(value)?))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Settings::from_iter)
}

pub fn value_from_toml(value: &toml::Value) -> Result<Value, SettingsError> {
    Ok(match value {
        toml::Value::String(s) => Value::Text(s.clone()),
        toml::Value::Integer(i) => Value::Integer(*i),
        toml::Value::Float(x) => Value::Float(*x),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::Text(d.to_string()),
        toml::Value::Array(items) => Value::List(
            items
                .iter()
                .map(value_from_toml)
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(table) => Value::Settings(settings_from_table(table)?),
    })
}

pub fn settings_to_table(settings: &Settings) -> toml::Table {
    settings
        .iter()
        .filter_map(|(key, value)| value_to_toml(value).map(|v| (key.clone(), v)))
        .collect()
}

/// `None` for values TOML cannot represent.
pub fn value_to_toml(value: &Value) -> Option<toml::Value> {
    Some(match value {
        Value::None => return None,
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Integer(i) => toml::Value::Integer(*i),
        Value::Float(x) => toml::Value::Float(*x),
        Value::Text(s) => toml::Value::String(s.clone()),
        Value::Quantity(q) => toml::Value::String(q.to_string()),
        Value::List(items) => toml::Value::Array(items.iter().filter_map(value_to_toml).collect()),
        Value::Settings(node) => toml::Value::Table(settings_to_table(node)),
    })
}

/// Interprets `text` as a TOML value literal (`3`, `2.5`, `[1, 2]`,
/// `"quoted"`); anything that is not valid TOML is taken as plain text.
pub fn parse_literal(text: &str) -> Value {
    let document = format!("value = {}", text);
    match toml::from_str::<toml::Table>(&document) {
        Ok(table) => table
            .get("value")
            .and_then(|value| value_from_toml(value).ok())
            .unwrap_or_else(|| Value::Text(text.to_string())),
        Err(_) => Value::Text(text.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::UnitRegistry;

    #[test]
    fn tables_become_nested_settings() {
        let text = "[elscata]\nIZ = 79\nEV = [\"100 eV\", \"1 keV\"]\n";
        let settings = TomlSettings.read_from_str(text).unwrap();
        assert_eq!(settings.value("elscata.IZ"), Some(&Value::Integer(79)));
        assert_eq!(
            settings.value("elscata.EV"),
            Some(&Value::from(vec!["100 eV", "1 keV"]))
        );
    }

    #[test]
    fn writing_skips_none_and_stringifies_quantities() {
        let registry = UnitRegistry::new();
        let settings = Settings::new()
            .with("a.IZ", 6)
            .unwrap()
            .with("a.RMUF", Value::None)
            .unwrap()
            .with("a.VABSD", registry.quantity(-1.0, "eV").unwrap())
            .unwrap();
        let text = TomlSettings.write_to_string(&settings).unwrap();
        let back = TomlSettings.read_from_str(&text).unwrap();
        assert_eq!(back.value("a.IZ"), Some(&Value::Integer(6)));
        assert!(!back.contains("a.RMUF"));
        assert_eq!(back.value("a.VABSD"), Some(&Value::from("-1 eV")));
    }

    #[test]
    fn quoted_keys_containing_dots_are_rejected() {
        let err = TomlSettings
            .read_from_str("[elscata]\n\"IZ.x\" = 79\n")
            .unwrap_err();
        assert!(matches!(
            err,
            InputError::Settings(SettingsError::InvalidPath { ref path }) if path == "IZ.x"
        ));

        let dotted = TomlSettings.read_from_str("elscata.IZ = 79\n").unwrap();
        assert_eq!(dotted.value("elscata.IZ"), Some(&Value::Integer(79)));
    }

    #[test]
    fn invalid_toml_is_reported() {
        assert!(matches!(
            TomlSettings.read_from_str("IZ = = 3"),
            Err(InputError::TomlRead(_))
        ));
    }

    #[test]
    fn literals_fall_back_to_text() {
        assert_eq!(parse_literal("3"), Value::Integer(3));
        assert_eq!(parse_literal("2.5"), Value::Float(2.5));
        assert_eq!(parse_literal("[1, 2]"), Value::from(vec![1, 2]));
        assert_eq!(parse_literal("\"quoted\""), Value::from("quoted"));
        assert_eq!(parse_literal("100 eV"), Value::from("100 eV"));
    }
}
