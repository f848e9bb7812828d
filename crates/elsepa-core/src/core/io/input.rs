use super::format::{format_float, format_integer, format_scientific, sign_padded};
use super::traits::DataFile;
use crate::core::settings::{
    Model, Settings, SettingsError, Type, Value, apply_parsers, validate_and_fill,
};
use crate::core::units::parse_fortran_float;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const KEYWORD_WIDTH: usize = 7;
const VALUE_WIDTH: usize = 12;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Setting '{key}' cannot be written to the input deck: {reason}")]
    Unwritable { key: String, reason: String },
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("Unknown keyword '{keyword}' on line {line}")]
    UnknownKeyword { line: usize, keyword: String },
    #[error("Invalid TOML: {0}")]
    TomlRead(#[from] toml::de::Error),
    #[error("Could not serialize settings to TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// The fixed-format keyword deck read by Fortran programs on standard input.
///
/// Each line holds a keyword in the first seven columns, a value in the next
/// twelve and a free-text description after that. Fields are written in model
/// order; the keyword is the last segment of the field's path. Values go
/// through the field's transformer before formatting, so quantities must be
/// reduced to bare numbers by then.
#[derive(Debug, Clone)]
pub struct InputDeck {
    model: Arc<Model>,
}

impl InputDeck {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Validates `settings`, fills defaults and renders the deck.
    pub fn render(&self, settings: &Settings) -> Result<String, InputError> {
        let filled = validate_and_fill(settings, &self.model)?;
        self.write_to_string(&filled)
    }

    fn keywords(&self) -> HashMap<String, (String, &Type)> {
        self.model
            .fields()
            .into_iter()
            .map(|(path, ty)| (keyword_of(&path).to_string(), (path, ty)))
            .collect()
    }

    fn write_field(
        &self,
        keyword: &str,
        ty: &Type,
        value: &Value,
        writer: &mut impl Write,
    ) -> Result<(), InputError> {
        let value = ty.transform(value).map_err(|source| SettingsError::Conversion {
            path: keyword.to_string(),
            source,
        })?;

        let elements = match (&value, ty.is_repeated()) {
            (Value::List(items), _) => Some(items.clone()),
            (scalar, true) => Some(vec![scalar.clone()]),
            (_, false) => None,
        };

        match elements {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let number = sign_padded(&format_scientific(element_number(keyword, item)?, 4));
                    if i == 0 {
                        writeln!(
                            writer,
                            "{:<kw$}{} {}",
                            keyword,
                            number,
                            ty.description(),
                            kw = KEYWORD_WIDTH
                        )?;
                    } else {
                        writeln!(writer, "{:<kw$}{}", keyword, number, kw = KEYWORD_WIDTH)?;
                    }
                }
            }
            None => {
                let mut text = scalar_text(keyword, &value)?;
                if text.len() >= VALUE_WIDTH {
                    text.push(' ');
                }
                writeln!(
                    writer,
                    "{:<kw$}{:<vw$}{}",
                    keyword,
                    text,
                    ty.description(),
                    kw = KEYWORD_WIDTH,
                    vw = VALUE_WIDTH
                )?;
            }
        }
        Ok(())
    }
}

impl DataFile for InputDeck {
    type Data = Settings;
    type Error = InputError;

    /// Reads a deck back into settings. Repeated keywords accumulate into a
    /// list and each field's parser restores typed values. Defaults are not
    /// filled in.
    fn read_from(&self, reader: &mut impl BufRead) -> Result<Settings, InputError> {
        let keywords = self.keywords();
        let mut raw = Settings::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = index + 1;
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let Some((path, ty)) = keywords.get(keyword) else {
                return Err(InputError::UnknownKeyword {
                    line: line_num,
                    keyword: keyword.to_string(),
                });
            };
            let token = tokens.next().ok_or_else(|| InputError::Parse {
                line: line_num,
                reason: format!("keyword '{}' has no value", keyword),
            })?;
            let value = parse_token(token);

            if ty.is_repeated() {
                match raw.value_mut(path) {
                    Some(Value::List(items)) => items.push(value),
                    _ => raw.set(path, Value::List(vec![value]))?,
                }
            } else {
                raw.set(path, value)?;
            }
        }

        debug!(fields = raw.len(), "Read input deck");
        Ok(apply_parsers(&raw, &self.model)?)
    }

    fn write_to(&self, settings: &Settings, writer: &mut impl Write) -> Result<(), InputError> {
        for (path, ty) in self.model.fields() {
            let Some(value) = settings.value(&path) else {
                continue;
            };
            if value.is_none() {
                continue;
            }
            self.write_field(keyword_of(&path), ty, value, writer)?;
        }
        Ok(())
    }
}

fn keyword_of(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn scalar_text(key: &str, value: &Value) -> Result<String, InputError> {
    let unwritable = |reason: String| InputError::Unwritable {
        key: key.to_string(),
        reason,
    };
    match value {
        Value::Integer(i) => Ok(format_integer(*i)),
        Value::Float(x) => Ok(format_float(*x)),
        Value::Bool(b) => Ok(format_integer(i64::from(*b))),
        Value::Text(s) => Ok(s.clone()),
        Value::Quantity(q) => Err(unwritable(format!(
            "quantity '{}' was not converted to a bare number",
            q
        ))),
        Value::List(_) => Err(unwritable("lists are only written for repeated fields".into())),
        Value::Settings(_) => Err(unwritable("nested settings have no deck form".into())),
        Value::None => Err(unwritable("no value".into())),
    }
}

fn element_number(key: &str, value: &Value) -> Result<f64, InputError> {
    value.as_float().ok_or_else(|| InputError::Unwritable {
        key: key.to_string(),
        reason: format!("repeated values must be numbers, found {}", value.kind()),
    })
}

fn parse_token(token: &str) -> Value {
    if let Ok(i) = token.parse::<i64>() {
        return Value::Integer(i);
    }
    match parse_fortran_float(token) {
        Some(x) => Value::Float(x),
        None => Value::Text(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::ConversionError;
    use crate::core::settings::predicates::{in_range, is_integer, is_sequence_of, non_empty};
    use crate::core::units::{Quantity, UnitRegistry};

    fn energies() -> Type {
        let registry = UnitRegistry::new();
        let ev = registry.parse_unit("eV").unwrap();
        let ev_for_parser = ev.clone();
        Type::new("kinetic energy (eV)")
            .obligatory()
            .repeated()
            .check(is_sequence_of(crate::core::settings::predicates::is_energy()).and(non_empty()))
            .transformer(move |v| match v {
                Value::List(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::Quantity(q) => Ok(Value::Float(q.magnitude_in(&ev)?)),
                        other => Err(ConversionError::UnexpectedValue {
                            expected: "quantity",
                            found: other.kind(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                other => Ok(other.clone()),
            })
            .parser(move |v| match v.as_float() {
                Some(x) => Ok(Value::Quantity(Quantity::new(x, ev_for_parser.clone()))),
                None => Ok(v.clone()),
            })
    }

    fn deck() -> InputDeck {
        let model = Model::new()
            .field("IZ", Type::new("atomic number").obligatory().check(is_integer()))
            .unwrap()
            .field(
                "MNUCL",
                Type::new("nuclear model")
                    .with_default(3)
                    .check(is_integer().and(in_range(1.0, 5.0))),
            )
            .unwrap()
            .field("RMUF", Type::new("muffin-tin radius (cm)"))
            .unwrap()
            .field("EV", energies())
            .unwrap();
        InputDeck::new(Arc::new(model))
    }

    fn sample_settings() -> Settings {
        let registry = UnitRegistry::new();
        Settings::new()
            .with("IZ", 80)
            .unwrap()
            .with(
                "EV",
                vec![
                    registry.quantity(10.0, "eV").unwrap(),
                    registry.quantity(100.0, "eV").unwrap(),
                ],
            )
            .unwrap()
    }

    #[test]
    fn render_writes_fields_in_model_order_with_defaults() {
        let text = deck().render(&sample_settings()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "IZ      80         atomic number",
                "MNUCL   3          nuclear model",
                "EV      1.0000e+01 kinetic energy (eV)",
                "EV      1.0000e+02",
            ]
        );
    }

    #[test]
    fn none_values_are_skipped() {
        let text = deck().render(&sample_settings()).unwrap();
        assert!(!text.contains("RMUF"));
    }

    #[test]
    fn negative_numbers_take_the_sign_column() {
        let settings = sample_settings().with("RMUF", -1.5).unwrap();
        let text = deck().render(&settings).unwrap();
        assert!(text.contains("RMUF   -1.5        muffin-tin radius (cm)"));
    }

    #[test]
    fn untransformed_quantity_cannot_be_written() {
        let registry = UnitRegistry::new();
        let settings = sample_settings()
            .with("RMUF", registry.quantity(1.0, "cm").unwrap())
            .unwrap();
        assert!(matches!(
            deck().render(&settings),
            Err(InputError::Unwritable { ref key, .. }) if key == "RMUF"
        ));
    }

    #[test]
    fn reading_accumulates_repeated_keywords_and_parses_values() {
        let text = "IZ      80         atomic number\n\
                    MNUCL   2\n\
                    EV      1.0000D+01 kinetic energy (eV)\n\
                    EV      1.0000e+02\n";
        let settings = deck().read_from_str(text).unwrap();
        assert_eq!(settings.value("IZ"), Some(&Value::Integer(80)));
        assert_eq!(settings.value("MNUCL"), Some(&Value::Integer(2)));
        let energies = settings.value("EV").unwrap().as_list().unwrap();
        assert_eq!(energies.len(), 2);
        let first = energies[0].as_quantity().unwrap();
        assert_eq!(first.unit().symbol(), "eV");
        assert!((first.magnitude() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn rendered_deck_reads_back_to_equivalent_settings() {
        let deck = deck();
        let text = deck.render(&sample_settings()).unwrap();
        let read = deck.read_from_str(&text).unwrap();
        let filled = validate_and_fill(&read, deck.model()).unwrap();
        assert_eq!(deck.write_to_string(&filled).unwrap(), text);
    }

    #[test]
    fn unknown_keyword_reports_its_line() {
        let err = deck().read_from_str("IZ 6\nBOGUS 1\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::UnknownKeyword { line: 2, ref keyword } if keyword == "BOGUS"
        ));
    }

    #[test]
    fn keyword_without_value_is_a_parse_error() {
        assert!(matches!(
            deck().read_from_str("IZ\n"),
            Err(InputError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn deck_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.in");
        let deck = deck();
        let filled = validate_and_fill(&sample_settings(), deck.model()).unwrap();
        deck.write_to_path(&filled, &path).unwrap();
        let read = deck.read_from_path(&path).unwrap();
        assert_eq!(read.value("IZ"), Some(&Value::Integer(80)));
    }
}
