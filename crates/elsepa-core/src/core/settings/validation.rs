use super::error::SettingsError;
use super::model::{DefaultValue, Model, ModelEntry};
use super::tree::{Settings, join_path};
use super::value::Value;
use tracing::{debug, instrument};

/// What to do with keys present in the settings but absent from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndeclaredKeys {
    /// Carried into the result unchecked.
    #[default]
    Keep,
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    pub undeclared: UndeclaredKeys,
}

impl ValidationOptions {
    pub fn strict() -> Self {
        Self {
            undeclared: UndeclaredKeys::Reject,
        }
    }
}

/// Returns a copy of `settings` completed against `model` and checked.
///
/// Each level is processed in three passes: static defaults, nested models and
/// obligatory fields first; then derived defaults, in declaration order,
/// against the level's node; then every field's check in declaration order.
/// The first failure aborts. The input is never modified.
pub fn validate_and_fill(settings: &Settings, model: &Model) -> Result<Settings, SettingsError> {
    validate_and_fill_with(settings, model, ValidationOptions::default())
}

#[instrument(skip_all, name = "validate_settings")]
pub fn validate_and_fill_with(
    settings: &Settings,
    model: &Model,
    options: ValidationOptions,
) -> Result<Settings, SettingsError> {
    let mut filled = fill_level(settings, model, "", options)?;
    if let Some(attached) = settings.model() {
        filled.attach_model(attached.clone());
    }
    Ok(filled)
}

fn fill_level(
    input: &Settings,
    model: &Model,
    prefix: &str,
    options: ValidationOptions,
) -> Result<Settings, SettingsError> {
    let mut out = Settings::new();
    for (key, value) in input {
        if model.iter().all(|(declared, _)| declared != key) {
            let path = join_path(prefix, key);
            if options.undeclared == UndeclaredKeys::Reject {
                return Err(SettingsError::UndeclaredField { path });
            }
            debug!(path = %path, "Keeping undeclared setting");
        }
        out.insert_entry(key.clone(), value.clone());
    }

    let mut derived = Vec::new();
    for (key, entry) in model.iter() {
        let path = join_path(prefix, key);
        match entry {
            ModelEntry::Model(submodel) => {
                let filled = match out.entry(key) {
                    None => fill_level(&Settings::new(), submodel, &path, options)?,
                    Some(Value::Settings(node)) => fill_level(node, submodel, &path, options)?,
                    Some(other) => {
                        return Err(SettingsError::NestedTypeMismatch {
                            path,
                            expected: "settings",
                            found: other.kind(),
                        });
                    }
                };
                out.insert_entry(key.clone(), Value::Settings(filled));
            }
            ModelEntry::Type(ty) => match out.entry(key) {
                Some(Value::Settings(_)) => {
                    return Err(SettingsError::NestedTypeMismatch {
                        path,
                        expected: "a value",
                        found: "settings",
                    });
                }
                Some(_) => {}
                None => match ty.default() {
                    DefaultValue::Static(value) => out.insert_entry(key.clone(), value.clone()),
                    DefaultValue::Derived(_) => derived.push((key, ty)),
                    DefaultValue::Absent if ty.is_obligatory() => {
                        return Err(SettingsError::MissingObligatoryField { path });
                    }
                    DefaultValue::Absent => out.insert_entry(key.clone(), Value::None),
                },
            },
        }
    }

    for (key, ty) in derived {
        let value = ty.default().resolve(Some(&out)).unwrap_or_default();
        out.insert_entry(key.clone(), value);
    }

    for (key, entry) in model.iter() {
        if let ModelEntry::Type(ty) = entry {
            let value = out.entry(key).cloned().unwrap_or_default();
            if !ty.validate(&value) {
                return Err(SettingsError::ValidationFailed {
                    path: join_path(prefix, key),
                    check: ty.predicate().map(|p| p.name().to_string()).unwrap_or_default(),
                    value,
                });
            }
        }
    }
    Ok(out)
}

/// Checks only the keys that are present; nothing is filled in.
pub fn check_only(settings: &Settings, model: &Model) -> Result<(), SettingsError> {
    check_only_with(settings, model, ValidationOptions::default())
}

pub fn check_only_with(
    settings: &Settings,
    model: &Model,
    options: ValidationOptions,
) -> Result<(), SettingsError> {
    check_level(settings, model, "", options)
}

fn check_level(
    input: &Settings,
    model: &Model,
    prefix: &str,
    options: ValidationOptions,
) -> Result<(), SettingsError> {
    for (key, value) in input {
        let path = join_path(prefix, key);
        match (model.entry(key), value) {
            (None, _) if options.undeclared == UndeclaredKeys::Reject => {
                return Err(SettingsError::UndeclaredField { path });
            }
            (None, _) => {}
            (Some(ModelEntry::Model(submodel)), Value::Settings(node)) => {
                check_level(node, submodel, &path, options)?;
            }
            (Some(ModelEntry::Model(_)), other) => {
                return Err(SettingsError::NestedTypeMismatch {
                    path,
                    expected: "settings",
                    found: other.kind(),
                });
            }
            (Some(ModelEntry::Type(_)), Value::Settings(_)) => {
                return Err(SettingsError::NestedTypeMismatch {
                    path,
                    expected: "a value",
                    found: "settings",
                });
            }
            (Some(ModelEntry::Type(ty)), value) => {
                if !ty.validate(value) {
                    return Err(SettingsError::ValidationFailed {
                        path,
                        check: ty.predicate().map(|p| p.name().to_string()).unwrap_or_default(),
                        value: value.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Runs each present field's parser over its raw value. Lists are parsed
/// element-wise and `None` is left alone.
pub fn apply_parsers(settings: &Settings, model: &Model) -> Result<Settings, SettingsError> {
    parse_level(settings, model, "")
}

fn parse_level(input: &Settings, model: &Model, prefix: &str) -> Result<Settings, SettingsError> {
    let mut out = Settings::new();
    for (key, value) in input {
        let path = join_path(prefix, key);
        let parsed = match (model.entry(key), value) {
            (Some(ModelEntry::Model(submodel)), Value::Settings(node)) => {
                Value::Settings(parse_level(node, submodel, &path)?)
            }
            (Some(ModelEntry::Type(_)), Value::None) => Value::None,
            (Some(ModelEntry::Type(ty)), Value::List(items)) => Value::List(
                items
                    .iter()
                    .map(|item| ty.parse(item))
                    .collect::<Result<_, _>>()
                    .map_err(|source| SettingsError::Conversion {
                        path: path.clone(),
                        source,
                    })?,
            ),
            (Some(ModelEntry::Type(ty)), value) => ty
                .parse(value)
                .map_err(|source| SettingsError::Conversion { path, source })?,
            _ => value.clone(),
        };
        out.insert_entry(key.clone(), parsed);
    }
    Ok(out)
}

/// Parses raw input into model form, then validates and fills it.
pub fn parse_to_model(settings: &Settings, model: &Model) -> Result<Settings, SettingsError> {
    let parsed = apply_parsers(settings, model)?;
    validate_and_fill(&parsed, model)
}
