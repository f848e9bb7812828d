use super::error::SettingsError;
use super::model::{DefaultValue, Model};
use super::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A hierarchical, insertion-ordered mapping of settings.
///
/// Keys are plain names; dotted paths such as `"elscata.IZ"` address nested
/// nodes. A `Settings` may carry a [`Model`] that describes its fields, which is
/// what allows [`Settings::get`] to hand out declared defaults for fields that
/// were never set.
#[derive(Clone, Default)]
pub struct Settings {
    entries: IndexMap<String, Value>,
    model: Option<Arc<Model>>,
}

/// The outcome of a read-only path lookup.
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// Absent, but the governing model declares a default for it.
    UseDefault {
        default: &'a DefaultValue,
        enclosing: Option<&'a Settings>,
    },
    Absent,
}

impl Lookup<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    /// The stored value, or the default computed against its enclosing node.
    pub fn resolve(&self) -> Option<Value> {
        match self {
            Lookup::Found(value) => Some((*value).clone()),
            Lookup::UseDefault { default, enclosing } => default.resolve(*enclosing),
            Lookup::Absent => None,
        }
    }
}

/// A mutable handle returned by [`Settings::get`].
///
/// Speculative access never fails: a path with no value and no declared default
/// yields [`Entry::Inert`], which answers every further `get` with itself and
/// ignores `set`.
#[derive(Debug)]
pub enum Entry<'a> {
    Node {
        value: &'a mut Value,
        model: Option<Arc<Model>>,
    },
    Inert,
}

impl<'a> Entry<'a> {
    pub fn is_present(&self) -> bool {
        matches!(self, Entry::Node { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Entry::Node { value, .. } => Some(value),
            Entry::Inert => None,
        }
    }

    pub fn into_value(self) -> Option<&'a mut Value> {
        match self {
            Entry::Node { value, .. } => Some(value),
            Entry::Inert => None,
        }
    }

    pub fn get(self, path: &str) -> Entry<'a> {
        match self {
            Entry::Node {
                value: Value::Settings(node),
                model,
            } => {
                let model = model.or_else(|| node.model.clone());
                node.get_in(path, model)
            }
            _ => Entry::Inert,
        }
    }

    /// Writing through an inert entry is a silent no-op.
    pub fn set(self, path: &str, value: impl Into<Value>) -> Result<(), SettingsError> {
        match self {
            Entry::Node {
                value: Value::Settings(node),
                ..
            } => node.set(path, value),
            Entry::Node { value, .. } => Err(SettingsError::NestedTypeMismatch {
                path: path.to_string(),
                expected: "settings",
                found: value.kind(),
            }),
            Entry::Inert => Ok(()),
        }
    }
}

pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, SettingsError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SettingsError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<Model>) -> Self {
        Self {
            entries: IndexMap::new(),
            model: Some(model),
        }
    }

    pub fn attach_model(&mut self, model: Arc<Model>) {
        self.model = Some(model);
    }

    pub fn detach_model(&mut self) -> Option<Arc<Model>> {
        self.model.take()
    }

    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Stores `value` at `path`, creating intermediate nodes as needed.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), SettingsError> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(SettingsError::InvalidPath {
                path: path.to_string(),
            });
        };

        let mut node = self;
        for (depth, segment) in parents.iter().enumerate() {
            let child = node
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Value::Settings(Settings::new()));
            node = match child {
                Value::Settings(next) => next,
                other => {
                    return Err(SettingsError::NestedTypeMismatch {
                        path: segments[..=depth].join("."),
                        expected: "settings",
                        found: other.kind(),
                    });
                }
            };
        }
        node.entries.insert(last.to_string(), value.into());
        Ok(())
    }

    /// Chaining form of [`Settings::set`].
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Result<Self, SettingsError> {
        self.set(path, value)?;
        Ok(self)
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut node = self;
        for segment in parents {
            node = node.entries.get_mut(*segment)?.as_settings_mut()?;
        }
        node.entries.shift_remove(*last)
    }

    /// The stored value at `path`, ignoring any model defaults.
    pub fn value(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut node = self;
        for segment in parents {
            node = node.entries.get(*segment)?.as_settings()?;
        }
        node.entries.get(*last)
    }

    pub fn value_mut(&mut self, path: &str) -> Option<&mut Value> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut node = self;
        for segment in parents {
            node = node.entries.get_mut(*segment)?.as_settings_mut()?;
        }
        node.entries.get_mut(*last)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.value(path).is_some()
    }

    pub fn require(&self, path: &str) -> Result<&Value, SettingsError> {
        split_path(path)?;
        self.value(path).ok_or_else(|| SettingsError::UnknownPath {
            path: path.to_string(),
        })
    }

    pub fn lookup(&self, path: &str) -> Lookup<'_> {
        self.lookup_in(path, self.model.as_deref())
    }

    fn lookup_in<'a>(&'a self, path: &str, model: Option<&'a Model>) -> Lookup<'a> {
        let Ok(segments) = split_path(path) else {
            return Lookup::Absent;
        };
        let mut node = self;
        let mut model = model;
        for (i, segment) in segments.iter().enumerate() {
            let is_last = i + 1 == segments.len();
            match node.entries.get(*segment) {
                Some(value) if is_last => return Lookup::Found(value),
                Some(Value::Settings(child)) => {
                    model = model
                        .and_then(|m| m.submodel(segment))
                        .or(child.model.as_deref());
                    node = child;
                }
                Some(_) => return Lookup::Absent,
                None => {
                    let rest = segments[i..].join(".");
                    let enclosing = is_last.then_some(node);
                    return match model.and_then(|m| m.type_at(&rest)).map(|ty| ty.default()) {
                        Some(DefaultValue::Derived(_)) if enclosing.is_none() => Lookup::Absent,
                        Some(default) if default.is_declared() => Lookup::UseDefault {
                            default,
                            enclosing,
                        },
                        _ => Lookup::Absent,
                    };
                }
            }
        }
        Lookup::Absent
    }

    /// Mutable access with default materialization.
    ///
    /// A missing field whose governing model declares a default is stored with
    /// that default before the handle is returned; anything else missing yields
    /// [`Entry::Inert`].
    pub fn get(&mut self, path: &str) -> Entry<'_> {
        let model = self.model.clone();
        self.get_in(path, model)
    }

    fn get_in(&mut self, path: &str, model: Option<Arc<Model>>) -> Entry<'_> {
        let materialized = match self.lookup_in(path, model.as_deref()) {
            Lookup::Found(_) => None,
            Lookup::UseDefault { default, enclosing } => match default.resolve(enclosing) {
                Some(value) => Some(value),
                None => return Entry::Inert,
            },
            Lookup::Absent => return Entry::Inert,
        };
        if let Some(value) = materialized {
            debug!(path, "Materializing declared default");
            if self.set(path, value).is_err() {
                return Entry::Inert;
            }
        }
        let nested = model.as_ref().and_then(|m| m.submodel_arc(path));
        match self.value_mut(path) {
            Some(value) => Entry::Node {
                value,
                model: nested,
            },
            None => Entry::Inert,
        }
    }

    pub(crate) fn insert_entry(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub(crate) fn entry(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a Settings {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Collects literal top-level keys; dots are not interpreted here.
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            model: None,
        }
    }
}
