use super::error::{ConversionError, SettingsError};
use super::predicates::Predicate;
use super::tree::{Settings, split_path};
use super::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub type DerivedDefault = Arc<dyn Fn(&Settings) -> Value + Send + Sync>;
pub type Conversion = Arc<dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync>;

/// How a missing field obtains its value.
#[derive(Clone, Default)]
pub enum DefaultValue {
    #[default]
    Absent,
    Static(Value),
    /// Computed from the node that encloses the field.
    Derived(DerivedDefault),
}

impl DefaultValue {
    pub fn is_declared(&self) -> bool {
        !matches!(self, DefaultValue::Absent)
    }

    /// `Absent` resolves to `Value::None`. A derived default needs its
    /// enclosing node and yields `None` without one.
    pub fn resolve(&self, enclosing: Option<&Settings>) -> Option<Value> {
        match self {
            DefaultValue::Absent => Some(Value::None),
            DefaultValue::Static(value) => Some(value.clone()),
            DefaultValue::Derived(generate) => enclosing.map(|node| generate(node)),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Absent => write!(f, "Absent"),
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Derived(_) => write!(f, "Derived(..)"),
        }
    }
}

/// Describes one field: documentation, default, check and conversions.
///
/// A field without a check accepts anything. `transformer` maps a validated
/// value into the form written to the input deck; `parser` maps raw external
/// input (text from files, numbers from the command line) into the form the
/// check expects.
#[derive(Clone, Default)]
pub struct Type {
    description: String,
    default: DefaultValue,
    check: Option<Predicate>,
    obligatory: bool,
    repeated: bool,
    transformer: Option<Conversion>,
    parser: Option<Conversion>,
}

impl Type {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Static(value.into());
        self
    }

    pub fn derived_default(
        mut self,
        generate: impl Fn(&Settings) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = DefaultValue::Derived(Arc::new(generate));
        self
    }

    pub fn check(mut self, predicate: Predicate) -> Self {
        self.check = Some(predicate);
        self
    }

    pub fn obligatory(mut self) -> Self {
        self.obligatory = true;
        self
    }

    /// The value is a list written as one deck line per element.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn transformer(
        mut self,
        f: impl Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    ) -> Self {
        self.transformer = Some(Arc::new(f));
        self
    }

    pub fn parser(
        mut self,
        f: impl Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    ) -> Self {
        self.parser = Some(Arc::new(f));
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default(&self) -> &DefaultValue {
        &self.default
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.check.as_ref()
    }

    pub fn is_obligatory(&self) -> bool {
        self.obligatory
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn validate(&self, value: &Value) -> bool {
        self.check.as_ref().is_none_or(|p| p.evaluate(value))
    }

    pub fn transform(&self, value: &Value) -> Result<Value, ConversionError> {
        match &self.transformer {
            Some(f) => f(value),
            None => Ok(value.clone()),
        }
    }

    pub fn parse(&self, value: &Value) -> Result<Value, ConversionError> {
        match &self.parser {
            Some(f) => f(value),
            None => Ok(value.clone()),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("description", &self.description)
            .field("default", &self.default)
            .field("check", &self.check)
            .field("obligatory", &self.obligatory)
            .field("repeated", &self.repeated)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum ModelEntry {
    Type(Type),
    Model(Arc<Model>),
}

impl From<Type> for ModelEntry {
    fn from(ty: Type) -> Self {
        ModelEntry::Type(ty)
    }
}

impl From<Model> for ModelEntry {
    fn from(model: Model) -> Self {
        ModelEntry::Model(Arc::new(model))
    }
}

impl From<Arc<Model>> for ModelEntry {
    fn from(model: Arc<Model>) -> Self {
        ModelEntry::Model(model)
    }
}

/// An ordered schema mirroring a settings tree. Declaration order is the order
/// fields are filled, checked and serialized in.
#[derive(Debug, Clone, Default)]
pub struct Model {
    entries: IndexMap<String, ModelEntry>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `entry` at a dotted `path`, creating nested models along the way.
    pub fn insert(
        &mut self,
        path: &str,
        entry: impl Into<ModelEntry>,
    ) -> Result<(), SettingsError> {
        let segments = split_path(path).map_err(|_| SettingsError::SchemaDefinition {
            path: path.to_string(),
            reason: "empty path segment".to_string(),
        })?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(SettingsError::SchemaDefinition {
                path: path.to_string(),
                reason: "empty path".to_string(),
            });
        };

        let mut node = self;
        for (depth, segment) in parents.iter().enumerate() {
            let child = node
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| ModelEntry::Model(Arc::new(Model::new())));
            node = match child {
                ModelEntry::Model(model) => Arc::make_mut(model),
                ModelEntry::Type(_) => {
                    return Err(SettingsError::SchemaDefinition {
                        path: segments[..=depth].join("."),
                        reason: "a field cannot contain nested entries".to_string(),
                    });
                }
            };
        }
        node.entries.insert(last.to_string(), entry.into());
        Ok(())
    }

    pub fn field(mut self, path: &str, ty: Type) -> Result<Self, SettingsError> {
        self.insert(path, ty)?;
        Ok(self)
    }

    pub fn nested(
        mut self,
        path: &str,
        model: impl Into<Arc<Model>>,
    ) -> Result<Self, SettingsError> {
        self.insert(path, ModelEntry::Model(model.into()))?;
        Ok(self)
    }

    pub fn from_entries<K, E, I>(entries: I) -> Result<Self, SettingsError>
    where
        K: AsRef<str>,
        E: Into<ModelEntry>,
        I: IntoIterator<Item = (K, E)>,
    {
        let mut model = Model::new();
        for (key, entry) in entries {
            model.insert(key.as_ref(), entry)?;
        }
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ModelEntry> {
        self.entries.iter()
    }

    pub fn entry(&self, path: &str) -> Option<&ModelEntry> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut node = self;
        for segment in parents {
            node = match node.entries.get(*segment)? {
                ModelEntry::Model(model) => model,
                ModelEntry::Type(_) => return None,
            };
        }
        node.entries.get(*last)
    }

    pub fn type_at(&self, path: &str) -> Option<&Type> {
        match self.entry(path)? {
            ModelEntry::Type(ty) => Some(ty),
            ModelEntry::Model(_) => None,
        }
    }

    pub fn submodel(&self, path: &str) -> Option<&Model> {
        match self.entry(path)? {
            ModelEntry::Model(model) => Some(model),
            ModelEntry::Type(_) => None,
        }
    }

    pub fn submodel_arc(&self, path: &str) -> Option<Arc<Model>> {
        match self.entry(path)? {
            ModelEntry::Model(model) => Some(Arc::clone(model)),
            ModelEntry::Type(_) => None,
        }
    }

    /// Every field with its dotted path, depth first in declaration order.
    pub fn fields(&self) -> Vec<(String, &Type)> {
        let mut out = Vec::new();
        self.collect_fields("", &mut out);
        out
    }

    fn collect_fields<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Type)>) {
        for (key, entry) in &self.entries {
            let path = super::tree::join_path(prefix, key);
            match entry {
                ModelEntry::Type(ty) => out.push((path, ty)),
                ModelEntry::Model(model) => model.collect_fields(&path, out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::predicates::is_integer;

    #[test]
    fn dotted_insert_builds_nested_models() {
        let model = Model::new()
            .field("elscata.IZ", Type::new("atomic number"))
            .unwrap()
            .field("elscata.MNUCL", Type::new("nuclear model"))
            .unwrap();
        let nested = model.submodel("elscata").unwrap();
        assert_eq!(nested.len(), 2);
        assert!(model.type_at("elscata.IZ").is_some());
        assert!(model.type_at("elscata").is_none());
    }

    #[test]
    fn nesting_under_a_field_is_a_schema_error() {
        let result = Model::new()
            .field("IZ", Type::new("atomic number"))
            .unwrap()
            .field("IZ.sub", Type::new("impossible"));
        assert!(matches!(
            result,
            Err(SettingsError::SchemaDefinition { ref path, .. }) if path == "IZ"
        ));
    }

    #[test]
    fn empty_segment_is_a_schema_error() {
        assert!(matches!(
            Model::new().field("a..b", Type::new("x")),
            Err(SettingsError::SchemaDefinition { .. })
        ));
    }

    #[test]
    fn fields_lists_leaves_in_declaration_order() {
        let model = Model::from_entries([
            ("b", ModelEntry::from(Type::new("b"))),
            ("a.y", ModelEntry::from(Type::new("y"))),
            ("a.x", ModelEntry::from(Type::new("x"))),
        ])
        .unwrap();
        let paths: Vec<String> = model.fields().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["b", "a.y", "a.x"]);
    }

    #[test]
    fn type_without_check_accepts_anything() {
        let ty = Type::new("free");
        assert!(ty.validate(&Value::None));
        assert!(ty.validate(&Value::from("x")));
        let checked = Type::new("int").check(is_integer());
        assert!(!checked.validate(&Value::from("x")));
    }

    #[test]
    fn derived_default_needs_an_enclosing_node() {
        let ty = Type::new("count")
            .derived_default(|node: &Settings| Value::Integer(node.len() as i64));
        assert_eq!(ty.default().resolve(None), None);
        let node = Settings::new().with("a", 1).unwrap();
        assert_eq!(ty.default().resolve(Some(&node)), Some(Value::Integer(1)));
        assert_eq!(DefaultValue::Absent.resolve(None), Some(Value::None));
    }
}
