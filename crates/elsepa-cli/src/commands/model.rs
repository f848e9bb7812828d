use crate::error::Result;
use elsepa::core::elscata::elscata_model;
use elsepa::core::settings::{DefaultValue, Model};
use elsepa::core::units::UnitRegistry;

pub fn run() -> Result<()> {
    let model = elscata_model(&UnitRegistry::new())?;
    print!("{}", describe(&model));
    Ok(())
}

/// One line per field: keyword, default and description.
pub fn describe(model: &Model) -> String {
    let mut out = format!("{:<8} {:<14} {}\n", "FIELD", "DEFAULT", "DESCRIPTION");
    for (path, ty) in model.fields() {
        let default = match ty.default() {
            DefaultValue::Static(value) => value.to_string(),
            DefaultValue::Derived(_) => "(derived)".to_string(),
            DefaultValue::Absent if ty.is_obligatory() => "(required)".to_string(),
            DefaultValue::Absent => "-".to_string(),
        };
        let repeated = if ty.is_repeated() { " [list]" } else { "" };
        out.push_str(&format!(
            "{:<8} {:<14} {}{}\n",
            path,
            default,
            ty.description(),
            repeated
        ));
    }
    out
}
