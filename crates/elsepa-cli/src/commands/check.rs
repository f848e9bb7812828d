use crate::cli::CheckArgs;
use crate::config;
use crate::error::{CliError, Result};
use elsepa::core::elscata::elscata_model;
use elsepa::core::io::toml_settings::TomlSettings;
use elsepa::core::io::traits::DataFile;
use elsepa::core::settings::{Settings, parse_to_model};
use elsepa::core::units::UnitRegistry;
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let (settings, _) = config::load_settings(&args.settings)?;
    let filled = check(&settings)?;
    info!("Settings in {:?} are valid.", args.settings.config);
    print!("{}", TomlSettings.write_to_string(&filled)?);
    Ok(())
}

/// Validates raw settings and fills every default.
pub fn check(settings: &Settings) -> Result<Settings> {
    let model = elscata_model(&UnitRegistry::new())?;
    parse_to_model(settings, &model).map_err(CliError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elsepa::core::settings::{SettingsError, Value};

    #[test]
    fn defaults_are_filled_in() {
        let settings = Settings::new()
            .with("IZ", 13)
            .unwrap()
            .with("EV", vec![Value::from(500)])
            .unwrap();
        let filled = check(&settings).unwrap();
        assert_eq!(filled.value("NELEC"), Some(&Value::Integer(13)));
        assert_eq!(filled.value("MEXCH"), Some(&Value::Integer(1)));
        let toml = TomlSettings.write_to_string(&filled).unwrap();
        assert!(toml.contains("NELEC = 13"));
        assert!(!toml.contains("RMUF"));
    }

    #[test]
    fn invalid_settings_are_reported_with_their_path() {
        let settings = Settings::new()
            .with("IZ", 13)
            .unwrap()
            .with("EV", vec![Value::from(500)])
            .unwrap()
            .with("MELEC", 9)
            .unwrap();
        let err = check(&settings).unwrap_err();
        assert!(matches!(
            err,
            CliError::Settings(SettingsError::ValidationFailed { ref path, .. }) if path == "MELEC"
        ));
    }
}
