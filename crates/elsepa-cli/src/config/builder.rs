use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileRunnerConfig};
use super::models::AppConfig;
use crate::cli::{RunArgs, SettingsArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use elsepa::core::io::toml_settings::settings_from_table;
use elsepa::core::settings::Settings;
use elsepa::engine::config::{RunConfig, RunConfigBuilder};
use tracing::debug;

/// Reads the settings tree from the config file and applies `--set` values.
pub fn load_settings(args: &SettingsArgs) -> Result<(Settings, FileRunnerConfig)> {
    let file_config = FileConfig::from_file(&args.config)?;
    let settings = settings_from_table(&file_config.settings)?;
    let settings = apply_set_values(settings, &args.set_values)?;
    Ok((settings, file_config.runner))
}

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let (settings, runner) = load_settings(&args.settings)?;
    let run_config = build_run_config(args, runner)?;
    Ok(AppConfig {
        settings,
        run_config,
    })
}

/// Command-line flags win over the file; the file wins over `$ELSEPA_DATA`
/// and `$PATH`, which win over the built-in defaults.
pub fn build_run_config(args: &RunArgs, runner: FileRunnerConfig) -> Result<RunConfig> {
    let defaults = DefaultsConfig::default();
    let mut builder = RunConfigBuilder::new();

    if let Some(dir) = args.output_dir.clone().or(runner.output_dir) {
        builder = builder.output_dir(dir);
    }

    match args.image.clone().or(runner.image) {
        Some(image) => {
            debug!(image = %image, "Using the container backend");
            builder = builder
                .image(image)
                .container_working_dir(
                    runner
                        .container_working_dir
                        .unwrap_or(defaults.container_working_dir),
                )
                .container_command(
                    runner
                        .container_command
                        .unwrap_or(defaults.container_command),
                )
                .container_engine(runner.container_engine.unwrap_or(defaults.container_engine));
        }
        None => {
            let elsepa_dir = args.elsepa_dir.clone().or(runner.elsepa_dir);
            let data_dir = args.data_dir.clone().or(runner.data_dir);
            builder = builder.locate(elsepa_dir.as_deref(), data_dir.as_deref())?;
        }
    }

    Ok(builder.build()?)
}

fn apply_set_values(mut settings: Settings, set_values: &[String]) -> Result<Settings> {
    for assignment in set_values {
        let (key, value) = parser::parse_assignment(assignment)
            .map_err(|e| CliError::Argument(e.to_string()))?;
        debug!(key, %value, "Overriding setting from the command line");
        settings.set(key, value)?;
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elsepa::core::settings::Value;
    use elsepa::engine::config::{Backend, DATA_PROBE_FILE, ELSCATA_BINARY};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn settings_args(config: &Path, set_values: &[&str]) -> SettingsArgs {
        SettingsArgs {
            config: config.to_path_buf(),
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn run_args(config: &Path) -> RunArgs {
        RunArgs {
            settings: settings_args(config, &[]),
            output_dir: None,
            elsepa_dir: None,
            data_dir: None,
            image: None,
        }
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path
    }

    fn install_elsepa(dir: &Path) {
        fs::write(dir.join(ELSCATA_BINARY), b"").unwrap();
        fs::write(dir.join(DATA_PROBE_FILE), b"").unwrap();
    }

    #[test]
    fn settings_are_read_and_overridden() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [settings]
            IZ = 79
            EV = ["100 eV"]
            "#,
        );
        let args = settings_args(&path, &["IZ=80", "MUFFIN=1", r#"RMUF="1e-8 cm""#]);

        let (settings, runner) = load_settings(&args).unwrap();

        assert_eq!(settings.value("IZ"), Some(&Value::Integer(80)));
        assert_eq!(settings.value("MUFFIN"), Some(&Value::Integer(1)));
        assert_eq!(settings.value("RMUF"), Some(&Value::Text("1e-8 cm".into())));
        assert_eq!(
            settings.value("EV"),
            Some(&Value::List(vec![Value::from("100 eV")]))
        );
        assert_eq!(runner, FileRunnerConfig::default());
    }

    #[test]
    fn malformed_set_value_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let err = load_settings(&settings_args(&path, &["IZ"])).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn local_backend_uses_directories_from_the_file() {
        let dir = tempdir().unwrap();
        install_elsepa(dir.path());
        let path = write_config(
            dir.path(),
            r#"
            [runner]
            elsepa-dir = "."
            data-dir = "."
            output-dir = "results"
            "#,
        );

        let app = build_config(&run_args(&path)).unwrap();

        assert_eq!(
            app.run_config.backend,
            Backend::Local {
                binary: dir.path().join(".").join(ELSCATA_BINARY),
                data_dir: dir.path().join("."),
            }
        );
        assert_eq!(app.run_config.output_dir, Some(dir.path().join("results")));
    }

    #[test]
    fn cli_flags_override_the_file() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [runner]
            image = "elsepa:old"
            container-engine = "podman"
            output-dir = "from-file"
            "#,
        );
        let mut args = run_args(&path);
        args.image = Some("elsepa:new".into());
        args.output_dir = Some(PathBuf::from("/tmp/from-cli"));

        let app = build_config(&args).unwrap();

        assert_eq!(
            app.run_config.backend,
            Backend::Container {
                image: "elsepa:new".into(),
                working_dir: DefaultsConfig::default().container_working_dir,
                command: ELSCATA_BINARY.into(),
                engine: "podman".into(),
            }
        );
        assert_eq!(app.run_config.output_dir, Some(PathBuf::from("/tmp/from-cli")));
    }

    #[test]
    fn missing_binary_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let mut args = run_args(&path);
        args.elsepa_dir = Some(dir.path().to_path_buf());
        args.data_dir = Some(dir.path().to_path_buf());
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }
}
