use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The configuration file: how to run the program and what to feed it.
///
/// ```toml
/// [runner]
/// elsepa-dir = "/opt/elsepa"
/// data-dir = "/opt/elsepa/data"
///
/// [settings]
/// IZ = 79
/// EV = ["100 eV", "1 keV"]
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub runner: FileRunnerConfig,
    #[serde(default)]
    pub settings: toml::Table,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRunnerConfig {
    pub elsepa_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub image: Option<String>,
    pub container_working_dir: Option<String>,
    pub container_command: Option<String>,
    pub container_engine: Option<String>,
}

impl FileConfig {
    /// Reads the file. Relative runner paths are taken relative to the
    /// directory holding the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {:?}", path);
        let text = std::fs::read_to_string(path).map_err(|e| CliError::parsing(path, e))?;
        let mut config: FileConfig =
            toml::from_str(&text).map_err(|e| CliError::parsing(path, e))?;

        let base = path.parent().unwrap_or(Path::new(""));
        let runner = &mut config.runner;
        for dir in [
            &mut runner.elsepa_dir,
            &mut runner.data_dir,
            &mut runner.output_dir,
        ]
        .into_iter()
        .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }
}
