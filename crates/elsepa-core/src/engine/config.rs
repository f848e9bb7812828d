use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ELSCATA_BINARY: &str = "elscata";
pub const DATA_DIR_ENV: &str = "ELSEPA_DATA";
/// A file every ELSEPA data directory contains.
pub const DATA_PROBE_FILE: &str = "z_001.den";

pub const DEFAULT_CONTAINER_WORKING_DIR: &str = "/tmp/elsepa";
pub const DEFAULT_CONTAINER_ENGINE: &str = "docker";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unable to find the elscata binary at '{0}'")]
    BinaryNotFound(String),

    #[error("Unable to find elscata on PATH")]
    BinaryNotOnPath,

    #[error("Unable to find the ELSEPA data directory: '{0}' does not contain {DATA_PROBE_FILE}")]
    DataDirNotFound(String),
}

/// Where and how the program is run.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    /// A binary on this machine, with `ELSEPA_DATA` pointing at `data_dir`.
    Local { binary: PathBuf, data_dir: PathBuf },
    /// A container image that has the program and its data installed.
    Container {
        image: String,
        working_dir: String,
        command: String,
        engine: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub backend: Backend,
    /// Where the raw `.dat` files are copied after a run, if anywhere.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    binary: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    image: Option<String>,
    container_working_dir: Option<String>,
    container_command: Option<String>,
    container_engine: Option<String>,
    output_dir: Option<PathBuf>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, path: PathBuf) -> Self {
        self.binary = Some(path);
        self
    }
    pub fn data_dir(mut self, path: PathBuf) -> Self {
        self.data_dir = Some(path);
        self
    }
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
    pub fn container_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.container_working_dir = Some(dir.into());
        self
    }
    pub fn container_command(mut self, command: impl Into<String>) -> Self {
        self.container_command = Some(command.into());
        self
    }
    pub fn container_engine(mut self, engine: impl Into<String>) -> Self {
        self.container_engine = Some(engine.into());
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }

    /// Finds the binary and the data directory for a local run.
    ///
    /// The binary is `elsepa_dir/elscata` when a directory is given and is
    /// searched on `PATH` otherwise. The data directory is `data_dir` or, when
    /// absent, the value of `$ELSEPA_DATA`; it must contain `z_001.den`.
    pub fn locate(
        self,
        elsepa_dir: Option<&Path>,
        data_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let binary = match elsepa_dir {
            Some(dir) => {
                let candidate = dir.join(ELSCATA_BINARY);
                if !candidate.is_file() {
                    return Err(ConfigError::BinaryNotFound(
                        candidate.display().to_string(),
                    ));
                }
                candidate
            }
            None => find_on_path(ELSCATA_BINARY).ok_or(ConfigError::BinaryNotOnPath)?,
        };

        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => env::var_os(DATA_DIR_ENV)
                .map(PathBuf::from)
                .ok_or(ConfigError::MissingParameter("data_dir"))?,
        };
        if !data_dir.join(DATA_PROBE_FILE).is_file() {
            return Err(ConfigError::DataDirNotFound(data_dir.display().to_string()));
        }

        debug!(binary = %binary.display(), data_dir = %data_dir.display(), "Located elscata");
        Ok(self.binary(binary).data_dir(data_dir))
    }

    /// A container backend is chosen when an image was given.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let backend = match self.image {
            Some(image) => Backend::Container {
                image,
                working_dir: self
                    .container_working_dir
                    .unwrap_or_else(|| DEFAULT_CONTAINER_WORKING_DIR.to_string()),
                command: self
                    .container_command
                    .unwrap_or_else(|| ELSCATA_BINARY.to_string()),
                engine: self
                    .container_engine
                    .unwrap_or_else(|| DEFAULT_CONTAINER_ENGINE.to_string()),
            },
            None => Backend::Local {
                binary: self.binary.ok_or(ConfigError::MissingParameter("binary"))?,
                data_dir: self
                    .data_dir
                    .ok_or(ConfigError::MissingParameter("data_dir"))?,
            },
        };
        Ok(RunConfig {
            backend,
            output_dir: self.output_dir,
        })
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
