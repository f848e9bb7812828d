use elsepa::engine::config::{
    DEFAULT_CONTAINER_ENGINE, DEFAULT_CONTAINER_WORKING_DIR, ELSCATA_BINARY,
};

pub struct DefaultsConfig {
    pub container_working_dir: String,
    pub container_command: String,
    pub container_engine: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            container_working_dir: DEFAULT_CONTAINER_WORKING_DIR.to_string(),
            container_command: ELSCATA_BINARY.to_string(),
            container_engine: DEFAULT_CONTAINER_ENGINE.to_string(),
        }
    }
}
