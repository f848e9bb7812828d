mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_config, load_settings};
pub use models::AppConfig;
