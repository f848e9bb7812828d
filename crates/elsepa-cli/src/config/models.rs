use elsepa::core::settings::Settings;
use elsepa::engine::config::RunConfig;

pub struct AppConfig {
    pub settings: Settings,
    pub run_config: RunConfig,
}
