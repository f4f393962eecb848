use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use std::fs;
use std::path::Path;
use tracing::info;

use rooster_application::error::{AppError, AppResult};
use rooster_application::infrastructure_config::Config;

const ENV_PREFIX: &str = "ROOSTER_";

pub fn load_config() -> AppResult<Config> {
    load_config_from(Path::new("."))
}

/// Defaults, then `config.toml`, `config.json` and `ROOSTER_*` variables
/// found relative to `dir`. Nested keys use `__`, e.g.
/// `ROOSTER_FIREBASE__API_KEY`.
pub fn load_config_from(dir: &Path) -> AppResult<Config> {
    generate_env_template_if_missing(dir)?;
    dotenvy::from_path(dir.join(".env")).ok();

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    let toml_file = dir.join("config.toml");
    if toml_file.exists() {
        figment = figment.merge(Toml::file(toml_file));
    }

    let json_file = dir.join("config.json");
    if json_file.exists() {
        figment = figment.merge(Json::file(json_file));
    }

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| AppError::ConfigError {
            message: format!("Failed to load configuration: {e}"),
        })?;

    config.validate()?;
    Ok(config)
}

fn generate_env_template_if_missing(dir: &Path) -> AppResult<()> {
    let env_file = dir.join(".env");
    let template_file = dir.join(".env.example");

    if env_file.exists() || !template_file.exists() {
        return Ok(());
    }

    fs::copy(&template_file, &env_file).map_err(|e| AppError::ConfigError {
        message: format!("Failed to generate .env file from template: {e}"),
    })?;

    info!("Generated .env from template. Fill in the backend keys before signing in.");
    Ok(())
}
