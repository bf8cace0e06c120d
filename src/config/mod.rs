use serde::Deserialize;
use std::env;

use ::config::{ConfigError, Environment};

use crate::seating::SeatingPolicy;

// Главная структура конфигурации
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub seating: SeatingPolicy,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// JSON lines instead of human-readable log output.
    pub json_logs: bool,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl Config {
    /// Reads `APP__*`, `DATABASE__*` and `SEATING__*` variables on top of the
    /// defaults. `DATABASE_URL`, `PORT` and `RUST_LOG` win when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    fn load(source: Environment) -> Result<Self, ConfigError> {
        ::config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000_i64)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "guest_seating=debug,tower_http=debug")?
            .set_default("app.json_logs", false)?
            .set_default("database.pool_size", 20_i64)?
            .set_default("seating.require_confirmed", true)?
            .add_source(source.separator("__").try_parsing(true))
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("app.port", env::var("PORT").ok())?
            .set_override_option("app.rust_log", env::var("RUST_LOG").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn seating_policy_is_read_from_environment() {
        let config = Config::load(source(&[
            ("DATABASE__URL", "postgres://localhost/seating"),
            ("DATABASE__POOL_SIZE", "7"),
            ("SEATING__REQUIRE_CONFIRMED", "false"),
        ]))
        .unwrap();

        assert!(!config.seating.require_confirmed);
        assert_eq!(config.database.pool_size, 7);
    }

    #[test]
    fn defaults_require_confirmed_guests() {
        let config = Config::load(source(&[("DATABASE__URL", "postgres://localhost/seating")])).unwrap();

        assert!(config.seating.require_confirmed);
        assert_eq!(config.app.host, "0.0.0.0");
        assert!(!config.is_production());
    }
}
