use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "CAREER";
pub const DEFAULT_DATA_SOURCE: &str = "data/data.json";
pub const DEFAULT_REPORT_ENDPOINT: &str = "http://localhost:3000/api/report";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// File path or http(s) url of the company dataset.
    pub data_source: String,
    pub db_path: String,
    pub report_endpoint: String,
}

impl Settings {
    /// Defaults overridden by `CAREER_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("data_source", DEFAULT_DATA_SOURCE)?
            .set_default("db_path", crate::db::DB_PATH)?
            .set_default("report_endpoint", DEFAULT_REPORT_ENDPOINT)?
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn defaults() {
        let s = Settings::from_env(env(&[])).unwrap();
        assert_eq!(s.data_source, DEFAULT_DATA_SOURCE);
        assert_eq!(s.db_path, "data/career_pages.sqlite");
        assert_eq!(s.report_endpoint, DEFAULT_REPORT_ENDPOINT);
    }

    #[test]
    fn environment_overrides() {
        let s = Settings::from_env(env(&[
            ("CAREER_DATA_SOURCE", "https://example.com/data.json"),
            ("CAREER_DB_PATH", "/tmp/bookmarks.sqlite"),
        ]))
        .unwrap();
        assert_eq!(s.data_source, "https://example.com/data.json");
        assert_eq!(s.db_path, "/tmp/bookmarks.sqlite");
        assert_eq!(s.report_endpoint, DEFAULT_REPORT_ENDPOINT);
    }
}
