use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::QueryKind;
use crate::error::CensusError;
use crate::metadata::DEFAULT_METADATA_BASE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "census.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub metadata_base_url: Option<String>,
    #[serde(default)]
    pub snapshot_dir: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub supply: Option<SupplyConfig>,
    #[serde(default)]
    pub watch_list: Option<Vec<u64>>,
    #[serde(default)]
    pub lineage_checks: Option<Vec<u64>>,
    #[serde(default)]
    pub focus_generation: Option<String>,
    #[serde(default)]
    pub queries: Option<Vec<QueryKind>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SupplyConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyEndpoint {
    pub url: String,
    pub field: String,
    pub api_key_env: String,
}

impl SupplyEndpoint {
    pub fn api_key(&self) -> Result<String, CensusError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| CensusError::MissingApiKey(self.api_key_env.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub metadata_base_url: String,
    pub snapshot_dir: Utf8PathBuf,
    /// Per-request limit; `None` waits as long as the service does.
    pub timeout: Option<Duration>,
    pub supply: Option<SupplyEndpoint>,
    pub watch_list: Vec<u64>,
    pub lineage_checks: Vec<u64>,
    pub focus_generation: String,
    pub queries: Vec<QueryKind>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `census.json` when it exists, or the defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CensusError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CensusError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CensusError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let supply = config.supply.and_then(|supply| {
            supply.url.map(|url| SupplyEndpoint {
                url,
                field: supply.field.unwrap_or_else(|| "totalSupply".to_string()),
                api_key_env: supply
                    .api_key_env
                    .unwrap_or_else(|| "CENSUS_API_KEY".to_string()),
            })
        });

        ResolvedConfig {
            metadata_base_url: config
                .metadata_base_url
                .unwrap_or_else(|| DEFAULT_METADATA_BASE_URL.to_string()),
            snapshot_dir: Utf8PathBuf::from(config.snapshot_dir.unwrap_or_else(|| "SNAPS".to_string())),
            timeout: config.timeout_secs.map(Duration::from_secs),
            supply,
            watch_list: config.watch_list.unwrap_or_else(default_watch_list),
            lineage_checks: config.lineage_checks.unwrap_or_else(|| vec![2193]),
            focus_generation: config.focus_generation.unwrap_or_else(|| "2".to_string()),
            queries: config.queries.unwrap_or_else(default_queries),
        }
    }
}

pub fn default_queries() -> Vec<QueryKind> {
    vec![QueryKind::Population, QueryKind::HealthRisk]
}

/// Gen 2 one-of-one token ids.
pub fn default_watch_list() -> Vec<u64> {
    vec![
        2002, 2006, 2013, 2017, 2018, 2020, 2022, 2027, 2030, 2031, 2039, 2042, 2052, 2057, 2064,
        2078, 2093, 2097, 2105, 2121, 2124, 2126, 2131, 2146, 2155, 2165, 2167, 2168, 2184, 2187,
        2193, 2194, 2195, 2196, 2199, 2202, 2212, 2234, 2248, 2264, 2284, 2313, 2314, 2322, 2356,
        2360, 2385, 2394, 2417, 2424, 2522, 2530, 2554, 2640, 2755,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.metadata_base_url, DEFAULT_METADATA_BASE_URL);
        assert_eq!(resolved.snapshot_dir, Utf8PathBuf::from("SNAPS"));
        assert_eq!(resolved.timeout, None);
        assert_eq!(resolved.supply, None);
        assert_eq!(resolved.watch_list.len(), 55);
        assert_eq!(resolved.focus_generation, "2");
        assert_eq!(resolved.queries, default_queries());
    }

    #[test]
    fn timeout_only_when_configured() {
        let config: Config = serde_json::from_str(r#"{ "timeout_secs": 45 }"#).unwrap();
        assert_eq!(
            ConfigLoader::resolve_config(config).timeout,
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    fn supply_needs_a_url() {
        let config: Config = serde_json::from_str(r#"{ "supply": { "field": "result" } }"#).unwrap();
        assert_eq!(ConfigLoader::resolve_config(config).supply, None);
    }
}
