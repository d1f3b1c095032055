use crate::coincap::client::DEFAULT_BASE_URL;
use crate::view::filters::Filters;
use serde::Deserialize;
use std::error;
use std::fmt;
use std::io;
use tokio::fs;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String, // CoinCap REST endpoint, collections are appended to it
    pub limit: Option<u32>, // Number of assets per fetch, CoinCap's own default when absent
    pub currency: Option<String>, // Fiat symbol to switch to once rates are loaded
    pub filters: Filters, // Initial column toggles
    pub page_size: usize, // Rows shown per page
    pub top_threshold: usize, // Row offset from which the "top" hint is shown
    pub color: bool, // Colour 24h changes with ANSI escapes
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            limit: None,
            currency: None,
            filters: Filters::default(),
            page_size: 25,
            top_threshold: 20,
            color: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read(io::Error),
    JsonParse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::Read(ref err) => write!(f, "Config Read Error: {}", err),
            ConfigError::JsonParse(ref err) => write!(f, "Config Parse Error: {}", err),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ConfigError::Read(ref err) => Some(err),
            ConfigError::JsonParse(ref err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> ConfigError {
        ConfigError::Read(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::JsonParse(err)
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Reads the config file. A missing file yields the defaults.
pub async fn read_config(file_path: &str) -> Result<Option<Config>, ConfigError> {
    let config_string = match fs::read_to_string(file_path).await {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(Config::from_json(config_string.as_str())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(Config::default(), Config::from_json("{}").unwrap());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_json(
            r#"{
                "base_url": "http://localhost:9000/v2/",
                "limit": 50,
                "currency": "EUR",
                "filters": { "volumes": true },
                "color": false
            }"#,
        )
        .unwrap();

        assert_eq!("http://localhost:9000/v2/", config.base_url);
        assert_eq!(Some(50), config.limit);
        assert_eq!(Some("EUR".to_string()), config.currency);
        assert!(config.filters.volumes);
        assert!(config.filters.changes);
        assert_eq!(25, config.page_size);
        assert!(!config.color);
    }

    #[test]
    fn test_malformed_config() {
        let err = Config::from_json(r#"{"limit": "many"}"#).unwrap_err();
        assert!(format!("{}", err).starts_with("Config Parse Error: "));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_an_error() {
        let result = read_config("/nonexistent/koin-cek/app_config.json").await.unwrap();
        assert!(result.is_none());
    }
}
