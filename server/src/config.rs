//! Server Configuration
//!
//! Read once at startup from `CONTAG_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_IDENTITY_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var} must be true or false, got {value}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub identity_url: String,
    pub identity_api_key: Option<String>,
    /// Accept `dev:<email>` bearer tokens
    pub dev_auth: bool,
    pub file_access_url: Option<String>,
    pub allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = var("CONTAG_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:4000".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidAddr {
            var: "CONTAG_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let dev_auth = match var("CONTAG_DEV_AUTH").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidBool {
                    var: "CONTAG_DEV_AUTH",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            db_path: PathBuf::from(var("CONTAG_DB_PATH").unwrap_or_else(|| "contag.db".to_string())),
            bind_addr,
            identity_url: var("CONTAG_IDENTITY_URL").unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string()),
            identity_api_key: var("CONTAG_IDENTITY_API_KEY"),
            dev_auth,
            file_access_url: var("CONTAG_FILE_ACCESS_URL"),
            allowed_origin: var("CONTAG_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }

    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let defaults = config(&[]).unwrap();
        assert_eq!(defaults.bind_addr.port(), 4000);
        assert_eq!(defaults.db_path, PathBuf::from("contag.db"));
        assert_eq!(defaults.identity_url, DEFAULT_IDENTITY_URL);
        assert!(!defaults.dev_auth);
        assert!(defaults.file_access_url.is_none());
    }

    #[test]
    fn test_overrides_and_errors() {
        let dev = config(&[("CONTAG_DEV_AUTH", "true"), ("CONTAG_DB_PATH", ":memory:")]).unwrap();
        assert!(dev.dev_auth);
        assert!(dev.in_memory());

        assert!(matches!(
            config(&[("CONTAG_BIND_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddr { .. })
        ));
        assert!(matches!(
            config(&[("CONTAG_DEV_AUTH", "maybe")]),
            Err(ConfigError::InvalidBool { .. })
        ));
    }
}
