//! Runtime configuration, read from the environment (and `.env` outside tests).

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3050";
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(
            std::env::var("BIND_ADDRESS").ok(),
            std::env::var("DATA_DIR").ok(),
        )
    }

    fn from_vars(bind_address: Option<String>, data_dir: Option<String>) -> Result<Self, ConfigError> {
        let bind_address_str = bind_address.unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let data_dir = data_dir
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        Ok(Self { bind_address, data_dir })
    }
}
