use std::env;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_env")]
    pub env: String, // file / server
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub prefix: Option<String>,

    /// Externally reachable host[:port] used in download links
    pub access_address: String,

    /// Output root, served under `/tmp`
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Quiescence window that counts as network idle (milliseconds)
    #[serde(default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Upper bound on a single network-idle wait; unset waits forever
    pub idle_timeout_ms: Option<u64>,

    pub chrome_path: Option<String>,
}

fn default_env() -> String {
    "file".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_output_dir() -> String {
    "tmp".to_string()
}

fn default_network_idle_ms() -> u64 {
    500
}

impl Config {
    /// Config with defaults for everything except the access address.
    pub fn with_access_address(access_address: impl Into<String>) -> Self {
        Self {
            env: default_env(),
            host: default_host(),
            port: default_port(),
            prefix: None,
            access_address: access_address.into(),
            output_dir: default_output_dir(),
            network_idle_ms: default_network_idle_ms(),
            idle_timeout_ms: None,
            chrome_path: None,
        }
    }
}

pub fn get_config() -> Result<Config> {
    let env_var = env::var("env").unwrap_or("file".to_string());
    if env_var == "file" {
        info!("using .env file as environtment variable");
        let _ = dotenvy::dotenv();
    } else {
        info!("using server environtment as environtment variable");
    }
    envy::from_env::<Config>().context("invalid configuration (is ACCESS_ADDRESS set?)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_everything_but_address() {
        let vars = vec![("ACCESS_ADDRESS".to_string(), "10.0.0.2:8000".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.access_address, "10.0.0.2:8000");
        assert_eq!(config.port, 8000);
        assert_eq!(config.output_dir, "tmp");
        assert_eq!(config.network_idle_ms, 500);
        assert!(config.idle_timeout_ms.is_none());
    }

    #[test]
    fn missing_address_is_rejected() {
        let vars = vec![("PORT".to_string(), "9000".to_string())];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
