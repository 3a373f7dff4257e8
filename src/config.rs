use std::env::var;
use std::fs::read_to_string;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use toml::from_str;

use crate::data_path_from_env;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub data_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub request_limit: usize,
    pub session_lifetime_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5003)),
            request_limit: 32,
            session_lifetime_secs: 3600,
        }
    }
}

impl Config {
    /// Reads `contacts.toml` from the data directory if present and applies
    /// the `BIND_ADDR` and `REQUEST_LIMIT` environment overrides.
    pub fn from_env() -> Result<Self> {
        let data_path = data_path_from_env().unwrap_or_else(|| Self::default().data_path);

        let mut config = Self::read(&data_path)?;

        if let Ok(bind_addr) = var("BIND_ADDR") {
            config.bind_addr = bind_addr
                .parse()
                .context("Environment variable BIND_ADDR invalid")?;
        }

        if let Ok(request_limit) = var("REQUEST_LIMIT") {
            config.request_limit = request_limit
                .parse()
                .context("Environment variable REQUEST_LIMIT invalid")?;
        }

        Ok(config)
    }

    pub fn read(data_path: &Path) -> Result<Self> {
        let path = data_path.join("contacts.toml");

        let mut config = match read_to_string(&path) {
            Ok(contents) => from_str::<Self>(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err).with_context(|| format!("Failed to read {}", path.display())),
        };

        config.data_path = data_path.to_owned();

        Ok(config)
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }
}
