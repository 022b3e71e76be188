use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 3000;

const ENV_PREFIX: &str = "BOOK_CATALOG";

/// Static configuration of a book-catalog client.
///
/// Loaded from `BOOK_CATALOG_URL` and `BOOK_CATALOG_READ_TIMEOUT_MS`,
/// every key falls back to its default when unset. The read timeout must be
/// greater than zero.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load(environment: config::Environment) -> anyhow::Result<Self> {
        let loaded: Self = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .context("Failed to read book catalog client configuration")?
            .try_deserialize()
            .context("Invalid book catalog client configuration")?;
        if loaded.read_timeout_ms == 0 {
            bail!("Book catalog client read timeout must be greater than zero");
        }
        Ok(loaded)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
