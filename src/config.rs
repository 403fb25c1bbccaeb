use anyhow::{Context, Result};
use std::{env, net::SocketAddr};
use tracing::{info, warn};

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` makes every proxy operation fail with "API Key not found".
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if tmdb_api_key.is_none() {
            warn!("TMDB_API_KEY is not set; movie endpoints will answer 500");
        }

        let tmdb_base_url = env::var("TMDB_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string());

        let bind_raw = env::var("BIND_ADDR").unwrap_or_else(|_| {
            info!("BIND_ADDR not set, using default: {DEFAULT_BIND_ADDR}");
            DEFAULT_BIND_ADDR.to_string()
        });
        let bind_addr = bind_raw
            .parse()
            .with_context(|| format!("Invalid BIND_ADDR value: {bind_raw}"))?;

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url,
            bind_addr,
        })
    }

    /// Fixture config for tests and tools that talk to a local upstream.
    pub fn with_key(api_key: Option<&str>, base_url: &str) -> Self {
        Self {
            tmdb_api_key: api_key.map(str::to_string),
            tmdb_base_url: base_url.trim_end_matches('/').to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}
