use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_INDEX_CACHE_SECONDS: u64 = 20;

/// Runtime settings, read from the environment (and `.env` through dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub media_root: PathBuf,
    pub bind_address: SocketAddr,
    pub index_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MEDIA_ROOT));
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned())
            .parse()
            .context("BIND_ADDRESS is not a valid socket address")?;
        let index_cache_ttl = match std::env::var("INDEX_CACHE_SECONDS") {
            Ok(value) => value
                .parse()
                .context("INDEX_CACHE_SECONDS must be a whole number of seconds")?,
            Err(_) => DEFAULT_INDEX_CACHE_SECONDS,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            media_root,
            bind_address,
            index_cache_ttl: Duration::from_secs(index_cache_ttl),
        })
    }
}
