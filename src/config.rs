use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use strum_macros::{AsRefStr, EnumString};

use crate::utils::email_filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is MySQL.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub run_migrations: bool,
    /// Load the demo users and requests into an empty store at startup.
    pub seed_demo_data: bool,

    pub api_prefix: String,
    // Rate limiting
    pub rate_per_min: u32,

    pub log_dir: String,
    pub user_cache_ttl: Duration,
    pub email_filter_capacity: usize,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store_backend: StoreBackend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Mysql)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if store_backend == StoreBackend::Mysql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=mysql");
        }

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            store_backend,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                5,
            )?),
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", false)?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_per_min: parse_or(&lookup, "RATE_PER_MIN", 1000)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            user_cache_ttl: Duration::from_secs(parse_or(&lookup, "USER_CACHE_TTL_SECS", 3600)?),
            email_filter_capacity: parse_or(
                &lookup,
                "EMAIL_FILTER_CAPACITY",
                email_filter::DEFAULT_CAPACITY,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let config = config(&[("DATABASE_URL", "mysql://root@localhost/vacations")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Mysql);
        assert_eq!(config.server_addr, "127.0.0.1:3000");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_per_min, 1000);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(5));
        assert!(config.run_migrations);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn mysql_requires_database_url() {
        assert!(config(&[]).is_err());
        let memory = config(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(memory.store_backend, StoreBackend::Memory);
        assert!(memory.database_url.is_none());

        let seeded = config(&[("STORE_BACKEND", "memory"), ("SEED_DEMO_DATA", "true")]).unwrap();
        assert!(seeded.seed_demo_data);
    }

    #[test]
    fn bad_numbers_are_errors() {
        let err = config(&[("STORE_BACKEND", "memory"), ("RATE_PER_MIN", "lots")]).unwrap_err();
        assert!(err.to_string().contains("RATE_PER_MIN"));
        assert!(config(&[("STORE_BACKEND", "postgres")]).is_err());
    }
}
