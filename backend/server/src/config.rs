use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub request_timeout: Duration,
    pub store_backend: StoreBackend,
}

impl Config {
    pub fn load() -> Result<Self, ServerError> {
        Ok(Self {
            port: try_load("PORT", "8000")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            request_timeout: Duration::from_secs(try_load("REQUEST_TIMEOUT_SECS", "10")?),
            store_backend: try_load("STORE_BACKEND", "redis")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ServerError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ServerError::Config {
                key,
                message: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("redis".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_try_load_default() {
        let port: u16 = try_load("CALORIES_TEST_UNSET_PORT", "8000").unwrap();
        assert_eq!(port, 8000);
    }

    #[test]
    fn test_try_load_bad_default() {
        let result: Result<u16, _> = try_load("CALORIES_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(
            result,
            Err(ServerError::Config {
                key: "CALORIES_TEST_UNSET_PORT",
                ..
            })
        ));
    }
}
