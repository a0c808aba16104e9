use std::{
    env,
    fmt::{self, Display},
    sync::Arc,
};

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::error::QueryError;

#[derive(Debug)]
pub struct ConfigError {
    info: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.info)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: Arc<[u8]>,
    pub session_lifetime_hours: i64,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment after loading an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            log::debug!("> No .env file found");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError {
                    info: format!("{key} is not set"),
                })
        };
        let number = |key: &str, default: i64| match lookup(key) {
            Some(value) => value.parse::<i64>().map_err(|_| ConfigError {
                info: format!("{key} must be an integer"),
            }),
            None => Ok(default),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: lookup("REDIS_URL").filter(|value| !value.is_empty()),
            jwt_secret: Arc::from(required("JWT_SECRET")?.into_bytes()),
            session_lifetime_hours: number("SESSION_LIFETIME_HOURS", 24)?,
            max_connections: number("DATABASE_MAX_CONNECTIONS", 5)?.clamp(1, 100) as u32,
        })
    }

    pub async fn connect(&self) -> Result<Pool<Postgres>, potion::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(QueryError::from)?;

        log::info!("Connected to database");
        Ok(pool)
    }

    pub async fn connect_cache(
        &self,
    ) -> Result<Option<redis::aio::MultiplexedConnection>, potion::Error> {
        let Some(url) = &self.redis_url else {
            return Ok(None);
        };

        let client = redis::Client::open(url.as_str()).map_err(crate::error::CacheError::from)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(crate::error::CacheError::from)?;

        log::info!("Connected to cache");
        Ok(Some(connection))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_to_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.session_lifetime_hours, 24);
        assert_eq!(config.redis_url, None);
        assert_eq!(&*config.jwt_secret, b"secret");
    }

    #[test]
    fn missing_or_malformed_values_fail() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "secret")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("JWT_SECRET", "secret"),
            ("SESSION_LIFETIME_HOURS", "soon"),
        ]))
        .is_err());
    }
}
