use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Environment captured once at startup, after `.env` has been applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    values: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn from_env() -> Self {
        if let Err(error) = dotenvy::dotenv() {
            tracing::debug!(%error, "no .env file applied");
        }
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name)
            .map(str::to_string)
            .ok_or(ConfigError::Missing(name))
    }

    fn parsed_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name,
                value: raw.to_string(),
            }),
        }
    }

    /// Comma separated list; an absent variable yields an empty list.
    fn list<T: FromStr>(&self, name: &'static str) -> Result<Vec<T>, ConfigError> {
        let Some(raw) = self.get(name) else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse().map_err(|_| ConfigError::Invalid {
                    name,
                    value: item.to_string(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub host: String,
    pub port: u16,
    pub throttle_ttl: Duration,
    pub throttle_limit: u32,
    pub bootstrap_admin_email: Option<String>,
    /// Socket peers whose client-address headers are believed.
    pub trusted_proxies: Vec<IpAddr>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_snapshot(&ConfigSnapshot::from_env())
    }

    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self, ConfigError> {
        let mongodb_uri = snapshot.required("MONGODB_URI")?;
        let jwt_secret = snapshot.required("JWT_SECRET")?;
        let jwt_ttl_minutes = snapshot.parsed_or("JWT_TTL_MINUTES", 60)?;
        let host = snapshot.get("HOST").unwrap_or("0.0.0.0").to_string();
        let port = snapshot.parsed_or("PORT", 3000)?;
        let throttle_ttl_ms: u64 = snapshot.parsed_or("THROTTLE_TTL_MS", 60_000)?;
        let throttle_limit = snapshot.parsed_or("THROTTLE_LIMIT", 30)?;
        let bootstrap_admin_email = snapshot.get("BOOTSTRAP_ADMIN_EMAIL").map(str::to_string);
        let trusted_proxies = snapshot.list("TRUSTED_PROXIES")?;

        Ok(Self {
            mongodb_uri,
            jwt_secret,
            jwt_ttl_minutes,
            host,
            port,
            throttle_ttl: Duration::from_millis(throttle_ttl_ms),
            throttle_limit,
            bootstrap_admin_email,
            trusted_proxies,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
