//! Service configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `SERVICE_NAME` | `documents` |
//! | `NODE_ENV` | `local` (namespace becomes `orchestra-<env>`) |
//! | `EVENT_CHANNEL_CAPACITY` | `1024` |
//! | `MONGODB_URL` | built from `MONGODB_HOST`, `MONGODB_PORT`, `MONGODB_DATABASE` |

use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_SERVICE_NAME: &str = "documents";
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Everything needed to stand up a document service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub service_name: String,
    pub namespace: String,
    /// `<service_name>-<uuid>`, unique per process.
    pub node_id: String,
    pub event_capacity: usize,
    pub store_uri: String,
}

impl ServiceConfig {
    /// Build from an arbitrary key lookup. Unset and empty values fall back
    /// to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let service_name = get("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());
        let namespace = format!(
            "orchestra-{}",
            get("NODE_ENV").unwrap_or_else(|| "local".to_string())
        );
        let node_id = format!("{}-{}", service_name, Uuid::new_v4());

        let event_capacity = match get("EVENT_CHANNEL_CAPACITY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("EVENT_CHANNEL_CAPACITY", raw)),
            },
            None => DEFAULT_EVENT_CAPACITY,
        };

        let store_uri = match get("MONGODB_URL") {
            Some(url) => url,
            None => {
                let host = get("MONGODB_HOST").unwrap_or_else(|| "mongodb".to_string());
                let port = match get("MONGODB_PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .map_err(|_| invalid("MONGODB_PORT", raw))?,
                    None => 27017,
                };
                let database = get("MONGODB_DATABASE").unwrap_or_else(|| "octopus".to_string());
                format!("mongodb://{}:{}/{}", host, port, database)
            }
        };

        Ok(Self {
            service_name,
            namespace,
            node_id,
            event_capacity,
            store_uri,
        })
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a `.env` file if one exists, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "failed to read .env file");
            }
        }
        Self::from_env()
    }
}

fn invalid(key: &str, value: String) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value,
    }
}
