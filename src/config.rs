//! Host configuration and server topology.
//!
//! The host hands over either a single `server` or a `replicaSet` with a list
//! of `servers`. Validation happens once, at construction, and never touches
//! the network.

use crate::errors::DbError;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PORT: u16 = 27017;

/// One server entry as the host supplies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Raw configuration object, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub replica_set: Option<String>,
    #[serde(default)]
    pub servers: Option<Vec<ServerConfig>>,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub auth_source: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DataSourceConfig {
    /// # Errors
    /// Returns an error if the host value does not have the configuration shape.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, DbError> {
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    /// Returns an error if the string is not valid configuration JSON.
    pub fn from_json_str(json: &str) -> Result<Self, DbError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    /// Returns an error if the string is not valid configuration TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(s)?)
    }
}

// Hosts frequently pass ports as strings ("27027").
fn port_from_number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u16>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Num(u16),
        Str(String),
    }
    match Option::<Port>::deserialize(d)? {
        None => Ok(None),
        Some(Port::Num(n)) => Ok(Some(n)),
        Some(Port::Str(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    // Both halves must be present and non-empty to count as credentials.
    fn pair(username: Option<&String>, password: Option<&String>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
                Some(Self { username: u.clone(), password: p.clone() })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
}

/// Validated, immutable server topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTopology {
    Single {
        server: ServerAddress,
    },
    ReplicaSet {
        servers: Vec<ServerAddress>,
        name: String,
        ssl: bool,
        auth_source: Option<String>,
        shared_credentials: Option<Credentials>,
    },
}

fn server_address(cfg: &ServerConfig, missing: &str) -> Result<ServerAddress, DbError> {
    let host = cfg
        .host
        .as_ref()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DbError::Config(missing.to_string()))?;
    Ok(ServerAddress {
        host: host.clone(),
        port: cfg.port.unwrap_or(DEFAULT_PORT),
        credentials: Credentials::pair(cfg.username.as_ref(), cfg.password.as_ref()),
    })
}

impl TryFrom<DataSourceConfig> for ServerTopology {
    type Error = DbError;

    fn try_from(cfg: DataSourceConfig) -> Result<Self, Self::Error> {
        let shared = Credentials::pair(cfg.username.as_ref(), cfg.password.as_ref());
        if let Some(name) = cfg.replica_set.filter(|n| !n.is_empty()) {
            let servers = cfg.servers.filter(|s| !s.is_empty()).ok_or_else(|| {
                DbError::Config("need a non-empty \"servers\" list if \"replicaSet\" is set".into())
            })?;
            let servers = servers
                .iter()
                .map(|s| server_address(s, "missing \"host\" in servers"))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::ReplicaSet {
                servers,
                name,
                ssl: cfg.ssl,
                auth_source: cfg.auth_source.filter(|a| !a.is_empty()),
                shared_credentials: shared,
            });
        }
        let server = cfg.server.ok_or_else(|| DbError::Config("missing \"server\"".into()))?;
        let mut server = server_address(&server, "missing \"host\" property in server")?;
        // single-server mode only knows the top-level credentials
        server.credentials = shared;
        Ok(Self::Single { server })
    }
}
