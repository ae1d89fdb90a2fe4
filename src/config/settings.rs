//! Server settings from environment variables (after `.env` via dotenvy).

use crate::error::ConfigError;
use regex::Regex;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/hydrus";
pub const DEFAULT_SCHEMA: &str = "hydrus";
pub const DEFAULT_API_NAME: &str = "api";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Schema holding the graph tables. Interpolated into DDL, so it must be a plain identifier.
    pub schema: String,
    pub store: StoreBackend,
    /// First path segment of every API route.
    pub api_name: String,
    pub bind: SocketAddr,
    /// Document imported at startup.
    pub doc_path: Option<PathBuf>,
    pub body_limit: usize,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or empty keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let schema = get("HYDRUS_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        check_pattern("HYDRUS_SCHEMA", &schema, r"^[a-z_][a-z0-9_]{0,62}$")?;

        let api_name = get("API_NAME").unwrap_or_else(|| DEFAULT_API_NAME.into());
        check_pattern("API_NAME", &api_name, r"^[A-Za-z0-9_-]{1,64}$")?;

        let store = match get("HYDRUS_STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "HYDRUS_STORE",
                    message: format!("expected 'postgres' or 'memory', got '{}'", other),
                })
            }
        };

        let bind_raw = get("HYDRUS_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind: SocketAddr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: "HYDRUS_BIND",
            message: format!("{}: {}", bind_raw, e),
        })?;

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            schema,
            store,
            api_name,
            bind,
            doc_path: get("HYDRUS_DOC").map(PathBuf::from),
            body_limit: parse_number(&get, "HYDRUS_BODY_LIMIT", DEFAULT_BODY_LIMIT)?,
            max_connections: parse_number(&get, "HYDRUS_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        })
    }
}

fn check_pattern(key: &'static str, value: &str, pattern: &str) -> Result<(), ConfigError> {
    let re = Regex::new(pattern).map_err(|e| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })?;
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            message: format!("'{}' does not match {}", value, pattern),
        })
    }
}

fn parse_number<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("{}: {}", raw, e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.schema, "hydrus");
        assert_eq!(s.store, StoreBackend::Postgres);
        assert_eq!(s.api_name, "api");
        assert_eq!(s.bind.port(), 8080);
        assert_eq!(s.body_limit, DEFAULT_BODY_LIMIT);
        assert!(s.doc_path.is_none());
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("HYDRUS_STORE", "memory"),
            ("API_NAME", "serverapi"),
            ("HYDRUS_BIND", "127.0.0.1:9000"),
            ("HYDRUS_DOC", "doc.jsonld"),
            ("HYDRUS_BODY_LIMIT", "2048"),
            ("HYDRUS_SCHEMA", ""),
        ])
        .unwrap();
        assert_eq!(s.store, StoreBackend::Memory);
        assert_eq!(s.api_name, "serverapi");
        assert_eq!(s.bind.to_string(), "127.0.0.1:9000");
        assert_eq!(s.doc_path, Some(PathBuf::from("doc.jsonld")));
        assert_eq!(s.body_limit, 2048);
        assert_eq!(s.schema, "hydrus");
    }

    #[test]
    fn rejects_unsafe_or_malformed_values() {
        assert!(settings(&[("HYDRUS_SCHEMA", "hydrus; DROP TABLE x")]).is_err());
        assert!(settings(&[("API_NAME", "a/b")]).is_err());
        assert!(settings(&[("HYDRUS_STORE", "sqlite")]).is_err());
        assert!(settings(&[("HYDRUS_BIND", "nowhere")]).is_err());
        assert!(settings(&[("HYDRUS_BODY_LIMIT", "lots")]).is_err());
    }
}
