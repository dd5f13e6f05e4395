use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tronnet::{Endpoint, PoolConfig};

use crate::{Result, SdkError};

/// Client configuration, YAML-deserializable. Durations are given in milliseconds.
///
/// ```yaml
/// endpoint: grpc://127.0.0.1:50051
/// timeout: 10000
/// init_conns: 1
/// max_conns: 4
/// ```
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `grpc://host:port` or `grpcs://host:port`
    #[serde(with = "serde_with::rust::display_fromstr")]
    pub endpoint: Endpoint,
    /// Deadline given to calls whose context has none.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    pub init_conns: usize,
    pub max_conns: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_idle: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub health_interval: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub dial_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let pool = PoolConfig::default();
        ClientConfig {
            endpoint: Endpoint {
                tls: false,
                host: "127.0.0.1".into(),
                port: 50051,
            },
            timeout: Duration::from_secs(10),
            init_conns: pool.init_conns,
            max_conns: pool.max_conns,
            max_idle: pool.max_idle,
            health_interval: pool.health_interval,
            dial_timeout: pool.dial_timeout,
        }
    }
}

impl ClientConfig {
    /// Default settings for `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Endpoint::parse(endpoint).map_err(|e| SdkError::validation("endpoint", e.to_string()))?;
        Ok(ClientConfig {
            endpoint,
            ..Default::default()
        })
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: ClientConfig =
            serde_yaml::from_str(yaml).context("error while parsing client config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("cannot read client config {:?}", path.as_ref()))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.init_conns == 0 {
            return Err(SdkError::validation("init_conns", "must be at least 1"));
        }
        if self.max_conns < self.init_conns {
            return Err(SdkError::validation(
                "max_conns",
                format!("{} is below init_conns {}", self.max_conns, self.init_conns),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SdkError::validation("timeout", "must be positive"));
        }
        if self.health_interval.is_zero() {
            return Err(SdkError::validation("health_interval", "must be positive"));
        }
        Ok(())
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            init_conns: self.init_conns,
            max_conns: self.max_conns,
            max_idle: self.max_idle,
            health_interval: self.health_interval,
            dial_timeout: self.dial_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        config.validate().unwrap();
        assert_eq!(config.init_conns, 1);
        assert_eq!(config.endpoint.to_string(), "grpc://127.0.0.1:50051");
    }

    #[test]
    fn yaml_overrides() {
        let config = ClientConfig::from_yaml_str(
            "endpoint: grpcs://grpc.trongrid.io:443\ntimeout: 2500\nmax_conns: 8\n",
        )
        .unwrap();
        assert!(config.endpoint.tls);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.max_conns, 8);
        assert_eq!(config.init_conns, 1);
    }

    #[test]
    fn bad_yaml_rejected() {
        assert!(ClientConfig::from_yaml_str("endpoint: http://localhost:80\n").is_err());
        assert!(ClientConfig::from_yaml_str("init_conns: 3\nmax_conns: 2\n").is_err());
        assert!(ClientConfig::from_yaml_str("init_conns: 0\n").is_err());
        assert!(matches!(
            ClientConfig::new("grpc://localhost"),
            Err(SdkError::Validation {
                field: "endpoint",
                ..
            })
        ));
    }
}
