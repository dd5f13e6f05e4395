use std::fmt;
use std::str::FromStr;

use crate::{NetError, Result};

/// A validated `grpc://host:port` or `grpcs://host:port` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub tls: bool,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || NetError::InvalidEndpoint(url.to_owned());
        let (tls, rest) = if let Some(rest) = url.strip_prefix("grpc://") {
            (false, rest)
        } else if let Some(rest) = url.strip_prefix("grpcs://") {
            (true, rest)
        } else {
            return Err(invalid());
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            // [v6 address]:port
            let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            (host, after.strip_prefix(':').ok_or_else(invalid)?)
        } else {
            rest.rsplit_once(':').ok_or_else(invalid)?
        };
        if host.is_empty() || host.contains(['/', '?', '#', '@']) {
            return Err(invalid());
        }
        let port: u16 = port.parse().map_err(|_| invalid())?;
        if port == 0 {
            return Err(invalid());
        }
        Ok(Endpoint {
            tls,
            host: host.to_owned(),
            port,
        })
    }

    /// `host:port`, suitable for socket address resolution.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "grpcs" } else { "grpc" };
        write!(f, "{}://{}", scheme, self.authority())
    }
}

impl FromStr for Endpoint {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
