// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use recall_store::Error;

/// The port used when a host string names none.
pub const DEFAULT_PORT: u16 = 6379;

/// A remote endpoint in `host[:port]` form.
///
/// ```
/// use recall_redis::Host;
///
/// let host: Host = "cache.internal:7000".parse()?;
/// assert_eq!(host.name(), "cache.internal");
/// assert_eq!(host.port(), 7000);
///
/// let host: Host = "localhost".parse()?;
/// assert_eq!(host.port(), 6379);
///
/// assert!("a:b:c".parse::<Host>().is_err());
/// # Ok::<(), recall_store::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
    name: String,
    port: u16,
}

impl Host {
    /// Creates a host from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self { name: name.into(), port }
    }

    /// Returns the host name or address.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Host {
    type Err = Error;

    fn from_str(host: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::HostFormat { host: host.to_string() };

        let (name, port) = match host.split_once(':') {
            None => (host, DEFAULT_PORT),
            Some((_, port)) if port.contains(':') => return Err(malformed()),
            Some((name, port)) => (name, port.parse().ok().ok_or_else(malformed)?),
        };

        if name.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(name, port))
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}
