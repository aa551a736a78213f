// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Redis store implementation.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use recall_store::{Backend, ClientError, ClientErrorKind, Result, SetOptions, Store, WriteCondition};
use redis::{Connection, RedisError};

use crate::Host;

/// A store backed by a Redis server.
///
/// Calls are serialized over a single blocking connection. Keys are matched with the
/// server's own glob syntax, which accepts the same patterns as the other backends.
pub struct RedisStore {
    host: Host,
    connection: Mutex<Connection>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").field("host", &self.host).finish_non_exhaustive()
    }
}

/// Builder for [`RedisStore`].
#[derive(Debug, Clone)]
pub struct RedisStoreBuilder {
    host: Host,
    timeout: Option<Duration>,
}

impl RedisStoreBuilder {
    /// Sets the connect, read and write timeout of the connection.
    ///
    /// An expired timeout surfaces as an [`ClientErrorKind::Io`] client error.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Opens the connection.
    ///
    /// # Errors
    ///
    /// Returns a client error if the server cannot be reached.
    pub fn connect(self) -> Result<RedisStore> {
        let client = redis::Client::open((self.host.name(), self.host.port())).map_err(translate)?;
        let connection = match self.timeout {
            Some(timeout) => {
                let connection = client.get_connection_with_timeout(timeout).map_err(translate)?;
                connection.set_read_timeout(Some(timeout)).map_err(translate)?;
                connection.set_write_timeout(Some(timeout)).map_err(translate)?;
                connection
            }
            None => client.get_connection().map_err(translate)?,
        };

        tracing::debug!(host = %self.host, timeout = ?self.timeout, "connected to remote store");
        Ok(RedisStore {
            host: self.host,
            connection: Mutex::new(connection),
        })
    }
}

impl RedisStore {
    /// Starts building a store for `host`.
    #[must_use]
    pub fn builder(host: Host) -> RedisStoreBuilder {
        RedisStoreBuilder { host, timeout: None }
    }

    /// Connects to `host` without a timeout.
    ///
    /// # Errors
    ///
    /// Returns a client error if the server cannot be reached.
    pub fn connect(host: Host) -> Result<Self> {
        Self::builder(host).connect()
    }

    /// Returns the server this store talks to.
    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    fn query<T: redis::FromRedisValue>(&self, command: &redis::Cmd) -> Result<T> {
        let mut connection = self.connection.lock();
        command.query(&mut *connection).map_err(translate)
    }
}

/// Translates a native failure into the shared error taxonomy.
fn translate(err: RedisError) -> recall_store::Error {
    let kind = if err.is_io_error() || err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal() {
        ClientErrorKind::Io
    } else if err.to_string().contains("not an integer") {
        ClientErrorKind::NotAnInteger
    } else {
        ClientErrorKind::Protocol
    };
    ClientError::caused_by(Backend::Remote, kind, err.to_string(), err).into()
}

fn expiry_millis(ttl: Duration) -> u64 {
    // PX rejects zero.
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl Store for RedisStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("GET").arg(key))
    }

    fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
        let condition = options.condition()?;

        let mut command = redis::cmd("SET");
        command.arg(key).arg(value);
        if let Some(ttl) = options.ttl() {
            command.arg("PX").arg(expiry_millis(ttl));
        }
        match condition {
            WriteCondition::Always => {}
            WriteCondition::IfAbsent => {
                command.arg("NX");
            }
            WriteCondition::IfPresent => {
                command.arg("XX");
            }
        }

        // A skipped conditional write answers nil.
        let reply: Option<String> = self.query(&command)?;
        Ok(reply.is_some())
    }

    fn delete(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.query(redis::cmd("DEL").arg(keys))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.query(redis::cmd("KEYS").arg(pattern))
    }

    fn backend(&self) -> Backend {
        Backend::Remote
    }

    fn increase(&self, key: &str, amount: i64) -> Result<String> {
        let value: i64 = self.query(redis::cmd("INCRBY").arg(key).arg(amount))?;
        Ok(value.to_string())
    }

    fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.query(redis::cmd("MGET").arg(keys))
    }
}
