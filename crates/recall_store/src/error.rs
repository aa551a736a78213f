// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store and memoization operations.
//!
//! Every backend translates its native failures (I/O, malformed documents, protocol errors)
//! into a [`ClientError`] at the backend boundary. Callers therefore only ever match on
//! [`Error::Client`] regardless of which backend raised it, and can still find out which
//! backend failed through [`ClientError::backend`].

use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error from a store, namespace or memoization operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A backend endpoint string is not of the form `host[:port]`.
    #[error("`{host}` is not a valid host, expected `host[:port]`")]
    HostFormat {
        /// The rejected endpoint string.
        host: String,
    },

    /// Parameters that cannot be combined were supplied together.
    #[error("invalid parameters: {0}")]
    Parameter(&'static str),

    /// A namespace was empty or used the reserved default value.
    #[error("namespace `{namespace}` is empty or reserved, an explicit namespace must be chosen")]
    Namespace {
        /// The rejected namespace.
        namespace: String,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid key pattern `{pattern}`")]
    Pattern {
        /// The rejected pattern.
        pattern: String,
        /// The underlying compilation failure.
        #[source]
        source: regex::Error,
    },

    /// A storage backend failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Call arguments or a result could not be encoded or decoded.
    #[error("codec failure")]
    Codec(#[source] BoxError),
}

impl Error {
    /// Wraps a serialization failure.
    pub fn codec(cause: impl Into<BoxError>) -> Self {
        Self::Codec(cause.into())
    }

    /// Returns the client error if this error was raised by a backend.
    #[must_use]
    pub fn as_client(&self) -> Option<&ClientError> {
        match self {
            Self::Client(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The backend family a [`ClientError`] originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Backend {
    /// The in-process map backend.
    Memory,
    /// The filesystem backend.
    File,
    /// The remote key-value backend.
    Remote,
    /// The fan-out dispatcher.
    Dispatcher,
    /// The recording mock used in tests.
    Mock,
}

impl Backend {
    /// Returns a short, stable name for the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Remote => "remote",
            Self::Dispatcher => "dispatcher",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category of a backend failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ClientErrorKind {
    /// Reading or writing the underlying medium failed.
    Io,
    /// A stored document could not be parsed.
    MalformedDocument,
    /// The remote store rejected a request or answered unexpectedly.
    Protocol,
    /// An increment targeted a value that is not an integer.
    NotAnInteger,
    /// The backend was constructed from an unusable configuration.
    InvalidConfiguration,
}

impl ClientErrorKind {
    /// Returns a short, stable name for the failure category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::MalformedDocument => "malformed document",
            Self::Protocol => "protocol",
            Self::NotAnInteger => "not an integer",
            Self::InvalidConfiguration => "invalid configuration",
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised by a storage backend.
///
/// # Example
///
/// ```
/// use recall_store::{Backend, ClientError, ClientErrorKind, Error};
///
/// let error: Error = ClientError::new(Backend::File, ClientErrorKind::Io, "disk full").into();
/// let client = error.as_client().expect("client error");
/// assert_eq!(client.backend(), Backend::File);
/// assert_eq!(client.kind(), ClientErrorKind::Io);
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{backend} store error ({kind}): {message}")]
pub struct ClientError {
    backend: Backend,
    kind: ClientErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ClientError {
    /// Creates a client error without an underlying cause.
    pub fn new(backend: Backend, kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            backend,
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a client error that wraps a backend-native error.
    pub fn caused_by(backend: Backend, kind: ClientErrorKind, message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            backend,
            kind,
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Returns the backend that raised this error.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Returns the failure category.
    #[must_use]
    pub fn kind(&self) -> ClientErrorKind {
        self.kind
    }

    /// Returns the human readable description, without the cause.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
