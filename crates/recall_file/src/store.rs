// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Filesystem store implementation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use recall_store::{Backend, ClientError, ClientErrorKind, Pattern, Result, SetOptions, Store};
use xxhash_rust::xxh3::xxh3_64;

use crate::document::{Document, Record};

/// A store that persists entries as JSON documents under a root directory.
///
/// The root directory is created on the first write. Reads of a missing root behave like
/// an empty store. Concurrent writers to the same document may overwrite each other.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    /// Creates a store rooted at `cache` inside the system temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(std::env::temp_dir().join("cache"))
    }

    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the document that holds `key`.
    #[must_use]
    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{:016x}", xxh3_64(key.as_bytes())))
    }

    fn read_document(path: &Path) -> Result<Document> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(err) => return Err(io_error("failed to read", path, err)),
        };

        serde_json::from_slice(&raw).map_err(|err| {
            ClientError::caused_by(
                Backend::File,
                ClientErrorKind::MalformedDocument,
                format!("`{}` is not a valid cache document", path.display()),
                err,
            )
            .into()
        })
    }

    fn write_document(&self, path: &Path, document: &Document) -> Result<()> {
        if document.is_empty() {
            return match fs::remove_file(path) {
                Err(err) if err.kind() != ErrorKind::NotFound => Err(io_error("failed to remove", path, err)),
                _ => Ok(()),
            };
        }

        fs::create_dir_all(&self.root).map_err(|err| io_error("failed to create", &self.root, err))?;
        let raw = serde_json::to_vec(document).map_err(|err| {
            ClientError::caused_by(
                Backend::File,
                ClientErrorKind::MalformedDocument,
                format!("failed to encode `{}`", path.display()),
                err,
            )
        })?;
        fs::write(path, raw).map_err(|err| io_error("failed to write", path, err))
    }

    fn document_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error("failed to list", &self.root, err)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| io_error("failed to list", &self.root, err))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> recall_store::Error {
    ClientError::caused_by(Backend::File, ClientErrorKind::Io, format!("{action} `{}`", path.display()), err).into()
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.document_path(key);
        let mut document = Self::read_document(&path)?;
        let Some(record) = document.get(key) else {
            return Ok(None);
        };

        let entry = record.to_entry(key)?;
        if entry.is_expired() {
            document.remove(key);
            self.write_document(&path, &document)?;
            return Ok(None);
        }
        Ok(Some(entry.into_value()))
    }

    fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
        let condition = options.condition()?;
        let path = self.document_path(key);
        let mut document = Self::read_document(&path)?;

        let present = match document.get(key) {
            Some(record) => record.is_live(key)?,
            None => false,
        };
        if !condition.permits(present) {
            return Ok(false);
        }

        document.insert(key.to_string(), Record::new(value, options.ttl()));
        self.write_document(&path, &document)?;
        Ok(true)
    }

    fn delete(&self, keys: &[String]) -> Result<usize> {
        let mut deleted = 0;
        for key in keys {
            let path = self.document_path(key);
            let mut document = Self::read_document(&path)?;
            if document.remove(key.as_str()).is_some() {
                self.write_document(&path, &document)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = Pattern::new(pattern)?;
        let mut keys = Vec::new();
        for path in self.document_files()? {
            for (key, record) in Self::read_document(&path)? {
                if pattern.matches(&key) && record.is_live(&key)? {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn backend(&self) -> Backend {
        Backend::File
    }
}
