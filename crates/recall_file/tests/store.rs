// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `FileStore`.

use std::fs;
use std::thread;
use std::time::Duration;

use recall_file::FileStore;
use recall_store::{ClientError, ClientErrorKind, Error, Result, SetOptions, Store};
use tempfile::TempDir;

fn store() -> (TempDir, FileStore) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = FileStore::with_root(dir.path().join("cache"));
    (dir, store)
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn missing_root_reads_as_empty() -> Result<()> {
    let (_dir, store) = store();
    assert_eq!(store.get("k")?, None);
    assert!(store.keys("*")?.is_empty());
    assert_eq!(store.delete(&keys(&["k"]))?, 0);
    assert!(!store.root().exists());
    Ok(())
}

#[test]
fn set_creates_root_and_round_trips_bytes() -> Result<()> {
    let (_dir, store) = store();
    let binary = [0_u8, 159, 146, 150];

    assert!(store.set("text", b"hello", &SetOptions::new())?);
    assert!(store.set("binary", &binary, &SetOptions::new())?);

    assert!(store.root().is_dir());
    assert_eq!(store.get("text")?, Some(b"hello".to_vec()));
    assert_eq!(store.get("binary")?, Some(binary.to_vec()));
    Ok(())
}

#[test]
fn documents_are_readable_json() -> Result<()> {
    let (_dir, store) = store();
    store.set("text", b"hello", &SetOptions::new().with_ttl(Duration::from_secs(30)))?;

    let raw = fs::read(store.document_path("text")).expect("document should exist");
    let document: serde_json::Value = serde_json::from_slice(&raw).expect("document should be json");
    let record = &document["text"];
    assert_eq!(record[0], serde_json::json!("hello"));
    assert!(record[1].as_f64().is_some_and(|stored_at| stored_at > 0.0));
    assert_eq!(record[2], serde_json::json!(30.0));
    Ok(())
}

#[test]
fn expired_entries_are_removed_on_read() -> Result<()> {
    let (_dir, store) = store();
    store.set("short", b"v", &SetOptions::new().with_ttl(Duration::from_millis(50)))?;
    assert_eq!(store.get("short")?, Some(b"v".to_vec()));

    thread::sleep(Duration::from_millis(120));
    assert!(store.keys("*")?.is_empty());
    assert_eq!(store.get("short")?, None);
    assert!(!store.document_path("short").exists());
    Ok(())
}

#[test]
fn conditional_writes_respect_presence() -> Result<()> {
    let (_dir, store) = store();

    assert!(!store.set("k", b"v", &SetOptions::new().only_if_old())?);
    assert_eq!(store.get("k")?, None);

    assert!(store.set("k", b"first", &SetOptions::new().only_if_new())?);
    assert!(!store.set("k", b"second", &SetOptions::new().only_if_new())?);
    assert_eq!(store.get("k")?, Some(b"first".to_vec()));

    assert!(store.set("k", b"third", &SetOptions::new().only_if_old())?);
    assert_eq!(store.get("k")?, Some(b"third".to_vec()));

    let err = store.set("k", b"v", &SetOptions::new().only_if_new().only_if_old()).unwrap_err();
    assert!(matches!(err, Error::Parameter(_)));
    Ok(())
}

#[test]
fn delete_removes_documents_and_counts() -> Result<()> {
    let (_dir, store) = store();
    store.set("a", b"1", &SetOptions::new())?;
    store.set("b", b"2", &SetOptions::new())?;

    assert_eq!(store.delete(&keys(&["a", "missing", "b"]))?, 2);
    assert!(!store.document_path("a").exists());
    assert!(!store.document_path("b").exists());
    Ok(())
}

#[test]
fn keys_list_across_documents() -> Result<()> {
    let (_dir, store) = store();
    for key in ["ns:cache:a", "ns:cache:b", "ns:monitoring:*:hits"] {
        store.set(key, b"x", &SetOptions::new())?;
    }

    assert_eq!(store.keys("ns:cache:*")?, keys(&["ns:cache:a", "ns:cache:b"]));
    assert_eq!(store.keys(r"ns:monitoring:\*:hits")?, keys(&["ns:monitoring:*:hits"]));
    assert_eq!(store.clear("ns:*")?, 3);
    assert!(store.keys("*")?.is_empty());
    Ok(())
}

#[test]
fn shared_documents_compare_full_keys() -> Result<()> {
    let (_dir, store) = store();
    store.set("owner", b"mine", &SetOptions::new())?;

    // Plant a foreign record in the same document, as a digest collision would.
    let path = store.document_path("owner");
    let mut document: serde_json::Value = serde_json::from_slice(&fs::read(&path).expect("read")).expect("json");
    document["stranger"] = serde_json::json!(["theirs", 1.0, null]);
    fs::write(&path, serde_json::to_vec(&document).expect("encode")).expect("write");

    assert_eq!(store.get("owner")?, Some(b"mine".to_vec()));
    assert_eq!(store.keys("*")?, keys(&["owner", "stranger"]));

    assert_eq!(store.delete(&keys(&["owner"]))?, 1);
    assert!(path.exists(), "document still holds the foreign record");
    Ok(())
}

#[test]
fn malformed_documents_are_reported() {
    let (_dir, store) = store();
    fs::create_dir_all(store.root()).expect("create root");
    fs::write(store.document_path("k"), b"not json").expect("write");

    let err = store.get("k").unwrap_err();
    let client = err.as_client().expect("should be a client error");
    assert_eq!(client.kind(), ClientErrorKind::MalformedDocument);
    assert_eq!(client.backend(), recall_store::Backend::File);
}

#[test]
fn increase_uses_default_layering() -> Result<()> {
    let (_dir, store) = store();
    assert_eq!(store.increase("n", 5)?, "5");
    assert_eq!(store.increase("n", -2)?, "3");

    store.set("word", b"abc", &SetOptions::new())?;
    let err = store.increase("word", 1).unwrap_err();
    assert_eq!(err.as_client().map(ClientError::kind), Some(ClientErrorKind::NotAnInteger));
    assert_eq!(store.get("word")?, Some(b"abc".to_vec()));
    Ok(())
}

#[test]
fn data_survives_new_store_instances() -> Result<()> {
    let (_dir, store) = store();
    store.set("persisted", b"yes", &SetOptions::new())?;

    let reopened = FileStore::with_root(store.root());
    assert_eq!(reopened.get("persisted")?, Some(b"yes".to_vec()));
    Ok(())
}
