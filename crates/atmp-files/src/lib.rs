//! Content-addressed blob storage on the local filesystem.
//!
//! Blobs are stored under a root directory, keyed by the SHA-256 of their
//! content. The hash doubles as the [`BlobHandle`], so writing the same
//! bytes twice is a no-op that returns the same handle. Files are fanned out
//! into subdirectories by the first two hex characters to keep directory
//! listings manageable.

use std::path::{Path, PathBuf};

use atmp_core::document::BlobHandle;
use bytes::Bytes;
use sha2::{Digest, Sha256};

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("blob store i/o error: {0}")]
  Io(#[from] std::io::Error),
  #[error("refusing to store an empty blob")]
  Empty,
  #[error("malformed blob handle: {0:?}")]
  MalformedHandle(String),
}

impl From<Error> for atmp_core::Error {
  fn from(value: Error) -> Self {
    match value {
      Error::Empty => atmp_core::Error::EmptyFile,
      Error::Io(e) => atmp_core::Error::Storage(e.to_string()),
      Error::MalformedHandle(h) => {
        atmp_core::Error::Storage(format!("malformed blob handle: {h:?}"))
      }
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;

// ─── FsBlobStore ─────────────────────────────────────────────────────────────

/// Filesystem-backed [`BlobStore`](atmp_core::store::BlobStore).
#[derive(Clone, Debug)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  /// Opens the store rooted at `root`, creating the directory if needed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Path of the blob for `handle`; validates that the handle looks like a
  /// SHA-256 hex digest so it cannot escape the root.
  fn blob_path(&self, handle: &BlobHandle) -> Result<PathBuf> {
    let hash = handle.as_str();
    let well_formed =
      hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit());
    if !well_formed {
      return Err(Error::MalformedHandle(hash.to_owned()));
    }
    Ok(self.root.join(&hash[..2]).join(hash))
  }
}

impl atmp_core::store::BlobStore for FsBlobStore {
  type Error = Error;

  async fn put(&self, content: Bytes) -> Result<BlobHandle> {
    if content.is_empty() {
      return Err(Error::Empty);
    }

    let hash = hex::encode(Sha256::digest(&content));
    let handle = BlobHandle(hash);
    let path = self.blob_path(&handle)?;

    if tokio::fs::try_exists(&path).await? {
      tracing::debug!(handle = handle.as_str(), "blob already stored");
      return Ok(handle);
    }

    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    // Write to a sibling temp file first, then rename into place, so a
    // crashed write never leaves a truncated blob under its final name.
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &content).await?;
    tokio::fs::rename(&tmp, &path).await?;

    tracing::debug!(
      handle = handle.as_str(),
      size = content.len(),
      "stored blob"
    );
    Ok(handle)
  }

  async fn get<'a>(&'a self, handle: &'a BlobHandle) -> Result<Option<Bytes>> {
    let path = self.blob_path(handle)?;
    match tokio::fs::read(&path).await {
      Ok(bytes) => Ok(Some(Bytes::from(bytes))),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use atmp_core::store::BlobStore;

  use super::*;

  async fn store() -> (tempfile::TempDir, FsBlobStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsBlobStore::open(dir.path()).await.expect("open store");
    (dir, store)
  }

  #[tokio::test]
  async fn put_then_get_round_trips() {
    let (_dir, store) = store().await;

    let content = Bytes::from_static(b"certificat medical initial");
    let handle = store.put(content.clone()).await.unwrap();

    assert_eq!(handle.as_str().len(), 64);
    let fetched = store.get(&handle).await.unwrap();
    assert_eq!(fetched, Some(content));
  }

  #[tokio::test]
  async fn put_is_idempotent() {
    let (_dir, store) = store().await;

    let content = Bytes::from_static(b"same bytes");
    let a = store.put(content.clone()).await.unwrap();
    let b = store.put(content).await.unwrap();
    assert_eq!(a, b);
  }

  #[tokio::test]
  async fn empty_content_is_rejected() {
    let (_dir, store) = store().await;
    let err = store.put(Bytes::new()).await.unwrap_err();
    assert!(matches!(err, Error::Empty));
  }

  #[tokio::test]
  async fn missing_blob_returns_none() {
    let (_dir, store) = store().await;
    let absent = BlobHandle("ab".repeat(32));
    assert_eq!(store.get(&absent).await.unwrap(), None);
  }

  #[tokio::test]
  async fn malformed_handle_is_rejected() {
    let (_dir, store) = store().await;
    let bad = BlobHandle("../../etc/passwd".into());
    assert!(matches!(
      store.get(&bad).await.unwrap_err(),
      Error::MalformedHandle(_)
    ));
  }
}
