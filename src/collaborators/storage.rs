//! Content-addressed report storage
//!
//! Identifiers are derived from the stored bytes, so uploading byte-identical
//! content twice yields the same identifier and stores it once. Identifiers
//! keep the CIDv0 shape (`Qm` + 44 base58 characters) that existing IPFS
//! viewers expect: base58 of the SHA-256 multihash of the payload.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::deadline::DeadlineExceeded;
use crate::report::{ContentId, ReportPayload};

const SHA2_256_CODE: u8 = 0x12;
const SHA2_256_LEN: u8 = 0x20;
const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
    #[error("no content stored under {0}")]
    NotFound(ContentId),
    #[error("stored content for {0} does not match its identifier")]
    Corrupted(ContentId),
    #[error("storage call '{operation}' timed out after {duration_ms}ms")]
    Timeout { operation: &'static str, duration_ms: u64 },
    #[error("payload could not be encoded: {0}")]
    Serialization(String),
}

impl From<DeadlineExceeded> for StorageError {
    fn from(err: DeadlineExceeded) -> Self {
        StorageError::Timeout {
            operation: err.operation,
            duration_ms: err.duration_ms,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Unavailable {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Content-addressed store for report payloads
///
/// `upload` is all-or-nothing: either the content is durably stored and its
/// identifier returned, or nothing is stored.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, payload: &ReportPayload) -> Result<ContentId, StorageError>;

    async fn retrieve(&self, content_id: &ContentId) -> Result<ReportPayload, StorageError>;
}

/// Compute the identifier for a byte sequence
pub fn content_id_for(bytes: &[u8]) -> ContentId {
    let digest = Sha256::digest(bytes);
    let mut multihash = Vec::with_capacity(2 + digest.len());
    multihash.push(SHA2_256_CODE);
    multihash.push(SHA2_256_LEN);
    multihash.extend_from_slice(&digest);
    ContentId(base58_encode(&multihash))
}

/// True when `value` has the `Qm` + 44 base58 character shape
pub fn is_content_id_shape(value: &str) -> bool {
    value.len() == 46
        && value.starts_with("Qm")
        && value.bytes().all(|b| BASE58_ALPHABET.contains(&b))
}

fn base58_encode(input: &[u8]) -> String {
    let leading_zeros = input.iter().take_while(|&&b| b == 0).count();

    // Repeated division of the big-endian number by 58, digits little-endian.
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 138 / 100 + 1);
    for &byte in &input[leading_zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut encoded = "1".repeat(leading_zeros);
    encoded.extend(digits.iter().rev().map(|&d| BASE58_ALPHABET[d as usize] as char));
    encoded
}

fn decode_verified(content_id: &ContentId, bytes: &[u8]) -> Result<ReportPayload, StorageError> {
    if content_id_for(bytes) != *content_id {
        warn!(content_id = %content_id, "Stored content failed integrity check");
        return Err(StorageError::Corrupted(content_id.clone()));
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// In-memory store, used by tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    objects: Mutex<HashMap<ContentId, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.objects.lock() {
            Ok(objects) => objects.len(),
            Err(poisoned) => {
                warn!("Memory store lock poisoned, reading its last state");
                poisoned.into_inner().len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn upload(&self, payload: &ReportPayload) -> Result<ContentId, StorageError> {
        let bytes = payload.canonical_bytes()?;
        let content_id = content_id_for(&bytes);

        let mut objects = self.objects.lock().map_err(|_| StorageError::Unavailable {
            message: "memory store lock poisoned".to_string(),
        })?;
        objects.entry(content_id.clone()).or_insert(bytes);

        debug!(content_id = %content_id, "Stored report payload in memory");
        Ok(content_id)
    }

    async fn retrieve(&self, content_id: &ContentId) -> Result<ReportPayload, StorageError> {
        let bytes = {
            let objects = self.objects.lock().map_err(|_| StorageError::Unavailable {
                message: "memory store lock poisoned".to_string(),
            })?;
            objects
                .get(content_id)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(content_id.clone()))?
        };
        decode_verified(content_id, &bytes)
    }
}

/// Filesystem store keeping one file per object under `<root>/objects`
#[derive(Debug, Clone)]
pub struct FsContentStore {
    objects_dir: PathBuf,
}

impl FsContentStore {
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let objects_dir = root.as_ref().join("objects");
        tokio::fs::create_dir_all(&objects_dir).await?;
        info!(path = %objects_dir.display(), "Opened filesystem content store");
        Ok(Self { objects_dir })
    }

    fn object_path(&self, content_id: &ContentId) -> PathBuf {
        self.objects_dir.join(format!("{}.json", content_id.as_str()))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn upload(&self, payload: &ReportPayload) -> Result<ContentId, StorageError> {
        let bytes = payload.canonical_bytes()?;
        let content_id = content_id_for(&bytes);
        let target = self.object_path(&content_id);

        match tokio::fs::read(&target).await {
            Ok(existing) if content_id_for(&existing) == content_id => {
                debug!(content_id = %content_id, "Content already stored");
                return Ok(content_id);
            }
            Ok(_) => {
                warn!(content_id = %content_id, "Stored object is damaged, rewriting it");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        // Write aside, flush, and rename so a failed upload or a crash never
        // leaves a partial object under its final name.
        let staging = self
            .objects_dir
            .join(format!(".staging-{}", uuid::Uuid::new_v4()));
        if let Err(e) = write_synced(&staging, &bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        info!(content_id = %content_id, size = bytes.len(), "Stored report payload");
        Ok(content_id)
    }

    async fn retrieve(&self, content_id: &ContentId) -> Result<ReportPayload, StorageError> {
        // Identifiers come from user input here; never let one name a path.
        if !is_content_id_shape(content_id.as_str()) {
            return Err(StorageError::NotFound(content_id.clone()));
        }
        let path = self.object_path(content_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(content_id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        decode_verified(content_id, &bytes)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
