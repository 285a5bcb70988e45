//! Anchoring content identifiers in an append-only ledger
//!
//! Each entry commits to the previous entry's reference, so rewriting or
//! removing any entry breaks every reference after it. The ledger can be kept
//! in memory or persisted as JSON lines and is fully re-verified on open.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::deadline::DeadlineExceeded;
use crate::report::{AnchorReference, ContentId};

const GENESIS_REFERENCE: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchoringError {
    #[error("anchoring service unavailable: {message}")]
    Unavailable { message: String },
    #[error("ledger chain broken at entry {index}: {reason}")]
    ChainBroken { index: u64, reason: String },
    #[error("anchoring call '{operation}' timed out after {duration_ms}ms")]
    Timeout { operation: &'static str, duration_ms: u64 },
}

impl From<DeadlineExceeded> for AnchoringError {
    fn from(err: DeadlineExceeded) -> Self {
        AnchoringError::Timeout {
            operation: err.operation,
            duration_ms: err.duration_ms,
        }
    }
}

impl From<std::io::Error> for AnchoringError {
    fn from(err: std::io::Error) -> Self {
        AnchoringError::Unavailable {
            message: err.to_string(),
        }
    }
}

/// A content identifier committed to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorEntry {
    pub index: u64,
    pub content_id: ContentId,
    pub reference: AnchorReference,
    pub previous_reference: AnchorReference,
    pub anchored_at: DateTime<Utc>,
}

/// What `anchor` hands back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    pub reference: AnchorReference,
    pub index: u64,
    pub anchored_at: DateTime<Utc>,
}

impl From<&AnchorEntry> for AnchorReceipt {
    fn from(entry: &AnchorEntry) -> Self {
        Self {
            reference: entry.reference.clone(),
            index: entry.index,
            anchored_at: entry.anchored_at,
        }
    }
}

/// Publicly verifiable, immutable timestamping of content identifiers
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Anchor: Send + Sync {
    async fn anchor(&self, content_id: &ContentId) -> Result<AnchorReceipt, AnchoringError>;

    /// Find the entry anchoring `content_id`, if any
    async fn lookup(&self, content_id: &ContentId) -> Result<Option<AnchorEntry>, AnchoringError>;

    async fn entry(&self, index: u64) -> Result<Option<AnchorEntry>, AnchoringError>;

    async fn count(&self) -> Result<u64, AnchoringError>;
}

/// Reference for an entry: `0x` + hex(SHA-256(previous || content id || time || index))
pub fn compute_reference(
    previous: &AnchorReference,
    content_id: &ContentId,
    anchored_at: DateTime<Utc>,
    index: u64,
) -> AnchorReference {
    let mut hasher = Sha256::new();
    hasher.update(previous.as_str().as_bytes());
    hasher.update(content_id.as_str().as_bytes());
    hasher.update(anchored_at.to_rfc3339().as_bytes());
    hasher.update(index.to_be_bytes());
    AnchorReference(format!("0x{}", hex::encode(hasher.finalize())))
}

/// True when `value` is `0x` followed by 64 lowercase hex characters
pub fn is_anchor_reference_shape(value: &str) -> bool {
    value.len() == 66
        && value.starts_with("0x")
        && value[2..].bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Check every link of a chain, starting from genesis
pub fn verify_chain(entries: &[AnchorEntry]) -> Result<(), AnchoringError> {
    let mut previous = AnchorReference(GENESIS_REFERENCE.to_string());
    for (position, entry) in entries.iter().enumerate() {
        let index = position as u64;
        if entry.index != index {
            return Err(AnchoringError::ChainBroken {
                index,
                reason: format!("entry claims index {}", entry.index),
            });
        }
        if entry.previous_reference != previous {
            return Err(AnchoringError::ChainBroken {
                index,
                reason: "previous reference does not match".to_string(),
            });
        }
        let expected = compute_reference(&previous, &entry.content_id, entry.anchored_at, index);
        if entry.reference != expected {
            return Err(AnchoringError::ChainBroken {
                index,
                reason: "reference does not match entry contents".to_string(),
            });
        }
        previous = entry.reference.clone();
    }
    Ok(())
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<AnchorEntry>,
    /// Length of the ledger file up to the last committed entry
    committed_len: u64,
}

/// Hash-chained ledger, optionally backed by a JSON lines file
#[derive(Debug)]
pub struct LedgerAnchor {
    state: Arc<Mutex<LedgerState>>,
    path: Option<PathBuf>,
}

impl Default for LedgerAnchor {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl LedgerAnchor {
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            path: None,
        }
    }

    /// Open (or create) a persisted ledger, verifying the existing chain
    ///
    /// A final line without its newline is the remains of an interrupted
    /// append. It is cut off before the chain is verified.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnchoringError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let complete = torn_tail_start(&contents);
        if complete < contents.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = contents.len() - complete,
                "Discarding incomplete trailing ledger entry"
            );
            truncate(&path, complete as u64).await?;
        }

        let entries = parse_entries(&contents[..complete])?;
        if let Err(e) = verify_chain(&entries) {
            error!(path = %path.display(), error = %e, "Ledger failed verification");
            return Err(e);
        }

        info!(path = %path.display(), entries = entries.len(), "Opened anchoring ledger");
        Ok(Self {
            state: Arc::new(Mutex::new(LedgerState {
                entries,
                committed_len: complete as u64,
            })),
            path: Some(path),
        })
    }

    /// Snapshot of every entry in ledger order
    pub async fn entries(&self) -> Vec<AnchorEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn verify(&self) -> Result<(), AnchoringError> {
        verify_chain(&self.state.lock().await.entries)
    }
}

/// Byte offset just past the last newline-terminated line
fn torn_tail_start(contents: &str) -> usize {
    if contents.is_empty() || contents.ends_with('\n') {
        return contents.len();
    }
    contents.rfind('\n').map_or(0, |i| i + 1)
}

async fn truncate(path: &Path, len: u64) -> Result<(), std::io::Error> {
    let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(len).await?;
    file.sync_data().await
}

fn parse_entries(contents: &str) -> Result<Vec<AnchorEntry>, AnchoringError> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| AnchoringError::ChainBroken {
                index: index as u64,
                reason: format!("unreadable entry: {e}"),
            })
        })
        .collect()
}

/// Append `entry` after `committed_len` bytes, returning the new length
///
/// On failure the file is cut back to `committed_len` so a partial line never
/// survives next to the in-memory chain.
async fn persist(
    path: &Path,
    committed_len: u64,
    entry: &AnchorEntry,
) -> Result<u64, AnchoringError> {
    let mut line = serde_json::to_string(entry).map_err(|e| AnchoringError::Unavailable {
        message: e.to_string(),
    })?;
    line.push('\n');

    let written = async {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await
    }
    .await;

    match written {
        Ok(()) => Ok(committed_len + line.len() as u64),
        Err(e) => {
            if let Err(rollback) = truncate(path, committed_len).await {
                error!(
                    path = %path.display(),
                    error = %rollback,
                    "Failed to roll back ledger append"
                );
            }
            Err(e.into())
        }
    }
}

async fn append(
    state: Arc<Mutex<LedgerState>>,
    path: Option<PathBuf>,
    content_id: ContentId,
) -> Result<AnchorReceipt, AnchoringError> {
    // Held across the append so entries are written in index order.
    let mut state = state.lock().await;

    if let Some(existing) = state.entries.iter().find(|e| e.content_id == content_id) {
        debug!(content_id = %content_id, index = existing.index, "Content already anchored");
        return Ok(AnchorReceipt::from(existing));
    }

    let index = state.entries.len() as u64;
    let previous_reference = state
        .entries
        .last()
        .map(|e| e.reference.clone())
        .unwrap_or_else(|| AnchorReference(GENESIS_REFERENCE.to_string()));
    let anchored_at = Utc::now();
    let reference = compute_reference(&previous_reference, &content_id, anchored_at, index);

    let entry = AnchorEntry {
        index,
        content_id,
        reference,
        previous_reference,
        anchored_at,
    };

    // Only commit in memory once the entry is durable.
    if let Some(path) = &path {
        state.committed_len = persist(path, state.committed_len, &entry).await?;
    }
    let receipt = AnchorReceipt::from(&entry);
    info!(
        content_id = %entry.content_id,
        index,
        reference = %receipt.reference,
        "Anchored content"
    );
    state.entries.push(entry);
    Ok(receipt)
}

#[async_trait]
impl Anchor for LedgerAnchor {
    async fn anchor(&self, content_id: &ContentId) -> Result<AnchorReceipt, AnchoringError> {
        // The append runs as its own task. A caller that stops waiting (a
        // deadline firing) leaves it to finish, so the file and the in-memory
        // chain never disagree.
        let task = tokio::spawn(append(
            Arc::clone(&self.state),
            self.path.clone(),
            content_id.clone(),
        ));
        task.await.map_err(|e| AnchoringError::Unavailable {
            message: format!("ledger append task failed: {e}"),
        })?
    }

    async fn lookup(&self, content_id: &ContentId) -> Result<Option<AnchorEntry>, AnchoringError> {
        let state = self.state.lock().await;
        Ok(state.entries.iter().find(|e| &e.content_id == content_id).cloned())
    }

    async fn entry(&self, index: u64) -> Result<Option<AnchorEntry>, AnchoringError> {
        let state = self.state.lock().await;
        Ok(usize::try_from(index).ok().and_then(|i| state.entries.get(i)).cloned())
    }

    async fn count(&self) -> Result<u64, AnchoringError> {
        Ok(self.state.lock().await.entries.len() as u64)
    }
}
