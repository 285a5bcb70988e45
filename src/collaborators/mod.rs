//! External collaborator abstractions
//!
//! The workflow talks to four collaborators (email verification, code
//! verification, content storage, anchoring) only through these traits, so
//! demo or local implementations can be swapped for real services without
//! touching the state machine.

pub mod anchor;
pub mod code;
pub mod deadline;
pub mod email;
pub mod storage;

use std::sync::Arc;

pub use anchor::{Anchor, AnchorEntry, AnchorReceipt, AnchoringError, LedgerAnchor};
pub use code::{CodeVerifier, DemoCodeVerifier};
pub use deadline::{within, DeadlineExceeded};
pub use email::{DemoEmailVerifier, EmailVerifier, VerificationError};
pub use storage::{content_id_for, ContentStore, FsContentStore, MemoryContentStore, StorageError};

/// The set of collaborators one workflow instance calls
#[derive(Clone)]
pub struct Collaborators {
    pub email: Arc<dyn EmailVerifier>,
    pub code: Arc<dyn CodeVerifier>,
    pub store: Arc<dyn ContentStore>,
    pub anchor: Arc<dyn Anchor>,
}

impl Collaborators {
    pub fn new(
        email: Arc<dyn EmailVerifier>,
        code: Arc<dyn CodeVerifier>,
        store: Arc<dyn ContentStore>,
        anchor: Arc<dyn Anchor>,
    ) -> Self {
        Self {
            email,
            code,
            store,
            anchor,
        }
    }

    /// Demo verifiers with ephemeral in-memory storage and ledger
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(DemoEmailVerifier::new()),
            Arc::new(DemoCodeVerifier::default()),
            Arc::new(MemoryContentStore::new()),
            Arc::new(LedgerAnchor::in_memory()),
        )
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
