//! One-time code verification

use async_trait::async_trait;
use tracing::debug;

use super::email::VerificationError;

pub const DEMO_CODE: &str = "123456";

/// Checks a one-time code against the one issued for an email
///
/// Calls are idempotent: checking a code never consumes or invalidates it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CodeVerifier: Send + Sync {
    async fn check_code(&self, email: &str, code: &str) -> Result<bool, VerificationError>;
}

/// Accepts a single fixed code for every address
#[derive(Debug, Clone)]
pub struct DemoCodeVerifier {
    accepted: String,
}

impl DemoCodeVerifier {
    pub fn new(accepted: impl Into<String>) -> Self {
        Self {
            accepted: accepted.into(),
        }
    }
}

impl Default for DemoCodeVerifier {
    fn default() -> Self {
        Self::new(DEMO_CODE)
    }
}

#[async_trait]
impl CodeVerifier for DemoCodeVerifier {
    async fn check_code(&self, _email: &str, code: &str) -> Result<bool, VerificationError> {
        let matched = code == self.accepted;
        debug!(matched, "Checked one-time code");
        Ok(matched)
    }
}
