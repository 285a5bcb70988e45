//! Explicit deadlines for collaborator calls.
//!
//! Each call the workflow makes is bounded by a deadline. When it expires the
//! in-flight future is dropped, which is the cancellation signal for every
//! collaborator implementation.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// A collaborator call did not finish within its deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineExceeded {
    pub operation: &'static str,
    pub duration_ms: u64,
}

/// Run `call` with a deadline, mapping expiry into the collaborator's error type.
pub async fn within<F, T, E>(deadline: Duration, operation: &'static str, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            let duration_ms = deadline.as_millis() as u64;
            warn!(operation, duration_ms, "Collaborator call exceeded its deadline");
            Err(DeadlineExceeded {
                operation,
                duration_ms,
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum CallError {
        Timeout(u64),
    }

    impl From<DeadlineExceeded> for CallError {
        fn from(err: DeadlineExceeded) -> Self {
            CallError::Timeout(err.duration_ms)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: Result<(), CallError> = within(Duration::from_secs(5), "slow call", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(CallError::Timeout(5000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let result: Result<u32, CallError> =
            within(Duration::from_secs(5), "fast call", async { Ok(7) }).await;

        assert_eq!(result, Ok(7));
    }
}
