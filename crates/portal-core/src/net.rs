//! bounded retry helper for the initial rendezvous dial (spec.md §7): the
//! client tries at most 3 times with exponential backoff before giving up
//! and surfacing `RendezvousUnreachable`.

use crate::error::PortalError;
use std::future::Future;
use std::time::Duration;

/// max dial attempts before giving up.
pub const MAX_DIAL_ATTEMPTS: u32 = 3;
/// backoff before the first retry; doubles on each subsequent attempt.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// retry `dial` up to [`MAX_DIAL_ATTEMPTS`] times with doubling backoff,
/// returning the first success or the last failure's error.
pub async fn dial_with_backoff<F, Fut, T>(mut dial: F) -> Result<T, PortalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PortalError>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut last_err = None;

    for attempt in 1..=MAX_DIAL_ATTEMPTS {
        match dial().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(attempt, %err, "rendezvous dial failed");
                last_err = Some(err);
                if attempt < MAX_DIAL_ATTEMPTS {
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        PortalError::RendezvousUnreachable("no dial attempts were made".to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_retrying() {
        let calls = AtomicU32::new(0);
        let result = dial_with_backoff(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, PortalError>(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_up_to_the_cap_then_gives_up() {
        let calls = AtomicU32::new(0);
        let result = dial_with_backoff(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(PortalError::RendezvousUnreachable("refused".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_DIAL_ATTEMPTS);
    }

    #[tokio::test]
    async fn recovers_on_a_later_attempt() {
        let calls = AtomicU32::new(0);
        let result = dial_with_backoff(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err(PortalError::RendezvousUnreachable("refused".into()))
                } else {
                    Ok(99)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
