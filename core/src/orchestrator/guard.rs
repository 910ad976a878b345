//! Timeout and cancellation around collaborator calls

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub(crate) enum Guarded<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// Await `future` for at most `limit`, giving up early on cancellation
///
/// Cancellation wins when both are ready.
pub(crate) async fn guarded<F>(future: F, limit: Duration, cancel: &CancellationToken) -> Guarded<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Guarded::Cancelled,
        result = tokio::time::timeout(limit, future) => match result {
            Ok(value) => Guarded::Done(value),
            Err(_) => Guarded::TimedOut,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_completes_within_limit() {
        let token = CancellationToken::new();
        let outcome = guarded(async { 7 }, Duration::from_secs(1), &token).await;
        assert!(matches!(outcome, Guarded::Done(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let token = CancellationToken::new();
        let slow = tokio::time::sleep(Duration::from_secs(5));
        let outcome = guarded(slow, Duration::from_secs(1), &token).await;
        assert!(matches!(outcome, Guarded::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = guarded(async { 1 }, Duration::from_secs(1), &token).await;
        assert!(matches!(outcome, Guarded::Cancelled));
    }
}
