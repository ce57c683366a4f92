use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use chatdeck_core::DispatchError;

/// Run a dispatch with an optional deadline.
///
/// With `limit = None` the operation runs to completion. When the deadline
/// passes first the operation is dropped and [`DispatchError::Timeout`] is
/// returned. There is no retry.
pub async fn with_deadline<F, T>(limit: Option<Duration>, operation: F) -> Result<T, DispatchError>
where
    F: Future<Output = Result<T, DispatchError>>,
{
    let Some(limit) = limit else {
        return operation.await;
    };

    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Dispatch did not finish within {limit:?}");
            Err(DispatchError::Timeout(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn finishes_before_deadline() {
        let result = with_deadline(Some(Duration::from_secs(5)), async {
            Ok::<_, DispatchError>("done")
        })
        .await;
        assert!(matches!(result, Ok("done")));
    }

    #[tokio::test]
    async fn slow_operation_times_out() {
        let limit = Duration::from_millis(20);
        let result: Result<(), DispatchError> = with_deadline(Some(limit), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DispatchError::Timeout(d)) if d == limit));
    }

    #[tokio::test]
    async fn errors_pass_through_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let result: Result<(), DispatchError> = with_deadline(None, async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DispatchError::Quota("daily limit".to_string()))
        })
        .await;

        assert!(matches!(result, Err(DispatchError::Quota(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
