//! Cancellation helpers
//!
//! Every blocking step of an adapter operation races the caller's
//! [`CancellationToken`]; when the token fires first the step resolves to
//! [`Error::Cancelled`] and the in-flight future is dropped.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Fail with [`Error::Cancelled`] if the token has already fired
pub fn check(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// Run `fut` unless the token fires first
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Sleep for `duration` unless the token fires first
pub async fn sleep(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    cancellable(cancel, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}
