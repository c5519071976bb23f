//! Cooperative cancellation for long-running relay operations.
//!
//! Callers hold the `watch::Sender<bool>` and flip it to `true` to abort.
//! A token whose sender has gone away can never fire, so dropping the
//! sender is the same as promising not to cancel.

use std::sync::OnceLock;

use tokio::sync::watch;

/// Observed side of a cancellation signal.
pub type CancellationToken = watch::Receiver<bool>;

static NEVER: OnceLock<watch::Sender<bool>> = OnceLock::new();

/// A token that never fires, for call sites with nothing to cancel.
pub fn never() -> CancellationToken {
    NEVER.get_or_init(|| watch::channel(false).0).subscribe()
}

/// Resolves once `token` observes `true`. Pends forever if the sender is
/// dropped without cancelling.
pub async fn cancelled(mut token: CancellationToken) {
    loop {
        if *token.borrow() {
            return;
        }
        if token.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
