//! Cooperative cancellation for transport calls.

use std::sync::Arc;

use tokio::sync::watch;

/// The sending half of a cancellation signal.
///
/// Aborting is idempotent: only the first call has an effect.
#[derive(Clone, Debug)]
pub struct AbortController {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    /// Create a controller whose signal has not fired.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// A signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal.
    ///
    /// Returns `true` if this call fired it, `false` if it had already fired.
    pub fn abort(&self) -> bool {
        self.tx.send_if_modified(|aborted| {
            if *aborted {
                false
            } else {
                *aborted = true;
                true
            }
        })
    }

    /// Whether the signal has fired.
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// The receiving half of a cancellation signal, handed to transports.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// Whether the signal has fired.
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the signal fires.
    ///
    /// Never completes if the controller is dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_abort_is_idempotent() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        assert!(controller.abort());
        assert!(!controller.abort());
        assert!(signal.is_aborted());
        assert!(controller.is_aborted());
    }

    #[tokio::test]
    async fn test_aborted_wakes_waiters() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.aborted().await });
        controller.abort();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signal did not fire")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_controller_never_fires() {
        let signal = AbortController::new().signal();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(waited.is_err());
    }
}
