//! Remote signal bus.
//!
//! Remote cancellation requests arrive from outside the session manager at
//! any time (for example a push-triggered system event relayed by the host
//! app). The bus fans them out; the manager receives them through a
//! [`SignalSubscription`] handed to it at construction.

use tokio::sync::broadcast;

use crate::types::RemoteSignal;

/// Default number of buffered signals per subscriber.
const DEFAULT_CAPACITY: usize = 16;

/// Broadcast bus for [`RemoteSignal`]s.
#[derive(Debug, Clone)]
pub struct RemoteSignalBus {
    sender: broadcast::Sender<RemoteSignal>,
}

impl RemoteSignalBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscription that sees every signal published after
    /// this call.
    #[must_use]
    pub fn subscribe(&self) -> SignalSubscription {
        SignalSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publishes a signal and returns how many subscribers received it.
    pub fn publish(&self, signal: RemoteSignal) -> usize {
        match self.sender.send(signal) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(signal)) => {
                tracing::debug!(signal = signal.as_str(), "No subscriber for remote signal");
                0
            }
        }
    }
}

impl Default for RemoteSignalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a [`RemoteSignalBus`].
#[derive(Debug)]
pub struct SignalSubscription {
    receiver: broadcast::Receiver<RemoteSignal>,
}

impl SignalSubscription {
    /// Waits for the next signal. Returns `None` once every bus handle has
    /// been dropped.
    pub async fn recv(&mut self) -> Option<RemoteSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Some(signal),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Remote signal subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
