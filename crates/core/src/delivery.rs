//! Delivery of pipeline output to a caller.
//!
//! A run talks to its caller only through a [`DeliveryChannel`]. Streaming channels push
//! each message as it is produced; [`BufferingChannel`] collects turn text and hands it
//! back once via [`BufferingChannel::finish`].

use crate::constants::{COMPLETED_NOTICE, CONNECTED_PREFIX, ERROR_PREFIX, TURN_SEPARATOR};
use crate::turn::{OutputMode, Role};
use crate::AgentError;
use agent_types::PatientId;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

// ============================================================================
// CANCELLATION
// ============================================================================

/// Cooperative cancellation signal shared between a channel and the pipeline.
///
/// Cancelling is sticky: once set, every current and future waiter observes it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel cannot be missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

/// One message handed to a channel.
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    /// The run has started for this patient.
    Connected(&'a PatientId),
    /// Model text produced by `role`.
    Fragment { role: Role, text: &'a str },
    /// The clinician turn is over and the pharmacist turn begins.
    Separator,
    /// Both turns completed.
    Completed,
    /// The run aborted.
    Failure(&'a AgentError),
}

impl Delivery<'_> {
    /// Wire text of this message on a streaming channel.
    pub fn render(&self) -> String {
        match self {
            Delivery::Connected(id) => format!("{CONNECTED_PREFIX} patient {id}"),
            Delivery::Fragment { text, .. } => (*text).to_string(),
            Delivery::Separator => TURN_SEPARATOR.to_string(),
            Delivery::Completed => COMPLETED_NOTICE.to_string(),
            Delivery::Failure(AgentError::RecordNotFound(id)) => {
                format!("{ERROR_PREFIX} Patient {id} not found")
            }
            Delivery::Failure(err) => format!("{ERROR_PREFIX} {err}"),
        }
    }
}

/// Destination of a run's output.
///
/// The pipeline calls [`DeliveryChannel::close`] exactly once, after the last delivery.
pub trait DeliveryChannel: Send {
    fn mode(&self) -> OutputMode;

    /// Token the pipeline watches at every suspension point.
    fn cancellation(&self) -> CancelToken;

    fn deliver(&mut self, delivery: Delivery<'_>) -> impl Future<Output = ()> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

// ============================================================================
// BUFFERING CHANNEL
// ============================================================================

/// Turn texts collected by a [`BufferingChannel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffered {
    pub clinician: String,
    pub pharmacist: String,
}

/// Final-mode channel accumulating each role's text.
#[derive(Debug, Default)]
pub struct BufferingChannel {
    buffered: Buffered,
    cancel: CancelToken,
    closed: bool,
}

impl BufferingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consume the channel and return everything it collected.
    pub fn finish(self) -> Buffered {
        self.buffered
    }
}

impl DeliveryChannel for BufferingChannel {
    fn mode(&self) -> OutputMode {
        OutputMode::Final
    }

    fn cancellation(&self) -> CancelToken {
        self.cancel.clone()
    }

    async fn deliver(&mut self, delivery: Delivery<'_>) {
        if let Delivery::Fragment { role, text } = delivery {
            let target = match role {
                Role::Clinician => &mut self.buffered.clinician,
                Role::Pharmacist => &mut self.buffered.pharmacist,
            };
            target.push_str(text);
        }
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::task::yield_now().await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .expect("join");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_once_set() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already cancelled");
    }

    #[test]
    fn renders_wire_messages() {
        let id = PatientId::new("52664210").expect("id");
        assert!(Delivery::Connected(&id).render().starts_with("[connected]"));
        assert_eq!(Delivery::Separator.render().trim(), "---");
        assert!(Delivery::Completed.render().contains("Done."));
        assert_eq!(
            Delivery::Failure(&AgentError::RecordNotFound(id.clone())).render(),
            "[error] Patient 52664210 not found"
        );
        assert_eq!(
            Delivery::Fragment {
                role: Role::Clinician,
                text: "Stable."
            }
            .render(),
            "Stable."
        );
    }

    #[tokio::test]
    async fn buffering_channel_collects_per_role() {
        let mut channel = BufferingChannel::new();
        assert_eq!(channel.mode(), OutputMode::Final);
        channel
            .deliver(Delivery::Fragment {
                role: Role::Clinician,
                text: "Stable ",
            })
            .await;
        channel.deliver(Delivery::Separator).await;
        channel
            .deliver(Delivery::Fragment {
                role: Role::Clinician,
                text: "patient.",
            })
            .await;
        channel
            .deliver(Delivery::Fragment {
                role: Role::Pharmacist,
                text: "No medications.",
            })
            .await;
        channel.close().await;
        assert!(channel.is_closed());

        let buffered = channel.finish();
        assert_eq!(buffered.clinician, "Stable patient.");
        assert_eq!(buffered.pharmacist, "No medications.");
    }
}
