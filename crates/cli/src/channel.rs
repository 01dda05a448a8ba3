//! Terminal delivery channel.

use agent_core::{CancelToken, Delivery, DeliveryChannel, OutputMode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Streams model text to `out` and status notices to `err`.
///
/// Keeping notices off `out` lets the conversation text be piped on its own.
pub struct TerminalChannel<O, E> {
    out: O,
    err: E,
    cancel: CancelToken,
}

impl<O, E> TerminalChannel<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    pub fn new(out: O, err: E, cancel: CancelToken) -> Self {
        Self { out, err, cancel }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    async fn write(&mut self, notice: bool, text: &str) {
        let target: &mut (dyn AsyncWrite + Unpin + Send) = if notice {
            &mut self.err
        } else {
            &mut self.out
        };
        let written = async {
            target.write_all(text.as_bytes()).await?;
            target.flush().await
        }
        .await;

        // A closed terminal is treated like a disconnected peer.
        if written.is_err() {
            self.cancel.cancel();
        }
    }
}

impl<O, E> DeliveryChannel for TerminalChannel<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    fn mode(&self) -> OutputMode {
        OutputMode::Stream
    }

    fn cancellation(&self) -> CancelToken {
        self.cancel.clone()
    }

    async fn deliver(&mut self, delivery: Delivery<'_>) {
        match delivery {
            Delivery::Fragment { text, .. } => self.write(false, text).await,
            Delivery::Separator => self.write(false, &delivery.render()).await,
            Delivery::Connected(_) | Delivery::Completed | Delivery::Failure(_) => {
                let line = format!("{}\n", delivery.render().trim());
                self.write(true, &line).await;
            }
        }
    }

    async fn close(&mut self) {
        if self.out.flush().await.is_err() || self.err.flush().await.is_err() {
            self.cancel.cancel();
        }
    }
}
