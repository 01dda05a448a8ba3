//! WebSocket delivery channel.

use agent_core::{CancelToken, Delivery, DeliveryChannel, OutputMode};
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use tokio::task::JoinHandle;

/// Streaming channel over one WebSocket.
///
/// Each delivery becomes one text frame. A background reader watches the inbound half; when
/// the peer closes or the socket errors it cancels the run. A failed send does the same.
pub struct WebSocketChannel {
    sink: SplitSink<WebSocket, Message>,
    cancel: CancelToken,
    reader: JoinHandle<()>,
}

impl WebSocketChannel {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, mut inbound) = socket.split();
        let cancel = CancelToken::new();

        let reader = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                // Inbound text is ignored; only the end of the stream matters.
                while let Some(message) = inbound.next().await {
                    match message {
                        Ok(Message::Close(_)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                tracing::debug!("peer disconnected");
                cancel.cancel();
            }
        });

        Self {
            sink,
            cancel,
            reader,
        }
    }
}

impl DeliveryChannel for WebSocketChannel {
    fn mode(&self) -> OutputMode {
        OutputMode::Stream
    }

    fn cancellation(&self) -> CancelToken {
        self.cancel.clone()
    }

    async fn deliver(&mut self, delivery: Delivery<'_>) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(err) = self.sink.send(Message::Text(delivery.render())).await {
            tracing::debug!(error = %err, "send failed; cancelling run");
            self.cancel.cancel();
        }
    }

    async fn close(&mut self) {
        self.reader.abort();
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(err) = self.sink.send(Message::Close(None)).await {
            tracing::debug!(error = %err, "close frame not sent");
        }
        if let Err(err) = self.sink.close().await {
            tracing::debug!(error = %err, "socket close failed");
        }
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
