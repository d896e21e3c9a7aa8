//! The channel between handlers and the UI-owning loop.
//!
//! Handlers run on worker tasks and never touch presentation state. They
//! send a [`UiRequest`]; the main task drains the channel cooperatively and
//! hands each request to a [`Presenter`].

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};
use wraith_core::command::{ActionCommand, Params};
use wraith_dispatch::HandlerCategory;

/// Something the UI should show or play.
#[derive(Debug, Clone, PartialEq)]
pub enum UiRequest {
    /// Run an effect.
    Effect {
        /// Family of the effect.
        category: HandlerCategory,
        /// Action tag.
        tag: String,
        /// Effect params.
        params: Params,
    },
    /// Speak a line.
    Speech(String),
}

impl UiRequest {
    /// Effect request for `command`.
    #[must_use]
    pub fn effect(category: HandlerCategory, command: &ActionCommand) -> Self {
        Self::Effect {
            category,
            tag: command.tag.clone(),
            params: command.params.clone(),
        }
    }
}

/// Sending half, cloned into every handler.
#[derive(Debug, Clone)]
pub struct UiSender(mpsc::UnboundedSender<UiRequest>);

impl UiSender {
    /// Queues `request`. Returns `false` once the UI loop is gone.
    pub fn send(&self, request: UiRequest) -> bool {
        self.0.send(request).is_ok()
    }

    /// Whether the receiving loop has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Receiving half, owned by the UI loop.
#[derive(Debug)]
pub struct UiReceiver(mpsc::UnboundedReceiver<UiRequest>);

impl UiReceiver {
    /// Presents everything queued right now without waiting. Returns how
    /// many requests were handled.
    pub fn drain(&mut self, presenter: &mut dyn Presenter) -> usize {
        let mut handled = 0;
        while let Ok(request) = self.0.try_recv() {
            presenter.present(request);
            handled += 1;
        }
        handled
    }

    /// Waits for the next request.
    pub async fn recv(&mut self) -> Option<UiRequest> {
        self.0.recv().await
    }
}

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn channel() -> (UiSender, UiReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiSender(tx), UiReceiver(rx))
}

/// Renders UI requests.
pub trait Presenter {
    /// Shows or plays one request.
    fn present(&mut self, request: UiRequest);
}

/// Presenter for headless runs: logs each request.
#[derive(Debug, Default)]
pub struct LogPresenter {
    presented: u64,
}

impl LogPresenter {
    /// Requests presented so far.
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, request: UiRequest) {
        self.presented += 1;
        match request {
            UiRequest::Effect {
                category,
                tag,
                params,
            } => {
                let text = params.get("text").and_then(Value::as_str).unwrap_or_default();
                info!(?category, %tag, text, "effect");
            }
            UiRequest::Speech(line) => info!(%line, "speech"),
        }
        debug!(presented = self.presented, "ui request presented");
    }
}

/// Presenter that keeps every request, for inspection.
#[derive(Debug, Default)]
pub struct CollectingPresenter {
    /// Requests in arrival order.
    pub requests: Vec<UiRequest>,
}

impl Presenter for CollectingPresenter {
    fn present(&mut self, request: UiRequest) {
        self.requests.push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_presents_queued_requests_in_order() {
        // Arrange
        let (tx, mut rx) = channel();
        tx.send(UiRequest::Speech("one".into()));
        tx.send(UiRequest::effect(
            HandlerCategory::Visual,
            &ActionCommand::new("glitch").with_param("intensity", 2),
        ));
        let mut presenter = CollectingPresenter::default();

        // Act
        let handled = rx.drain(&mut presenter);

        // Assert
        assert_eq!(handled, 2);
        assert_eq!(presenter.requests[0], UiRequest::Speech("one".into()));
        assert!(matches!(
            &presenter.requests[1],
            UiRequest::Effect { tag, .. } if tag == "glitch"
        ));
        assert_eq!(rx.drain(&mut presenter), 0);
    }

    #[test]
    fn test_send_after_receiver_dropped_reports_closed() {
        let (tx, rx) = channel();
        drop(rx);

        assert!(!tx.send(UiRequest::Speech("lost".into())));
        assert!(tx.is_closed());
    }

    #[test]
    fn test_log_presenter_counts() {
        let mut presenter = LogPresenter::default();

        presenter.present(UiRequest::Speech("hi".into()));

        assert_eq!(presenter.presented(), 1);
    }
}
