//! # Refresh Notification
//!
//! Best-effort signal to the external preview/automation collaborator after
//! a successful build. Failures are logged, never propagated as build
//! failures. Background build errors travel over the same channel so they
//! stay observable.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BuildEvent {
    /// Opaque reload signal; no document content is sent
    Refresh,

    /// A build triggered asynchronously failed after the patch committed
    BuildFailed { message: String },
}

pub enum RefreshNotifier {
    /// No collaborator attached (tests, variant generation)
    Noop,

    /// POST the event to an external webhook
    Webhook {
        url: String,
        client: reqwest::Client,
    },

    /// In-process channel, used by tests and embedded callers
    Channel(tokio::sync::mpsc::UnboundedSender<BuildEvent>),
}

impl RefreshNotifier {
    pub fn webhook(url: impl Into<String>) -> Self {
        Self::Webhook {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Deliver one event, best-effort. The result contract is explicit:
    /// delivery failure is logged here and the call always succeeds.
    pub async fn notify(&self, event: BuildEvent) {
        match self {
            RefreshNotifier::Noop => {}
            RefreshNotifier::Webhook { url, client } => {
                let result = client.post(url).json(&event).send().await;
                match result {
                    Ok(response) if !response.status().is_success() => {
                        tracing::warn!(url, status = %response.status(), "refresh webhook rejected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(url, "refresh webhook unreachable: {e}");
                    }
                }
            }
            RefreshNotifier::Channel(sender) => {
                if sender.send(event).is_err() {
                    tracing::warn!("refresh channel receiver dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_delivers() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let notifier = RefreshNotifier::Channel(tx);

        notifier.notify(BuildEvent::Refresh).await;
        assert_eq!(rx.recv().await, Some(BuildEvent::Refresh));
    }

    #[tokio::test]
    async fn test_noop_and_dropped_channel_never_fail() {
        RefreshNotifier::Noop.notify(BuildEvent::Refresh).await;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<BuildEvent>();
        drop(rx);
        RefreshNotifier::Channel(tx)
            .notify(BuildEvent::BuildFailed {
                message: "boom".to_string(),
            })
            .await;
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(BuildEvent::Refresh).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "refresh" }));
    }
}
