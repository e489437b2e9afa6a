use crate::interface::alert::{Alert, AlertEvent};
use crate::interface::location::LocationFix;
use log::debug;

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("failed to encode alert: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to send alert: {0}")]
    Send(String),
}

/// Publish-capable endpoint for serialised alerts.
#[allow(async_fn_in_trait)]
pub trait AlertSink {
    async fn send(&mut self, payload: String) -> Result<(), PublishError>;
}

/// Subscribe-only telemetry feed polled with a short, bounded wait.
#[allow(async_fn_in_trait)]
pub trait TelemetrySource {
    async fn try_recv(&mut self) -> Option<String>;
}

/// Builds alerts and hands them to the sink. Failures are logged and swallowed.
pub struct AlertPublisher<S: AlertSink> {
    sink: S,
    id_prefix: String,
}

impl<S: AlertSink> AlertPublisher<S> {
    pub fn new(sink: S, id_prefix: impl Into<String>) -> Self {
        Self {
            sink,
            id_prefix: id_prefix.into(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns whether the alert reached the sink.
    pub async fn publish(&mut self, event: &AlertEvent, location: Option<LocationFix>) -> bool {
        let alert = Alert::build(event, location, &self.id_prefix);
        match self.send(&alert).await {
            Ok(()) => true,
            Err(err) => {
                debug!("{} alert dropped: {}", event.source, err);
                false
            }
        }
    }

    async fn send(&mut self, alert: &Alert) -> Result<(), PublishError> {
        let payload = alert.to_json()?;
        self.sink.send(payload).await
    }
}
