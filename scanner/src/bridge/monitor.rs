use anyhow::Context;
use fpvcore::interface::TelemetrySource;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use zeromq::{Socket, SocketRecv, SubSocket};

const MONITOR_BACKLOG: usize = 64;

/// Sensor monitor feed. A background task owns the SUB socket, so a feed that
/// is not up yet never holds back the scan; messages queue until polled.
pub struct ZmqMonitor {
    inbox: mpsc::Receiver<String>,
    recv_timeout: Duration,
    task: JoinHandle<()>,
}

impl ZmqMonitor {
    /// Starts connecting to `endpoint` in the background and returns at once.
    /// Must be called from within the tokio runtime.
    pub fn spawn(endpoint: &str, recv_timeout: Duration) -> Self {
        let (outbox, inbox) = mpsc::channel(MONITOR_BACKLOG);
        let endpoint = endpoint.to_string();
        let task = tokio::spawn(async move {
            if let Err(err) = forward(&endpoint, outbox).await {
                warn!("location enrichment off: {:#}", err);
            }
        });
        Self {
            inbox,
            recv_timeout,
            task,
        }
    }
}

async fn forward(endpoint: &str, outbox: mpsc::Sender<String>) -> anyhow::Result<()> {
    let mut socket = SubSocket::new();
    socket
        .connect(endpoint)
        .await
        .with_context(|| format!("connecting to monitor feed {}", endpoint))?;
    socket
        .subscribe("")
        .await
        .context("subscribing to monitor feed")?;
    info!("monitor feed connected on {}", endpoint);

    loop {
        let message = socket.recv().await.context("receiving from monitor feed")?;
        match String::try_from(message) {
            Ok(text) => {
                if outbox.send(text).await.is_err() {
                    return Ok(());
                }
            }
            Err(err) => debug!("dropping non-text monitor frame: {}", err),
        }
    }
}

impl TelemetrySource for ZmqMonitor {
    async fn try_recv(&mut self) -> Option<String> {
        timeout(self.recv_timeout, self.inbox.recv())
            .await
            .ok()
            .flatten()
    }
}

impl Drop for ZmqMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
