use crate::hardware::{RadioBackend, Release, ScanPipeline};
use crate::prelude::{DriverError, FrontendParams, ScanError, ScanResult, ScanTiming};
use log::{debug, info, warn};
use tokio::time::{sleep, Instant};

/// Lifecycle state of the exclusive radio handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy)]
struct LastRelease {
    at: Instant,
    kind: Release,
}

/// Owns the radio pipeline. At most one pipeline is open at a time and it is
/// stopped when the session is closed or dropped.
pub struct HardwareSession<B: RadioBackend> {
    backend: B,
    params: FrontendParams,
    timing: ScanTiming,
    state: SessionState,
    pipeline: Option<B::Pipeline>,
    last_release: Option<LastRelease>,
}

impl<B: RadioBackend> HardwareSession<B> {
    pub fn new(backend: B, params: FrontendParams, timing: ScanTiming) -> Self {
        Self {
            backend,
            params,
            timing,
            state: SessionState::Closed,
            pipeline: None,
            last_release: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn params(&self) -> &FrontendParams {
        &self.params
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Opens the pipeline, retrying transient driver failures up to the
    /// configured bound. Waits out any pending cooldown first.
    pub async fn open(&mut self) -> ScanResult<()> {
        if self.is_open() {
            return Ok(());
        }
        self.wait_cooldown().await;

        let attempts = self.timing.reopen_attempts.max(1);
        let mut last = None;
        for attempt in 1..=attempts {
            self.state = SessionState::Opening;
            match self.backend.open(&self.params) {
                Ok(pipeline) => {
                    self.pipeline = Some(pipeline);
                    self.state = SessionState::Open;
                    self.last_release = None;
                    debug!(
                        "radio open (attempt {}) threshold={:.2} dB",
                        attempt, self.params.threshold_db
                    );
                    return Ok(());
                }
                Err(err) if !err.is_transient() => {
                    self.state = SessionState::Closed;
                    return Err(ScanError::HardwareConfiguration(err));
                }
                Err(err) => {
                    self.state = SessionState::Closed;
                    warn!("failed to open SDR (attempt {}): {}", attempt, err);
                    last = Some(err);
                    if attempt < attempts {
                        sleep(self.timing.reopen_delay).await;
                    }
                }
            }
        }

        Err(ScanError::HardwareUnavailable {
            attempts,
            last: last.unwrap_or_else(|| DriverError::Io("no open attempt made".into())),
        })
    }

    /// Stops and drops the pipeline. Returns `false` when nothing was open.
    pub fn close(&mut self) -> bool {
        let Some(mut pipeline) = self.pipeline.take() else {
            return false;
        };
        self.state = SessionState::Closing;
        let kind = pipeline.stop();
        drop(pipeline);
        self.state = SessionState::Closed;
        self.last_release = Some(LastRelease {
            at: Instant::now(),
            kind,
        });
        debug!("radio closed ({:?})", kind);
        true
    }

    /// Records that an external tool just released the device, which gives
    /// no completion signal of its own.
    pub fn note_external_release(&mut self) {
        self.last_release = Some(LastRelease {
            at: Instant::now(),
            kind: Release::Unconfirmed,
        });
    }

    /// Sleeps for whatever is left of the cooldown after the last unacknowledged release.
    pub async fn wait_cooldown(&self) {
        let Some(release) = self.last_release else {
            return;
        };
        if release.kind == Release::Acknowledged {
            return;
        }
        let ready_at = release.at + self.timing.cooldown;
        if Instant::now() < ready_at {
            tokio::time::sleep_until(ready_at).await;
        }
    }

    /// Closes the current pipeline and reopens it with a new detection threshold.
    pub async fn reopen_with_threshold(&mut self, threshold_db: f64) -> ScanResult<()> {
        self.close();
        self.params = self.params.with_threshold(threshold_db);
        info!("reopening radio with threshold {:.2} dB", threshold_db);
        self.open().await
    }

    pub fn set_center_frequency(&mut self, hz: f64) -> ScanResult<()> {
        let pipeline = self.pipeline.as_mut().ok_or(ScanError::SessionClosed)?;
        pipeline.set_center_frequency(hz);
        Ok(())
    }

    pub fn pipeline(&self) -> ScanResult<&B::Pipeline> {
        self.pipeline.as_ref().ok_or(ScanError::SessionClosed)
    }
}

impl<B: RadioBackend> Drop for HardwareSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}
