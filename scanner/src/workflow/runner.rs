use crate::bridge::{ZmqMonitor, ZmqPublisher};
use crate::generator::SyntheticBackend;
use crate::workflow::config::ScanConfig;
use anyhow::Context;
use fpvcore::confirm::ConfirmEngine;
use fpvcore::hardware::HardwareSession;
use fpvcore::interface::{AlertPublisher, LocationTracker};
use fpvcore::scan::ScanLoop;
use fpvcore::telemetry::ScanSnapshot;
use log::{error, info};
use tokio::signal;

type Scanner = ScanLoop<SyntheticBackend, ConfirmEngine, ZmqPublisher, ZmqMonitor>;

/// Wires the scanner together from `config`. The publisher is bound before the
/// radio is opened; the monitor feed connects in the background.
pub async fn build(config: &ScanConfig) -> anyhow::Result<Scanner> {
    let session = HardwareSession::new(
        SyntheticBackend::new(config.generator.clone()),
        config.frontend_params(),
        config.timing,
    );
    let engine = ConfirmEngine::new(config.classifier.clone());

    let monitor = ZmqMonitor::spawn(&config.monitor.endpoint, config.monitor.recv_timeout());

    let mut scanner: Scanner = ScanLoop::new(
        config.channel_plan(),
        session,
        engine,
        LocationTracker::new(Some(monitor)),
        config.timing,
    );

    if config.publish.enabled {
        let publisher = ZmqPublisher::bind(&config.publish.endpoint).await?;
        info!("publishing alerts on {}", publisher.endpoint());
        scanner = scanner.with_publisher(AlertPublisher::new(
            publisher,
            config.publish.alert_id_prefix.clone(),
        ));
    }

    Ok(scanner)
}

/// Runs until Ctrl+C or a fatal hardware error. The radio is released on both paths.
pub async fn run(config: ScanConfig) -> anyhow::Result<()> {
    let mut scanner = build(&config).await?;
    let calibrator = config.calibrator();

    let outcome = tokio::select! {
        result = async {
            scanner.start(calibrator.as_ref()).await?;
            scanner.run().await
        } => result.context("scan loop stopped"),
        interrupted = signal::ctrl_c() => {
            interrupted.context("awaiting Ctrl+C")?;
            info!("interrupted, releasing radio");
            Ok(())
        }
    };

    let snapshot = scanner.shutdown();
    log_summary(&snapshot);
    if let Err(err) = &outcome {
        error!("fatal: {:#}", err);
    }
    outcome
}

fn log_summary(snapshot: &ScanSnapshot) {
    info!(
        "sweeps={} channels={} detections={} confirmed={} skipped={} failed={} alerts={} publish_failures={}",
        snapshot.sweeps_completed,
        snapshot.channels_visited,
        snapshot.detections,
        snapshot.confirmations,
        snapshot.confirmations_skipped,
        snapshot.confirmations_failed,
        snapshot.alerts_published,
        snapshot.publish_failures
    );
}
