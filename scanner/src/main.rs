use anyhow::Context;
use clap::Parser;
use generator::EmitterProfile;
use log::LevelFilter;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::ScanConfig;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "FPV energy scan with optional suscli confirmation and ZMQ publish."
)]
struct Args {
    /// Enable ZMQ alert output (default: off)
    #[arg(short = 'z', long = "zmq", default_value_t = false)]
    zmq: bool,
    /// Alert PUB endpoint (default: tcp://127.0.0.1:4226)
    #[arg(long, env = "FPV_ZMQ_ENDPOINT")]
    zmq_endpoint: Option<String>,
    /// Sensor monitor endpoint (default: tcp://127.0.0.1:4225)
    #[arg(long, env = "WARD_MON_ZMQ")]
    monitor_endpoint: Option<String>,
    /// Receive timeout for the monitor feed, in milliseconds
    #[arg(long, env = "WARD_MON_RECV_TIMEOUT_MS")]
    monitor_timeout_ms: Option<u64>,
    /// Enable extra debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,
    /// Override radio source args (e.g. 'plutosdr=ip:ant.local')
    #[arg(long)]
    source_args: Option<String>,
    /// Pluto address when using default source args (default: ant.local)
    #[arg(long)]
    pluto_uri: Option<String>,
    /// Sample rate in Hz (default: 8e6)
    #[arg(long)]
    samp_rate: Option<f64>,
    /// RF bandwidth in Hz (default: 8e6)
    #[arg(long)]
    bandwidth: Option<f64>,
    /// RF gain (default: 50)
    #[arg(long)]
    gain: Option<f64>,
    /// Extra channel centre in MHz; repeatable
    #[arg(long = "extra-mhz")]
    extra_mhz: Vec<u32>,
    /// Simulated transmitter as MHZ[:BW_MHZ[:POWER_DB]]; repeatable
    #[arg(long = "emitter")]
    emitters: Vec<EmitterProfile>,
    /// Load the scan config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ScanConfig> {
        let mut config = match &self.workflow {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        config.publish.enabled |= self.zmq;
        if let Some(endpoint) = self.zmq_endpoint {
            config.publish.endpoint = endpoint;
        }
        if let Some(endpoint) = self.monitor_endpoint {
            config.monitor.endpoint = endpoint;
        }
        if let Some(timeout) = self.monitor_timeout_ms {
            config.monitor.recv_timeout_ms = timeout;
        }
        if self.source_args.is_some() {
            config.source_args = self.source_args;
        }
        if let Some(uri) = self.pluto_uri {
            config.pluto_uri = uri;
        }
        if let Some(rate) = self.samp_rate {
            config.sample_rate = rate;
        }
        if let Some(bandwidth) = self.bandwidth {
            config.bandwidth = bandwidth;
        }
        if let Some(gain) = self.gain {
            config.gain = gain;
        }
        config.extra_mhz.extend(self.extra_mhz);
        config.generator.emitters.extend(self.emitters);
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let config = args.into_config()?;
    log::debug!("radio source {}", config.resolved_source_args());

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating scanner runtime")?;
    runtime.block_on(workflow::runner::run(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let args = Args::try_parse_from([
            "fpvscan",
            "-z",
            "--zmq-endpoint",
            "tcp://0.0.0.0:5000",
            "--gain",
            "30",
            "--extra-mhz",
            "5123",
            "--extra-mhz",
            "5124",
            "--emitter",
            "5805.5:6:-55",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert!(config.publish.enabled);
        assert_eq!(config.publish.endpoint, "tcp://0.0.0.0:5000");
        assert_eq!(config.gain, 30.0);
        assert_eq!(config.sample_rate, 8e6);
        assert_eq!(config.extra_mhz, vec![5123, 5124]);
        assert_eq!(config.generator.emitters[0].power_db, -55.0);
    }

    #[test]
    fn source_args_override_pluto_uri() {
        let args = Args::try_parse_from([
            "fpvscan",
            "--pluto-uri",
            "usb:0.1.5",
            "--source-args",
            "plutosdr=ip:192.168.2.1",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.resolved_source_args(), "plutosdr=ip:192.168.2.1");
    }
}
