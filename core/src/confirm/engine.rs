use crate::confirm::breaker::{ConfirmBreaker, DisableReason};
use crate::confirm::record::{reduce_output, HEADER_RECORDS};
use crate::confirm::{Confirm, ConfirmFailure, ConfirmOutcome};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::timeout;

/// Invocation profile for the external video-modulation classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub binary: String,
    pub command: String,
    pub profile: String,
    pub bandwidth: String,
    pub dt: String,
    pub q: String,
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub header_records: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            binary: "suscli".into(),
            command: "fpvdet".into(),
            profile: "fpv58_race_2m".into(),
            bandwidth: "1.8e6".into(),
            dt: "0.1".into(),
            q: "10".into(),
            timeout: Duration::from_secs(5),
            header_records: HEADER_RECORDS,
        }
    }
}

impl ClassifierConfig {
    pub fn args(&self, candidate_hz: f64) -> Vec<String> {
        vec![
            self.command.clone(),
            format!("--profile={}", self.profile),
            format!("--frequency={}", candidate_hz),
            format!("--bandwidth={}", self.bandwidth),
            format!("--dt={}", self.dt),
            format!("--q={}", self.q),
            "--formatter=json".to_string(),
        ]
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

enum Exit {
    Status(ExitStatus),
    TimedOut,
    WaitFailed(std::io::Error),
}

struct Capture {
    stdout: String,
    stderr: String,
    exit: Exit,
}

/// Reads stdout and stderr until the child exits or `limit` expires. Output
/// captured before the deadline is kept either way.
async fn capture(mut child: Child, limit: Duration) -> Capture {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let finished = timeout(limit, async {
        let read_stdout = async {
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut stdout).await;
            }
        };
        let read_stderr = async {
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut stderr).await;
            }
        };
        let (_, _, status) = tokio::join!(read_stdout, read_stderr, child.wait());
        status
    })
    .await;

    let exit = match finished {
        Ok(Ok(status)) => Exit::Status(status),
        Ok(Err(err)) => Exit::WaitFailed(err),
        Err(_) => {
            let _ = child.kill().await;
            Exit::TimedOut
        }
    };

    Capture {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit,
    }
}

fn reports_unknown_command(output: &str) -> bool {
    output.contains("Unknown command") || output.contains("unknown command")
}

/// Runs the classifier against one candidate frequency at a time and
/// permanently disables itself when the tool is missing or lacks the command.
pub struct ConfirmEngine {
    config: ClassifierConfig,
    breaker: ConfirmBreaker,
    spawned: usize,
}

impl ConfirmEngine {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            breaker: ConfirmBreaker::new(),
            spawned: 0,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn disabled_reason(&self) -> Option<&DisableReason> {
        self.breaker.reason()
    }

    /// Number of classifier processes started so far.
    pub fn spawn_count(&self) -> usize {
        self.spawned
    }

    fn disable(&mut self, reason: DisableReason) -> ConfirmOutcome {
        self.breaker.trip(reason.clone());
        ConfirmOutcome::Disabled(self.breaker.reason().cloned().unwrap_or(reason))
    }

    async fn run(&mut self, candidate_hz: f64) -> ConfirmOutcome {
        let args = self.config.args(candidate_hz);
        debug!("running {} {}", self.config.binary, args.join(" "));
        let spawned = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let binary = self.config.binary.clone();
                return self.disable(DisableReason::BinaryNotFound { binary });
            }
            Err(err) => return ConfirmOutcome::Failed(ConfirmFailure::Spawn(err.to_string())),
        };
        self.spawned += 1;

        let capture = capture(child, self.config.timeout).await;
        let summary = reduce_output(&capture.stdout, self.config.header_records);

        match capture.exit {
            Exit::Status(status) if status.success() => ConfirmOutcome::Scores(summary.best),
            Exit::Status(status) => {
                let combined = format!("{}\n{}", capture.stdout, capture.stderr);
                if reports_unknown_command(&combined) {
                    let reason = DisableReason::UnknownCommand {
                        binary: self.config.binary.clone(),
                        command: self.config.command.clone(),
                    };
                    return self.disable(reason);
                }
                ConfirmOutcome::Failed(ConfirmFailure::ExitStatus(status.code()))
            }
            Exit::TimedOut if summary.records > 0 => ConfirmOutcome::Scores(summary.best),
            Exit::TimedOut => ConfirmOutcome::Failed(ConfirmFailure::TimedOut(self.config.timeout)),
            Exit::WaitFailed(err) => ConfirmOutcome::Failed(ConfirmFailure::Wait(err.to_string())),
        }
    }
}

impl Confirm for ConfirmEngine {
    async fn confirm(&mut self, candidate_hz: f64) -> ConfirmOutcome {
        if let Some(reason) = self.breaker.reason() {
            return ConfirmOutcome::Disabled(reason.clone());
        }
        self.run(candidate_hz).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::record::SignalScores;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn missing_binary() -> ClassifierConfig {
        ClassifierConfig {
            binary: "/nonexistent/fpv-classifier-missing".into(),
            ..Default::default()
        }
    }

    /// Runs `body` through `/bin/sh`, passed where the sub-command normally goes.
    #[cfg(unix)]
    fn shell_classifier(body: &str, limit: Duration) -> (ClassifierConfig, tempfile::TempPath) {
        let mut script = NamedTempFile::new().unwrap();
        script.write_all(body.as_bytes()).unwrap();
        let path = script.into_temp_path();
        let config = ClassifierConfig {
            binary: "/bin/sh".into(),
            command: path.to_string_lossy().into_owned(),
            timeout: limit,
            ..Default::default()
        };
        (config, path)
    }

    #[test]
    fn args_carry_profile_and_frequency() {
        let args = ClassifierConfig::default().args(5805.5e6);
        assert_eq!(args[0], "fpvdet");
        assert!(args.contains(&"--profile=fpv58_race_2m".to_string()));
        assert!(args.contains(&"--frequency=5805500000".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--formatter=json"));
    }

    #[tokio::test]
    async fn missing_binary_disables_confirmation_once() {
        let mut engine = ConfirmEngine::new(missing_binary());
        let first = engine.confirm(5805e6).await;
        assert!(matches!(
            first,
            ConfirmOutcome::Disabled(DisableReason::BinaryNotFound { .. })
        ));
        let second = engine.confirm(5740e6).await;
        assert_eq!(first, second);
        assert_eq!(engine.spawn_count(), 0);
        assert!(engine.disabled_reason().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn best_of_run_scores_are_returned() {
        let (config, _script) = shell_classifier(
            "echo '{\"version\":1}'\n\
             echo '{\"device\":\"pluto\"}'\n\
             echo '{\"signal\":{\"pal\":0.2,\"ntsc\":0.1}}'\n\
             echo 'not json'\n\
             echo '{\"signal\":{\"pal\":0.9,\"ntsc\":0.1}}'\n\
             echo '{\"signal\":'\n\
             echo '{\"signal\":{\"pal\":0.4,\"ntsc\":0.8}}'\n",
            Duration::from_secs(5),
        );
        let mut engine = ConfirmEngine::new(config);
        let outcome = engine.confirm(5805e6).await;
        assert_eq!(outcome, ConfirmOutcome::Scores(SignalScores::new(0.9, 0.8)));
        assert_eq!(engine.spawn_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unknown_command_trips_breaker() {
        let (config, _script) =
            shell_classifier("echo 'Unknown command: fpvdet' >&2\nexit 1\n", Duration::from_secs(5));
        let mut engine = ConfirmEngine::new(config);
        assert!(matches!(
            engine.confirm(5805e6).await,
            ConfirmOutcome::Disabled(DisableReason::UnknownCommand { .. })
        ));
        assert!(matches!(
            engine.confirm(5805e6).await,
            ConfirmOutcome::Disabled(_)
        ));
        assert_eq!(engine.spawn_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn plain_non_zero_exit_is_a_single_failure() {
        let (config, _script) = shell_classifier("echo 'device busy' >&2\nexit 3\n", Duration::from_secs(5));
        let mut engine = ConfirmEngine::new(config);
        assert_eq!(
            engine.confirm(5805e6).await,
            ConfirmOutcome::Failed(ConfirmFailure::ExitStatus(Some(3)))
        );
        assert_eq!(
            engine.confirm(5805e6).await,
            ConfirmOutcome::Failed(ConfirmFailure::ExitStatus(Some(3)))
        );
        assert_eq!(engine.spawn_count(), 2);
        assert!(engine.disabled_reason().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_keeps_partial_output() {
        let (config, _script) = shell_classifier(
            "echo '{}'\necho '{}'\necho '{\"signal\":{\"pal\":0.7,\"ntsc\":0.3}}'\nexec sleep 5\n",
            Duration::from_millis(500),
        );
        let mut engine = ConfirmEngine::new(config);
        assert_eq!(
            engine.confirm(5805e6).await,
            ConfirmOutcome::Scores(SignalScores::new(0.7, 0.3))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_without_records_is_a_failure() {
        let (config, _script) = shell_classifier("exec sleep 5\n", Duration::from_millis(200));
        let mut engine = ConfirmEngine::new(config);
        assert!(matches!(
            engine.confirm(5805e6).await,
            ConfirmOutcome::Failed(ConfirmFailure::TimedOut(_))
        ));
        assert!(engine.disabled_reason().is_none());
    }
}
