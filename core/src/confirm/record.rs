//! Decoding of the classifier's line-delimited JSON output.

use serde::Deserialize;

/// Number of structured lines the classifier prints before its first score
/// record. Empirical for `suscli fpvdet` with `--formatter=json`; other tool
/// versions may differ, so it is configurable on the engine.
pub const HEADER_RECORDS: usize = 2;

/// PAL/NTSC confidence scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct SignalScores {
    #[serde(default)]
    pub pal: f64,
    #[serde(default)]
    pub ntsc: f64,
}

impl SignalScores {
    pub fn new(pal: f64, ntsc: f64) -> Self {
        Self { pal, ntsc }
    }

    fn max(self, other: SignalScores) -> Self {
        Self {
            pal: self.pal.max(other.pal),
            ntsc: self.ntsc.max(other.ntsc),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifierRecord {
    #[serde(default)]
    signal: SignalScores,
}

/// Best-of-run reduction of one classifier invocation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunSummary {
    pub best: SignalScores,
    pub records: usize,
}

pub fn is_structured(line: &str) -> bool {
    line.starts_with('{')
}

/// Decodes one structured line; `None` means the line is skipped.
pub fn decode_line(line: &str) -> Option<SignalScores> {
    serde_json::from_str::<ClassifierRecord>(line)
        .ok()
        .map(|record| record.signal)
}

/// Skips the header, decodes the remaining structured lines and keeps the
/// per-score maxima. Undecodable lines are ignored.
pub fn reduce_output(output: &str, header_records: usize) -> RunSummary {
    output
        .lines()
        .filter(|line| is_structured(line))
        .skip(header_records)
        .filter_map(decode_line)
        .fold(RunSummary::default(), |summary, scores| RunSummary {
            best: summary.best.max(scores),
            records: summary.records + 1,
        })
}
