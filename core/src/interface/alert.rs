use crate::confirm::SignalScores;
use crate::interface::location::LocationFix;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ALERT_ID_PREFIX: &str = "fpv-alert";

/// Pipeline stage that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Energy,
    Confirm,
}

impl fmt::Display for AlertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSource::Energy => f.write_str("energy"),
            AlertSource::Confirm => f.write_str("confirm"),
        }
    }
}

/// What happened: one detection or one confirmation of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertEvent {
    pub source: AlertSource,
    pub center_hz: f64,
    pub bandwidth_hz: f64,
    pub scores: SignalScores,
}

impl AlertEvent {
    pub fn energy(center_hz: f64, bandwidth_hz: f64) -> Self {
        Self {
            source: AlertSource::Energy,
            center_hz,
            bandwidth_hz,
            scores: SignalScores::default(),
        }
    }

    pub fn confirm(center_hz: f64, bandwidth_hz: f64, scores: SignalScores) -> Self {
        Self {
            source: AlertSource::Confirm,
            center_hz,
            bandwidth_hz,
            scores,
        }
    }
}

/// One typed message of an alert, serialised as `{"<type name>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertPart {
    #[serde(rename = "Basic ID")]
    BasicId {
        id_type: String,
        id: String,
        description: String,
    },
    #[serde(rename = "Location/Vector Message")]
    Location {
        latitude: f64,
        longitude: f64,
        geodetic_altitude: f64,
        height_agl: f64,
        speed: f64,
        vert_speed: f64,
    },
    #[serde(rename = "Self-ID Message")]
    SelfId { text: String },
    #[serde(rename = "Frequency Message")]
    Frequency { frequency: f64 },
    #[serde(rename = "Signal Info")]
    SignalInfo {
        source: AlertSource,
        center_hz: f64,
        bandwidth_hz: f64,
        pal_conf: f64,
        ntsc_conf: f64,
    },
}

/// Immutable, ordered set of message parts describing one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alert {
    parts: Vec<AlertPart>,
}

impl Alert {
    pub fn build(event: &AlertEvent, location: Option<LocationFix>, id_prefix: &str) -> Self {
        let mut parts = Vec::with_capacity(5);
        parts.push(AlertPart::BasicId {
            id_type: "Serial Number (ANSI/CTA-2063-A)".into(),
            id: alert_id(id_prefix, event.center_hz),
            description: "FPV Signal".into(),
        });
        if let Some(fix) = location {
            parts.push(AlertPart::Location {
                latitude: fix.latitude,
                longitude: fix.longitude,
                geodetic_altitude: fix.altitude,
                height_agl: 0.0,
                speed: 0.0,
                vert_speed: 0.0,
            });
        }
        parts.push(AlertPart::SelfId {
            text: format!("FPV alert ({})", event.source),
        });
        parts.push(AlertPart::Frequency {
            frequency: event.center_hz,
        });
        parts.push(AlertPart::SignalInfo {
            source: event.source,
            center_hz: event.center_hz,
            bandwidth_hz: event.bandwidth_hz,
            pal_conf: event.scores.pal,
            ntsc_conf: event.scores.ntsc,
        });
        Self { parts }
    }

    pub fn parts(&self) -> &[AlertPart] {
        &self.parts
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub fn alert_id(prefix: &str, center_hz: f64) -> String {
    format!("{}-{:.3}MHz", prefix, center_hz / 1e6)
}
