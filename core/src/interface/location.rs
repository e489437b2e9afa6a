use crate::interface::transport::TelemetrySource;
use serde_json::{Map, Value};

/// Sensor position: latitude/longitude in degrees, altitude in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl LocationFix {
    /// Returns `None` for coordinates outside the valid lat/lon ranges.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
            altitude,
        })
    }
}

/// Decodes a monitor message; only a JSON object with numeric top-level
/// `lat`/`lon` counts. Malformed or out-of-range input yields `None`.
pub fn parse_fix(text: &str) -> Option<LocationFix> {
    let message: Map<String, Value> = serde_json::from_str(text).ok()?;
    let latitude = message.get("lat")?.as_f64()?;
    let longitude = message.get("lon")?.as_f64()?;
    let altitude = match message.get("alt") {
        None | Some(Value::Null) => 0.0,
        Some(alt) => alt.as_f64()?,
    };
    LocationFix::new(latitude, longitude, altitude)
}

/// Keeps the most recent valid fix from an optional telemetry feed.
pub struct LocationTracker<T: TelemetrySource> {
    source: Option<T>,
    latest: Option<LocationFix>,
}

impl<T: TelemetrySource> LocationTracker<T> {
    pub fn new(source: Option<T>) -> Self {
        Self {
            source,
            latest: None,
        }
    }

    pub fn latest(&self) -> Option<LocationFix> {
        self.latest
    }

    /// Stores the fix carried by `text`, if any. Returns whether it was accepted.
    pub fn ingest(&mut self, text: &str) -> bool {
        match parse_fix(text) {
            Some(fix) => {
                self.latest = Some(fix);
                true
            }
            None => false,
        }
    }

    /// Takes at most one pending message from the feed without blocking the scan.
    pub async fn poll(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        if let Some(text) = source.try_recv().await {
            self.ingest(&text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Queue(VecDeque<String>);

    impl TelemetrySource for Queue {
        async fn try_recv(&mut self) -> Option<String> {
            self.0.pop_front()
        }
    }

    #[test]
    fn out_of_range_fix_leaves_previous_value() {
        let mut tracker: LocationTracker<Queue> = LocationTracker::new(None);
        assert!(tracker.ingest(r#"{"lat":45.0,"lon":-120.0,"alt":100.0}"#));
        assert!(!tracker.ingest(r#"{"lat":95.0,"lon":-120.0,"alt":100.0}"#));
        assert_eq!(
            tracker.latest(),
            Some(LocationFix {
                latitude: 45.0,
                longitude: -120.0,
                altitude: 100.0
            })
        );
    }

    #[test]
    fn malformed_messages_are_ignored() {
        assert_eq!(parse_fix("not json"), None);
        assert_eq!(parse_fix(r#"{"lat":"45","lon":1.0}"#), None);
        assert_eq!(parse_fix(r#"{"lon":1.0}"#), None);
        assert_eq!(parse_fix(r#"[1,2,3]"#), None);
        assert_eq!(parse_fix(r#"[45.0,-120.0]"#), None);
        assert_eq!(parse_fix(r#"{"lat":45.0,"lon":-120.0,"alt":"high"}"#), None);
    }

    #[test]
    fn array_message_does_not_replace_fix() {
        let mut tracker: LocationTracker<Queue> = LocationTracker::new(None);
        assert!(tracker.ingest(r#"{"lat":45.0,"lon":-120.0}"#));
        assert!(!tracker.ingest("[1,2,3]"));
        assert_eq!(tracker.latest().map(|fix| fix.latitude), Some(45.0));
    }

    #[test]
    fn missing_altitude_defaults_to_zero() {
        let fix = parse_fix(r#"{"lat":-33.9,"lon":151.2,"gps_fix":true}"#).unwrap();
        assert_eq!(fix.altitude, 0.0);
    }

    #[tokio::test]
    async fn poll_takes_one_message_per_call() {
        let queue = Queue(VecDeque::from(vec![
            r#"{"lat":1.0,"lon":2.0}"#.to_string(),
            r#"{"lat":3.0,"lon":4.0}"#.to_string(),
        ]));
        let mut tracker = LocationTracker::new(Some(queue));
        tracker.poll().await;
        assert_eq!(tracker.latest().map(|f| f.latitude), Some(1.0));
        tracker.poll().await;
        tracker.poll().await;
        assert_eq!(tracker.latest().map(|f| f.latitude), Some(3.0));
    }
}
