pub mod alert;
pub mod location;
pub mod transport;

pub use alert::{Alert, AlertEvent, AlertPart, AlertSource, ALERT_ID_PREFIX};
pub use location::{LocationFix, LocationTracker};
pub use transport::{AlertPublisher, AlertSink, PublishError, TelemetrySource};
