//! ZeroMQ endpoints: alert publication and sensor telemetry.

pub mod monitor;
pub mod publisher;

pub use monitor::ZmqMonitor;
pub use publisher::ZmqPublisher;
