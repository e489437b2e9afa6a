//! Top-level scan/confirm control loop.

pub mod scan_loop;
pub mod state;


pub use scan_loop::ScanLoop;
pub use state::ScanState;
