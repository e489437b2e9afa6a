pub mod frontend;
pub mod profile;

pub use frontend::SyntheticBackend;
pub use profile::{EmitterProfile, GeneratorConfig};
