//! Communication events consumed from the extraction stage.

mod types;

pub use types::*;
