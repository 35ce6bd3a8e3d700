//! Versioned source of truth.
//!
//! Entries are append-only: an update to logical id `X` is stored as
//! `X_v2`, `X_v3`, ... each linking back to the version it replaces.

mod entry;
mod error;
mod populate;
mod store;

pub use entry::*;
pub use error::TruthError;
pub use populate::*;
pub use store::*;
