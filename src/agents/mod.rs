//! Rule-based agents.
//!
//! Each agent borrows the graph or the truth store for the duration of one
//! request and recomputes everything it reports.

mod coordinator;
mod critic;
mod memory;

pub use coordinator::*;
pub use critic::*;
pub use memory::*;
