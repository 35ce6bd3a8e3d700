//! Knowledge graph of people, topics and decisions.
//!
//! - `builder` turns enriched events into a graph
//! - `centrality` ranks nodes by structural position
//! - `snapshot` persists the graph as `{nodes, links}` JSON

mod builder;
mod centrality;
mod error;
mod snapshot;
mod types;

pub use builder::*;
pub use centrality::*;
pub use error::GraphError;
pub use snapshot::*;
pub use types::*;
