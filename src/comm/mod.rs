//! Process groups, generic collectives, and neighbor topologies.

pub mod collectives;
pub mod graph;
pub mod group;
pub mod session;

pub use graph::NeighborGroup;
pub use group::ProcessGroup;
pub use session::Session;
