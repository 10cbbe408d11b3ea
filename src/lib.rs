//! # blockgrid
//!
//! blockgrid is the distributed communication and data-distribution layer of a
//! multiple-scattering solver: reference-counted process-group handles with
//! type-generic collectives, sparse neighbor-topology collectives, 2-D process
//! grids, and block-cyclic distributed dense matrices that can be
//! redistributed between grids.
//!
//! ## Features
//! - [`ProcessGroup`](comm::group::ProcessGroup): shared handles over an MPI
//!   communicator with split/duplicate and generic broadcast/gather
//! - [`NeighborGroup`](comm::graph::NeighborGroup): distributed-graph
//!   communicators with blocking and non-blocking neighbor allgather
//! - [`GridContext`](grid::context::GridContext): 2-D process grids with
//!   row- or column-major rank enumeration
//! - [`DistMatrix`](grid::matrix::DistMatrix): block-cyclic matrices whose
//!   descriptor is directly consumable by ScaLAPACK-style libraries, with
//!   grid-to-grid redistribution
//!
//! ## Collective discipline
//!
//! Every operation documented as *collective* is a synchronization point:
//! all members of the group (or, for transfers, the union of both grids)
//! must reach the matching call. The degenerate single-process group short
//! circuits all of them, so serial code paths need no branching.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! blockgrid = "0.2"
//! ```

pub mod comm;
pub mod error;
pub mod grid;

pub use error::BlockGridError;

/// A convenient prelude to import the most-used types:
pub mod prelude {
    pub use crate::comm::graph::{GraphRequest, NeighborGroup};
    pub use crate::comm::group::ProcessGroup;
    pub use crate::comm::session::{self, Session};
    pub use crate::error::BlockGridError;
    pub use crate::grid::context::{GridContext, GridOrder};
    pub use crate::grid::layout::{Anchor, BlockSize, GridShape};
    pub use crate::grid::matrix::DistMatrix;
    pub use crate::grid::transfer::StagingPolicy;
    pub use num_complex::{Complex32, Complex64};
}
