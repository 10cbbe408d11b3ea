//! BlockGridError: unified error type for blockgrid public APIs.
//!
//! Recoverable conditions (bad construction arguments, mismatched shapes,
//! failed MPI calls) are reported through this enum. Preconditions whose
//! violation would desynchronize a collective — an out-of-range root rank,
//! reading local indices on an excluded process — are asserted instead:
//! there is no distributed rollback, so they must fail early and loudly.

use thiserror::Error;

/// Unified error type for blockgrid operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockGridError {
    /// Requested grid has more cells than the group has processes.
    #[error("grid {rows}x{cols} does not fit in a group of {group_size} processes")]
    GridTooLarge {
        rows: usize,
        cols: usize,
        group_size: usize,
    },
    /// Grid dimensions must both be non-zero.
    #[error("grid dimensions must be non-zero")]
    EmptyGrid,
    /// Block-cyclic tile dimensions must both be non-zero.
    #[error("block dimensions must be non-zero")]
    EmptyBlock,
    /// Anchor coordinate lies outside the process grid.
    #[error("anchor ({row}, {col}) lies outside a {grid_rows}x{grid_cols} grid")]
    AnchorOutOfGrid {
        row: usize,
        col: usize,
        grid_rows: usize,
        grid_cols: usize,
    },
    /// Two matrices in a same-shape transfer disagree on global shape.
    #[error("global shape {found:?} does not match expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// Transfer endpoints were built from different base process groups.
    #[error("contexts are not derived from the same process group")]
    ContextMismatch,
    /// Receive-count list does not match the topology in-degree.
    #[error("got {counts} receive counts for a topology with in-degree {indegree}")]
    CountMismatch { counts: usize, indegree: usize },
    /// A neighbor topology with edges was requested on the degenerate group.
    #[error("operation requires a live MPI group, got the degenerate group")]
    DegenerateGroup,
    /// An underlying MPI call reported failure.
    #[error("{call} failed with error code {code}")]
    Mpi { call: &'static str, code: i32 },
}
