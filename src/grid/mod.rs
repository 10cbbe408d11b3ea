//! Process grids and block-cyclic distributed matrices.

pub mod context;
pub mod layout;
pub mod matrix;
pub mod transfer;

pub use context::{GridContext, GridOrder};
pub use layout::{Anchor, BlockSize, GridShape};
pub use matrix::DistMatrix;
pub use transfer::StagingPolicy;
