//! 2-D process grid contexts.
//!
//! A [`GridContext`] arranges the first `rows * cols` ranks of a process
//! group into a 2-D grid for dense-matrix work. Construction duplicates the
//! group so matrix traffic cannot collide with unrelated collectives on the
//! same handle, and is therefore collective over the whole group — including
//! ranks that end up outside the grid, which receive a context with no
//! coordinate and must not ask grid-relative questions.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::comm::group::ProcessGroup;
use crate::error::BlockGridError;
use crate::grid::layout::GridShape;

/// Enumeration order mapping ranks to grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOrder {
    RowMajor,
    ColMajor,
}

/// A 2-D arrangement of (a prefix of) a process group.
#[derive(Clone)]
pub struct GridContext {
    /// Duplicated communicator carrying this grid's traffic.
    group: ProcessGroup,
    /// The handle the context was built from; transfers require both
    /// endpoints to share it.
    base: ProcessGroup,
    shape: GridShape,
    order: GridOrder,
    coord: Option<(usize, usize)>,
    id: i32,
}

static NEXT_CONTEXT_ID: AtomicI32 = AtomicI32::new(1);

impl GridContext {
    /// Row-major grid over the first `shape.count()` ranks of `group`.
    /// Collective over `group`.
    pub fn new(group: &ProcessGroup, shape: GridShape) -> Result<Self, BlockGridError> {
        Self::with_order(group, shape, GridOrder::RowMajor)
    }

    /// Row-major grid; alias of [`new`](Self::new). Collective over `group`.
    pub fn row_major(group: &ProcessGroup, shape: GridShape) -> Result<Self, BlockGridError> {
        Self::with_order(group, shape, GridOrder::RowMajor)
    }

    /// Column-major grid: ranks fill columns first. Collective over `group`.
    pub fn col_major(group: &ProcessGroup, shape: GridShape) -> Result<Self, BlockGridError> {
        Self::with_order(group, shape, GridOrder::ColMajor)
    }

    /// Grid with an explicit enumeration order. Collective over `group`.
    pub fn with_order(
        group: &ProcessGroup,
        shape: GridShape,
        order: GridOrder,
    ) -> Result<Self, BlockGridError> {
        if shape.rows == 0 || shape.cols == 0 {
            return Err(BlockGridError::EmptyGrid);
        }
        if shape.count() > group.size() {
            return Err(BlockGridError::GridTooLarge {
                rows: shape.rows,
                cols: shape.cols,
                group_size: group.size(),
            });
        }
        let rank = group.rank();
        let coord = (rank < shape.count()).then(|| match order {
            GridOrder::RowMajor => (rank / shape.cols, rank % shape.cols),
            GridOrder::ColMajor => (rank % shape.rows, rank / shape.rows),
        });
        Ok(GridContext {
            group: group.duplicate(),
            base: group.clone(),
            shape,
            order,
            coord,
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Near-square grid over a prefix of the group: `rows` is the integer
    /// square root of the group size and `cols = n / rows`, so up to
    /// `n mod rows` trailing ranks fall outside the grid (`coord() == None`).
    /// Collective over `group`.
    pub fn square(group: &ProcessGroup) -> Result<Self, BlockGridError> {
        let n = group.size();
        let rows = (1..=n).take_while(|r| r * r <= n).last().unwrap_or(1);
        Self::new(group, GridShape::new(rows, n / rows))
    }

    /// True if the calling process holds a cell of the grid.
    pub fn is_valid(&self) -> bool {
        self.coord.is_some()
    }

    /// This process's (row, column) coordinate, or `None` if excluded.
    pub fn coord(&self) -> Option<(usize, usize)> {
        self.coord
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn order(&self) -> GridOrder {
        self.order
    }

    /// Number of grid cells (not the base group size).
    pub fn size(&self) -> usize {
        self.shape.count()
    }

    /// The communicator carrying this grid's traffic.
    pub fn group(&self) -> &ProcessGroup {
        &self.group
    }

    /// Process-local numeric identifier, used as the context slot of matrix
    /// descriptors.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Rank (in the base group) of the process holding grid cell `coord`.
    /// Duplicated communicators preserve rank numbering, so this rank is
    /// valid on every context derived from the same base group.
    pub fn parent_rank_of(&self, coord: (usize, usize)) -> usize {
        debug_assert!(coord.0 < self.shape.rows && coord.1 < self.shape.cols);
        match self.order {
            GridOrder::RowMajor => coord.0 * self.shape.cols + coord.1,
            GridOrder::ColMajor => coord.1 * self.shape.rows + coord.0,
        }
    }

    /// True if both contexts were built from the same base group, the
    /// precondition for redistributing between them.
    pub fn compatible_with(&self, other: &Self) -> bool {
        self.base.same_group(&other.base)
    }
}

impl PartialEq for GridContext {
    /// Contexts are equal iff they alias the same underlying grid (clones of
    /// one construction); two separately constructed grids are distinct even
    /// with identical shape.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for GridContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridContext")
            .field("shape", &self.shape)
            .field("coord", &self.coord)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_group_gets_a_one_by_one_grid() {
        let g = ProcessGroup::degenerate();
        let ctx = GridContext::new(&g, GridShape::new(1, 1)).unwrap();
        assert!(ctx.is_valid());
        assert_eq!(ctx.coord(), Some((0, 0)));
        assert_eq!(ctx.size(), 1);
        assert_eq!(ctx.parent_rank_of((0, 0)), 0);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let g = ProcessGroup::degenerate();
        let err = GridContext::new(&g, GridShape::new(2, 2)).unwrap_err();
        assert!(matches!(err, BlockGridError::GridTooLarge { .. }));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let g = ProcessGroup::degenerate();
        let err = GridContext::new(&g, GridShape::new(0, 1)).unwrap_err();
        assert_eq!(err, BlockGridError::EmptyGrid);
    }

    #[test]
    fn square_of_one_is_one_by_one() {
        let g = ProcessGroup::degenerate();
        let ctx = GridContext::square(&g).unwrap();
        assert_eq!(ctx.shape(), GridShape::new(1, 1));
    }

    #[test]
    fn coordinate_enumeration_orders() {
        // Coordinate assignment is a pure function of rank and order; spot
        // check the inverse map on both orders for a 2x3 grid.
        for (order, coord, rank) in [
            (GridOrder::RowMajor, (0, 2), 2),
            (GridOrder::RowMajor, (1, 0), 3),
            (GridOrder::ColMajor, (1, 0), 1),
            (GridOrder::ColMajor, (0, 2), 4),
        ] {
            let g = ProcessGroup::degenerate();
            let ctx = GridContext::with_order(&g, GridShape::new(1, 1), order).unwrap();
            // Use a shape-2x3 context's mapping by constructing the shape by
            // hand; parent_rank_of only reads shape and order.
            let probe = GridContext {
                shape: GridShape::new(2, 3),
                ..ctx
            };
            assert_eq!(probe.parent_rank_of(coord), rank);
        }
    }

    #[test]
    fn contexts_from_one_base_are_compatible() {
        let g = ProcessGroup::degenerate();
        let a = GridContext::new(&g, GridShape::new(1, 1)).unwrap();
        let b = GridContext::square(&g).unwrap();
        assert!(a.compatible_with(&b));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a.id(), b.id());
    }
}
