//! Block-cyclic distributed dense matrices.
//!
//! A [`DistMatrix`] pairs a [`GridContext`] with a block-cyclic layout and
//! stores only the elements the calling process owns, in a row-major
//! [`Array2`]. Local extents come from the layout closed forms, so every
//! process sizes its block independently. The descriptor produced by
//! [`desc`](DistMatrix::desc) is the standard 9-integer ScaLAPACK form.

use ndarray::Array2;
use num_traits::Zero;

use mpi::traits::Equivalence;

use crate::error::BlockGridError;
use crate::grid::context::GridContext;
use crate::grid::layout::{self, Anchor, BlockSize};
use crate::grid::transfer::{self, StagingPolicy};

/// One logical matrix spread block-cyclically over a process grid.
pub struct DistMatrix<T> {
    ctx: GridContext,
    rows: usize,
    cols: usize,
    block: BlockSize,
    anchor: Anchor,
    local: Array2<T>,
}

impl<T> std::fmt::Debug for DistMatrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistMatrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("block", &self.block)
            .field("anchor", &self.anchor)
            .field("local_shape", &self.local.dim())
            .finish_non_exhaustive()
    }
}

impl<T: Equivalence + Zero + Copy> DistMatrix<T> {
    /// Zero-initialized matrix of global shape `(rows, cols)` distributed
    /// over `ctx` in tiles of `block`, anchored at grid coordinate `anchor`.
    /// Processes outside the grid hold an empty local block.
    pub fn zeros(
        ctx: &GridContext,
        (rows, cols): (usize, usize),
        block: BlockSize,
        anchor: Anchor,
    ) -> Result<Self, BlockGridError> {
        if block.rows == 0 || block.cols == 0 {
            return Err(BlockGridError::EmptyBlock);
        }
        let shape = ctx.shape();
        if anchor.row >= shape.rows || anchor.col >= shape.cols {
            return Err(BlockGridError::AnchorOutOfGrid {
                row: anchor.row,
                col: anchor.col,
                grid_rows: shape.rows,
                grid_cols: shape.cols,
            });
        }
        let (local_rows, local_cols) = match ctx.coord() {
            Some((r, c)) => (
                layout::local_extent(rows, block.rows, r, anchor.row, shape.rows),
                layout::local_extent(cols, block.cols, c, anchor.col, shape.cols),
            ),
            None => (0, 0),
        };
        Ok(DistMatrix {
            ctx: ctx.clone(),
            rows,
            cols,
            block,
            anchor,
            local: Array2::zeros((local_rows, local_cols)),
        })
    }

    /// Global row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Global column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Global `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cyclic tile dimensions.
    pub fn block(&self) -> BlockSize {
        self.block
    }

    /// Grid coordinate anchoring global element (0, 0).
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn context(&self) -> &GridContext {
        &self.ctx
    }

    /// The locally owned block (row-major).
    pub fn local(&self) -> &Array2<T> {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Array2<T> {
        &mut self.local
    }

    /// `(rows, cols)` of the locally owned block.
    pub fn local_shape(&self) -> (usize, usize) {
        self.local.dim()
    }

    /// Leading dimension of the local block under its row-major storage.
    pub fn local_leading(&self) -> usize {
        self.local.ncols().max(1)
    }

    /// The 9-integer ScaLAPACK-style descriptor:
    /// `[dtype, ctxt, m, n, mb, nb, rsrc, csrc, lld]`. The context slot is
    /// this context's process-local [`id`](GridContext::id), or -1 on
    /// processes outside the grid.
    pub fn desc(&self) -> [i32; 9] {
        [
            1,
            if self.ctx.is_valid() { self.ctx.id() } else { -1 },
            self.rows as i32,
            self.cols as i32,
            self.block.rows as i32,
            self.block.cols as i32,
            self.anchor.row as i32,
            self.anchor.col as i32,
            self.local_leading() as i32,
        ]
    }

    /// Grid coordinate owning global element `(i, j)`.
    pub fn owner_of(&self, i: usize, j: usize) -> (usize, usize) {
        let shape = self.ctx.shape();
        (
            layout::owner(i, self.block.rows, self.anchor.row, shape.rows),
            layout::owner(j, self.block.cols, self.anchor.col, shape.cols),
        )
    }

    /// Local indices of global `(i, j)` if the calling process owns it.
    pub fn global_to_local(&self, i: usize, j: usize) -> Option<(usize, usize)> {
        let coord = self.ctx.coord()?;
        if self.owner_of(i, j) != coord {
            return None;
        }
        let shape = self.ctx.shape();
        Some((
            layout::global_to_local(i, self.block.rows, shape.rows),
            layout::global_to_local(j, self.block.cols, shape.cols),
        ))
    }

    /// Global indices of local `(li, lj)`.
    ///
    /// The calling process must hold a grid cell; asking from an excluded
    /// process is a caller bug.
    pub fn local_to_global(&self, li: usize, lj: usize) -> (usize, usize) {
        let (r, c) = self
            .ctx
            .coord()
            .expect("local index query on a process outside the grid");
        let shape = self.ctx.shape();
        (
            layout::local_to_global(li, self.block.rows, r, self.anchor.row, shape.rows),
            layout::local_to_global(lj, self.block.cols, c, self.anchor.col, shape.cols),
        )
    }

    /// The locally owned copy of global element `(i, j)`, if any.
    pub fn get_global(&self, i: usize, j: usize) -> Option<T> {
        let (li, lj) = self.global_to_local(i, j)?;
        Some(self.local[[li, lj]])
    }

    /// Fills the locally owned block from a function of global indices.
    /// Calling this on every grid member materializes the full matrix.
    pub fn fill_with(&mut self, f: impl Fn(usize, usize) -> T) {
        let (lr, lc) = self.local.dim();
        for li in 0..lr {
            for lj in 0..lc {
                let (i, j) = self.local_to_global(li, lj);
                self.local[[li, lj]] = f(i, j);
            }
        }
    }

    /// Redistributes into a new matrix on `target` with the same layout
    /// parameters as this one. Collective over the union of both grids.
    pub fn transfer_to(&self, target: &GridContext) -> Result<DistMatrix<T>, BlockGridError> {
        transfer::transfer(self, target, self.block, self.anchor, StagingPolicy::default())
    }

    /// Redistributes into a new matrix on `target` with an explicit block
    /// size and anchor. Collective over the union of both grids.
    pub fn transfer_to_with_layout(
        &self,
        target: &GridContext,
        block: BlockSize,
        anchor: Anchor,
    ) -> Result<DistMatrix<T>, BlockGridError> {
        transfer::transfer(self, target, block, anchor, StagingPolicy::default())
    }

    /// [`transfer_to_with_layout`](Self::transfer_to_with_layout) with an
    /// explicit staging policy.
    pub fn transfer_with_policy(
        &self,
        target: &GridContext,
        block: BlockSize,
        anchor: Anchor,
        policy: StagingPolicy,
    ) -> Result<DistMatrix<T>, BlockGridError> {
        transfer::transfer(self, target, block, anchor, policy)
    }

    /// Redistributes this matrix's content into `other`, which must have the
    /// same global shape; `other`'s layout is preserved. Collective over the
    /// union of both grids.
    pub fn transfer_to_matrix(&self, other: &mut DistMatrix<T>) -> Result<(), BlockGridError> {
        transfer::transfer_into(self, other, StagingPolicy::default())
    }
}
