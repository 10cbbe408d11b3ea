//! Block-cyclic layout arithmetic.
//!
//! A block-cyclic distribution chops one dimension of length `n` into tiles
//! of `nb` consecutive indices and deals the tiles round-robin to the
//! `nprocs` grid coordinates along that dimension, starting at the anchor
//! coordinate `isrc`. Everything here is a closed form over those five
//! numbers: each process computes its own extents and index maps with no
//! communication, which is the invariant the whole redistribution engine
//! rests on.

use serde::{Deserialize, Serialize};

/// Dimensions of one cyclic tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSize {
    pub rows: usize,
    pub cols: usize,
}

impl BlockSize {
    pub const fn new(rows: usize, cols: usize) -> Self {
        BlockSize { rows, cols }
    }

    pub const fn square(n: usize) -> Self {
        BlockSize { rows: n, cols: n }
    }
}

/// Grid coordinate at which global element (0, 0) is anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub row: usize,
    pub col: usize,
}

impl Anchor {
    pub const fn new(row: usize, col: usize) -> Self {
        Anchor { row, col }
    }
}

/// Shape of a 2-D process grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        GridShape { rows, cols }
    }

    /// Number of grid cells.
    pub const fn count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Number of indices of a dimension of length `n`, tiled by `nb`, owned by
/// grid coordinate `iproc` when the distribution starts at `isrc` over
/// `nprocs` coordinates. The ScaLAPACK `NUMROC` closed form.
pub fn local_extent(n: usize, nb: usize, iproc: usize, isrc: usize, nprocs: usize) -> usize {
    debug_assert!(nb > 0 && nprocs > 0);
    debug_assert!(iproc < nprocs && isrc < nprocs);
    let mydist = (nprocs + iproc - isrc) % nprocs;
    let nblocks = n / nb;
    let mut extent = nblocks / nprocs * nb;
    let extra = nblocks % nprocs;
    if mydist < extra {
        extent += nb;
    } else if mydist == extra {
        extent += n % nb;
    }
    extent
}

/// Grid coordinate owning global index `g` along one dimension.
pub fn owner(g: usize, nb: usize, isrc: usize, nprocs: usize) -> usize {
    (isrc + g / nb) % nprocs
}

/// Index of global `g` within its owner's local storage.
pub fn global_to_local(g: usize, nb: usize, nprocs: usize) -> usize {
    g / (nb * nprocs) * nb + g % nb
}

/// Global index of local `l` on grid coordinate `iproc`.
pub fn local_to_global(l: usize, nb: usize, iproc: usize, isrc: usize, nprocs: usize) -> usize {
    let mydist = (nprocs + iproc - isrc) % nprocs;
    (l / nb * nprocs + mydist) * nb + l % nb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_cover_ten_by_two_blocks_on_two_procs() {
        // 10 indices, tiles of 2, dealt to 2 coordinates: 3 tiles vs 2 tiles.
        assert_eq!(local_extent(10, 2, 0, 0, 2), 6);
        assert_eq!(local_extent(10, 2, 1, 0, 2), 4);
        // Anchoring at coordinate 1 swaps the shares.
        assert_eq!(local_extent(10, 2, 0, 1, 2), 4);
        assert_eq!(local_extent(10, 2, 1, 1, 2), 6);
    }

    #[test]
    fn ragged_tail_lands_on_the_boundary_coordinate() {
        // 7 indices, tiles of 3, 2 coordinates: blocks 0,2 on coord 0 (sizes
        // 3 and 1), block 1 on coord 1 (size 3).
        assert_eq!(local_extent(7, 3, 0, 0, 2), 4);
        assert_eq!(local_extent(7, 3, 1, 0, 2), 3);
    }

    #[test]
    fn single_coordinate_owns_everything() {
        assert_eq!(local_extent(13, 4, 0, 0, 1), 13);
        for g in 0..13 {
            assert_eq!(owner(g, 4, 0, 1), 0);
            assert_eq!(global_to_local(g, 4, 1), g);
        }
    }

    #[test]
    fn owner_and_index_maps_are_mutually_inverse() {
        let (n, nb, nprocs, isrc) = (23, 3, 4, 2);
        for g in 0..n {
            let p = owner(g, nb, isrc, nprocs);
            let l = global_to_local(g, nb, nprocs);
            assert!(l < local_extent(n, nb, p, isrc, nprocs));
            assert_eq!(local_to_global(l, nb, p, isrc, nprocs), g);
        }
    }

    #[test]
    fn extents_partition_the_dimension() {
        for &(n, nb, nprocs, isrc) in &[(10, 2, 2, 0), (10, 2, 2, 1), (100, 7, 3, 2), (5, 8, 4, 0)]
        {
            let total: usize = (0..nprocs)
                .map(|p| local_extent(n, nb, p, isrc, nprocs))
                .sum();
            assert_eq!(total, n, "n={n} nb={nb} p={nprocs} isrc={isrc}");
        }
    }
}
