//! Property tests for the block-cyclic index arithmetic.

use proptest::prelude::*;

use blockgrid::grid::layout::{global_to_local, local_extent, local_to_global, owner};

prop_compose! {
    /// A dimension length, block size, process count and anchor coordinate.
    fn dist_params()(
        n in 0usize..256,
        nb in 1usize..12,
        nprocs in 1usize..9,
        isrc_seed in 0usize..9,
    ) -> (usize, usize, usize, usize) {
        (n, nb, nprocs, isrc_seed % nprocs)
    }
}

proptest! {
    /// Local extents over all coordinates partition the dimension exactly.
    #[test]
    fn extents_partition_dimension((n, nb, nprocs, isrc) in dist_params()) {
        let total: usize = (0..nprocs)
            .map(|p| local_extent(n, nb, p, isrc, nprocs))
            .sum();
        prop_assert_eq!(total, n);
    }

    /// Every global index maps to exactly one owner, whose local index is in
    /// bounds and maps back to the same global index.
    #[test]
    fn index_maps_roundtrip((n, nb, nprocs, isrc) in dist_params()) {
        for g in 0..n {
            let p = owner(g, nb, isrc, nprocs);
            prop_assert!(p < nprocs);
            let l = global_to_local(g, nb, nprocs);
            prop_assert!(l < local_extent(n, nb, p, isrc, nprocs));
            prop_assert_eq!(local_to_global(l, nb, p, isrc, nprocs), g);
        }
    }

    /// Each coordinate's local-to-global map is strictly increasing, which
    /// the redistribution schedule relies on for ordering.
    #[test]
    fn local_to_global_is_monotone((n, nb, nprocs, isrc) in dist_params()) {
        for p in 0..nprocs {
            let extent = local_extent(n, nb, p, isrc, nprocs);
            for l in 1..extent {
                prop_assert!(
                    local_to_global(l, nb, p, isrc, nprocs)
                        > local_to_global(l - 1, nb, p, isrc, nprocs)
                );
            }
        }
    }

    /// Anchoring the distribution at coordinate `isrc` gives that coordinate
    /// the very first block.
    #[test]
    fn anchor_owns_first_block((n, nb, nprocs, isrc) in dist_params()) {
        for g in 0..n.min(nb) {
            prop_assert_eq!(owner(g, nb, isrc, nprocs), isrc);
        }
    }
}
