//! Fills a block-cyclic matrix on an n-by-1 process grid and redistributes
//! it onto a 1-by-n grid with a different blocking.
//!
//! Run with e.g. `mpiexec -n 4 cargo run --example transfer_grids`.

use blockgrid::prelude::*;

fn main() {
    let session = Session::new();
    let world = session.world();
    let n = world.size();

    let rows = GridContext::new(&world, GridShape::new(n, 1)).expect("n ranks fill an n-by-1 grid");
    let cols = GridContext::new(&world, GridShape::new(1, n)).expect("n ranks fill a 1-by-n grid");

    let mut m = DistMatrix::<f64>::zeros(&rows, (8, 8), BlockSize::square(2), Anchor::default())
        .expect("block and anchor fit the grid");
    m.fill_with(|i, j| (10 * i + j) as f64);
    println!(
        "rank {}: holds {:?} of the 8x8 matrix on the row grid",
        world.rank(),
        m.local_shape()
    );

    let moved = m
        .transfer_to_with_layout(&cols, BlockSize::new(3, 3), Anchor::default())
        .expect("both grids share the world group");
    println!(
        "rank {}: holds {:?} on the column grid, descriptor {:?}",
        world.rank(),
        moved.local_shape(),
        moved.desc()
    );
}
