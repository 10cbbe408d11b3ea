//! Builds a ring topology over the world and exchanges values between
//! neighbors, first one element each, then a variable count per rank.
//!
//! Run with e.g. `mpiexec -n 4 cargo run --example graph_allgather`.

use blockgrid::prelude::*;

fn main() {
    let session = Session::new();
    let world = session.world();
    let (n, me) = (world.size(), world.rank());
    let left = (me + n - 1) % n;
    let right = (me + 1) % n;

    let graph =
        NeighborGroup::new(&world, &[left], &[right], false).expect("world carries a communicator");
    let (indeg, outdeg, _) = graph.nedges();
    let heard = graph.allgather(&(me as u64)).expect("one slot per source");
    println!(
        "rank {me}: {indeg} in / {outdeg} out, heard {heard:?} from {:?}",
        graph.sources().collect::<Vec<_>>()
    );

    // Rank r contributes r + 1 copies of its id.
    let send = vec![me as u64; me + 1];
    let heard = graph
        .allgatherv(&send, &[left + 1])
        .expect("counts agreed with the topology");
    println!("rank {me}: variable-count gather {heard:?}");
}
