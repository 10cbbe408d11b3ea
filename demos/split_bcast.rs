//! Splits the world by rank parity and runs collectives in each half.
//!
//! Run with e.g. `mpiexec -n 4 cargo run --example split_bcast`.

use blockgrid::prelude::*;

fn main() {
    let session = Session::new();
    let world = session.world();
    println!("rank {} of {} up", world.rank(), world.size());

    let parity = (world.rank() % 2) as i32;
    if let Some(sub) = world.split(parity) {
        let seed = if sub.is_root() { world.rank() as u64 } else { 0 };
        let got = sub.broadcast(seed, 0);
        println!(
            "rank {}: parity-{parity} subgroup of {} heard {got} from its root",
            world.rank(),
            sub.size()
        );
    }

    let gathered = world.gather(world.rank() as u64, 0);
    if world.is_root() {
        println!("root gathered {gathered:?}");
    }
}
