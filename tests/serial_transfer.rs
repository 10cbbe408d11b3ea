//! End-to-end exercises of the public API on the degenerate single-process
//! group. These need no MPI runtime and run under plain `cargo test`.

use blockgrid::prelude::*;

fn ctx_1x1(group: &ProcessGroup) -> GridContext {
    GridContext::new(group, GridShape::new(1, 1)).unwrap()
}

#[test]
fn degenerate_group_collectives_are_local() {
    let g = ProcessGroup::degenerate();
    assert_eq!(g.size(), 1);
    assert_eq!(g.rank(), 0);
    assert!(g.is_root());
    assert_eq!(g.broadcast(17u64, 0), 17);
    assert_eq!(g.gather(3.5f64, 0), vec![3.5]);
    assert_eq!(g.broadcast_vec(vec![1u32, 2, 3], 0), vec![1, 2, 3]);
}

#[test]
fn degenerate_split_keeps_membership_by_sign() {
    let g = ProcessGroup::degenerate();
    assert!(g.split(0).is_some());
    assert!(g.split(7).is_some());
    assert!(g.split(-1).is_none());
}

#[test]
fn square_context_on_one_process_is_1x1() {
    let g = ProcessGroup::degenerate();
    let ctx = GridContext::square(&g).unwrap();
    assert_eq!(ctx.shape(), GridShape::new(1, 1));
    assert_eq!(ctx.coord(), Some((0, 0)));
    assert!(ctx.is_valid());
}

#[test]
fn matrix_descriptor_and_indexing() {
    let g = ProcessGroup::degenerate();
    let ctx = ctx_1x1(&g);
    let mut m =
        DistMatrix::<f64>::zeros(&ctx, (6, 4), BlockSize::new(2, 2), Anchor::default()).unwrap();
    m.fill_with(|i, j| (10 * i + j) as f64);

    let desc = m.desc();
    assert_eq!(desc[0], 1);
    assert_eq!((desc[2], desc[3]), (6, 4));
    assert_eq!((desc[4], desc[5]), (2, 2));
    assert_eq!(desc[8], 4);

    assert_eq!(m.owner_of(5, 3), (0, 0));
    assert_eq!(m.global_to_local(5, 3), Some((5, 3)));
    assert_eq!(m.get_global(5, 3), Some(53.0));
}

#[test]
fn complex_matrix_transfers_between_layouts() {
    let g = ProcessGroup::degenerate();
    let (a, b) = (ctx_1x1(&g), ctx_1x1(&g));
    let mut m =
        DistMatrix::<Complex64>::zeros(&a, (5, 5), BlockSize::square(2), Anchor::default())
            .unwrap();
    m.fill_with(|i, j| Complex64::new(i as f64, -(j as f64)));

    let moved = m
        .transfer_to_with_layout(&b, BlockSize::new(3, 1), Anchor::default())
        .unwrap();
    for i in 0..5 {
        for j in 0..5 {
            assert_eq!(moved.get_global(i, j), Some(Complex64::new(i as f64, -(j as f64))));
        }
    }
}

#[test]
fn transfer_rejects_shape_mismatch() {
    let g = ProcessGroup::degenerate();
    let (a, b) = (ctx_1x1(&g), ctx_1x1(&g));
    let m = DistMatrix::<f64>::zeros(&a, (3, 3), BlockSize::square(1), Anchor::default()).unwrap();
    let mut other =
        DistMatrix::<f64>::zeros(&b, (3, 4), BlockSize::square(1), Anchor::default()).unwrap();
    let err = m.transfer_to_matrix(&mut other).unwrap_err();
    assert_eq!(
        err,
        BlockGridError::ShapeMismatch { expected: (3, 3), found: (3, 4) }
    );
}
