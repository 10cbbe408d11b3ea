//! Grid-to-grid redistribution of block-cyclic matrices.
//!
//! The schedule is owner-computes: walking its own local block in global
//! row-major order, each process determines the target owner of every element
//! it holds (its send lists) and the source owner of every element it will
//! hold (its receive lists). Both sides enumerate the same intersections in
//! the same global order, so counts and message layout need no negotiation.
//!
//! The exchange posts every receive, then every send, as non-blocking
//! operations on the staging context's communicator, so no pairwise ordering
//! can deadlock. Same-rank traffic never touches the transport. The
//! operation is collective over the union of both grids; processes outside
//! both simply have empty lists.

use std::collections::BTreeMap;

use itertools::iproduct;
use log::debug;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use mpi::traits::{Communicator, Destination, Equivalence, Source};

use crate::error::BlockGridError;
use crate::grid::context::GridContext;
use crate::grid::matrix::DistMatrix;
use crate::grid::layout::{Anchor, BlockSize};

/// Which context stages a redistribution, that is, whose communicator
/// carries the traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagingPolicy {
    /// The context with more grid cells; ties go to the source. Maximizes
    /// the number of processes with work during the exchange.
    #[default]
    PreferLarger,
    Source,
    Target,
}

const TRANSFER_TAG: i32 = 0x42;

pub(crate) fn transfer<T: Equivalence + Zero + Copy>(
    src: &DistMatrix<T>,
    target: &GridContext,
    block: BlockSize,
    anchor: Anchor,
    policy: StagingPolicy,
) -> Result<DistMatrix<T>, BlockGridError> {
    let mut dst = DistMatrix::zeros(target, src.shape(), block, anchor)?;
    transfer_into(src, &mut dst, policy)?;
    Ok(dst)
}

pub(crate) fn transfer_into<T: Equivalence + Zero + Copy>(
    src: &DistMatrix<T>,
    dst: &mut DistMatrix<T>,
    policy: StagingPolicy,
) -> Result<(), BlockGridError> {
    if dst.shape() != src.shape() {
        return Err(BlockGridError::ShapeMismatch {
            expected: src.shape(),
            found: dst.shape(),
        });
    }
    if !src.context().compatible_with(dst.context()) {
        return Err(BlockGridError::ContextMismatch);
    }

    let staging = match policy {
        StagingPolicy::Source => src.context().clone(),
        StagingPolicy::Target => dst.context().clone(),
        StagingPolicy::PreferLarger => {
            if dst.context().size() > src.context().size() {
                dst.context().clone()
            } else {
                src.context().clone()
            }
        }
    };
    let my_rank = staging.group().rank();

    // Send lists: every element I own in the source layout, grouped by the
    // base-group rank owning it in the target layout, in global order.
    let mut send: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    let (slr, slc) = src.local_shape();
    for (li, lj) in iproduct!(0..slr, 0..slc) {
        let (gi, gj) = src.local_to_global(li, lj);
        let to = dst.context().parent_rank_of(dst.owner_of(gi, gj));
        send.entry(to).or_default().push(src.local()[[li, lj]]);
    }

    // Receive lists: every element I own in the target layout, grouped by
    // its source owner, with the local slot it lands in. Same global order
    // as the sender's walk, so the i-th received element fills the i-th slot.
    let mut recv_slots: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    let (dlr, dlc) = dst.local_shape();
    for (li, lj) in iproduct!(0..dlr, 0..dlc) {
        let (gi, gj) = dst.local_to_global(li, lj);
        let from = src.context().parent_rank_of(src.owner_of(gi, gj));
        recv_slots.entry(from).or_default().push((li, lj));
    }

    // Elements that stay on this rank bypass the transport.
    if let Some(slots) = recv_slots.remove(&my_rank) {
        let vals = send.remove(&my_rank).unwrap_or_default();
        debug_assert_eq!(slots.len(), vals.len());
        for (&(li, lj), v) in slots.iter().zip(vals) {
            dst.local_mut()[[li, lj]] = v;
        }
    }

    debug!(
        "redistribute {}x{}: rank {my_rank} sends to {} peer(s), receives from {}",
        src.rows(),
        src.cols(),
        send.len(),
        recv_slots.len()
    );

    let Some(comm) = staging.group().mpi_comm() else {
        debug_assert!(send.is_empty() && recv_slots.is_empty());
        return Ok(());
    };

    let mut recv_bufs: BTreeMap<usize, Vec<T>> = recv_slots
        .iter()
        .map(|(&from, slots)| (from, vec![T::zero(); slots.len()]))
        .collect();

    mpi::request::scope(|scope| {
        let mut recv_reqs = Vec::new();
        for (&from, buf) in recv_bufs.iter_mut() {
            recv_reqs.push(
                comm.process_at_rank(from as i32)
                    .immediate_receive_into_with_tag(scope, buf, TRANSFER_TAG),
            );
        }
        let mut send_reqs = Vec::new();
        for (&to, buf) in send.iter() {
            send_reqs.push(
                comm.process_at_rank(to as i32)
                    .immediate_send_with_tag(scope, &buf[..], TRANSFER_TAG),
            );
        }
        for req in send_reqs {
            req.wait_without_status();
        }
        for req in recv_reqs {
            req.wait_without_status();
        }
    });

    for (from, slots) in recv_slots {
        let buf = &recv_bufs[&from];
        for (&(li, lj), &v) in slots.iter().zip(buf) {
            dst.local_mut()[[li, lj]] = v;
        }
    }
    Ok(())
}
