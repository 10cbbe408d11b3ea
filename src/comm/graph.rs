//! Neighbor-topology groups: distributed-graph communicators.
//!
//! A [`NeighborGroup`] scopes communication to an explicit sparse adjacency
//! (who sends to me, whom I send to) instead of the full group. The safe MPI
//! binding does not surface distributed graph topologies, so creation and the
//! neighbor collectives go through the raw `mpi-sys` bindings; the
//! communicator itself is still owned and released through the safe wrapper.
//!
//! Construction is collective over the base group: every member must call it,
//! including members with no neighbors at all. Receive ordering of every
//! (all)gather follows the caller's source list.

use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::os::raw::c_int;

use mpi::raw::{AsRaw, FromRaw};
use mpi::topology::SimpleCommunicator;
use mpi::datatype::{AsDatatype, Collection, Pointer, PointerMut};
use mpi::traits::{Communicator, Equivalence};

use crate::comm::group::ProcessGroup;
use crate::error::BlockGridError;

/// A process group restricted to an explicit directed communication graph.
pub struct NeighborGroup {
    /// `None` only for the trivial topology on the degenerate group.
    comm: Option<SimpleCommunicator>,
    sources: Vec<c_int>,
    destinations: Vec<c_int>,
    weighted: bool,
}

impl std::fmt::Debug for NeighborGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborGroup")
            .field("sources", &self.sources)
            .field("destinations", &self.destinations)
            .field("weighted", &self.weighted)
            .finish_non_exhaustive()
    }
}

impl NeighborGroup {
    /// Builds an unweighted topology from the caller's own source and
    /// destination rank lists. Collective over `group`, even for members
    /// whose lists are both empty.
    ///
    /// `reorder` permits the runtime to renumber ranks for topology locality.
    pub fn new(
        group: &ProcessGroup,
        sources: &[usize],
        destinations: &[usize],
        reorder: bool,
    ) -> Result<Self, BlockGridError> {
        Self::create(group, sources, None, destinations, None, reorder)
    }

    /// Builds a weighted topology; `source_weights` and `destination_weights`
    /// carry one cost per edge. Collective over `group`, and every member
    /// must agree on weightedness.
    pub fn with_weights(
        group: &ProcessGroup,
        sources: &[usize],
        source_weights: &[i32],
        destinations: &[usize],
        destination_weights: &[i32],
        reorder: bool,
    ) -> Result<Self, BlockGridError> {
        assert_eq!(
            sources.len(),
            source_weights.len(),
            "one weight per source edge"
        );
        assert_eq!(
            destinations.len(),
            destination_weights.len(),
            "one weight per destination edge"
        );
        Self::create(
            group,
            sources,
            Some(source_weights),
            destinations,
            Some(destination_weights),
            reorder,
        )
    }

    fn create(
        group: &ProcessGroup,
        sources: &[usize],
        source_weights: Option<&[i32]>,
        destinations: &[usize],
        destination_weights: Option<&[i32]>,
        reorder: bool,
    ) -> Result<Self, BlockGridError> {
        for &peer in sources.iter().chain(destinations) {
            assert!(
                peer < group.size(),
                "neighbor rank {peer} out of range for group of {}",
                group.size()
            );
        }
        let weighted = source_weights.is_some();
        let sources: Vec<c_int> = sources.iter().map(|&r| r as c_int).collect();
        let destinations: Vec<c_int> = destinations.iter().map(|&r| r as c_int).collect();

        let Some(base) = group.mpi_comm() else {
            if sources.is_empty() && destinations.is_empty() {
                return Ok(NeighborGroup {
                    comm: None,
                    sources,
                    destinations,
                    weighted,
                });
            }
            return Err(BlockGridError::DegenerateGroup);
        };

        let comm = unsafe {
            let src_weights: *const c_int = match source_weights {
                Some(w) => w.as_ptr(),
                None => mpi_sys::RSMPI_UNWEIGHTED(),
            };
            let dst_weights: *const c_int = match destination_weights {
                Some(w) => w.as_ptr(),
                None => mpi_sys::RSMPI_UNWEIGHTED(),
            };
            let mut raw = MaybeUninit::<mpi_sys::MPI_Comm>::uninit();
            let code = mpi_sys::MPI_Dist_graph_create_adjacent(
                base.as_raw(),
                sources.len() as c_int,
                sources.as_ptr(),
                src_weights,
                destinations.len() as c_int,
                destinations.as_ptr(),
                dst_weights,
                mpi_sys::RSMPI_INFO_NULL,
                reorder as c_int,
                raw.as_mut_ptr(),
            );
            if code != 0 {
                return Err(BlockGridError::Mpi {
                    call: "MPI_Dist_graph_create_adjacent",
                    code,
                });
            }
            SimpleCommunicator::from_raw(raw.assume_init())
        };

        Ok(NeighborGroup {
            comm: Some(comm),
            sources,
            destinations,
            weighted,
        })
    }

    /// Rank of the calling process in the topology.
    pub fn rank(&self) -> usize {
        self.comm.as_ref().map_or(0, |c| c.rank() as usize)
    }

    /// Number of processes in the topology.
    pub fn size(&self) -> usize {
        self.comm.as_ref().map_or(1, |c| c.size() as usize)
    }

    /// `(in-degree, out-degree, is-weighted)` for the calling process, as
    /// reported by the runtime's view of the constructed topology.
    pub fn nedges(&self) -> (usize, usize, bool) {
        let Some(comm) = &self.comm else {
            return (0, 0, self.weighted);
        };
        let (mut indegree, mut outdegree, mut weighted): (c_int, c_int, c_int) = (0, 0, 0);
        unsafe {
            mpi_sys::MPI_Dist_graph_neighbors_count(
                comm.as_raw(),
                &mut indegree,
                &mut outdegree,
                &mut weighted,
            );
        }
        (indegree as usize, outdegree as usize, weighted != 0)
    }

    /// Ranks this process receives from, in receive order.
    pub fn sources(&self) -> impl Iterator<Item = usize> + '_ {
        self.sources.iter().map(|&r| r as usize)
    }

    /// Ranks this process sends to.
    pub fn destinations(&self) -> impl Iterator<Item = usize> + '_ {
        self.destinations.iter().map(|&r| r as usize)
    }

    /// Sends `value` to every destination and receives one value from each
    /// source; the result is ordered like the source list. Blocking
    /// collective over the topology.
    pub fn allgather<T>(&self, value: &T) -> Result<Vec<T>, BlockGridError>
    where
        T: Equivalence + Default + Clone,
    {
        let mut recv = vec![T::default(); self.sources.len()];
        let Some(comm) = &self.comm else {
            return Ok(recv);
        };
        unsafe {
            let rbuf = &mut recv[..];
            let code = mpi_sys::MPI_Neighbor_allgather(
                value.pointer(),
                value.count(),
                value.as_datatype().as_raw(),
                rbuf.pointer_mut(),
                1,
                rbuf.as_datatype().as_raw(),
                comm.as_raw(),
            );
            if code != 0 {
                return Err(BlockGridError::Mpi {
                    call: "MPI_Neighbor_allgather",
                    code,
                });
            }
        }
        Ok(recv)
    }

    /// Sends `send` to every destination and receives `recv_counts[i]`
    /// elements from `sources[i]`; the result is the concatenation of the
    /// per-source chunks in source order. Blocking collective.
    pub fn allgatherv<T>(&self, send: &[T], recv_counts: &[usize]) -> Result<Vec<T>, BlockGridError>
    where
        T: Equivalence + Default + Clone,
    {
        let (counts, displs, total) = self.varcounts(recv_counts)?;
        let mut recv = vec![T::default(); total];
        let Some(comm) = &self.comm else {
            return Ok(recv);
        };
        unsafe {
            let rbuf = &mut recv[..];
            let code = mpi_sys::MPI_Neighbor_allgatherv(
                send.pointer(),
                send.count(),
                send.as_datatype().as_raw(),
                rbuf.pointer_mut(),
                counts.as_ptr(),
                displs.as_ptr(),
                rbuf.as_datatype().as_raw(),
                comm.as_raw(),
            );
            if code != 0 {
                return Err(BlockGridError::Mpi {
                    call: "MPI_Neighbor_allgatherv",
                    code,
                });
            }
        }
        Ok(recv)
    }

    /// Non-blocking [`allgatherv`](Self::allgatherv). `recv` is resized to
    /// the total expected count and both buffers stay borrowed by the
    /// returned request until it is waited on (or dropped, which waits).
    pub fn iallgatherv<'a, T>(
        &self,
        send: &'a [T],
        recv: &'a mut Vec<T>,
        recv_counts: &[usize],
    ) -> Result<GraphRequest<'a>, BlockGridError>
    where
        T: Equivalence + Default + Clone,
    {
        let (counts, displs, total) = self.varcounts(recv_counts)?;
        recv.clear();
        recv.resize(total, T::default());
        let Some(comm) = &self.comm else {
            return Ok(GraphRequest::completed());
        };
        let request = unsafe {
            let rbuf = &mut recv[..];
            let mut request = MaybeUninit::<mpi_sys::MPI_Request>::uninit();
            let code = mpi_sys::MPI_Ineighbor_allgatherv(
                send.pointer(),
                send.count(),
                send.as_datatype().as_raw(),
                rbuf.pointer_mut(),
                counts.as_ptr(),
                displs.as_ptr(),
                rbuf.as_datatype().as_raw(),
                comm.as_raw(),
                request.as_mut_ptr(),
            );
            if code != 0 {
                return Err(BlockGridError::Mpi {
                    call: "MPI_Ineighbor_allgatherv",
                    code,
                });
            }
            request.assume_init()
        };
        Ok(GraphRequest {
            request: Some(request),
            _counts: counts,
            _displs: displs,
            _buffers: PhantomData,
        })
    }

    fn varcounts(
        &self,
        recv_counts: &[usize],
    ) -> Result<(Vec<c_int>, Vec<c_int>, usize), BlockGridError> {
        if recv_counts.len() != self.sources.len() {
            return Err(BlockGridError::CountMismatch {
                counts: recv_counts.len(),
                indegree: self.sources.len(),
            });
        }
        let counts: Vec<c_int> = recv_counts.iter().map(|&c| c as c_int).collect();
        let mut displs = Vec::with_capacity(counts.len());
        let mut offset: c_int = 0;
        for &c in &counts {
            displs.push(offset);
            offset += c;
        }
        Ok((counts, displs, offset as usize))
    }
}

/// In-flight non-blocking neighbor collective.
///
/// Active until completion is confirmed through [`test`](Self::test) or
/// [`wait`](Self::wait). The borrow it holds on the send and receive buffers
/// keeps them untouchable for its whole lifetime; dropping an active request
/// blocks until the transfer finishes.
pub struct GraphRequest<'a> {
    request: Option<mpi_sys::MPI_Request>,
    // MPI may reference the count/displacement arrays until completion.
    _counts: Vec<c_int>,
    _displs: Vec<c_int>,
    _buffers: PhantomData<&'a mut ()>,
}

impl GraphRequest<'_> {
    fn completed() -> Self {
        GraphRequest {
            request: None,
            _counts: Vec::new(),
            _displs: Vec::new(),
            _buffers: PhantomData,
        }
    }

    /// True while the transfer has not been confirmed complete.
    pub fn is_active(&self) -> bool {
        self.request.is_some()
    }

    /// Polls for completion without blocking; returns true once complete.
    pub fn test(&mut self) -> bool {
        let Some(mut request) = self.request.take() else {
            return true;
        };
        let mut flag: c_int = 0;
        unsafe {
            let mut status = MaybeUninit::<mpi_sys::MPI_Status>::uninit();
            mpi_sys::MPI_Test(&mut request, &mut flag, status.as_mut_ptr());
        }
        if flag != 0 {
            true
        } else {
            self.request = Some(request);
            false
        }
    }

    /// Blocks until the transfer completes, releasing the buffer borrows.
    pub fn wait(mut self) {
        self.wait_in_place();
    }

    fn wait_in_place(&mut self) {
        if let Some(mut request) = self.request.take() {
            unsafe {
                let mut status = MaybeUninit::<mpi_sys::MPI_Status>::uninit();
                mpi_sys::MPI_Wait(&mut request, status.as_mut_ptr());
            }
        }
    }
}

impl Drop for GraphRequest<'_> {
    fn drop(&mut self) {
        self.wait_in_place();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_topology_on_degenerate_group() {
        let g = ProcessGroup::degenerate();
        let graph = NeighborGroup::new(&g, &[], &[], false).unwrap();
        assert_eq!(graph.nedges(), (0, 0, false));
        let got: Vec<i32> = graph.allgather(&5).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn degenerate_group_rejects_edges() {
        let g = ProcessGroup::degenerate();
        let err = NeighborGroup::new(&g, &[0], &[0], false).unwrap_err();
        assert_eq!(err, BlockGridError::DegenerateGroup);
    }

    #[test]
    fn trivial_iallgatherv_completes_immediately() {
        let g = ProcessGroup::degenerate();
        let graph = NeighborGroup::new(&g, &[], &[], false).unwrap();
        let send: Vec<f64> = vec![1.0, 2.0];
        let mut recv = Vec::new();
        let mut req = graph.iallgatherv(&send, &mut recv, &[]).unwrap();
        assert!(!req.is_active());
        assert!(req.test());
        req.wait();
        assert!(recv.is_empty());
    }

    #[test]
    fn count_list_must_match_indegree() {
        let g = ProcessGroup::degenerate();
        let graph = NeighborGroup::new(&g, &[], &[], false).unwrap();
        let err = graph.allgatherv(&[1.0_f64], &[3]).unwrap_err();
        assert!(matches!(err, BlockGridError::CountMismatch { .. }));
    }
}
