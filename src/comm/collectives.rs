//! Type-generic collectives over a [`ProcessGroup`].
//!
//! Scalar payloads are any [`Equivalence`] type; dense payloads broadcast
//! their shape first as a fixed header, then the element buffer, so receivers
//! never need to pre-agree on dimensions. An out-of-range root is a topology
//! bug and fails an assertion before any communication is attempted.

use mpi::traits::{Communicator, Equivalence, Root};
use ndarray::Array2;
use num_traits::Zero;

use crate::comm::group::ProcessGroup;

impl ProcessGroup {
    /// Broadcasts `value` from `root` to every member; all members return the
    /// root's value. Collective.
    pub fn broadcast<T: Equivalence>(&self, value: T, root: usize) -> T {
        assert!(
            root < self.size(),
            "broadcast root {root} out of range for group of {}",
            self.size()
        );
        let Some(comm) = self.mpi_comm() else {
            return value;
        };
        let mut result = value;
        comm.process_at_rank(root as i32).broadcast_into(&mut result);
        result
    }

    /// Receiving-side broadcast: the caller supplies no value and gets the
    /// root's. Collective.
    pub fn broadcast_from<T: Equivalence + Default>(&self, root: usize) -> T {
        self.broadcast(T::default(), root)
    }

    /// Gathers one `value` per member at `root`; the result on root is
    /// indexed by sender rank, and empty on every other member. Collective.
    pub fn gather<T: Equivalence + Clone>(&self, value: T, root: usize) -> Vec<T> {
        assert!(
            root < self.size(),
            "gather root {root} out of range for group of {}",
            self.size()
        );
        let Some(comm) = self.mpi_comm() else {
            return vec![value];
        };
        let root_process = comm.process_at_rank(root as i32);
        if self.rank() == root {
            let mut result = vec![value.clone(); self.size()];
            root_process.gather_into_root(&value, &mut result[..]);
            result
        } else {
            root_process.gather_into(&value);
            Vec::new()
        }
    }

    /// Broadcasts a vector from `root`; non-root inputs are placeholders
    /// whose length need not match and are resized to the root's. Collective.
    pub fn broadcast_vec<T: Equivalence + Default + Clone>(
        &self,
        vec: Vec<T>,
        root: usize,
    ) -> Vec<T> {
        assert!(
            root < self.size(),
            "broadcast root {root} out of range for group of {}",
            self.size()
        );
        let Some(comm) = self.mpi_comm() else {
            return vec;
        };
        let root_process = comm.process_at_rank(root as i32);
        let mut len = [vec.len() as u64];
        root_process.broadcast_into(&mut len[..]);
        let mut out = vec;
        out.resize(len[0] as usize, T::default());
        if !out.is_empty() {
            root_process.broadcast_into(&mut out[..]);
        }
        out
    }

    /// Broadcasts a dense matrix from `root`; non-root inputs are
    /// placeholders and are reshaped to the root's dimensions. Collective.
    pub fn broadcast_matrix<T: Equivalence + Zero + Copy>(
        &self,
        mat: Array2<T>,
        root: usize,
    ) -> Array2<T> {
        assert!(
            root < self.size(),
            "broadcast root {root} out of range for group of {}",
            self.size()
        );
        let Some(comm) = self.mpi_comm() else {
            return mat;
        };
        let root_process = comm.process_at_rank(root as i32);
        let mut shape = [mat.nrows() as u64, mat.ncols() as u64];
        root_process.broadcast_into(&mut shape[..]);
        let (rows, cols) = (shape[0] as usize, shape[1] as usize);
        // The broadcast writes one contiguous row-major buffer, so a root
        // holding e.g. a transposed view's storage is copied, not discarded.
        let mut mat = if mat.dim() != (rows, cols) {
            Array2::zeros((rows, cols))
        } else if mat.is_standard_layout() {
            mat
        } else {
            mat.as_standard_layout().into_owned()
        };
        if rows * cols > 0 {
            let buf = mat
                .as_slice_mut()
                .expect("freshly shaped matrix is contiguous");
            root_process.broadcast_into(buf);
        }
        mat
    }
}
