//! Shared-ownership handle over an MPI communicator.
//!
//! All clones of a [`ProcessGroup`] are shallow: they reference the same
//! underlying communicator, which is released exactly once when the last
//! clone is dropped. The world communicator is a distinguished instance the
//! process did not create and is never released by this crate.

use std::sync::Arc;

use mpi::topology::{Color, SimpleCommunicator};
use mpi::traits::Communicator;

/// Owns the native communicator for as long as any handle references it.
///
/// Dropping the last `Arc<GroupInner>` drops the `SimpleCommunicator`,
/// which frees user-created communicators exactly once and leaves built-in
/// ones (the world) untouched.
pub(crate) struct GroupInner {
    pub(crate) comm: SimpleCommunicator,
    is_world: bool,
}

/// A reference-counted handle over a group of cooperating processes.
///
/// The degenerate handle (no underlying group) reports rank 0 and size 1 and
/// turns every collective into a local no-op, so single-process callers need
/// no special casing.
#[derive(Clone)]
pub struct ProcessGroup {
    inner: Option<Arc<GroupInner>>,
}

impl ProcessGroup {
    /// Handle over the world communicator. MPI must be initialized first;
    /// see [`crate::comm::session`].
    pub fn world() -> Self {
        ProcessGroup {
            inner: Some(Arc::new(GroupInner {
                comm: SimpleCommunicator::world(),
                is_world: true,
            })),
        }
    }

    /// The degenerate "no group" handle: rank 0, size 1, no communication.
    pub fn degenerate() -> Self {
        ProcessGroup { inner: None }
    }

    /// Wraps a communicator this handle will own and eventually release.
    pub(crate) fn from_comm(comm: SimpleCommunicator) -> Self {
        ProcessGroup {
            inner: Some(Arc::new(GroupInner {
                comm,
                is_world: false,
            })),
        }
    }

    /// The number of processes in the group.
    pub fn size(&self) -> usize {
        self.inner.as_ref().map_or(1, |i| i.comm.size() as usize)
    }

    /// The rank of the calling process within the group.
    pub fn rank(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.comm.rank() as usize)
    }

    /// Root rank for rooted collectives on any group.
    pub const fn root_id() -> usize {
        0
    }

    /// True if the calling process is the root of this group.
    pub fn is_root(&self) -> bool {
        self.rank() == Self::root_id()
    }

    /// True iff both handles reference the same underlying communicator.
    ///
    /// Handles produced by [`duplicate`](Self::duplicate) compare unequal to
    /// their origin even though membership is identical. All world handles
    /// compare equal to each other.
    pub fn same_group(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || (a.is_world && b.is_world),
            (None, None) => true,
            _ => false,
        }
    }

    /// Splits the group into disjoint subgroups by `color`, ordering members
    /// of each subgroup by the caller's current rank.
    ///
    /// Collective: every member of the group must call it. A negative color
    /// opts the caller out of every subgroup and yields `None`.
    pub fn split(&self, color: i32) -> Option<ProcessGroup> {
        self.split_with_key(color, self.rank() as i32)
    }

    /// Splits the group by `color`, ordering each subgroup by ascending `key`.
    ///
    /// Collective: every member of the group must call it.
    pub fn split_with_key(&self, color: i32, key: i32) -> Option<ProcessGroup> {
        let Some(inner) = &self.inner else {
            return (color >= 0).then(ProcessGroup::degenerate);
        };
        let color = if color < 0 {
            Color::undefined()
        } else {
            Color::with_value(color)
        };
        inner
            .comm
            .split_by_color_with_key(color, key)
            .map(ProcessGroup::from_comm)
    }

    /// Creates a group with identical membership and ordering but a distinct
    /// underlying communicator, isolating its collective traffic.
    ///
    /// Collective: every member of the group must call it.
    pub fn duplicate(&self) -> ProcessGroup {
        match &self.inner {
            Some(inner) => ProcessGroup::from_comm(inner.comm.duplicate()),
            None => ProcessGroup::degenerate(),
        }
    }

    /// The underlying communicator, or `None` for the degenerate handle.
    pub fn mpi_comm(&self) -> Option<&SimpleCommunicator> {
        self.inner.as_ref().map(|i| &i.comm)
    }
}

impl PartialEq for ProcessGroup {
    fn eq(&self, other: &Self) -> bool {
        self.same_group(other)
    }
}

impl std::fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessGroup")
            .field("rank", &self.rank())
            .field("size", &self.size())
            .field("degenerate", &self.inner.is_none())
            .finish()
    }
}
