//! MPI lifecycle management.
//!
//! A [`Session`] initializes MPI (or attaches to an already-initialized
//! runtime) and finalizes it when dropped. Every [`ProcessGroup`] must be
//! dropped before the `Session` that made it usable; the usual shape is to
//! create the session first thing in `main` and let it drop last.

use once_cell::sync::OnceCell;

use mpi::environment::Universe;

use crate::comm::group::ProcessGroup;

/// Owns the MPI runtime for the duration of a computation.
pub struct Session {
    _universe: Option<Universe>,
}

impl Session {
    /// Initializes MPI, or attaches if some other component already did.
    /// Only the initializing session finalizes on drop.
    pub fn new() -> Self {
        let universe = mpi::initialize();
        if universe.is_some() {
            let world = ProcessGroup::world();
            log::debug!("MPI initialized: rank {} of {}", world.rank(), world.size());
        }
        Session {
            _universe: universe,
        }
    }

    /// Handle over the world communicator.
    pub fn world(&self) -> ProcessGroup {
        ProcessGroup::world()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes MPI on first use and keeps it alive for the remainder of the
/// process, then returns a world handle.
///
/// Finalization is deliberately skipped, which suits test harnesses and
/// binaries whose process exit doubles as teardown. Long-running applications
/// that need an orderly `MPI_Finalize` should hold a [`Session`] instead.
pub fn world_shared() -> ProcessGroup {
    static KEEP_ALIVE: OnceCell<()> = OnceCell::new();
    KEEP_ALIVE.get_or_init(|| {
        if let Some(universe) = mpi::initialize() {
            std::mem::forget(universe);
        }
    });
    ProcessGroup::world()
}
