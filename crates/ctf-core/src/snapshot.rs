//! Snapshot/rollback: an opaque high-water mark over the type and
//! variable sequences, and the two operations built on it.

use crate::container::Container;
use crate::error::{CtfError, Result};

/// An opaque rollback target captured by [`Container::snapshot`].
/// Carries no meaning beyond "pass this back to `rollback`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) last_id: u32,
    pub(crate) snap: u64,
}

impl Container {
    /// Captures the current state as a rollback target. Types and
    /// variables added up to and including this call are preserved by
    /// a later `rollback` to this token; anything added after is not.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            last_id: self.dynamic.next_id,
            snap: self.dynamic.var_seq + 1,
        }
    }

    /// Restores the container to `target`, dropping every type and
    /// variable added since. Fails with [`CtfError::OverRollback`] if
    /// `target` precedes the last committed `update` — once `update`
    /// has run, that state can no longer be undone.
    pub fn rollback(&mut self, target: Snapshot) -> Result<()> {
        self.require_writable()?;
        if target.last_id < self.dynamic.old_id
            || target.snap <= self.dynamic.snapshot_at_last_update
        {
            return Err(CtfError::OverRollback);
        }
        let base = self.child_base();
        self.dynamic.types.truncate_above(base + target.last_id + 1);
        self.dynamic.vars.retain_created_before(target.snap);
        self.dynamic.next_id = target.last_id;
        self.dynamic.var_seq = target.snap.saturating_sub(1);

        if target.last_id > self.dynamic.old_id {
            self.mark_dirty();
        } else {
            self.clear_dirty();
        }
        Ok(())
    }

    /// Rolls back everything added since the last `update` (or since
    /// construction, if `update` has never run). A no-op if nothing
    /// was added.
    pub fn discard(&mut self) -> Result<()> {
        let target = Snapshot {
            last_id: self.dynamic.old_id,
            snap: self.dynamic.snapshot_at_last_update + 1,
        };
        self.rollback(target)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod snapshot_tests;
