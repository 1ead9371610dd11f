/*!
Scoped bypass of archiving for deliberately destructive operations
*/

use std::cell::Cell;

use parking_lot::ReentrantMutex;

/// Process-wide "archiving disabled" flag behind one lock.
///
/// Scopes nest on the owning thread: the flag stays raised until the outermost
/// `disable` returns. Other threads block on the lock, whether they are opening
/// a scope or checking the flag, until that happens.
#[derive(Debug)]
pub struct DisableGuard {
    depth: ReentrantMutex<Cell<usize>>,
}

impl Default for DisableGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl DisableGuard {
    pub fn new() -> Self {
        Self {
            depth: ReentrantMutex::new(Cell::new(0)),
        }
    }

    /// Run `action` with archiving disabled. The flag is lowered again on every
    /// exit path, unwinding included.
    pub fn disable<R>(&self, action: impl FnOnce() -> R) -> R {
        let depth = self.depth.lock();
        depth.set(depth.get() + 1);
        let _lower = Lower(&*depth);
        action()
    }

    pub fn is_disabled(&self) -> bool {
        self.depth.lock().get() > 0
    }
}

struct Lower<'a>(&'a Cell<usize>);

impl Drop for Lower<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
