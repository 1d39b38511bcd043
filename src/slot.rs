//! Callback Slot - at most one script-function reference per channel.
//!
//! Only touched from the cooperative loop thread, including from inside a
//! callback the slot is currently running, so mutation goes through
//! `&self`. Releasing a reference is dropping it. A callback that clears
//! its own slot stays alive until its invocation returns.

use alloc::rc::Rc;
use core::cell::RefCell;

/// Holds zero or one script-function reference.
pub struct CallbackSlot<F> {
    func: RefCell<Option<Rc<F>>>,
}

impl<F> CallbackSlot<F> {
    pub const fn new() -> Self {
        Self {
            func: RefCell::new(None),
        }
    }

    /// Store `func`. A previous reference is released before the new one
    /// is stored. Returns `true` if a reference was released.
    pub fn set(&self, func: F) -> bool {
        let released = self.clear();
        self.func.replace(Some(Rc::new(func)));
        released
    }

    /// Release the stored reference, if any. Returns `true` if one was
    /// released.
    pub fn clear(&self) -> bool {
        // Taken out first: dropping a function reference may re-enter.
        let old = self.func.take();
        old.is_some()
    }

    /// Share the current reference for one invocation.
    pub fn get(&self) -> Option<Rc<F>> {
        self.func.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.func.borrow().is_some()
    }
}

impl<F> Default for CallbackSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}
