//! Shared state cells.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Copy-on-write cell holding an immutable, shared value.
///
/// Readers take an [`Arc`] to the current value and keep using it for as long
/// as they like; they only contend with writers for the duration of a pointer
/// copy. Writers build the replacement value off to the side and swap it in,
/// so a reader observes either the old value or the new one in its entirety.
///
/// # Example
/// ```
/// use consortium_common::Snapshot;
///
/// let cell = Snapshot::new(vec![1, 2]);
/// let before = cell.load();
///
/// cell.update(|values| values.push(3));
///
/// assert_eq!(*before, vec![1, 2]);
/// assert_eq!(*cell.load(), vec![1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct Snapshot<T> {
    current: RwLock<Arc<T>>,
    writer: Mutex<()>,
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Snapshot<T> {
    /// Creates a new cell with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
            writer: Mutex::new(()),
        }
    }

    /// Returns the current value.
    pub fn load(&self) -> Arc<T> {
        self.current.read().clone()
    }

    /// Replaces the current value, returning the previous one.
    pub fn store(&self, value: T) -> Arc<T> {
        let _writer = self.writer.lock();
        std::mem::replace(&mut *self.current.write(), Arc::new(value))
    }

    /// Derives a new value from a copy of the current one and swaps it in.
    ///
    /// Concurrent updates are serialized, so none of them is lost.
    pub fn update<R>(&self, change: impl FnOnce(&mut T) -> R) -> R
    where
        T: Clone,
    {
        let _writer = self.writer.lock();
        let mut next = T::clone(&self.current.read());
        let output = change(&mut next);
        *self.current.write() = Arc::new(next);
        output
    }
}
