use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};

/// Mutex-shaped wrapper that performs no locking at all.
///
/// The solver's only shared mutable state is the pair of accumulators on
/// each action node, and the tree topology guarantees that at most one
/// in-flight traversal call touches a given node at a time (a node has
/// exactly one path from the root, and top-level walks never overlap).
/// Under that discipline a real mutex would only add cost, so this wrapper
/// hands out mutable access unconditionally.
///
/// **Note**: this bypasses the "shared XOR mutable" rule entirely. Any use
/// outside the single-visitor discipline is a data race; debug builds check
/// the discipline with a visitor counter on the node itself.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct MutexLike<T: ?Sized> {
    data: UnsafeCell<T>,
}

/// Smart-pointer wrapper returned when a [`MutexLike`] is "locked".
#[derive(Debug)]
pub struct MutexGuardLike<'a, T: ?Sized + 'a> {
    mutex: &'a MutexLike<T>,
}

unsafe impl<T: ?Sized + Send> Send for MutexLike<T> {}
unsafe impl<T: ?Sized + Send> Sync for MutexLike<T> {}
unsafe impl<'a, T: ?Sized + Sync + 'a> Sync for MutexGuardLike<'a, T> {}

impl<T> MutexLike<T> {
    /// Creates a new [`MutexLike`] with the given value.
    #[inline]
    pub fn new(val: T) -> Self {
        Self {
            data: UnsafeCell::new(val),
        }
    }
}

impl<T: ?Sized> MutexLike<T> {
    /// Acquires the "lock", which never blocks.
    ///
    /// # Examples
    /// ```
    /// use subgame_solver::MutexLike;
    ///
    /// let mutex_like = MutexLike::new(0);
    /// *mutex_like.lock() = 10;
    /// assert_eq!(*mutex_like.lock(), 10);
    /// ```
    #[inline]
    pub fn lock(&self) -> MutexGuardLike<T> {
        MutexGuardLike { mutex: self }
    }
}

impl<'a, T: ?Sized + 'a> Deref for MutexGuardLike<'a, T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<'a, T: ?Sized + 'a> DerefMut for MutexGuardLike<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}
