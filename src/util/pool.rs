/*!
A thread safe memory pool.

The principal type in this module is a [`Pool`]. Its main use case is for
holding a thread safe collection of mutable scratch spaces (the backtracker's
`Cache`) that a pattern needs to execute a search. This permits sharing the
same read-only pattern across multiple threads while having a quick way of
reusing scratch space, which avoids re-creating the backtracking stack for
every search.

The pool is a stack represented by a `Mutex<Vec<Box<T>>>`. Boxing the values
keeps pushing and popping cheap, since a box is much smaller than a cache.
The pool grows to the number of threads that simultaneously use it and never
contracts.
*/

use alloc::{boxed::Box, vec::Vec};

use std::sync::Mutex;

/// A thread safe pool of reusable values.
///
/// Getting a value out comes with a guard. When that guard is dropped, the
/// value is automatically put back in the pool. If the pool is empty when a
/// value is requested, a new one is made with the `create` function.
pub(crate) struct Pool<T, F = fn() -> T> {
    stack: Mutex<Vec<Box<T>>>,
    create: F,
}

impl<T, F> Pool<T, F> {
    /// Create a new pool. The given closure is used to create values in the
    /// pool when necessary.
    pub(crate) fn new(create: F) -> Pool<T, F> {
        Pool { stack: Mutex::new(Vec::new()), create }
    }
}

impl<T: Send, F: Fn() -> T> Pool<T, F> {
    /// Get a value from the pool, creating one if the pool is empty.
    pub(crate) fn get(&self) -> PoolGuard<'_, T, F> {
        // A panic while the lock is held can't leave the stack in an
        // inconsistent state, so a poisoned lock is still usable.
        let popped = self
            .stack
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .pop();
        let value = match popped {
            None => Box::new((self.create)()),
            Some(value) => value,
        };
        PoolGuard { pool: self, value: Some(value) }
    }

    fn put(&self, value: Box<T>) {
        let mut stack =
            self.stack.lock().unwrap_or_else(|err| err.into_inner());
        stack.push(value);
    }
}

impl<T, F> core::fmt::Debug for Pool<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let len = self
            .stack
            .lock()
            .map(|stack| stack.len())
            .unwrap_or_else(|err| err.into_inner().len());
        f.debug_struct("Pool").field("available", &len).finish()
    }
}

/// A guard that is returned when a caller requests a value from the pool.
///
/// The purpose of the guard is to use RAII to automatically put the value
/// back in the pool once it's dropped.
pub(crate) struct PoolGuard<'a, T: Send, F: Fn() -> T> {
    pool: &'a Pool<T, F>,
    /// Always `Some` until the guard is dropped.
    value: Option<Box<T>>,
}

impl<'a, T: Send, F: Fn() -> T> core::ops::Deref for PoolGuard<'a, T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.value {
            Some(ref value) => value,
            None => unreachable!("pool guard used after drop"),
        }
    }
}

impl<'a, T: Send, F: Fn() -> T> core::ops::DerefMut for PoolGuard<'a, T, F> {
    fn deref_mut(&mut self) -> &mut T {
        match self.value {
            Some(ref mut value) => value,
            None => unreachable!("pool guard used after drop"),
        }
    }
}

impl<'a, T: Send, F: Fn() -> T> Drop for PoolGuard<'a, T, F> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.put(value);
        }
    }
}
