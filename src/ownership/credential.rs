use std::fmt;
use std::sync::{Arc, Weak};

use super::{Acquire, User, Validate};

/// Non-owning reference to an object held by an [`Owner`](super::Owner).
///
/// A credential never extends the object's lifetime. Use [`acquire`](Self::acquire)
/// to turn it into a [`User`] right before each use; success guarantees the object
/// stays alive for as long as that user is held, whatever happens to the owner.
///
/// ### Rules
/// - `acquire` is one atomic upgrade, never a check-then-act pair.
/// - `is_valid` may be true one instant and the next `acquire` may still fail.
pub struct Credential<T> {
    inner: Weak<T>,
}

impl<T> Credential<T> {
    pub(crate) fn from_shared(shared: &Arc<T>) -> Self {
        Self {
            inner: Arc::downgrade(shared),
        }
    }

    /// Acquires a user if the object is still alive.
    ///
    /// `None` is an expected outcome (e.g. during shutdown), not an error.
    #[inline]
    pub fn acquire(&self) -> Option<User<T>> {
        self.inner.upgrade().map(User::from_arc)
    }

    /// Like [`acquire`](Self::acquire) but returns an invalid user on failure.
    pub fn acquire_user(&self) -> User<T> {
        User::from_shared(self.inner.upgrade())
    }

    /// Returns `true` if both credentials reference the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T> Default for Credential<T> {
    /// A credential that references nothing.
    fn default() -> Self {
        Self { inner: Weak::new() }
    }
}

impl<T> Clone for Credential<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Validate for Credential<T> {
    #[inline]
    fn is_valid(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Acquire<T> for Credential<T> {
    #[inline]
    fn acquire(&self) -> Option<User<T>> {
        Credential::acquire(self)
    }
}

impl<T: fmt::Debug> fmt::Debug for Credential<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.upgrade() {
            Some(value) => f.debug_tuple("Credential").field(&*value).finish(),
            None => f.write_str("Credential(<expired>)"),
        }
    }
}
