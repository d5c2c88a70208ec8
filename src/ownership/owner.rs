use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::{Acquire, Credential, User, Validate};

/// Exclusive handle that constructs an object and keeps it alive.
///
/// There is exactly one `Owner` per object; it can be moved but not cloned.
/// Dropping it releases the owner's share: the object is destroyed as soon as no
/// [`User`] shares it either, and every outstanding [`Credential`] then fails to
/// acquire.
///
/// An owner may be empty ([`Owner::empty`]), e.g. when `T` has no sensible
/// default and nothing was supplied yet.
pub struct Owner<T> {
    inner: Option<Arc<T>>,
}

impl<T> Owner<T> {
    /// Constructs and takes ownership of `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
        }
    }

    /// Creates an owner that holds nothing.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Returns a user sharing ownership of the object.
    ///
    /// The user is invalid if this owner is empty.
    pub fn acquire_user(&self) -> User<T> {
        User::from_shared(self.inner.clone())
    }

    /// Issues a credential for the owned object, or `None` if the owner is empty.
    pub fn authorize(&self) -> Option<Credential<T>> {
        self.inner.as_ref().map(Credential::from_shared)
    }

    /// Checked access to the owned object.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }
}

impl<T: Default> Default for Owner<T> {
    /// Owns a default-constructed `T`.
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Validate for Owner<T> {
    #[inline]
    fn is_valid(&self) -> bool {
        self.inner.is_some()
    }
}

impl<T> Acquire<T> for Owner<T> {
    fn acquire(&self) -> Option<User<T>> {
        self.inner.clone().map(User::from_arc)
    }
}

impl<T> Deref for Owner<T> {
    type Target = T;

    /// # Panics
    /// Panics if the owner is empty. Check [`Validate::is_valid`] or use
    /// [`Owner::get`] when emptiness is possible.
    fn deref(&self) -> &T {
        match self.inner.as_deref() {
            Some(value) => value,
            None => panic!("dereferenced an empty Owner<{}>", std::any::type_name::<T>()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Owner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.as_deref() {
            Some(value) => f.debug_tuple("Owner").field(value).finish(),
            None => f.write_str("Owner(<empty>)"),
        }
    }
}
