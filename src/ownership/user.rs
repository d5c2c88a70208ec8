use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::{Acquire, Credential, Validate};

/// Shared handle that keeps an object alive but did not create it.
///
/// Obtained from [`Owner::acquire_user`](super::Owner::acquire_user) or a
/// successful [`Credential::acquire`]. While any user lives the object outlives
/// its owner. A default-constructed user is invalid and references nothing.
pub struct User<T> {
    inner: Option<Arc<T>>,
}

impl<T> User<T> {
    pub(crate) fn from_arc(shared: Arc<T>) -> Self {
        Self {
            inner: Some(shared),
        }
    }

    pub(crate) fn from_shared(shared: Option<Arc<T>>) -> Self {
        Self { inner: shared }
    }

    /// Issues a credential for the object, or `None` if this user is invalid.
    pub fn authorize(&self) -> Option<Credential<T>> {
        self.inner.as_ref().map(Credential::from_shared)
    }

    /// Checked access to the object.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }
}

impl<T> Default for User<T> {
    /// An invalid user.
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<T> Clone for User<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Validate for User<T> {
    #[inline]
    fn is_valid(&self) -> bool {
        self.inner.is_some()
    }
}

impl<T> Acquire<T> for User<T> {
    fn acquire(&self) -> Option<User<T>> {
        self.inner.clone().map(User::from_arc)
    }
}

impl<T> Deref for User<T> {
    type Target = T;

    /// # Panics
    /// Panics if the user is invalid. Obtain users through
    /// [`Credential::acquire`] (which only yields valid ones) or check first.
    fn deref(&self) -> &T {
        match self.inner.as_deref() {
            Some(value) => value,
            None => panic!("dereferenced an invalid User<{}>", std::any::type_name::<T>()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for User<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.as_deref() {
            Some(value) => f.debug_tuple("User").field(value).finish(),
            None => f.write_str("User(<empty>)"),
        }
    }
}
