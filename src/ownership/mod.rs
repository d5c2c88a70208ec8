//! # Ownership model: owners, users and credentials.
//!
//! Pipeline collaborators (sources, destinations, monitors) are wired together
//! through three handle kinds layered over reference counting:
//!
//! - [`Owner`]: exclusive, move-only; constructs the object and keeps it alive;
//! - [`User`]: shared; participates in keeping the object alive;
//! - [`Credential`]: non-owning; must be [acquired](Credential::acquire) into a
//!   [`User`] before use.
//!
//! ## Lifetime
//! ```text
//!   Owner<T> ──acquire_user()──► User<T> ──authorize()──► Credential<T>
//!      │                            ▲                          │
//!      └────────authorize()─────────┼──────────────────────────┤
//!                                   └────────acquire()─────────┘
//!                                       (atomic upgrade, may fail)
//!
//!   object alive  ⇔  Owner alive  ∨  any User alive
//! ```
//!
//! ## Rules
//! - Acquisition is a single atomic load-and-upgrade; it either yields a live
//!   [`User`] or `None`, never a dangling reference.
//! - [`Validate::is_valid`] on a credential is **advisory**: the owner may be
//!   dropped right after the check. Always re-acquire immediately before use.
//! - The ownership layer guarantees *lifetime* only. Mutation of the referenced
//!   object is that type's own business (interior mutability, atomics, locks).

mod credential;
mod owner;
mod user;

pub use credential::Credential;
pub use owner::Owner;
pub use user::User;

/// Cheap, non-blocking validity check shared by every handle kind.
///
/// For [`Owner`] and [`User`] this is exact; for [`Credential`] it is a
/// snapshot that may be stale by the time the caller acts on it.
pub trait Validate {
    /// Returns `true` if the handle currently references a live object.
    fn is_valid(&self) -> bool;
}

impl<V: Validate + ?Sized> Validate for &V {
    #[inline]
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

/// Turns any handle kind into a [`User`] for the duration of a use.
///
/// Lets code be written generically over "a reference to `T`" regardless of
/// which handle kind a caller (or a test) substitutes.
pub trait Acquire<T> {
    /// Returns a live user, or `None` if the object is gone (or never existed).
    fn acquire(&self) -> Option<User<T>>;
}

/// Returns `true` if every handle currently resolves to a live object.
///
/// Intended as a pre-flight gate. There is a race window between this check and
/// any later use; callers still have to [acquire](Acquire::acquire) at point of use.
pub fn validate_all(handles: &[&dyn Validate]) -> bool {
    handles.iter().all(|h| h.is_valid())
}

/// Variadic form of [`validate_all`].
///
/// ```rust
/// use pipevisor::{validate_all, Owner};
///
/// let a = Owner::new(1_u32);
/// let b = Owner::new("b");
/// let (ca, cb) = (a.authorize().unwrap(), b.authorize().unwrap());
/// assert!(validate_all!(ca, cb));
///
/// drop(b);
/// assert!(!validate_all!(ca, cb));
/// ```
#[macro_export]
macro_rules! validate_all {
    ($($handle:expr),+ $(,)?) => {
        true $(&& $crate::ownership::Validate::is_valid(&$handle))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_all_over_mixed_handle_kinds() {
        let owner = Owner::new(7_i32);
        let user = owner.acquire_user();
        let credential = owner.authorize().unwrap();

        assert!(validate_all(&[&owner, &user, &credential]));
        assert!(validate_all!(owner, user, credential));

        let empty: Credential<i32> = Credential::default();
        assert!(!validate_all(&[&owner, &empty]));
        assert!(!validate_all!(credential, empty));
    }

    #[test]
    fn validate_all_accepts_references() {
        let owner = Owner::new(1_u8);
        let credential = owner.authorize().unwrap();
        let by_ref = &credential;
        assert!(validate_all!(by_ref, &owner));
    }

    #[test]
    fn empty_set_is_trivially_valid() {
        assert!(validate_all(&[]));
    }

    fn resolve_generic<H: Acquire<String>>(handle: &H) -> Option<usize> {
        handle.acquire().map(|user| user.len())
    }

    #[test]
    fn acquire_is_generic_over_handle_kinds() {
        let owner = Owner::new(String::from("abc"));
        let user = owner.acquire_user();
        let credential = owner.authorize().unwrap();

        assert_eq!(resolve_generic(&owner), Some(3));
        assert_eq!(resolve_generic(&user), Some(3));
        assert_eq!(resolve_generic(&credential), Some(3));

        drop(owner);
        drop(user);
        assert_eq!(resolve_generic(&credential), None);
        assert_eq!(resolve_generic(&User::<String>::default()), None);
    }
}
