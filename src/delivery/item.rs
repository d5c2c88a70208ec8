//! # Item source and destination capabilities.
//!
//! A pipeline stage pulls from an [`ItemSource`] and pushes into an
//! [`ItemDestination`]. Both are reached through
//! [`Credential`](crate::Credential)s, i.e. by shared reference only: a
//! collaborator that keeps state uses interior mutability.
//!
//! ## Contract
//! - `get_item` returning `None` means "no item this time". It is reported to the
//!   monitor as a source error but is not necessarily fatal.
//! - `set_item` cannot reject an item. Validate before handing it over.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use async_trait::async_trait;
//! use pipevisor::ItemSource;
//!
//! #[derive(Default)]
//! struct Ticks(AtomicU32);
//!
//! #[async_trait]
//! impl ItemSource for Ticks {
//!     type Item = u32;
//!
//!     async fn get_item(&self) -> Option<u32> {
//!         let n = self.0.fetch_add(1, Ordering::Relaxed);
//!         (n % 7 != 0).then_some(n)
//!     }
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::signal::Functional;

/// Produces one item per call.
#[async_trait]
pub trait ItemSource: Send + Sync + 'static {
    /// Item type produced.
    type Item: Send + 'static;

    /// Attempts to produce one item.
    ///
    /// A call that never completes makes the owning task unresponsive to
    /// interruption; implementations should bound their own waits.
    async fn get_item(&self) -> Option<Self::Item>;
}

/// Accepts one item per call.
#[async_trait]
pub trait ItemDestination: Send + Sync + 'static {
    /// Item type accepted.
    type Item: Send + 'static;

    /// Takes the item and handles it.
    async fn set_item(&self, item: Self::Item);
}

/// Source that never produces anything.
pub struct EmptyItemSource<T>(PhantomData<fn() -> T>);

impl<T> Default for EmptyItemSource<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> fmt::Debug for EmptyItemSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmptyItemSource")
    }
}

#[async_trait]
impl<T: Send + 'static> ItemSource for EmptyItemSource<T> {
    type Item = T;

    async fn get_item(&self) -> Option<T> {
        None
    }
}

/// Source that always yields a clone of a fixed item.
#[derive(Debug, Default, Clone)]
pub struct SimpleItemSource<T> {
    /// Item handed out on every call.
    pub item: T,
}

impl<T> SimpleItemSource<T> {
    pub fn new(item: T) -> Self {
        Self { item }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ItemSource for SimpleItemSource<T> {
    type Item = T;

    async fn get_item(&self) -> Option<T> {
        Some(self.item.clone())
    }
}

/// Destination that discards every item.
pub struct EmptyItemDestination<T>(PhantomData<fn(T)>);

impl<T> Default for EmptyItemDestination<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> Clone for EmptyItemDestination<T> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<T> fmt::Debug for EmptyItemDestination<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmptyItemDestination")
    }
}

impl<T> Functional for EmptyItemDestination<T> {
    fn is_functional(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: Send + 'static> ItemDestination for EmptyItemDestination<T> {
    type Item = T;

    async fn set_item(&self, _item: T) {}
}
