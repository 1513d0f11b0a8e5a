//! In-memory, time-expiring cache for environmental layer results.
//!
//! One namespace per [`ResourceClass`], keyed by [`RegionKey`] inside each
//! namespace. Entries expire after a fixed duration and are evicted lazily
//! on the next validity check; there is no background sweep, no capacity
//! bound and no persistence across sessions.

mod key;
mod store;

pub use key::{RegionKey, ResourceClass};
pub use store::{CacheStore, SharedCache};
