//! # lrucache
//!
//! Thread-safe, fixed-capacity LRU cache.
//!
//! ## Architecture
//! - **HashMap**: AHash map from key to list node handle (O(1))
//! - **Recency list**: [`dlist::List`] ordered most to least recently used (O(1))
//! - **Locking**: one `RwLock` per cache; every mutating call holds it exclusively
//!
//! ```
//! use lrucache::LruCache;
//!
//! let cache = LruCache::new(2).expect("capacity is positive");
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a");
//! cache.set("c", 3); // evicts "b"
//!
//! assert_eq!(cache.get(&"b"), None);
//! assert_eq!(cache.keys(), vec!["c", "a"]);
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod stats;

pub use cache::LruCache;
pub use dlist::InvariantError;
pub use error::{Error, Result};
pub use stats::CacheStats;
