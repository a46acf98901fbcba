//! # dlist
//!
//! Doubly-linked list whose nodes live in a slot arena.
//!
//! ## Architecture
//! - **Arena**: `Vec` of slots plus a free list, so node storage is reused
//! - **Handles**: [`NodeId`] carries the owning list and the slot generation,
//!   so stale or foreign handles are rejected instead of corrupting links
//! - **Operations**: push/remove/move at either end are O(1) given a handle

#![warn(missing_docs)]

mod error;
mod list;

pub use error::InvariantError;
pub use list::{Iter, List, NodeId};
