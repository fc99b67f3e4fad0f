//! # avlars
//!
//! A persistent AVL ordered set over byte-string keys with structural
//! sharing and lower-bound queries.
//!
//! ## Overview
//!
//! This library provides a single, focused data structure:
//! [`persistent::PersistentAvlSet`], an immutable height-balanced binary
//! search tree over `&[u8]` keys. Every mutating operation returns a new
//! version of the set and leaves the original untouched; unchanged
//! subtrees are shared between versions through reference counting.
//!
//! - O(log N) insert, producing a new version
//! - O(log N) contains / lower_bound / min / max
//! - O(1) len, is_empty, and version cloning
//! - Keys are borrowed views into caller-owned storage; no key bytes are
//!   ever copied
//!
//! The primary use case is in-memory suffix indexing: insert every suffix
//! of a text, then answer "smallest stored key greater than or equal to a
//! query" to locate substring occurrences.
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` for structural sharing, making set
//!   versions `Send + Sync`
//!
//! ## Example
//!
//! ```rust
//! use avlars::persistent::PersistentAvlSet;
//!
//! let text = "mississippi";
//! let mut index = PersistentAvlSet::new();
//! for position in (0..text.len()).rev() {
//!     index = index.insert(text[position..].as_bytes());
//! }
//!
//! assert_eq!(index.lower_bound(b"iss"), Some("issippi".as_bytes()));
//! assert_eq!(index.lower_bound(b"z"), None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use avlars::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
