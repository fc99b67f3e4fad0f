//! Persistent (immutable) ordered set structures.
//!
//! This module provides [`PersistentAvlSet`], an immutable ordered set
//! over byte-string keys that uses structural sharing for efficient
//! versioning.
//!
//! # Structural Sharing
//!
//! Every `insert` returns a new set version without modifying the
//! original. Only the nodes along the insertion path are rebuilt; the
//! untouched subtrees are shared between versions via reference
//! counting, so holding many successive versions costs O(log N) extra
//! nodes per version rather than a full copy.
//!
//! # Examples
//!
//! ```rust
//! use avlars::persistent::PersistentAvlSet;
//!
//! let v1 = PersistentAvlSet::new().insert(b"b").insert(b"a");
//! let v2 = v1.insert(b"c");
//!
//! assert_eq!(v1.len(), 2); // Original unchanged
//! assert_eq!(v2.len(), 3); // New version
//! assert_eq!(v2.lower_bound(b"ab"), Some(b"b".as_slice()));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod avl_set;

pub use avl_set::PersistentAvlSet;
pub use avl_set::PersistentAvlSetIntoIterator;
pub use avl_set::PersistentAvlSetIterator;
pub use avl_set::TreeStats;

// =============================================================================
// Tests
// =============================================================================
