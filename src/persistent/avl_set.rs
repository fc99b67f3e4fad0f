//! Persistent (immutable) ordered set based on an AVL tree.
//!
//! This module provides [`PersistentAvlSet`], an immutable ordered set
//! over byte-string keys that uses structural sharing for efficient
//! operations.
//!
//! # Overview
//!
//! `PersistentAvlSet` is a persistent height-balanced binary search tree.
//! Keys are `&[u8]` views into caller-owned storage; the set never copies
//! key bytes, it only stores the borrowed slices. Keys are ordered by
//! standard lexicographic byte comparison.
//!
//! - O(log N) insert, returning a new version
//! - O(log N) contains / lower_bound / min / max
//! - O(1) len and `is_empty`
//!
//! All operations return new sets without modifying the original, and
//! structural sharing ensures memory efficiency: an insert allocates one
//! new node per level of the search path and shares every untouched
//! subtree with the previous version.
//!
//! # Examples
//!
//! ```rust
//! use avlars::persistent::PersistentAvlSet;
//!
//! let set = PersistentAvlSet::new()
//!     .insert(b"banana")
//!     .insert(b"apple")
//!     .insert(b"cherry");
//!
//! // Keys are always in sorted order
//! let keys: Vec<&[u8]> = set.iter().collect();
//! assert_eq!(keys, vec![b"apple".as_slice(), b"banana", b"cherry"]);
//!
//! // Lower-bound queries
//! assert_eq!(set.lower_bound(b"b"), Some(b"banana".as_slice()));
//! ```
//!
//! # Internal Structure
//!
//! The AVL tree maintains the following invariants:
//! 1. In-order traversal yields keys in strictly increasing order
//! 2. At every node, the subtree heights differ by at most 1
//! 3. Every node stores `max(height(left), height(right)) + 1`, with
//!    `height(empty) == 0`
//!
//! These invariants bound the tree height by ~1.44 * log2(N + 2), which
//! also bounds the recursion depth of insertion, traversal, and drop.

use super::ReferenceCounter;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

/// Inline capacity of iterator traversal stacks. The balance invariant
/// keeps the tree height within this bound for any realistic key count;
/// `SmallVec` spills to the heap beyond it.
const TRAVERSAL_STACK_CAPACITY: usize = 24;

// =============================================================================
// Node Definition
// =============================================================================

/// An optional, shared handle to a subtree. `None` is the empty subtree.
type Link<'a> = Option<ReferenceCounter<Node<'a>>>;

/// Internal node structure for the AVL tree.
///
/// Nodes are immutable once constructed; rebalancing builds new nodes
/// instead of mutating existing ones, so any number of set versions can
/// share a node safely.
struct Node<'a> {
    height: u32,
    key: &'a [u8],
    left: Link<'a>,
    right: Link<'a>,
}

impl<'a> Node<'a> {
    /// Creates a new node with no children.
    const fn leaf(key: &'a [u8]) -> Self {
        Self {
            height: 1,
            key,
            left: None,
            right: None,
        }
    }

    /// Height of an optional subtree; the empty subtree has height 0.
    fn height_of(link: &Link<'a>) -> u32 {
        link.as_ref().map_or(0, |node| node.height)
    }

    /// Balance factor of a node built from these children: positive means
    /// right-heavy, negative means left-heavy.
    fn balance_of(left: &Link<'a>, right: &Link<'a>) -> i64 {
        i64::from(Self::height_of(right)) - i64::from(Self::height_of(left))
    }

    /// Constructs a node directly from already-balanced children.
    fn make(left: Link<'a>, key: &'a [u8], right: Link<'a>) -> ReferenceCounter<Self> {
        debug_assert!(Self::balance_of(&left, &right).abs() < 2);
        let height = Self::height_of(&left).max(Self::height_of(&right)) + 1;
        ReferenceCounter::new(Self {
            height,
            key,
            left,
            right,
        })
    }

    /// Constructs a node from children that may be out of balance by one
    /// level, rotating as needed.
    ///
    /// This is the single place where the AVL shape invariant is enforced;
    /// all insertion logic funnels through it.
    fn make_and_rebalance(left: Link<'a>, key: &'a [u8], right: Link<'a>) -> ReferenceCounter<Self> {
        let balance = Self::balance_of(&left, &right);
        if balance.abs() < 2 {
            return Self::make(left, key, right);
        }
        Self::rebalance(left, key, right, balance)
    }

    /// Rebuilds an out-of-balance arrangement.
    ///
    /// The children arrived balanced on their own, so the overflow is
    /// exactly one level deep and one of the four classic rotation shapes
    /// applies. Rotation here means reassembling the ordered subtree and
    /// key fragments into fresh nodes; the original nodes stay untouched
    /// for any versions still referencing them.
    fn rebalance(
        left: Link<'a>,
        key: &'a [u8],
        right: Link<'a>,
        balance: i64,
    ) -> ReferenceCounter<Self> {
        if balance == -2 {
            let left = left.expect("left-heavy overflow implies a non-empty left subtree");
            if Self::balance_of(&left.left, &left.right) == 1 {
                // The inner grandchild is the deepest fragment; pull it to
                // the top (double rotation).
                let inner = left
                    .right
                    .clone()
                    .expect("a right-leaning subtree has a right child");
                Self::make3(
                    left.left.clone(),
                    left.key,
                    inner.left.clone(),
                    inner.key,
                    inner.right.clone(),
                    key,
                    right,
                )
            } else {
                Self::make2(left.left.clone(), left.key, left.right.clone(), key, right, true)
            }
        } else {
            debug_assert_eq!(balance, 2);
            let right = right.expect("right-heavy overflow implies a non-empty right subtree");
            if Self::balance_of(&right.left, &right.right) == -1 {
                let inner = right
                    .left
                    .clone()
                    .expect("a left-leaning subtree has a left child");
                Self::make3(
                    left,
                    key,
                    inner.left.clone(),
                    inner.key,
                    inner.right.clone(),
                    right.key,
                    right.right.clone(),
                )
            } else {
                Self::make2(left, key, right.left.clone(), right.key, right.right.clone(), false)
            }
        }
    }

    /// Builds a two-level tree from four subtrees and three keys, all
    /// in order, rooted at the middle key (the double-rotation shape).
    /// Three new nodes result; this is the cost of persistence.
    fn make3(
        first: Link<'a>,
        low: &'a [u8],
        second: Link<'a>,
        mid: &'a [u8],
        third: Link<'a>,
        high: &'a [u8],
        fourth: Link<'a>,
    ) -> ReferenceCounter<Self> {
        debug_assert!(first.as_ref().is_none_or(|node| node.key < low));
        debug_assert!(low < mid);
        debug_assert!(second.as_ref().is_none_or(|node| node.key < mid));
        debug_assert!(mid < high);
        debug_assert!(third.as_ref().is_none_or(|node| node.key < high));
        debug_assert!(fourth.as_ref().is_none_or(|node| node.key > high));

        Self::make(
            Some(Self::make(first, low, second)),
            mid,
            Some(Self::make(third, high, fourth)),
        )
    }

    /// Builds a two-level tree from three subtrees and two keys, all in
    /// order (the single-rotation shape). `root_at_low` picks which key
    /// becomes the new root.
    fn make2(
        first: Link<'a>,
        low: &'a [u8],
        second: Link<'a>,
        high: &'a [u8],
        third: Link<'a>,
        root_at_low: bool,
    ) -> ReferenceCounter<Self> {
        debug_assert!(first.as_ref().is_none_or(|node| node.key < low));
        debug_assert!(low < high);
        debug_assert!(second.as_ref().is_none_or(|node| node.key < high));
        debug_assert!(third.as_ref().is_none_or(|node| node.key > high));

        if root_at_low {
            Self::make(first, low, Some(Self::make(second, high, third)))
        } else {
            Self::make(Some(Self::make(first, low, second)), high, third)
        }
    }
}

// =============================================================================
// PersistentAvlSet Definition
// =============================================================================

/// A persistent (immutable) ordered set of byte-string keys based on an
/// AVL tree.
///
/// `PersistentAvlSet` is an immutable data structure that uses structural
/// sharing: `insert` returns a new version of the set, and the original
/// stays valid and unchanged for as long as it is held.
///
/// Keys are `&[u8]` slices borrowed from storage the caller guarantees
/// outlives the set; key bytes are never copied. Keys are compared with
/// standard lexicographic byte ordering. Inserting a key that is already
/// present is idempotent.
///
/// # Time Complexity
///
/// | Operation     | Complexity |
/// |---------------|------------|
/// | `new`         | O(1)       |
/// | `insert`      | O(log N)   |
/// | `contains`    | O(log N)   |
/// | `lower_bound` | O(log N)   |
/// | `min`/`max`   | O(log N)   |
/// | `len`         | O(1)       |
/// | `is_empty`    | O(1)       |
///
/// # Examples
///
/// ```rust
/// use avlars::persistent::PersistentAvlSet;
///
/// let v1 = PersistentAvlSet::new().insert(b"x");
/// let v2 = v1.insert(b"y");
///
/// assert_eq!(v1.lower_bound(b"a"), Some(b"x".as_slice()));
/// assert_eq!(v2.lower_bound(b"y"), Some(b"y".as_slice()));
/// assert_eq!(v1.len(), 1); // Original unchanged
/// ```
#[derive(Clone)]
pub struct PersistentAvlSet<'a> {
    /// Root node of the tree
    root: Link<'a>,
    /// Number of keys
    length: usize,
}

impl<'a> PersistentAvlSet<'a> {
    /// Creates a new empty set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let set = PersistentAvlSet::new();
    /// assert!(set.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Creates a set containing a single key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let set = PersistentAvlSet::singleton(b"only");
    /// assert_eq!(set.len(), 1);
    /// assert!(set.contains(b"only"));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: &'a [u8]) -> Self {
        Self::new().insert(key)
    }

    /// Returns the number of keys in the set.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the set contains no keys.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the height of the tree (0 for the empty set).
    ///
    /// The balance invariant bounds this by ~1.44 * log2(len + 2).
    #[must_use]
    pub fn height(&self) -> usize {
        Node::height_of(&self.root) as usize
    }

    /// Returns `true` if the set contains the given key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let set = PersistentAvlSet::new().insert(b"key");
    /// assert!(set.contains(b"key"));
    /// assert!(!set.contains(b"other"));
    /// ```
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        let mut node = self.root.as_deref();
        while let Some(current) = node {
            match key.cmp(current.key) {
                Ordering::Less => node = current.left.as_deref(),
                Ordering::Greater => node = current.right.as_deref(),
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// Inserts a key into the set, returning the new version.
    ///
    /// The receiver is left unchanged; untouched subtrees are shared
    /// between the two versions. Inserting a key that is already present
    /// is idempotent and returns an equal set.
    ///
    /// # Complexity
    ///
    /// O(log N), allocating one new node per level of the search path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let v1 = PersistentAvlSet::new().insert(b"a");
    /// let v2 = v1.insert(b"b");
    ///
    /// assert_eq!(v1.len(), 1); // Original unchanged
    /// assert_eq!(v2.len(), 2); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: &'a [u8]) -> Self {
        if self.contains(key) {
            return self.clone();
        }

        Self {
            root: Some(Self::insert_into(self.root.as_ref(), key)),
            length: self.length + 1,
        }
    }

    /// Recursive helper for insert. The caller has already ruled out a
    /// duplicate, so the descent only sees strictly smaller or larger
    /// keys. Recursion depth is bounded by the balance invariant.
    fn insert_into(
        node: Option<&ReferenceCounter<Node<'a>>>,
        key: &'a [u8],
    ) -> ReferenceCounter<Node<'a>> {
        match node {
            None => ReferenceCounter::new(Node::leaf(key)),
            Some(current) => {
                if key < current.key {
                    let new_left = Self::insert_into(current.left.as_ref(), key);
                    Node::make_and_rebalance(Some(new_left), current.key, current.right.clone())
                } else {
                    let new_right = Self::insert_into(current.right.as_ref(), key);
                    Node::make_and_rebalance(current.left.clone(), current.key, Some(new_right))
                }
            }
        }
    }

    /// Returns the smallest stored key that is greater than or equal to
    /// `query`, or `None` if every stored key is smaller.
    ///
    /// This is a read-only descent: at each node, keys smaller than the
    /// query discard the node and its left subtree; otherwise the node
    /// becomes the best candidate so far and the search continues left
    /// for a closer one. No allocation takes place.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let set = PersistentAvlSet::new()
    ///     .insert(b"b")
    ///     .insert(b"a")
    ///     .insert(b"c");
    ///
    /// assert_eq!(set.lower_bound(b"a"), Some(b"a".as_slice()));
    /// assert_eq!(set.lower_bound(b"ab"), Some(b"b".as_slice()));
    /// assert_eq!(set.lower_bound(b"d"), None);
    /// ```
    #[must_use]
    pub fn lower_bound(&self, query: &[u8]) -> Option<&'a [u8]> {
        let mut best = None;
        let mut node = self.root.as_deref();
        while let Some(current) = node {
            if current.key < query {
                node = current.right.as_deref();
            } else {
                best = Some(current.key);
                node = current.left.as_deref();
            }
        }
        best
    }

    /// Returns the smallest key in the set.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn min(&self) -> Option<&'a [u8]> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(node.key)
    }

    /// Returns the largest key in the set.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn max(&self) -> Option<&'a [u8]> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(node.key)
    }

    /// Returns an iterator over keys in sorted order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let set = PersistentAvlSet::new()
    ///     .insert(b"b")
    ///     .insert(b"c")
    ///     .insert(b"a");
    ///
    /// let keys: Vec<&[u8]> = set.iter().collect();
    /// assert_eq!(keys, vec![b"a".as_slice(), b"b", b"c"]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentAvlSetIterator<'_, 'a> {
        let mut stack = SmallVec::new();
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = node.left.as_deref();
            stack.push(node);
        }
        PersistentAvlSetIterator {
            stack,
            remaining: self.length,
        }
    }

    /// Audits every structural invariant of the tree and returns
    /// aggregate statistics.
    ///
    /// The walk independently recomputes heights bottom-up and confirms:
    ///
    /// - every stored height matches the recomputed height
    /// - the subtree heights at every node differ by at most 1
    /// - the in-order key sequence is strictly increasing
    /// - every reachable node has at least one live handle
    /// - the tracked length matches the node count
    ///
    /// # Panics
    ///
    /// Panics on any violation. A violation indicates a rebalancing or
    /// structural-sharing bug, so there is no soft-error path. Calling
    /// `validate` repeatedly on an unmodified set never fails and never
    /// mutates it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlars::persistent::PersistentAvlSet;
    ///
    /// let set = PersistentAvlSet::new().insert(b"a").insert(b"b");
    /// let stats = set.validate();
    /// assert_eq!(stats.node_count, 2);
    /// ```
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> TreeStats {
        struct Checker<'a> {
            prev_seen: Option<&'a [u8]>,
            node_count: usize,
            total_depth: usize,
        }

        impl<'a> Checker<'a> {
            /// Checks a node's subtree and returns its height.
            fn check(&mut self, node: &ReferenceCounter<Node<'a>>, depth: usize) -> u32 {
                self.node_count += 1;
                self.total_depth += depth;

                assert!(
                    ReferenceCounter::strong_count(node) >= 1,
                    "reachable node must have a live handle"
                );

                let left_height = node
                    .left
                    .as_ref()
                    .map_or(0, |left| self.check(left, depth + 1));

                // In addition to checking balance we ensure that in-order
                // traversal sees keys in strictly increasing order.
                if let Some(prev) = self.prev_seen {
                    assert!(
                        prev < node.key,
                        "in-order key sequence must be strictly increasing"
                    );
                }
                self.prev_seen = Some(node.key);

                let right_height = node
                    .right
                    .as_ref()
                    .map_or(0, |right| self.check(right, depth + 1));

                let expected_height = left_height.max(right_height) + 1;
                assert_eq!(
                    expected_height, node.height,
                    "stored height must match recomputed height"
                );

                let balance = i64::from(right_height) - i64::from(left_height);
                assert!(balance.abs() < 2, "balance invariant violated");

                node.height
            }
        }

        let mut checker = Checker {
            prev_seen: None,
            node_count: 0,
            total_depth: 0,
        };
        let max_height = self
            .root
            .as_ref()
            .map_or(0, |root| checker.check(root, 1));

        assert_eq!(
            checker.node_count, self.length,
            "tracked length must match node count"
        );

        TreeStats {
            node_count: checker.node_count,
            max_height: max_height as usize,
            average_depth: if checker.node_count == 0 {
                0.0
            } else {
                checker.total_depth as f64 / checker.node_count as f64
            },
        }
    }
}

// =============================================================================
// Tree Statistics
// =============================================================================

/// Aggregate statistics reported by [`PersistentAvlSet::validate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeStats {
    /// Number of nodes in the tree.
    pub node_count: usize,
    /// Height of the tree; the root is at depth 1.
    pub max_height: usize,
    /// Mean depth of all nodes, with the root at depth 1.
    pub average_depth: f64,
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// An iterator over the keys of a [`PersistentAvlSet`] in sorted order.
pub struct PersistentAvlSetIterator<'s, 'a> {
    stack: SmallVec<[&'s Node<'a>; TRAVERSAL_STACK_CAPACITY]>,
    remaining: usize,
}

impl<'a> Iterator for PersistentAvlSetIterator<'_, 'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut cursor = node.right.as_deref();
        while let Some(next) = cursor {
            cursor = next.left.as_deref();
            self.stack.push(next);
        }
        self.remaining -= 1;
        Some(node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PersistentAvlSetIterator<'_, '_> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over the keys of a [`PersistentAvlSet`] in sorted
/// order.
///
/// Keys borrow from the external storage, not from the set, so they
/// remain valid after the set itself is consumed.
pub struct PersistentAvlSetIntoIterator<'a> {
    stack: SmallVec<[ReferenceCounter<Node<'a>>; TRAVERSAL_STACK_CAPACITY]>,
    remaining: usize,
}

impl<'a> Iterator for PersistentAvlSetIntoIterator<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut cursor = node.right.clone();
        while let Some(next) = cursor {
            cursor = next.left.clone();
            self.stack.push(next);
        }
        self.remaining -= 1;
        Some(node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PersistentAvlSetIntoIterator<'_> {
    fn len(&self) -> usize {
        self.remaining
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl Default for PersistentAvlSet<'_> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FromIterator<&'a [u8]> for PersistentAvlSet<'a> {
    fn from_iter<I: IntoIterator<Item = &'a [u8]>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set = set.insert(key);
        }
        set
    }
}

impl<'a> IntoIterator for PersistentAvlSet<'a> {
    type Item = &'a [u8];
    type IntoIter = PersistentAvlSetIntoIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        let mut stack = SmallVec::new();
        let mut cursor = self.root.clone();
        while let Some(node) = cursor {
            cursor = node.left.clone();
            stack.push(node);
        }
        PersistentAvlSetIntoIterator {
            stack,
            remaining: self.length,
        }
    }
}

impl<'s, 'a> IntoIterator for &'s PersistentAvlSet<'a> {
    type Item = &'a [u8];
    type IntoIter = PersistentAvlSetIterator<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for PersistentAvlSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl Eq for PersistentAvlSet<'_> {}

/// Computes a hash value for this set.
///
/// The hash covers the length and then every key in sorted order, so the
/// insertion order does not affect the hash value and equal sets produce
/// equal hashes.
impl Hash for PersistentAvlSet<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for key in self {
            key.hash(state);
        }
    }
}

impl fmt::Debug for PersistentAvlSet<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

// =============================================================================
// Compile-Time Guarantees
// =============================================================================

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentAvlSet<'static>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentAvlSet<'static>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
