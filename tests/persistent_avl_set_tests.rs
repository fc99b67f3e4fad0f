//! Unit tests for `PersistentAvlSet`.

use avlars::persistent::PersistentAvlSet;
use rstest::rstest;

// =============================================================================
// Basic Construction Tests
// =============================================================================

#[rstest]
fn test_new_creates_empty_set() {
    let set = PersistentAvlSet::new();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.height(), 0);
}

#[rstest]
fn test_default_creates_empty_set() {
    let set = PersistentAvlSet::default();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
}

#[rstest]
fn test_singleton_creates_set_with_one_key() {
    let set = PersistentAvlSet::singleton(b"only");
    assert_eq!(set.len(), 1);
    assert!(set.contains(b"only"));
    assert_eq!(set.height(), 1);
}

// =============================================================================
// Insert and Contains Tests
// =============================================================================

#[rstest]
fn test_insert_multiple_keys() {
    let set = PersistentAvlSet::new()
        .insert(b"banana")
        .insert(b"apple")
        .insert(b"cherry");

    assert_eq!(set.len(), 3);
    assert!(set.contains(b"apple"));
    assert!(set.contains(b"banana"));
    assert!(set.contains(b"cherry"));
    assert!(!set.contains(b"durian"));
}

#[rstest]
fn test_insert_duplicate_is_idempotent() {
    let set = PersistentAvlSet::new().insert(b"key").insert(b"other");
    let again = set.insert(b"key");

    assert_eq!(again.len(), 2);
    assert_eq!(set, again);
    again.validate();
}

#[rstest]
fn test_insert_preserves_original_set() {
    let v1 = PersistentAvlSet::new().insert(b"a");
    let v2 = v1.insert(b"b");

    assert_eq!(v1.len(), 1);
    assert_eq!(v2.len(), 2);
    assert!(!v1.contains(b"b"));
    assert!(v2.contains(b"a"));
}

#[rstest]
fn test_empty_key_is_a_valid_member() {
    let set = PersistentAvlSet::new().insert(b"").insert(b"a");

    assert!(set.contains(b""));
    assert_eq!(set.min(), Some(b"".as_slice()));
    assert_eq!(set.lower_bound(b""), Some(b"".as_slice()));
    set.validate();
}

// =============================================================================
// Lower Bound Tests
// =============================================================================

#[rstest]
fn test_lower_bound_basic() {
    let set = PersistentAvlSet::new().insert(b"b").insert(b"a").insert(b"c");

    let keys: Vec<&[u8]> = set.iter().collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"b", b"c"]);

    assert_eq!(set.lower_bound(b"a"), Some(b"a".as_slice()));
    assert_eq!(set.lower_bound(b"ab"), Some(b"b".as_slice()));
    assert_eq!(set.lower_bound(b"d"), None);
}

#[rstest]
fn test_lower_bound_boundaries() {
    let set = PersistentAvlSet::new().insert(b"m").insert(b"a").insert(b"z");

    // Query equal to the maximum key returns that key.
    assert_eq!(set.lower_bound(b"z"), Some(b"z".as_slice()));
    // Query greater than all keys returns none.
    assert_eq!(set.lower_bound(b"zz"), None);
    // Query smaller than all keys returns the minimum.
    assert_eq!(set.lower_bound(b""), Some(b"a".as_slice()));
}

#[rstest]
fn test_lower_bound_on_empty_set() {
    let set = PersistentAvlSet::new();
    assert_eq!(set.lower_bound(b""), None);
    assert_eq!(set.lower_bound(b"anything"), None);
}

#[rstest]
fn test_lower_bound_over_text_suffixes() {
    let text = "mississippi";
    let mut index = PersistentAvlSet::new();
    for position in (0..text.len()).rev() {
        index = index.insert(text[position..].as_bytes());
    }

    assert_eq!(index.len(), text.len());
    index.validate();

    assert_eq!(index.lower_bound(b"iss"), Some("issippi".as_bytes()));
    assert_eq!(index.lower_bound(b"ssi"), Some("ssippi".as_bytes()));
    assert_eq!(index.lower_bound(b"mississippi"), Some("mississippi".as_bytes()));
    assert_eq!(index.lower_bound(b"z"), None);
    assert_eq!(index.min(), Some("i".as_bytes()));
    assert_eq!(index.max(), Some("ssissippi".as_bytes()));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[rstest]
fn test_versions_remain_independently_queryable() {
    let v0 = PersistentAvlSet::new();
    let v1 = v0.insert(b"x");
    let v2 = v1.insert(b"y");

    assert_eq!(v0.lower_bound(b"a"), None);
    assert_eq!(v1.lower_bound(b"a"), Some(b"x".as_slice()));
    assert_eq!(v2.lower_bound(b"a"), Some(b"x".as_slice()));
    assert_eq!(v2.lower_bound(b"y"), Some(b"y".as_slice()));
    assert_eq!(v1.lower_bound(b"y"), None);

    assert_eq!(v0.len(), 0);
    assert_eq!(v1.len(), 1);
    assert_eq!(v2.len(), 2);
}

#[rstest]
fn test_early_version_survives_later_inserts() {
    let keys: Vec<String> = (0..50).map(|index| format!("{index:02}")).collect();

    let snapshot: PersistentAvlSet<'_> = keys[..10].iter().map(|key| key.as_bytes()).collect();
    let mut latest = snapshot.clone();
    for key in &keys[10..] {
        latest = latest.insert(key.as_bytes());
    }

    assert_eq!(snapshot.len(), 10);
    assert_eq!(latest.len(), 50);
    snapshot.validate();
    latest.validate();

    let snapshot_keys: Vec<&[u8]> = snapshot.iter().collect();
    let expected: Vec<&[u8]> = keys[..10].iter().map(|key| key.as_bytes()).collect();
    assert_eq!(snapshot_keys, expected);
}

// =============================================================================
// Balance Tests
// =============================================================================

#[rstest]
fn test_reverse_insert_triggers_rotation() {
    // A naive BST would degrade into a chain of height 3.
    let set = PersistentAvlSet::new().insert(b"c").insert(b"b").insert(b"a");

    assert_eq!(set.height(), 2);
    set.validate();
}

#[rstest]
fn test_sequential_inserts_stay_balanced() {
    let keys: Vec<String> = (0..1000).map(|index| format!("{index:04}")).collect();
    let set: PersistentAvlSet<'_> = keys.iter().map(|key| key.as_bytes()).collect();

    assert_eq!(set.len(), 1000);
    // Theoretical minimum height for 1000 nodes is 10; the AVL bound
    // allows at most ~14.
    assert!(set.height() >= 10);
    assert!(set.height() <= 15, "height {} exceeds AVL bound", set.height());

    let stats = set.validate();
    assert_eq!(stats.node_count, 1000);
    assert_eq!(stats.max_height, set.height());
}

// =============================================================================
// Validate Tests
// =============================================================================

#[rstest]
fn test_validate_is_idempotent() {
    let set = PersistentAvlSet::new().insert(b"b").insert(b"a").insert(b"c");

    let first = set.validate();
    let second = set.validate();
    assert_eq!(first, second);
    assert_eq!(set.len(), 3);
}

// =============================================================================
// Iteration and Trait Tests
// =============================================================================

#[rstest]
fn test_iter_yields_sorted_keys() {
    let set = PersistentAvlSet::new()
        .insert(b"pear")
        .insert(b"fig")
        .insert(b"apple")
        .insert(b"quince");

    let keys: Vec<&[u8]> = set.iter().collect();
    assert_eq!(keys, vec![b"apple".as_slice(), b"fig", b"pear", b"quince"]);
    assert_eq!(set.iter().len(), 4);
}

#[rstest]
fn test_into_iter_yields_sorted_keys() {
    let set = PersistentAvlSet::new().insert(b"b").insert(b"a");
    let keys: Vec<&[u8]> = set.into_iter().collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"b"]);
}

#[rstest]
fn test_from_iter() {
    let keys: [&[u8]; 3] = [b"c", b"a", b"b"];
    let set: PersistentAvlSet<'_> = keys.into_iter().collect();

    assert_eq!(set.len(), 3);
    assert_eq!(set.min(), Some(b"a".as_slice()));
    assert_eq!(set.max(), Some(b"c".as_slice()));
}

#[rstest]
fn test_eq_ignores_insertion_order() {
    let forward = PersistentAvlSet::new().insert(b"a").insert(b"b").insert(b"c");
    let backward = PersistentAvlSet::new().insert(b"c").insert(b"b").insert(b"a");
    let smaller = PersistentAvlSet::new().insert(b"a").insert(b"b");

    assert_eq!(forward, backward);
    assert_ne!(forward, smaller);
}

#[rstest]
fn test_debug_output_is_sorted() {
    let set = PersistentAvlSet::new().insert(b"b").insert(b"a");
    let rendered = format!("{set:?}");
    assert!(rendered.starts_with('{'));
    assert!(rendered.ends_with('}'));
}

#[rstest]
fn test_hash_consistent_with_eq() {
    use std::collections::HashMap;

    let key_set = PersistentAvlSet::new().insert(b"a").insert(b"b");
    let lookup = PersistentAvlSet::new().insert(b"b").insert(b"a");

    let mut outer: HashMap<PersistentAvlSet<'_>, &str> = HashMap::new();
    outer.insert(key_set, "value");
    assert_eq!(outer.get(&lookup), Some(&"value"));
}

#[rstest]
fn test_clone_is_shallow_and_equal() {
    let set = PersistentAvlSet::new().insert(b"a").insert(b"b");
    let clone = set.clone();

    assert_eq!(set, clone);
    let extended = clone.insert(b"c");
    assert_eq!(set.len(), 2);
    assert_eq!(extended.len(), 3);
}
