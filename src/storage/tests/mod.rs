use crate::{
    common::PAGE_SIZE,
    storage::{
        header::{HeaderMut, HeaderRef, MAX_HEADER_RECORDS},
        node::{NodeKind, NodeMut, NodeRef, KEY_SIZE},
    },
    structures::comparator::SignedNumericComparator,
    types::{Rid, INVALID_PAGE_ID},
};

use std::io;

fn page_buf() -> Vec<u8> {
    vec![0u8; PAGE_SIZE]
}

fn key(value: i64) -> [u8; KEY_SIZE] {
    value.to_ne_bytes()
}

fn comparator() -> SignedNumericComparator {
    SignedNumericComparator::with_type::<i64>()
}

#[test]
fn test_leaf_init_and_header() -> io::Result<()> {
    let mut buf = page_buf();
    let mut node = NodeMut::new(&mut buf);
    node.init_leaf(5, 2, 8);

    let node = NodeRef::new(&buf);
    assert_eq!(node.kind()?, NodeKind::Leaf);
    assert_eq!(node.size(), 0);
    let header = node.header();
    assert_eq!(header.page_id, 5);
    assert_eq!(header.parent_page_id, 2);
    assert_eq!(header.next_page_id, INVALID_PAGE_ID);
    assert_eq!(header.max_size, 8);
    Ok(())
}

#[test]
fn test_zeroed_page_has_no_valid_kind() {
    let buf = page_buf();
    assert!(NodeRef::new(&buf).kind().is_err());
}

#[test]
fn test_leaf_sorted_insert_and_lookup() -> io::Result<()> {
    let cmp = comparator();
    let mut buf = page_buf();
    let mut node = NodeMut::new(&mut buf);
    node.init_leaf(1, INVALID_PAGE_ID, 16);

    for (i, k) in [30i64, 10, 20, 40].into_iter().enumerate() {
        let new_size = node.leaf_insert(&cmp, &key(k), Rid::new(1, i as u32))?;
        assert_eq!(new_size, i + 1);
    }

    let node = NodeRef::new(&buf);
    let keys: Vec<i64> = (0..node.size())
        .map(|i| i64::from_ne_bytes(node.key_at(i).try_into().unwrap()))
        .collect();
    assert_eq!(keys, vec![10, 20, 30, 40], "Entries must stay sorted");

    assert_eq!(node.leaf_lookup(&cmp, &key(20))?, Some(Rid::new(1, 2)));
    assert_eq!(node.leaf_lookup(&cmp, &key(25))?, None);
    assert_eq!(node.leaf_lookup(&cmp, &key(5))?, None);
    assert_eq!(node.leaf_lookup(&cmp, &key(99))?, None);
    Ok(())
}

#[test]
fn test_leaf_duplicate_insert_leaves_node_unchanged() -> io::Result<()> {
    let cmp = comparator();
    let mut buf = page_buf();
    let mut node = NodeMut::new(&mut buf);
    node.init_leaf(1, INVALID_PAGE_ID, 8);

    node.leaf_insert(&cmp, &key(7), Rid::new(1, 0))?;
    let size = node.leaf_insert(&cmp, &key(7), Rid::new(9, 9))?;

    assert_eq!(size, 1, "Duplicate insert must not grow the node");
    assert_eq!(
        node.as_ref().leaf_lookup(&cmp, &key(7))?,
        Some(Rid::new(1, 0)),
        "Duplicate insert must not overwrite the value"
    );
    Ok(())
}

#[test]
fn test_leaf_split_moves_upper_half_and_splices_chain() -> io::Result<()> {
    let cmp = comparator();
    let mut left_buf = page_buf();
    let mut right_buf = page_buf();

    let mut left = NodeMut::new(&mut left_buf);
    left.init_leaf(1, INVALID_PAGE_ID, 4);
    left.set_next_page_id(9);
    for k in [10i64, 20, 30, 40] {
        left.leaf_insert(&cmp, &key(k), Rid::new(1, k as u32))?;
    }

    let mut right = NodeMut::new(&mut right_buf);
    right.init_leaf(2, INVALID_PAGE_ID, 4);
    left.leaf_move_upper_half_to(&mut right);

    let left = NodeRef::new(&left_buf);
    let right = NodeRef::new(&right_buf);
    assert_eq!(left.size(), 2);
    assert_eq!(right.size(), 2);
    assert_eq!(right.key_at(0), &key(30)[..], "Separator is the sibling's first key");
    assert_eq!(left.header().next_page_id, 2, "Old leaf links to the sibling");
    assert_eq!(right.header().next_page_id, 9, "Sibling inherits the old next");
    Ok(())
}

#[test]
fn test_internal_lookup_boundaries() -> io::Result<()> {
    let cmp = comparator();
    let mut buf = page_buf();
    let mut node = NodeMut::new(&mut buf);
    node.init_internal(3, INVALID_PAGE_ID, 8);
    node.internal_populate_new_root(10, &key(50), 20);

    let node = NodeRef::new(&buf);
    assert_eq!(node.size(), 2);
    assert_eq!(node.internal_lookup(&cmp, &key(10))?, 10, "Below the separator");
    assert_eq!(node.internal_lookup(&cmp, &key(50))?, 20, "Separator belongs right");
    assert_eq!(node.internal_lookup(&cmp, &key(99))?, 20);
    Ok(())
}

#[test]
fn test_internal_insert_after_keeps_child_order() -> io::Result<()> {
    let cmp = comparator();
    let mut buf = page_buf();
    let mut node = NodeMut::new(&mut buf);
    node.init_internal(3, INVALID_PAGE_ID, 8);
    node.internal_populate_new_root(10, &key(50), 20);

    // Child 10 split, promoting 25 with new right sibling 30.
    let size = node.internal_insert_after(10, &key(25), 30)?;
    assert_eq!(size, 3);

    let node = NodeRef::new(&buf);
    assert_eq!(node.internal_child_at(0), 10);
    assert_eq!(node.internal_child_at(1), 30);
    assert_eq!(node.internal_child_at(2), 20);
    assert_eq!(node.internal_lookup(&cmp, &key(30))?, 30);
    assert_eq!(node.internal_lookup(&cmp, &key(60))?, 20);
    Ok(())
}

#[test]
fn test_internal_insert_after_missing_child_is_corruption() {
    let mut buf = page_buf();
    let mut node = NodeMut::new(&mut buf);
    node.init_internal(3, INVALID_PAGE_ID, 8);
    node.internal_populate_new_root(10, &key(50), 20);

    assert!(node.internal_insert_after(99, &key(1), 2).is_err());
}

#[test]
fn test_internal_split_reports_moved_children() -> io::Result<()> {
    let mut left_buf = page_buf();
    let mut right_buf = page_buf();

    let mut left = NodeMut::new(&mut left_buf);
    left.init_internal(1, INVALID_PAGE_ID, 4);
    left.internal_populate_new_root(100, &key(10), 101);
    left.internal_insert_after(101, &key(20), 102)?;
    left.internal_insert_after(102, &key(30), 103)?;
    left.internal_insert_after(103, &key(40), 104)?;

    let mut right = NodeMut::new(&mut right_buf);
    right.init_internal(2, INVALID_PAGE_ID, 4);
    let moved = left.internal_move_upper_half_to(&mut right);

    assert_eq!(left.as_ref().size(), 2);
    assert_eq!(right.as_ref().size(), 3);
    assert_eq!(moved, vec![102, 103, 104]);
    assert_eq!(right.as_ref().key_at(0), &key(20)[..], "Promoted separator");
    Ok(())
}

#[test]
fn test_header_insert_get_update() -> io::Result<()> {
    let mut buf = page_buf();

    assert_eq!(HeaderRef::new(&buf).record_count(), 0);
    assert_eq!(HeaderRef::new(&buf).get_record("orders_pk")?, None);

    let mut view = HeaderMut::new(&mut buf);
    assert!(view.insert_record("orders_pk", 3)?);
    assert!(view.insert_record("users_pk", 8)?);
    assert!(!view.insert_record("orders_pk", 5)?, "Names are unique");

    assert_eq!(view.as_ref().get_record("orders_pk")?, Some(3));
    assert_eq!(view.as_ref().get_record("users_pk")?, Some(8));

    assert!(view.update_record("orders_pk", 11)?);
    assert!(!view.update_record("missing", 1)?);
    assert_eq!(view.as_ref().get_record("orders_pk")?, Some(11));
    assert_eq!(view.as_ref().record_count(), 2);
    Ok(())
}

#[test]
fn test_header_rejects_oversized_names() {
    let mut buf = page_buf();
    let mut view = HeaderMut::new(&mut buf);

    let long_name = "x".repeat(64);
    assert!(view.insert_record(&long_name, 1).is_err());
    assert!(view.insert_record("", 1).is_err());
}

#[test]
fn test_header_page_capacity() -> io::Result<()> {
    let mut buf = page_buf();
    let mut view = HeaderMut::new(&mut buf);

    for i in 0..MAX_HEADER_RECORDS {
        assert!(view.insert_record(&format!("index_{}", i), i as i32)?);
    }
    assert!(!view.insert_record("one_too_many", 0)?);
    assert_eq!(view.as_ref().record_count(), MAX_HEADER_RECORDS);
    Ok(())
}
