// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Engine integration tests.
//!
//! Tests the on-disk B-tree through its public `Tree` API end to end,
//! including the root-split behavior and base-directory resolution via
//! `Config`.

use ferrokv::{Config, Tree};

fn temp_db_path(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join(name);
    (dir, path)
}

#[test]
fn opening_a_fresh_database_has_nothing_in_it() {
    let (_dir, path) = temp_db_path("fresh.db");
    let mut tree = Tree::open(&path).expect("failed to open database");

    let (value, found) = tree.get(b"anything").expect("lookup failed");
    assert!(!found);
    assert!(value.is_empty());
}

#[test]
fn single_pair_survives_insert_and_lookup() {
    let (_dir, path) = temp_db_path("single.db");
    let mut tree = Tree::open(&path).expect("failed to open database");

    tree.insert("hola", "amigos").expect("insert failed");

    let (value, found) = tree.get(b"hola").expect("lookup failed");
    assert!(found);
    assert_eq!(value, b"amigos");
}

#[test]
fn leaf_holds_thirty_pairs_without_splitting() {
    let (_dir, path) = temp_db_path("thirty.db");
    let mut tree = Tree::open(&path).expect("failed to open database");

    for i in 0..30 {
        tree.insert(format!("key-{:02}", i), format!("value-{}", i))
            .expect("insert failed");
    }

    for i in 0..30 {
        let (value, found) = tree
            .get(format!("key-{:02}", i).as_bytes())
            .expect("lookup failed");
        assert!(found, "key-{:02} should be present", i);
        assert_eq!(value, format!("value-{}", i).into_bytes());
    }
}

#[test]
fn thirty_first_insert_triggers_a_root_split() {
    let (_dir, path) = temp_db_path("split.db");
    let mut tree = Tree::open(&path).expect("failed to open database");

    for i in 0..31 {
        tree.insert(format!("key-{:02}", i), format!("value-{}", i))
            .expect("insert failed");
    }

    for i in 0..31 {
        let (value, found) = tree
            .get(format!("key-{:02}", i).as_bytes())
            .expect("lookup failed");
        assert!(found, "key-{:02} should survive the split", i);
        assert_eq!(value, format!("value-{}", i).into_bytes());
    }
}

#[test]
fn bulk_insert_of_five_hundred_keys_is_fully_retrievable() {
    let (_dir, path) = temp_db_path("bulk.db");
    let mut tree = Tree::open(&path).expect("failed to open database");

    for i in 0..500 {
        tree.insert(format!("key-{:04}", i), format!("value-{}", i))
            .expect("insert failed");
    }

    for i in 0..500 {
        let (value, found) = tree
            .get(format!("key-{:04}", i).as_bytes())
            .expect("lookup failed");
        assert!(found, "key-{:04} should be present", i);
        assert_eq!(value, format!("value-{}", i).into_bytes());
    }

    for i in 501..1500 {
        let (_, found) = tree
            .get(format!("key-{:04}", i).as_bytes())
            .expect("lookup failed");
        assert!(!found, "key-{:04} was never inserted", i);
    }
}

#[test]
fn oversized_key_and_value_are_rejected() {
    let (_dir, path) = temp_db_path("oversized.db");
    let mut tree = Tree::open(&path).expect("failed to open database");

    let oversized_key = "k".repeat(ferrokv::store::MAX_KEY_LEN + 1);
    assert!(tree.insert(oversized_key, "v").is_err());

    let oversized_value = "v".repeat(ferrokv::store::MAX_VALUE_LEN + 1);
    assert!(tree.insert("k", oversized_value).is_err());
}

#[test]
fn config_resolves_db_path_under_its_base_directory() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = Config::new(dir.path().join("databases"));

    let path = config.db_path("alice").expect("failed to resolve db path");
    assert_eq!(path, dir.path().join("databases").join("alice.db"));

    let mut tree = Tree::open(&path).expect("failed to open database");
    tree.insert("hola", "amigos").expect("insert failed");
    let (value, found) = tree.get(b"hola").expect("lookup failed");
    assert!(found);
    assert_eq!(value, b"amigos");
}
