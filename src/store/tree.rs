// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The public entry point: a disk-resident B-tree keyed on byte strings.

use std::path::Path;

use crate::error::EngineResult;
use crate::store::block::BlockService;
use crate::store::node::Node;
use crate::store::pair::Pair;

/// A persistent key-value store backed by a single file of fixed-size
/// blocks.
///
/// The root always lives at block `0`; everything below it is reached by
/// following child block ids, never by in-memory reference, so a `Tree`
/// can be dropped and reopened at any point with no recovery step.
pub struct Tree {
    blocks: BlockService,
}

impl Tree {
    /// Opens (creating if necessary) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let existed_before = path.as_ref().exists();
        let blocks = BlockService::open(path.as_ref())?;
        log::info!(
            "opened database at {} ({})",
            path.as_ref().display(),
            if existed_before { "reopened" } else { "newly created" }
        );
        Ok(Self { blocks })
    }

    /// Inserts `key`/`value`, or updates the existing value if `key` is
    /// already present.
    ///
    /// Rejects keys longer than [`crate::store::MAX_KEY_LEN`] bytes or
    /// values longer than [`crate::store::MAX_VALUE_LEN`] bytes before
    /// touching the tree.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> EngineResult<()> {
        let pair = Pair::new(key.into(), value.into());
        pair.validate()?;

        let mut root = self.blocks.get_root_block().map(Node::from)?;
        root.insert(&mut self.blocks, pair, true)?;
        Ok(())
    }

    /// Looks up `key`, returning `(value, true)` if present or
    /// `(Vec::new(), false)` if absent.
    pub fn get(&mut self, key: &[u8]) -> EngineResult<(Vec<u8>, bool)> {
        let root = self.blocks.get_root_block().map(Node::from)?;
        root.search(&mut self.blocks, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tree() -> (tempfile::TempDir, Tree) {
        let dir = tempfile::tempdir().unwrap();
        let tree = Tree::open(dir.path().join("tree.db")).unwrap();
        (dir, tree)
    }

    #[test]
    fn get_on_empty_tree_reports_not_found() {
        let (_dir, mut tree) = open_tree();
        let (value, found) = tree.get(b"missing").unwrap();
        assert!(!found);
        assert!(value.is_empty());
    }

    #[test]
    fn insert_then_get_round_trips_a_single_pair() {
        let (_dir, mut tree) = open_tree();
        tree.insert("hola", "amigos").unwrap();

        let (value, found) = tree.get(b"hola").unwrap();
        assert!(found);
        assert_eq!(value, b"amigos");
    }

    #[test]
    fn leaf_fills_to_capacity_without_splitting() {
        let (_dir, mut tree) = open_tree();
        for i in 0..30 {
            tree.insert(format!("key-{:02}", i), "v").unwrap();
        }

        for i in 0..30 {
            let (_, found) = tree.get(format!("key-{:02}", i).as_bytes()).unwrap();
            assert!(found, "key-{:02} should be present", i);
        }
    }

    #[test]
    fn thirty_first_insert_splits_the_root() {
        let (_dir, mut tree) = open_tree();
        for i in 0..31 {
            tree.insert(format!("key-{:02}", i), "v").unwrap();
        }

        for i in 0..31 {
            let (_, found) = tree.get(format!("key-{:02}", i).as_bytes()).unwrap();
            assert!(found, "key-{:02} should be present after split", i);
        }
    }

    #[test]
    fn bulk_insert_and_lookup_of_five_hundred_keys() {
        let (_dir, mut tree) = open_tree();
        for i in 0..500 {
            tree.insert(format!("key-{:04}", i), format!("value-{}", i))
                .unwrap();
        }

        for i in 0..500 {
            let (value, found) = tree.get(format!("key-{:04}", i).as_bytes()).unwrap();
            assert!(found, "key-{:04} should be present", i);
            assert_eq!(value, format!("value-{}", i).into_bytes());
        }

        for i in 501..1500 {
            let (_, found) = tree.get(format!("key-{:04}", i).as_bytes()).unwrap();
            assert!(!found, "key-{:04} should be absent", i);
        }
    }

    #[test]
    fn inserting_same_key_twice_updates_value_rather_than_duplicating() {
        let (_dir, mut tree) = open_tree();
        tree.insert("hola", "amigos").unwrap();
        tree.insert("hola", "mundo").unwrap();

        let (value, found) = tree.get(b"hola").unwrap();
        assert!(found);
        assert_eq!(value, b"mundo");
    }

    #[test]
    fn reinserting_a_key_promoted_by_a_root_split_updates_it_in_place() {
        let (_dir, mut tree) = open_tree();
        for i in 0..31 {
            tree.insert(format!("key-{:02}", i), "v").unwrap();
        }

        // "key-15" was promoted to the new root's separator keys by the
        // split and removed from both leaves underneath it.
        tree.insert("key-15", "updated").unwrap();

        let (value, found) = tree.get(b"key-15").unwrap();
        assert!(found);
        assert_eq!(value, b"updated");
    }

    #[test]
    fn oversized_key_is_rejected_before_touching_the_tree() {
        let (_dir, mut tree) = open_tree();
        let oversized_key = "k".repeat(crate::store::MAX_KEY_LEN + 1);
        match tree.insert(oversized_key, "v") {
            Err(crate::error::EngineError::OversizedKey { .. }) => {}
            other => panic!("expected OversizedKey, got {:?}", other),
        }
    }

    #[test]
    fn oversized_value_is_rejected_before_touching_the_tree() {
        let (_dir, mut tree) = open_tree();
        let oversized_value = "v".repeat(crate::store::MAX_VALUE_LEN + 1);
        match tree.insert("k", oversized_value) {
            Err(crate::error::EngineError::OversizedValue { .. }) => {}
            other => panic!("expected OversizedValue, got {:?}", other),
        }
    }

    #[test]
    fn reopening_an_existing_database_preserves_its_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.db");

        {
            let mut tree = Tree::open(&path).unwrap();
            tree.insert("hola", "amigos").unwrap();
        }

        let mut reopened = Tree::open(&path).unwrap();
        let (value, found) = reopened.get(b"hola").unwrap();
        assert!(found);
        assert_eq!(value, b"amigos");
    }
}
