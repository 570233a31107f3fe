// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! In-memory B-tree node: the logical view of a [`Block`] plus the
//! insert/search/split algorithms that operate on it.
//!
//! Nodes reference their children by block id, never by in-memory
//! pointer, so there is nothing to keep acyclic here — every descent
//! re-reads the child from disk via [`BlockService`] and, on mutation,
//! writes it straight back. A higher layer is free to add a cache; this
//! module does not need one to be correct.

use crate::error::EngineResult;
use crate::store::block::{Block, BlockService, MAX_LEAF};
use crate::store::pair::Pair;

/// The in-memory view of one block: an ordered key array and, for
/// internal nodes, one more child pointer than it has keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub block_id: u64,
    pub keys: Vec<Pair>,
    pub child_block_ids: Vec<u64>,
}

impl Node {
    /// True for a node with no children — the only place pairs are
    /// actually stored in the ASCII-art sense; internal nodes hold
    /// separator keys, not data.
    pub fn is_leaf(&self) -> bool {
        self.child_block_ids.is_empty()
    }

    /// True once a node holds more than `MAX_LEAF` keys and must be split
    /// before it can be persisted.
    pub fn has_overflowed(&self) -> bool {
        self.keys.len() > MAX_LEAF
    }

    /// Inserts `pair` into this node's own key array, keeping it sorted,
    /// and returns the index it landed at.
    ///
    /// A pair whose key already exists is inserted immediately before the
    /// first equal key, same as the reference algorithm — callers that
    /// want update-in-place semantics for duplicate user keys (see
    /// [`Node::insert`]) must check for an existing match first.
    fn add_element(&mut self, pair: Pair) -> usize {
        let index = self
            .keys
            .iter()
            .position(|existing| existing.key >= pair.key)
            .unwrap_or(self.keys.len());
        self.keys.insert(index, pair);
        index
    }

    /// Chooses which child to descend into for `key`: the first child
    /// whose separator key is strictly greater than `key`, or the last
    /// child if `key` is greater than or equal to every separator.
    fn child_for_key(&self, key: &[u8]) -> usize {
        self.keys
            .iter()
            .position(|existing| key < existing.key.as_slice())
            .unwrap_or(self.child_block_ids.len() - 1)
    }

    /// Splits an overflowed leaf into two fresh leaves plus a promoted
    /// middle key. The original block is left untouched on disk — after
    /// a split its block id is unreachable from the tree (see the
    /// space-leak note in `DESIGN.md`).
    fn split_leaf(&self, bs: &mut BlockService) -> EngineResult<(Pair, Node, Node)> {
        let mid = self.keys.len() / 2;
        let middle = self.keys[mid].clone();

        let left = bs.save_new_node(Node {
            block_id: 0,
            keys: self.keys[..mid].to_vec(),
            child_block_ids: Vec::new(),
        })?;
        let right = bs.save_new_node(Node {
            block_id: 0,
            keys: self.keys[mid + 1..].to_vec(),
            child_block_ids: Vec::new(),
        })?;

        Ok((middle, left, right))
    }

    /// Splits an overflowed internal node the same way as
    /// [`Node::split_leaf`], additionally partitioning `child_block_ids`
    /// so the left half keeps `mid + 1` children and the right half keeps
    /// the rest.
    fn split_non_leaf(&self, bs: &mut BlockService) -> EngineResult<(Pair, Node, Node)> {
        let mid = self.keys.len() / 2;
        let middle = self.keys[mid].clone();

        let left = bs.save_new_node(Node {
            block_id: 0,
            keys: self.keys[..mid].to_vec(),
            child_block_ids: self.child_block_ids[..mid + 1].to_vec(),
        })?;
        let right = bs.save_new_node(Node {
            block_id: 0,
            keys: self.keys[mid + 1..].to_vec(),
            child_block_ids: self.child_block_ids[mid + 1..].to_vec(),
        })?;

        Ok((middle, left, right))
    }

    /// Folds a child's split result into this (parent) node: inserts the
    /// promoted key and replaces the one child pointer it used to have
    /// with pointers to both new children.
    fn integrate_popped(&mut self, middle: Pair, left: &Node, right: &Node) {
        let index = self.add_element(middle);
        self.child_block_ids[index] = left.block_id;
        self.child_block_ids.insert(index + 1, right.block_id);
    }

    /// Recursively inserts `value`, splitting this node (and propagating
    /// the split upward) if it overflows.
    ///
    /// A duplicate user key is treated as an update: the existing pair's
    /// value is overwritten in place and no split is ever triggered by
    /// the duplicate itself. This resolves the shadow-on-split ambiguity
    /// the reference algorithm leaves open (see `DESIGN.md`). A key that
    /// has previously been promoted into an ancestor's separator keys is
    /// just as much an existing key as one sitting in a leaf, so every
    /// level checks its own `self.keys` for an exact match before doing
    /// anything else — not only the leaf the descent eventually reaches.
    ///
    /// Returns `Some((middle, left, right))` when this node split and the
    /// caller (the parent, or `Tree` for the root) must integrate the
    /// result; `None` once the insert has been fully absorbed.
    pub fn insert(
        &mut self,
        bs: &mut BlockService,
        value: Pair,
        is_root: bool,
    ) -> EngineResult<Option<(Pair, Node, Node)>> {
        if let Some(existing) = self.keys.iter_mut().find(|p| p.key == value.key) {
            existing.value = value.value;
            bs.update_node(self)?;
            return Ok(None);
        }

        if self.is_leaf() {
            self.add_element(value);
            if !self.has_overflowed() {
                bs.update_node(self)?;
                return Ok(None);
            }

            let (middle, left, right) = self.split_leaf(bs)?;
            log::debug!(
                "split leaf {} into {} and {}, promoting key {:?}",
                self.block_id,
                left.block_id,
                right.block_id,
                String::from_utf8_lossy(&middle.key)
            );
            if is_root {
                bs.update_root(&mut Node {
                    block_id: self.block_id,
                    keys: vec![middle],
                    child_block_ids: vec![left.block_id, right.block_id],
                })?;
                return Ok(None);
            }
            return Ok(Some((middle, left, right)));
        }

        let child_index = self.child_for_key(&value.key);
        let mut child = bs.node_at(self.child_block_ids[child_index])?;
        let popped = child.insert(bs, value, false)?;

        let Some((middle, left, right)) = popped else {
            return Ok(None);
        };

        self.integrate_popped(middle, &left, &right);
        if !self.has_overflowed() {
            bs.update_node(self)?;
            return Ok(None);
        }

        let (middle, left, right) = self.split_non_leaf(bs)?;
        log::debug!(
            "split internal node {} into {} and {}, promoting key {:?}",
            self.block_id,
            left.block_id,
            right.block_id,
            String::from_utf8_lossy(&middle.key)
        );
        if is_root {
            bs.update_root(&mut Node {
                block_id: self.block_id,
                keys: vec![middle],
                child_block_ids: vec![left.block_id, right.block_id],
            })?;
            return Ok(None);
        }
        Ok(Some((middle, left, right)))
    }

    /// Looks up `key`, returning an explicit found flag rather than
    /// inferring absence from an empty value (see `DESIGN.md`).
    pub fn search(&self, bs: &mut BlockService, key: &[u8]) -> EngineResult<(Vec<u8>, bool)> {
        if let Some(pair) = self.keys.iter().find(|p| p.key == key) {
            return Ok((pair.value.clone(), true));
        }

        if self.is_leaf() {
            return Ok((Vec::new(), false));
        }

        let child = bs.node_at(self.child_block_ids[self.child_for_key(key)])?;
        child.search(bs, key)
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Self {
            block_id: block.block_id,
            keys: block.pairs,
            child_block_ids: block.child_block_ids,
        }
    }
}

impl From<&Node> for Block {
    fn from(node: &Node) -> Self {
        Self {
            block_id: node.block_id,
            pairs: node.keys.clone(),
            child_block_ids: node.child_block_ids.clone(),
        }
    }
}

/// Node-level persistence, layered onto [`BlockService`] here since it is
/// [`Node`], not [`Block`], that callers actually traffic in.
impl BlockService {
    /// Reads the block at `id` and interprets it as a node.
    pub fn node_at(&mut self, id: u64) -> EngineResult<Node> {
        let block = self.read_block(id as i64)?;
        Ok(Node::from(block))
    }

    /// Assigns `node` the next free block id and persists it.
    pub fn save_new_node(&mut self, mut node: Node) -> EngineResult<Node> {
        node.block_id = (self.latest_block_id()? + 1) as u64;
        self.write_block(&Block::from(&node))?;
        Ok(node)
    }

    /// Persists `node` at its existing block id.
    pub fn update_node(&mut self, node: &Node) -> EngineResult<()> {
        self.write_block(&Block::from(node))
    }

    /// Persists `node` as the root, forcing its block id to `0`.
    pub fn update_root(&mut self, node: &mut Node) -> EngineResult<()> {
        node.block_id = 0;
        self.write_block(&Block::from(&*node))
    }
}
