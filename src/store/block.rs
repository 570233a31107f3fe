// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size block I/O: the on-disk byte layout and the file-backed
//! service that reads, writes, and allocates blocks.
//!
//! ## Block layout (4096 bytes)
//! ```text
//! Offset                      | Size              | Field
//! ----------------------------|-------------------|-------
//! 0                           | 8                 | block_id (u64 LE)
//! 8                           | 8                 | leaf_count (u64 LE)
//! 16                          | 8                 | child_count (u64 LE)
//! 24                          | 124 * leaf_count   | pair records
//! 24 + 124 * leaf_count       | 8 * child_count    | child block ids (u64 LE)
//! ...                         | remainder          | unused
//! ```
//! `child_count` is either `0` (leaf) or `leaf_count + 1` (internal node).
//! This layout is the on-disk format; changing any offset or width breaks
//! compatibility with existing database files.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::store::pair::{Pair, PAIR_SIZE};

/// Size of a block on disk, in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// Maximum number of pairs a leaf may hold before it must split.
pub const MAX_LEAF: usize = 30;

const BLOCK_ID_OFFSET: usize = 0;
const LEAF_COUNT_OFFSET: usize = 8;
const CHILD_COUNT_OFFSET: usize = 16;
const PAIRS_OFFSET: usize = 24;

/// The raw, on-disk representation of a single B-tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_id: u64,
    pub pairs: Vec<Pair>,
    pub child_block_ids: Vec<u64>,
}

impl Block {
    /// Builds an empty block at `block_id` with no pairs and no children.
    pub fn empty(block_id: u64) -> Self {
        Self {
            block_id,
            pairs: Vec::new(),
            child_block_ids: Vec::new(),
        }
    }

    /// Serializes this block into its fixed 4096-byte on-disk form.
    ///
    /// Returns `CorruptBlock` if the in-memory block itself violates the
    /// invariants it is about to write — this would indicate a bug in the
    /// node logic rather than a disk-read problem, but the error kind is
    /// shared since both describe "this isn't a well-formed block".
    pub fn serialize(&self) -> EngineResult<[u8; BLOCK_SIZE]> {
        self.check_invariants()?;

        let mut buf = [0u8; BLOCK_SIZE];
        buf[BLOCK_ID_OFFSET..BLOCK_ID_OFFSET + 8].copy_from_slice(&self.block_id.to_le_bytes());
        buf[LEAF_COUNT_OFFSET..LEAF_COUNT_OFFSET + 8]
            .copy_from_slice(&(self.pairs.len() as u64).to_le_bytes());
        buf[CHILD_COUNT_OFFSET..CHILD_COUNT_OFFSET + 8]
            .copy_from_slice(&(self.child_block_ids.len() as u64).to_le_bytes());

        let mut offset = PAIRS_OFFSET;
        for pair in &self.pairs {
            let encoded = pair.encode();
            buf[offset..offset + PAIR_SIZE].copy_from_slice(&encoded);
            offset += PAIR_SIZE;
        }

        for child_id in &self.child_block_ids {
            buf[offset..offset + 8].copy_from_slice(&child_id.to_le_bytes());
            offset += 8;
        }

        Ok(buf)
    }

    /// Parses a block from a 4096-byte buffer, validating structural
    /// invariants before trusting any of the derived offsets.
    pub fn deserialize(buf: &[u8; BLOCK_SIZE]) -> EngineResult<Self> {
        let block_id = u64::from_le_bytes(buf[BLOCK_ID_OFFSET..BLOCK_ID_OFFSET + 8].try_into().unwrap());
        let leaf_count =
            u64::from_le_bytes(buf[LEAF_COUNT_OFFSET..LEAF_COUNT_OFFSET + 8].try_into().unwrap());
        let child_count = u64::from_le_bytes(
            buf[CHILD_COUNT_OFFSET..CHILD_COUNT_OFFSET + 8]
                .try_into()
                .unwrap(),
        );

        if leaf_count as usize > MAX_LEAF {
            let reason = format!("leaf_count {} exceeds MAX_LEAF {}", leaf_count, MAX_LEAF);
            log::error!("block {} is corrupt: {}", block_id, reason);
            return Err(EngineError::CorruptBlock { block_id, reason });
        }
        if child_count != 0 && child_count != leaf_count + 1 {
            let reason = format!(
                "child_count {} is neither 0 nor leaf_count + 1 ({})",
                child_count,
                leaf_count + 1
            );
            log::error!("block {} is corrupt: {}", block_id, reason);
            return Err(EngineError::CorruptBlock { block_id, reason });
        }

        let pairs_bytes = leaf_count as usize * PAIR_SIZE;
        let children_bytes = child_count as usize * 8;
        if PAIRS_OFFSET + pairs_bytes + children_bytes > BLOCK_SIZE {
            let reason = "declared pair/child counts overflow the block".to_string();
            log::error!("block {} is corrupt: {}", block_id, reason);
            return Err(EngineError::CorruptBlock { block_id, reason });
        }

        let mut offset = PAIRS_OFFSET;
        let mut pairs = Vec::with_capacity(leaf_count as usize);
        for _ in 0..leaf_count {
            let pair = Pair::decode(&buf[offset..offset + PAIR_SIZE]);
            if pair.key.len() > crate::store::pair::MAX_KEY_LEN
                || pair.value.len() > crate::store::pair::MAX_VALUE_LEN
            {
                let reason = "decoded pair exceeds key/value size caps".to_string();
                log::error!("block {} is corrupt: {}", block_id, reason);
                return Err(EngineError::CorruptBlock { block_id, reason });
            }
            pairs.push(pair);
            offset += PAIR_SIZE;
        }

        let mut child_block_ids = Vec::with_capacity(child_count as usize);
        for _ in 0..child_count {
            let id = u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap());
            child_block_ids.push(id);
            offset += 8;
        }

        Ok(Self {
            block_id,
            pairs,
            child_block_ids,
        })
    }

    fn check_invariants(&self) -> EngineResult<()> {
        if self.pairs.len() > MAX_LEAF {
            let reason = format!("{} pairs exceeds MAX_LEAF {}", self.pairs.len(), MAX_LEAF);
            log::error!("block {} is corrupt: {}", self.block_id, reason);
            return Err(EngineError::CorruptBlock {
                block_id: self.block_id,
                reason,
            });
        }
        let child_count = self.child_block_ids.len();
        if child_count != 0 && child_count != self.pairs.len() + 1 {
            let reason = format!(
                "child_count {} is neither 0 nor leaf_count + 1 ({})",
                child_count,
                self.pairs.len() + 1
            );
            log::error!("block {} is corrupt: {}", self.block_id, reason);
            return Err(EngineError::CorruptBlock {
                block_id: self.block_id,
                reason,
            });
        }
        Ok(())
    }
}

/// Owns the open database file and translates between logical block ids
/// and byte offsets within it.
///
/// There is no write-back cache: every method that produces or mutates a
/// block persists it before returning, so a reader may always assume
/// durable-to-the-filesystem state after any successful call.
pub struct BlockService {
    file: File,
}

impl BlockService {
    /// Opens (creating if necessary) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())
            .map_err(|e| {
                log::error!("failed to open database file {}: {}", path.as_ref().display(), e);
                EngineError::IoError {
                    operation: "open".to_string(),
                    reason: e.to_string(),
                }
            })?;
        Ok(Self { file })
    }

    /// The highest allocated block id, or `-1` if the file is empty.
    pub fn latest_block_id(&self) -> EngineResult<i64> {
        let len = self
            .file
            .metadata()
            .map_err(|e| {
                log::warn!("failed to stat database file: {}", e);
                EngineError::from(e)
            })?
            .len();
        if len == 0 {
            return Ok(-1);
        }
        Ok((len / BLOCK_SIZE as u64) as i64 - 1)
    }

    /// True iff block 0 has been allocated.
    pub fn root_exists(&self) -> EngineResult<bool> {
        Ok(self.latest_block_id()? >= 0)
    }

    /// Reads and validates the block at `id`.
    ///
    /// # Panics
    /// Panics if `id` is negative — that is always a programming error in
    /// this engine, never a user-triggerable condition.
    pub fn read_block(&mut self, id: i64) -> EngineResult<Block> {
        if id < 0 {
            panic!("read_block called with negative block id {}", id);
        }
        self.file
            .seek(SeekFrom::Start(id as u64 * BLOCK_SIZE as u64))
            .map_err(|e| {
                log::warn!("failed to seek to block {}: {}", id, e);
                EngineError::IoError {
                    operation: "seek".to_string(),
                    reason: e.to_string(),
                }
            })?;

        let mut buf = [0u8; BLOCK_SIZE];
        self.file.read_exact(&mut buf).map_err(|e| {
            log::warn!("failed to read block {}: {}", id, e);
            EngineError::IoError {
                operation: "read_block".to_string(),
                reason: e.to_string(),
            }
        })?;

        Block::deserialize(&buf)
    }

    /// Writes `block` at its own `block_id`.
    pub fn write_block(&mut self, block: &Block) -> EngineResult<()> {
        let encoded = block.serialize()?;
        self.file
            .seek(SeekFrom::Start(block.block_id * BLOCK_SIZE as u64))
            .map_err(|e| {
                log::warn!("failed to seek to block {}: {}", block.block_id, e);
                EngineError::IoError {
                    operation: "seek".to_string(),
                    reason: e.to_string(),
                }
            })?;
        self.file.write_all(&encoded).map_err(|e| {
            log::warn!("failed to write block {}: {}", block.block_id, e);
            EngineError::IoError {
                operation: "write_block".to_string(),
                reason: e.to_string(),
            }
        })?;
        log::debug!("wrote block {}", block.block_id);
        Ok(())
    }

    /// Allocates a fresh empty block at the next free id and persists it.
    pub fn new_block(&mut self) -> EngineResult<Block> {
        let id = (self.latest_block_id()? + 1) as u64;
        let block = Block::empty(id);
        self.write_block(&block)?;
        Ok(block)
    }

    /// Returns block 0, allocating it first if the file is empty.
    pub fn get_root_block(&mut self) -> EngineResult<Block> {
        if self.root_exists()? {
            self.read_block(0)
        } else {
            self.new_block()
        }
    }

    /// The maximum number of pairs a leaf may hold.
    pub fn max_leaf_size(&self) -> usize {
        MAX_LEAF
    }
}
