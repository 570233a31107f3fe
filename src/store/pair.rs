// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The key-value record and its fixed-width on-disk encoding.
//!
//! ## Layout
//! ```text
//! Offset          | Size      | Field
//! ----------------|-----------|-------
//! 0               | 2         | key_len (u16 LE)
//! 2               | 2         | value_len (u16 LE)
//! 4               | key_len   | key bytes
//! 4 + key_len     | value_len | value bytes
//! ```
//! Key and value are packed back-to-back immediately after the 4-byte
//! header, not at fixed-width offsets — a short key leaves the value
//! starting earlier, with the rest of the 124-byte record left as
//! unspecified padding. This matches the reference encoder, which copies
//! each field at its actual length rather than reserving a fixed-size
//! key region. The 124-byte record size is part of the on-disk format
//! and must never change.
//!
//! `MAX_KEY_LEN` and `MAX_VALUE_LEN` independently allow up to 30 and 93
//! bytes, but `4 + key_len + value_len` must also fit within
//! [`PAIR_SIZE`]; [`Pair::validate`] enforces this combined bound so
//! `encode` never has to truncate or panic.

use crate::error::{EngineError, EngineResult};

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 30;

/// Maximum value length in bytes.
pub const MAX_VALUE_LEN: usize = 93;

/// Serialized size of a single pair, in bytes.
pub const PAIR_SIZE: usize = 124;

const KEY_LEN_OFFSET: usize = 0;
const VALUE_LEN_OFFSET: usize = 2;
const KEY_OFFSET: usize = 4;

/// A single key-value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Pair {
    /// Builds a pair from raw key/value bytes without validating lengths;
    /// call [`Pair::validate`] before handing the pair to the tree.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Rejects a pair whose key or value exceeds the fixed caps, or whose
    /// combined encoded size would overflow a [`PAIR_SIZE`] record.
    pub fn validate(&self) -> EngineResult<()> {
        if self.key.len() > MAX_KEY_LEN {
            return Err(EngineError::OversizedKey {
                len: self.key.len(),
            });
        }
        if self.value.len() > MAX_VALUE_LEN {
            return Err(EngineError::OversizedValue {
                len: self.value.len(),
            });
        }
        if KEY_OFFSET + self.key.len() + self.value.len() > PAIR_SIZE {
            return Err(EngineError::OversizedValue {
                len: self.value.len(),
            });
        }
        Ok(())
    }

    /// Encodes this pair into its fixed 124-byte on-disk representation.
    ///
    /// Callers are expected to have already validated the pair via
    /// [`Pair::validate`], since `Tree::insert` always validates first.
    pub fn encode(&self) -> [u8; PAIR_SIZE] {
        let mut buf = [0u8; PAIR_SIZE];

        let key_len = self.key.len() as u16;
        let value_len = self.value.len() as u16;
        let value_offset = KEY_OFFSET + self.key.len();

        buf[KEY_LEN_OFFSET..KEY_LEN_OFFSET + 2].copy_from_slice(&key_len.to_le_bytes());
        buf[VALUE_LEN_OFFSET..VALUE_LEN_OFFSET + 2].copy_from_slice(&value_len.to_le_bytes());
        buf[KEY_OFFSET..KEY_OFFSET + self.key.len()].copy_from_slice(&self.key);
        buf[value_offset..value_offset + self.value.len()].copy_from_slice(&self.value);

        buf
    }

    /// Decodes a pair from the start of `buf`, which must contain at least
    /// [`PAIR_SIZE`] bytes.
    pub fn decode(buf: &[u8]) -> Self {
        let key_len = u16::from_le_bytes([buf[KEY_LEN_OFFSET], buf[KEY_LEN_OFFSET + 1]]) as usize;
        let value_len =
            u16::from_le_bytes([buf[VALUE_LEN_OFFSET], buf[VALUE_LEN_OFFSET + 1]]) as usize;

        let value_offset = KEY_OFFSET + key_len;
        let key = buf[KEY_OFFSET..value_offset].to_vec();
        let value = buf[value_offset..value_offset + value_len].to_vec();

        Self { key, value }
    }
}
