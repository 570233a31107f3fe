// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the storage engine.
//!
//! A single enum covers every recoverable failure the engine can produce.
//! Negative block ids are a programmer error and `panic!`, rather than
//! round-tripping through this type — see `BlockService::read_block`.

use std::fmt;

/// Standard `Result` alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors the storage engine can return.
#[derive(Debug)]
pub enum EngineError {
    /// A pair's key exceeded `pair::MAX_KEY_LEN` bytes.
    OversizedKey { len: usize },

    /// A pair's value exceeded `pair::MAX_VALUE_LEN` bytes.
    OversizedValue { len: usize },

    /// The underlying file could not be read, written, or seeked.
    IoError { operation: String, reason: String },

    /// A block read from disk violated a structural invariant and cannot be
    /// interpreted as a node. The database file is considered unusable.
    CorruptBlock { block_id: u64, reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OversizedKey { len } => {
                write!(f, "key length {} exceeds the 30-byte maximum", len)
            }
            Self::OversizedValue { len } => {
                write!(f, "value length {} exceeds the 93-byte maximum", len)
            }
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::CorruptBlock { block_id, reason } => {
                write!(f, "block {} is corrupt: {}", block_id, reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
