// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! A persistent on-disk key-value store backed by a disk-resident B-tree.
//!
//! Records are fixed-width (30-byte key, 93-byte value) and blocks are a
//! fixed 4096 bytes, so the tree's branching factor and on-disk layout are
//! both compile-time constants rather than configuration. See
//! [`store::pair`] and [`store::block`] for the exact byte layouts.
//!
//! ```no_run
//! use ferrokv::Tree;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tree = Tree::open("example.db")?;
//! tree.insert("hola", "amigos")?;
//! let (value, found) = tree.get(b"hola")?;
//! assert!(found);
//! assert_eq!(value, b"amigos");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod store;

pub use core::Config;
pub use error::{EngineError, EngineResult};
pub use store::Tree;
