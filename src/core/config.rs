// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Base-directory resolution for named databases.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable consulted by [`Config::from_env`] for the base
/// directory, if set.
pub const DATA_DIR_ENV_VAR: &str = "FERROKV_DATA_DIR";

/// Default base directory used when no explicit path or environment
/// variable is provided.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Resolves `<dbname>.db` paths under a common base directory.
///
/// `Config` is a convenience for the collaborator that opens databases by
/// name (e.g. an HTTP handler resolving a per-user database); the engine
/// itself never constructs one.
#[derive(Debug, Clone)]
pub struct Config {
    base_dir: PathBuf,
}

impl Config {
    /// Creates a config rooted at an explicit base directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Creates a config from `FERROKV_DATA_DIR`, falling back to
    /// [`DEFAULT_DATA_DIR`] when the variable is unset.
    pub fn from_env() -> Self {
        let base_dir = env::var(DATA_DIR_ENV_VAR).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(base_dir)
    }

    /// The base directory database files are resolved under.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path for `<dbname>.db`, creating the base directory if
    /// it does not already exist.
    pub fn db_path(&self, dbname: &str) -> io::Result<PathBuf> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)?;
        }
        Ok(self.base_dir.join(format!("{}.db", dbname)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_joins_base_dir_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested");
        let config = Config::new(&base);

        let path = config.db_path("alice").unwrap();

        assert_eq!(path, base.join("alice.db"));
        assert!(base.exists());
    }

    #[test]
    fn from_env_falls_back_to_default() {
        env::remove_var(DATA_DIR_ENV_VAR);
        let config = Config::from_env();
        assert_eq!(config.base_dir(), Path::new(DEFAULT_DATA_DIR));
    }
}
