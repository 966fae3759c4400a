//! The mapping table: namespace prefixes to ordered base directories.
//!
//! Prefixes keep their insertion order, and so do the directories under each
//! prefix (unless prepended). Duplicate directories are kept as given.

use crate::ident::{Prefix, Separator};

use anyhow::{bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::{is_separator, MAIN_SEPARATOR};

/// A base directory, normalized to end with exactly one path separator
/// E.g.: /pkg/src/
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseDir(String);

impl Display for BaseDir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl BaseDir {
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            bail!("base directory must not be empty");
        }
        let trimmed = s.trim_end_matches(is_separator);
        Ok(Self(format!("{}{}", trimmed, MAIN_SEPARATOR)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Insertion-ordered map from normalized prefixes to their base directories
#[derive(Debug, Clone, Default)]
pub struct PrefixMap {
    entries: Vec<(Prefix, Vec<BaseDir>)>,
    index: HashMap<String, usize>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Default::default()
    }

    /// Normalize `prefix` and `base_dir` and add the directory to the
    /// prefix's list: at the front if `prepend`, at the back otherwise.
    pub fn insert(
        &mut self,
        prefix: &str,
        base_dir: &str,
        sep: Separator,
        prepend: bool,
    ) -> Result<()> {
        let prefix = Prefix::new(prefix, sep)?;
        let dir = BaseDir::new(base_dir)?;
        debug!("mapping {} -> {} (prepend: {})", prefix, dir, prepend);

        let i = match self.index.get(prefix.as_str()) {
            Some(&i) => i,
            None => {
                self.index.insert(prefix.as_str().to_string(), self.entries.len());
                self.entries.push((prefix, Vec::new()));
                self.entries.len() - 1
            }
        };
        let dirs = &mut self.entries[i].1;
        if prepend {
            dirs.insert(0, dir);
        } else {
            dirs.push(dir);
        }
        Ok(())
    }

    /// Directories for an already-normalized prefix key, in try order
    pub fn get(&self, prefix: &str) -> Option<&[BaseDir]> {
        self.index.get(prefix).map(|&i| self.entries[i].1.as_slice())
    }

    /// Iterator over (prefix, directories), in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Prefix, &[BaseDir])> {
        self.entries.iter().map(|(p, ds)| (p, ds.as_slice()))
    }

    /// Number of distinct prefixes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
