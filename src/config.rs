//! TOML configuration for a resolver.
//!
//! ```toml
//! separator = "\\"
//! extension = "php"
//!
//! [[mapping]]
//! prefix = "Acme\\Widgets"
//! dirs = ["src", "tests"]
//! ```
//!
//! Relative directories are taken relative to the config file.

use crate::ident::Separator;
use crate::loader::SourceLoader;
use crate::resolver::{PrefixResolver, DEFAULT_EXTENSION};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub prefix: String,
    pub dirs: Vec<PathBuf>,
    #[serde(default)]
    pub prepend: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    #[serde(default)]
    pub separator: Separator,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default, rename = "mapping")]
    pub mappings: Vec<MappingEntry>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            separator: Separator::default(),
            extension: default_extension(),
            mappings: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn new(separator: Separator, extension: &str) -> Self {
        Self { separator, extension: extension.to_string(), mappings: Vec::new() }
    }

    /// Ok(None) if nothing exists at `path`
    pub fn read_config(path: &Path) -> Result<Option<ResolverConfig>> {
        if path.is_dir() {
            Err(anyhow!("Config path {} is a directory", path.display()))
        } else if path.is_file() {
            let toml_string = std::fs::read_to_string(path)?;
            let mut config: ResolverConfig = toml::from_str(&toml_string)
                .with_context(|| format!("parsing {}", path.display()))?;
            if let Some(base) = path.parent() {
                config.anchor_dirs(base);
            }
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut f = File::create(path)?;
        let toml = toml::to_string(self)?;
        f.write_all(toml.as_bytes())?;
        Ok(())
    }

    pub fn add_mapping(&mut self, prefix: &str, dir: PathBuf, prepend: bool) {
        self.mappings.push(MappingEntry { prefix: prefix.to_string(), dirs: vec![dir], prepend });
    }

    /// Make relative mapping directories relative to `base`
    fn anchor_dirs(&mut self, base: &Path) {
        for entry in self.mappings.iter_mut() {
            for dir in entry.dirs.iter_mut() {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
    }

    /// Build a resolver, applying mappings in file order
    pub fn into_resolver<L: SourceLoader>(self, loader: L) -> Result<PrefixResolver<L>> {
        let mut resolver = PrefixResolver::new(loader, self.separator, &self.extension);
        for entry in &self.mappings {
            for dir in &entry.dirs {
                let dir_str = dir
                    .to_str()
                    .ok_or_else(|| anyhow!("directory {:?} is not valid UTF-8", dir))?;
                resolver
                    .add_mapping(&entry.prefix, dir_str, entry.prepend)
                    .with_context(|| format!("mapping {:?}", entry.prefix))?;
            }
        }
        Ok(resolver)
    }
}
