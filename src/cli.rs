//! Command-line arguments shared by the `resolve` and `catalog` binaries.

use crate::config::ResolverConfig;
use crate::ident::Separator;
use crate::loader::SourceLoader;
use crate::resolver::PrefixResolver;

use anyhow::{anyhow, Context, Result};
use clap::Args as ClapArgs;
use log::warn;
use std::path::PathBuf;

#[derive(Clone, ClapArgs, Debug, Default)]
pub struct ResolverArgs {
    /// Path to a TOML mapping file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Append a mapping, as PREFIX=DIR (repeatable)
    #[clap(short = 'm', long = "map", value_name = "PREFIX=DIR")]
    pub map: Vec<String>,

    /// Prepend a mapping, as PREFIX=DIR (repeatable)
    #[clap(short = 'p', long = "prepend", value_name = "PREFIX=DIR")]
    pub prepend: Vec<String>,

    /// Name separator: a single character, or dot/underscore/backslash/psr0/psr4
    #[clap(short = 's', long)]
    pub separator: Option<String>,

    /// Source file extension
    #[clap(short = 'e', long)]
    pub extension: Option<String>,
}

fn split_mapping(s: &str) -> Result<(&str, &str)> {
    s.split_once('=').ok_or_else(|| anyhow!("expected PREFIX=DIR, got {:?}", s))
}

impl ResolverArgs {
    /// Config file first (if any), then command-line overrides and mappings
    pub fn load_config(&self) -> Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::read_config(path)?
                .ok_or_else(|| anyhow!("config file {} not found", path.display()))?,
            None => ResolverConfig::default(),
        };
        if let Some(sep) = &self.separator {
            config.separator =
                sep.parse::<Separator>().with_context(|| format!("--separator {:?}", sep))?;
        }
        if let Some(ext) = &self.extension {
            config.extension = ext.clone();
        }
        for m in &self.map {
            let (prefix, dir) = split_mapping(m)?;
            config.add_mapping(prefix, PathBuf::from(dir), false);
        }
        for m in &self.prepend {
            let (prefix, dir) = split_mapping(m)?;
            config.add_mapping(prefix, PathBuf::from(dir), true);
        }
        Ok(config)
    }

    pub fn build_resolver<L: SourceLoader>(&self, loader: L) -> Result<PrefixResolver<L>> {
        let config = self.load_config()?;
        if config.mappings.is_empty() {
            warn!("no mappings configured; nothing can be resolved");
        }
        config.into_resolver(loader)
    }
}
