//! Enumerate the source files under every mapped directory, and check which
//! of them a resolver would actually pick for the name they imply.

use crate::loader::SourceLoader;
use crate::resolver::PrefixResolver;
use crate::util::fs::walk_files_with_extension;

use anyhow::Result;
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    /// Resolving the name finds this file
    Resolvable,
    /// Resolving the name finds another file first
    Shadowed { by: PathBuf },
    /// The name can't lead back to this file
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: Status,
}

impl Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.status {
            Status::Resolvable => write!(f, "{} => {}", self.name, self.path.display()),
            Status::Shadowed { by } => write!(
                f,
                "{} => {} (shadowed by {})",
                self.name,
                self.path.display(),
                by.display()
            ),
            Status::Unreachable => {
                write!(f, "{} => {} (unreachable)", self.name, self.path.display())
            }
        }
    }
}

/// Name implied by a file's location under a base directory, e.g.
/// `<dir>/Alpha/Omega.php` under `Acme.` gives `Acme.Alpha.Omega`.
///
/// None if a segment isn't valid UTF-8 or already contains the separator.
fn implied_name(prefix: &str, dir: &Path, file: &Path, sep: char, ext: &str) -> Option<String> {
    let relative = file.strip_prefix(dir).ok()?;
    let mut segments = relative
        .iter()
        .map(|s| s.to_str())
        .collect::<Option<Vec<&str>>>()?;
    let last = segments.pop()?;
    let stem = if ext.is_empty() { last } else { last.strip_suffix(ext)?.strip_suffix('.')? };
    segments.push(stem);
    if segments.iter().any(|s| s.is_empty() || s.contains(sep)) {
        return None;
    }
    Some(format!("{}{}", prefix, segments.iter().join(&sep.to_string())))
}

/// Walk every mapped directory (prefixes in insertion order, directories in
/// try order) and classify each file found.
///
/// Missing directories are skipped. Nothing is loaded.
pub fn catalog<L: SourceLoader>(resolver: &PrefixResolver<L>) -> Result<Vec<CatalogEntry>> {
    let sep = resolver.separator().as_char();
    let ext = resolver.extension();
    let mut entries = Vec::new();

    for (prefix, dirs) in resolver.mappings().iter() {
        for dir in dirs {
            let dir = Path::new(dir.as_str());
            debug!("cataloging {} under {}", dir.display(), prefix);
            for path in walk_files_with_extension(dir, ext) {
                let (name, status) = match implied_name(prefix.as_str(), dir, &path, sep, ext) {
                    Some(n) => {
                        let status = match resolver.locate(&n)? {
                            Some(found) if found == path => Status::Resolvable,
                            Some(found) => Status::Shadowed { by: found },
                            None => Status::Unreachable,
                        };
                        (n, status)
                    }
                    None => (path.to_string_lossy().into_owned(), Status::Unreachable),
                };
                entries.push(CatalogEntry { name, path, status });
            }
        }
    }
    Ok(entries)
}
