//! Utility functions

/// Logging
/// Warnings only by default; RUST_LOG overrides
pub fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_module("prefix_resolver", LevelFilter::Warn)
        .parse_default_env()
        .init();
}

/// Iterator util
pub mod iter {
    use log::warn;
    use std::fmt::Display;

    /// Ignore errors, logging them as warnings
    /// useful with iter::filter_map: `my_iter.filter_map(warn_ok)`
    pub fn warn_ok<T, E: Display>(x: Result<T, E>) -> Option<T> {
        if let Some(e) = x.as_ref().err() {
            warn!("Warning: discarding error {}", e);
        }
        x.ok()
    }
}

/// Filesystem util
pub mod fs {
    use log::debug;
    use std::path::{Path, PathBuf};
    use walkdir::{DirEntry, WalkDir};

    /// All entries under `p`, sorted by file name; nothing if `p` is not a directory
    pub fn walk_files(p: &Path) -> impl Iterator<Item = PathBuf> {
        let walker = if p.is_dir() {
            Some(WalkDir::new(p).sort_by_file_name())
        } else {
            debug!("skipping {}: not a directory", p.display());
            None
        };
        walker
            .into_iter()
            .flatten()
            .filter_map(super::iter::warn_ok)
            .map(DirEntry::into_path)
    }

    pub fn walk_files_with_extension<'a>(
        p: &'a Path,
        ext: &'a str,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        // `ext` may itself contain dots (e.g. class.php), so match the whole suffix
        let suffix = format!(".{}", ext);
        walk_files(p).filter(|entry| entry.is_file()).filter(move |entry| {
            if ext.is_empty() {
                entry.extension().is_none()
            } else {
                entry
                    .file_name()
                    .and_then(|x| x.to_str())
                    .map_or(false, |x| x.len() > suffix.len() && x.ends_with(&suffix))
            }
        })
    }
}
