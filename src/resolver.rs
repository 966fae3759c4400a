//! Longest-prefix resolution of qualified names to source files.
//!
//! For `Acme.Widgets.Alpha.Omega`, the resolver tries the prefixes
//! `Acme.Widgets.Alpha.`, `Acme.Widgets.` and `Acme.` in that order. For each
//! mapped prefix it tries every base directory in order, building
//! `<base dir><tail with separators as path separators>.<extension>`.
//! The first existing file is loaded and returned.

use crate::ident::{Prefix, QualifiedName, Separator};
use crate::loader::SourceLoader;
use crate::mapping::{BaseDir, PrefixMap};
use crate::util::iter::warn_ok;

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use std::fmt::{self, Display};
use std::path::{PathBuf, MAIN_SEPARATOR};

pub const DEFAULT_EXTENSION: &str = "php";

/// One step of a resolution, as recorded by `PrefixResolver::explain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Probe {
    /// The prefix has no mapping
    Unmapped { prefix: String },
    /// The prefix is mapped, but the candidate file does not exist
    Miss { prefix: String, candidate: PathBuf },
    /// The candidate file exists
    Hit { prefix: String, candidate: PathBuf },
}

impl Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Probe::Unmapped { prefix } => write!(f, "{:<24} (no mapping)", prefix),
            Probe::Miss { prefix, candidate } => {
                write!(f, "{:<24} {} (missing)", prefix, candidate.display())
            }
            Probe::Hit { prefix, candidate } => {
                write!(f, "{:<24} {} (found)", prefix, candidate.display())
            }
        }
    }
}

/// Outcome of `PrefixResolver::explain`: the located path, if any, plus
/// every probe made on the way, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub name: String,
    pub path: Option<PathBuf>,
    pub probes: Vec<Probe>,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }
}

/// What to do with the first existing candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Load,
    Locate,
}

/// Maps namespace prefixes to base directories and resolves qualified names
/// against them.
///
/// Mappings are added through `&mut self` during setup; resolution only
/// borrows the table, so a resolver with a `Sync` loader can be shared
/// across threads once set up.
#[derive(Debug)]
pub struct PrefixResolver<L> {
    map: PrefixMap,
    sep: Separator,
    extension: String,
    loader: L,
}

impl<L: SourceLoader> PrefixResolver<L> {
    /// A leading `.` on `extension` is ignored; an empty extension appends nothing.
    pub fn new(loader: L, sep: Separator, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.').to_string();
        Self { map: PrefixMap::new(), sep, extension, loader }
    }

    pub fn add_mapping(&mut self, prefix: &str, base_dir: &str, prepend: bool) -> Result<()> {
        self.map.insert(prefix, base_dir, self.sep, prepend)
    }

    pub fn mappings(&self) -> &PrefixMap {
        &self.map
    }

    pub fn separator(&self) -> Separator {
        self.sep
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Candidate file for a relative name under a base directory
    pub fn candidate_path(&self, dir: &BaseDir, relative: &str) -> PathBuf {
        let sep = self.sep.as_char();
        let mut file = String::with_capacity(dir.as_str().len() + relative.len() + 8);
        file.push_str(dir.as_str());
        file.extend(relative.chars().map(|c| if c == sep { MAIN_SEPARATOR } else { c }));
        if !self.extension.is_empty() {
            file.push('.');
            file.push_str(&self.extension);
        }
        PathBuf::from(file)
    }

    /// Resolve a fully-qualified name, loading the file found.
    ///
    /// Ok(None) when no mapped prefix leads to an existing file.
    pub fn resolve(&self, name: &str) -> Result<Option<PathBuf>> {
        let name = QualifiedName::parse(name, self.sep)?;
        let found = self.search(&name, Mode::Load, &mut None)?;
        match &found {
            Some(path) => info!("resolved {} to {}", name, path.display()),
            None => debug!("could not resolve {}", name),
        }
        Ok(found)
    }

    /// Like `resolve`, but only checks for existence and never loads.
    pub fn locate(&self, name: &str) -> Result<Option<PathBuf>> {
        let name = QualifiedName::parse(name, self.sep)?;
        self.search(&name, Mode::Locate, &mut None)
    }

    /// Locate `name` while recording every probe.
    pub fn explain(&self, name: &str) -> Result<Resolution> {
        let qualified = QualifiedName::parse(name, self.sep)?;
        let mut probes = Some(Vec::new());
        let path = self.search(&qualified, Mode::Locate, &mut probes)?;
        Ok(Resolution { name: name.to_string(), path, probes: probes.unwrap_or_default() })
    }

    /// Try the directories of one prefix for a relative name, loading the
    /// first existing file.
    ///
    /// Ok(None) if the prefix is unknown or none of its directories has the file.
    pub fn load_mapped_file(&self, prefix: &str, relative: &str) -> Result<Option<PathBuf>> {
        let prefix = Prefix::new(prefix, self.sep)?;
        self.probe_prefix(prefix.as_str(), relative, Mode::Load, &mut None)
    }

    fn search(
        &self,
        name: &QualifiedName,
        mode: Mode,
        probes: &mut Option<Vec<Probe>>,
    ) -> Result<Option<PathBuf>> {
        for cut in name.cuts() {
            if let Some(path) = self.probe_prefix(cut.prefix, cut.tail, mode, probes)? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn probe_prefix(
        &self,
        prefix: &str,
        relative: &str,
        mode: Mode,
        probes: &mut Option<Vec<Probe>>,
    ) -> Result<Option<PathBuf>> {
        let Some(dirs) = self.map.get(prefix) else {
            debug!("prefix {} is not mapped", prefix);
            if let Some(ps) = probes.as_mut() {
                ps.push(Probe::Unmapped { prefix: prefix.to_string() });
            }
            return Ok(None);
        };

        for dir in dirs {
            let candidate = self.candidate_path(dir, relative);
            // I/O errors other than absence count as a miss
            let exists = warn_ok(self.loader.exists(&candidate)).unwrap_or(false);
            debug!("probing {} for {}: {}", candidate.display(), prefix, exists);

            if let Some(ps) = probes.as_mut() {
                let prefix = prefix.to_string();
                let candidate = candidate.clone();
                ps.push(if exists {
                    Probe::Hit { prefix, candidate }
                } else {
                    Probe::Miss { prefix, candidate }
                });
            }

            if exists {
                if mode == Mode::Load {
                    self.loader.load(&candidate)?;
                }
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FsLoader;

    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;

    /// Loader over an in-memory set of paths, recording every call
    #[derive(Default)]
    struct FakeLoader {
        files: HashSet<PathBuf>,
        broken: HashSet<PathBuf>,
        checked: RefCell<Vec<PathBuf>>,
        loads: RefCell<Vec<PathBuf>>,
    }

    impl FakeLoader {
        fn with_files(files: &[&str]) -> Self {
            Self { files: files.iter().map(PathBuf::from).collect(), ..Default::default() }
        }
    }

    impl SourceLoader for FakeLoader {
        fn exists(&self, path: &Path) -> Result<bool> {
            self.checked.borrow_mut().push(path.to_path_buf());
            if self.broken.contains(path) {
                return Err(anyhow!("permission denied"));
            }
            Ok(self.files.contains(path))
        }

        fn load(&self, path: &Path) -> Result<()> {
            self.loads.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s.replace('/', &MAIN_SEPARATOR.to_string()))
    }

    fn fake(files: &[&str]) -> PrefixResolver<FakeLoader> {
        let files: Vec<String> =
            files.iter().map(|f| p(f).to_string_lossy().into_owned()).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        PrefixResolver::new(FakeLoader::with_files(&refs), Separator::DOT, "ext")
    }

    #[test]
    fn test_resolve_scenario() {
        let mut r = fake(&["/pkg/src/Alpha/Omega.ext"]);
        r.add_mapping("Acme.Widgets", "/pkg/src", false).unwrap();

        let found = r.resolve("Acme.Widgets.Alpha.Omega").unwrap();
        assert_eq!(found, Some(p("/pkg/src/Alpha/Omega.ext")));
        assert_eq!(*r.loader().loads.borrow(), vec![p("/pkg/src/Alpha/Omega.ext")]);

        assert_eq!(r.resolve("Acme.Widgets.Missing").unwrap(), None);
        assert_eq!(r.loader().loads.borrow().len(), 1);
    }

    #[test]
    fn test_prepended_dir_tried_first() {
        let mut r = fake(&["/pkg/tests/BazTest.ext", "/pkg/src/Baz.ext"]);
        r.add_mapping("Acme.Widgets", "/pkg/src", false).unwrap();
        r.add_mapping("Acme.Widgets", "/pkg/tests", true).unwrap();

        assert_eq!(
            r.resolve("Acme.Widgets.BazTest").unwrap(),
            Some(p("/pkg/tests/BazTest.ext"))
        );
        assert_eq!(
            *r.loader().checked.borrow(),
            vec![p("/pkg/tests/BazTest.ext")]
        );
        assert_eq!(r.resolve("Acme.Widgets.Baz").unwrap(), Some(p("/pkg/src/Baz.ext")));
    }

    #[test]
    fn test_longest_prefix_first() {
        let mut r = fake(&["/short/Baz/Qux.ext", "/long/Qux.ext"]);
        r.add_mapping("Foo.Bar", "/short", false).unwrap();
        r.add_mapping("Foo.Bar.Baz", "/long", false).unwrap();
        assert_eq!(r.resolve("Foo.Bar.Baz.Qux").unwrap(), Some(p("/long/Qux.ext")));
    }

    #[test]
    fn test_first_existing_dir_wins() {
        let mut r = fake(&["/dirY/Thing.ext"]);
        r.add_mapping("Foo", "/dirX", false).unwrap();
        r.add_mapping("Foo", "/dirY", false).unwrap();
        assert_eq!(r.resolve("Foo.Thing").unwrap(), Some(p("/dirY/Thing.ext")));
    }

    #[test]
    fn test_falls_back_to_shorter_prefix() {
        let mut r = fake(&["/foo/Bar/Thing.ext"]);
        r.add_mapping("Foo.Bar", "/foobar", false).unwrap();
        r.add_mapping("Foo", "/foo", false).unwrap();
        assert_eq!(r.resolve("Foo.Bar.Thing").unwrap(), Some(p("/foo/Bar/Thing.ext")));
        assert_eq!(
            *r.loader().checked.borrow(),
            vec![p("/foobar/Thing.ext"), p("/foo/Bar/Thing.ext")]
        );
    }

    #[test]
    fn test_tail_keeps_trimmed_segments() {
        let mut r = fake(&["/pkg/Alpha/Omega.ext"]);
        r.add_mapping("Foo.Bar", "/pkg", false).unwrap();
        assert_eq!(r.resolve("Foo.Bar.Alpha.Omega").unwrap(), Some(p("/pkg/Alpha/Omega.ext")));
    }

    #[test]
    fn test_not_found() {
        let mut r = fake(&["/pkg/Other.ext"]);
        assert_eq!(r.resolve("Foo.Thing").unwrap(), None);
        r.add_mapping("Foo", "/pkg", false).unwrap();
        assert_eq!(r.resolve("Foo.Thing").unwrap(), None);
        assert_eq!(r.resolve("Bar.Other").unwrap(), None);
        assert!(r.loader().loads.borrow().is_empty());
    }

    #[test]
    fn test_name_without_separator_never_matches() {
        let mut r = fake(&["/pkg/Foo.ext"]);
        r.add_mapping("Foo", "/pkg", false).unwrap();
        assert_eq!(r.resolve("Foo").unwrap(), None);
        assert!(r.loader().checked.borrow().is_empty());
    }

    #[test]
    fn test_malformed_names_rejected() {
        let r = fake(&[]);
        assert!(r.resolve("").is_err());
        assert!(r.resolve(".Foo.Bar").is_err());
        assert!(r.resolve("Foo..Bar").is_err());
        assert!(r.locate("Foo.Bar.").is_err());
    }

    #[test]
    fn test_exists_error_counts_as_miss() {
        let mut loader = FakeLoader::with_files(&[]);
        let broken = p("/a/Thing.ext");
        loader.broken.insert(broken);
        loader.files.insert(p("/b/Thing.ext"));
        let mut r = PrefixResolver::new(loader, Separator::DOT, "ext");
        r.add_mapping("Foo", "/a", false).unwrap();
        r.add_mapping("Foo", "/b", false).unwrap();
        assert_eq!(r.resolve("Foo.Thing").unwrap(), Some(p("/b/Thing.ext")));
    }

    #[test]
    fn test_locate_does_not_load() {
        let mut r = fake(&["/pkg/Thing.ext"]);
        r.add_mapping("Foo", "/pkg", false).unwrap();
        assert_eq!(r.locate("Foo.Thing").unwrap(), Some(p("/pkg/Thing.ext")));
        assert!(r.loader().loads.borrow().is_empty());
    }

    #[test]
    fn test_explain_records_probes() {
        let mut r = fake(&["/foo/Bar/Thing.ext"]);
        r.add_mapping("Foo.Bar", "/foobar", false).unwrap();
        r.add_mapping("Foo", "/foo", false).unwrap();

        let res = r.explain("Foo.Bar.Thing").unwrap();
        assert!(res.is_found());
        assert_eq!(
            res.probes,
            vec![
                Probe::Miss { prefix: "Foo.Bar.".into(), candidate: p("/foobar/Thing.ext") },
                Probe::Hit { prefix: "Foo.".into(), candidate: p("/foo/Bar/Thing.ext") },
            ]
        );

        let res = r.explain("Baz.Qux.Thing").unwrap();
        assert!(!res.is_found());
        assert_eq!(
            res.probes,
            vec![
                Probe::Unmapped { prefix: "Baz.Qux.".into() },
                Probe::Unmapped { prefix: "Baz.".into() },
            ]
        );
    }

    #[test]
    fn test_load_mapped_file() {
        let mut r = fake(&["/pkg/Alpha/Omega.ext"]);
        r.add_mapping("Foo", "/pkg", false).unwrap();
        assert_eq!(
            r.load_mapped_file("Foo.", "Alpha.Omega").unwrap(),
            Some(p("/pkg/Alpha/Omega.ext"))
        );
        assert_eq!(r.load_mapped_file("Foo", "Alpha.Missing").unwrap(), None);
        assert_eq!(r.load_mapped_file("Bar", "Alpha.Omega").unwrap(), None);
    }

    #[test]
    fn test_extension_handling() {
        let dir = BaseDir::new("/pkg").unwrap();
        let r = PrefixResolver::new(FakeLoader::default(), Separator::UNDERSCORE, ".inc");
        assert_eq!(r.extension(), "inc");
        assert_eq!(r.candidate_path(&dir, "Alpha_Omega"), p("/pkg/Alpha/Omega.inc"));

        let r = PrefixResolver::new(FakeLoader::default(), Separator::UNDERSCORE, "");
        assert_eq!(r.candidate_path(&dir, "Alpha_Omega"), p("/pkg/Alpha/Omega"));
    }

    #[test]
    fn test_psr0_and_psr4_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("Alpha")).unwrap();
        fs::write(src.join("Alpha").join("Omega.php"), "<?php").unwrap();
        let src_str = src.to_str().unwrap();

        let mut psr0 = PrefixResolver::new(FsLoader::new(), Separator::UNDERSCORE, "php");
        psr0.add_mapping("Foo_Bar", src_str, false).unwrap();
        let found = psr0.resolve("Foo_Bar_Alpha_Omega").unwrap().unwrap();
        assert_eq!(found, src.join("Alpha").join("Omega.php"));
        assert!(psr0.loader().is_loaded(&found));

        let mut psr4 = PrefixResolver::new(FsLoader::new(), Separator::BACKSLASH, "php");
        psr4.add_mapping("\\Foo\\Bar\\", src_str, false).unwrap();
        let found = psr4.resolve("Foo\\Bar\\Alpha\\Omega").unwrap().unwrap();
        assert_eq!(found, src.join("Alpha").join("Omega.php"));
        assert_eq!(psr4.loader().source(&found).as_deref(), Some(&b"<?php"[..]));

        // a second resolution finds the same file without re-reading it
        assert_eq!(psr4.resolve("Foo\\Bar\\Alpha\\Omega").unwrap(), Some(found));
        assert_eq!(psr4.loader().loaded_paths().len(), 1);
    }

    #[test]
    fn test_concurrent_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..8 {
            fs::write(tmp.path().join(format!("Thing{}.php", i)), "<?php").unwrap();
        }
        let mut r = PrefixResolver::new(FsLoader::new(), Separator::DOT, "php");
        r.add_mapping("Foo", tmp.path().to_str().unwrap(), false).unwrap();

        let r = &r;
        std::thread::scope(|s| {
            for i in 0..8 {
                s.spawn(move || {
                    let name = format!("Foo.Thing{}", i);
                    assert!(r.resolve(&name).unwrap().is_some());
                    assert!(r.resolve("Foo.Nothing").unwrap().is_none());
                });
            }
        });
        assert_eq!(r.loader().loaded_paths().len(), 8);
    }
}
