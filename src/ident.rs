//! Qualified symbol names, separators, and namespace prefixes.
//!
//! Separator: `.`, `_`, `\`
//! QualifiedName: Acme.Widgets.Alpha.Omega
//! Prefix: Acme.Widgets. (always stored with exactly one trailing separator)
//! Cut: (Acme.Widgets., Alpha.Omega)

use anyhow::{bail, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// The character separating the segments of a qualified name
/// E.g.: `_` for Foo_Bar_Baz, `\` for Foo\Bar\Baz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Separator(char);

impl Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Separator {
    pub const DOT: Separator = Separator('.');
    /// Underscore-separated class names (PSR-0 style)
    pub const UNDERSCORE: Separator = Separator('_');
    /// Backslash-separated namespaces (PSR-4 style)
    pub const BACKSLASH: Separator = Separator('\\');

    pub fn new(c: char) -> Result<Self> {
        if c.is_alphanumeric() || c.is_whitespace() {
            bail!("{:?} cannot be used as a name separator", c);
        }
        Ok(Self(c))
    }

    pub fn as_char(self) -> char {
        self.0
    }

    pub fn len_utf8(self) -> usize {
        self.0.len_utf8()
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::BACKSLASH
    }
}

impl TryFrom<char> for Separator {
    type Error = anyhow::Error;

    fn try_from(c: char) -> Result<Self> {
        Self::new(c)
    }
}

impl From<Separator> for char {
    fn from(sep: Separator) -> char {
        sep.0
    }
}

/// Accepts a single character or one of the preset names
impl FromStr for Separator {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dot" => Ok(Self::DOT),
            "underscore" | "psr0" => Ok(Self::UNDERSCORE),
            "backslash" | "psr4" => Ok(Self::BACKSLASH),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::new(c),
                    _ => bail!("unknown separator {:?}", s),
                }
            }
        }
    }
}

/// A normalized namespace prefix, used as a key into the mapping table
/// E.g.: `Acme.Widgets.`
/// Never empty; always ends with exactly one separator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prefix(String);

impl Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Prefix {
    /// Strip every leading and trailing separator, then append exactly one.
    pub fn new(s: &str, sep: Separator) -> Result<Self> {
        let trimmed = s.trim_matches(sep.as_char());
        if trimmed.is_empty() {
            bail!("namespace prefix {:?} is empty once separators are trimmed", s);
        }
        let result = Self(format!("{}{}", trimmed, sep));
        result.check_invariant(sep);
        Ok(result)
    }

    /// A prefix with an empty inner segment can never match a valid name
    pub fn invariant(&self, sep: Separator) -> bool {
        self.trimmed(sep).split(sep.as_char()).all(|seg| !seg.is_empty())
    }

    pub fn check_invariant(&self, sep: Separator) {
        if !self.invariant(sep) {
            warn!("failed invariant! on Prefix {} (empty segment, can never match)", self);
        }
    }

    /// The prefix without its trailing separator
    pub fn trimmed(&self, sep: Separator) -> &str {
        self.0.strip_suffix(sep.as_char()).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully-qualified symbol name
/// E.g.: Acme.Widgets.Alpha.Omega
/// Non-empty, no leading or trailing separator, no empty segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    name: String,
    sep: Separator,
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// One way of splitting a name into a prefix key and the relative tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cut<'a> {
    /// Leading segments, including the trailing separator
    pub prefix: &'a str,
    /// Every segment after the cut, taken from the full name
    pub tail: &'a str,
}

impl QualifiedName {
    pub fn parse(s: &str, sep: Separator) -> Result<Self> {
        if s.is_empty() {
            bail!("cannot resolve an empty name");
        }
        if s.starts_with(sep.as_char()) || s.ends_with(sep.as_char()) {
            bail!("name {:?} has a leading or trailing separator {:?}", s, sep.as_char());
        }
        if s.split(sep.as_char()).any(str::is_empty) {
            bail!("name {:?} has an empty segment", s);
        }
        Ok(Self { name: s.to_string(), sep })
    }

    /// Every cut of the name, longest prefix first.
    ///
    /// Separator positions are computed once and walked right to left; each
    /// tail is sliced from the full name, so shorter prefixes carry all the
    /// trimmed segments (`Foo.` for `Foo.Bar.Baz` has tail `Bar.Baz`).
    /// A name without separators has no cuts.
    pub fn cuts(&self) -> impl Iterator<Item = Cut<'_>> {
        let width = self.sep.len_utf8();
        let positions: Vec<usize> =
            self.name.match_indices(self.sep.as_char()).map(|(i, _)| i).collect();
        positions.into_iter().rev().map(move |i| Cut {
            prefix: &self.name[..i + width],
            tail: &self.name[i + width..],
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}
