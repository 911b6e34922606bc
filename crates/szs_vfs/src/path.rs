//! Paths inside an archive.
//!
//! A [`VirtualPath`] is a list of names and a flag telling whether it starts at the root. Paths
//! are plain values, nothing here looks at an archive. Two values stand out:
//!
//! - the *root path* `/`, absolute with no names
//! - the *empty path*, relative with a single empty name, what `""` parses to
//!
//! ```
//! use szs_vfs::VirtualPath;
//!
//! let base = VirtualPath::parse("/course/model");
//! let file = base.resolve(&VirtualPath::parse("../course.kmp")).normalize();
//! assert_eq!(file.to_string(), "/course/course.kmp");
//! assert_eq!(base.relativize(&file).to_string(), "../course.kmp");
//! ```

use std::{convert::Infallible, fmt, ops::Range, str::FromStr};

const CURRENT: &str = ".";
const PARENT: &str = "..";

/// A path to a node of an archive
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
    absolute: bool,
}

impl VirtualPath {
    /// The root directory, `/`
    pub fn root() -> Self {
        VirtualPath {
            segments: Vec::new(),
            absolute: true,
        }
    }

    /// The empty path, what `""` parses to
    pub fn empty() -> Self {
        VirtualPath {
            segments: vec![String::new()],
            absolute: false,
        }
    }

    fn new(segments: Vec<String>, absolute: bool) -> Self {
        if segments.is_empty() && !absolute {
            VirtualPath::empty()
        } else {
            VirtualPath { segments, absolute }
        }
    }

    /// Parse a `/` separated path.
    ///
    /// Runs of `/` count as one and trailing ones are ignored. A leading `/` makes the path
    /// absolute.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return VirtualPath::empty();
        }

        let segments = path
            .split('/')
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        if segments.is_empty() {
            return VirtualPath::root();
        }
        VirtualPath {
            segments,
            absolute: path.starts_with('/'),
        }
    }

    /// Join several strings into one path. A later part starting with `/` replaces everything
    /// before it.
    pub fn from_parts<'s>(first: &str, more: impl IntoIterator<Item = &'s str>) -> Self {
        let mut joined = first.to_owned();
        for part in more {
            if part.starts_with('/') {
                joined.clear();
            } else {
                joined.push('/');
            }
            joined.push_str(part);
        }
        VirtualPath::parse(&joined)
    }

    /// Whether the path starts at the root
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Whether this is the root path `/`
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    /// Whether this is the empty path
    pub fn is_empty_path(&self) -> bool {
        !self.absolute && self.segments.len() == 1 && self.segments[0].is_empty()
    }

    /// The names making up the path
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of names in the path, `0` for the root
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no names, which is only true for the root
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The name at `index` as a relative path
    pub fn name(&self, index: usize) -> Option<VirtualPath> {
        self.segments
            .get(index)
            .map(|name| VirtualPath::new(vec![name.clone()], false))
    }

    /// The last name as a relative path, `None` for the root
    pub fn file_name(&self) -> Option<VirtualPath> {
        self.name(self.segments.len().checked_sub(1)?)
    }

    /// The path without its last name.
    ///
    /// A single name has the root as its parent when absolute and no parent otherwise.
    pub fn parent(&self) -> Option<VirtualPath> {
        match self.segments.len() {
            0 => None,
            1 if self.absolute => Some(VirtualPath::root()),
            1 => None,
            len => Some(VirtualPath::new(
                self.segments[..len - 1].to_vec(),
                self.absolute,
            )),
        }
    }

    /// A relative path made of the names in `range`.
    ///
    /// `None` when the range is empty or reaches past the last name.
    pub fn subpath(&self, range: Range<usize>) -> Option<VirtualPath> {
        if range.start >= range.end {
            return None;
        }
        self.segments
            .get(range)
            .map(|names| VirtualPath::new(names.to_vec(), false))
    }

    /// Whether `other` is a prefix of this path, names compared whole
    pub fn starts_with(&self, other: &VirtualPath) -> bool {
        self.absolute == other.absolute && self.segments.starts_with(&other.segments)
    }

    /// Whether `other` is a suffix of this path. An absolute `other` must match all of this path.
    pub fn ends_with(&self, other: &VirtualPath) -> bool {
        if other.absolute && (!self.absolute || other.len() != self.len()) {
            return false;
        }
        self.segments.ends_with(&other.segments)
    }

    /// Remove `.` names and fold each `..` into the name before it.
    ///
    /// A `..` with nothing left to remove is kept, also in absolute paths. A relative path
    /// left without names becomes the empty path.
    pub fn normalize(&self) -> VirtualPath {
        let mut result: Vec<String> = Vec::with_capacity(self.segments.len());
        for name in &self.segments {
            match name.as_str() {
                CURRENT => {}
                PARENT if result.last().is_some_and(|last| last != PARENT) => {
                    result.pop();
                }
                _ => result.push(name.clone()),
            }
        }
        VirtualPath::new(result, self.absolute)
    }

    /// Append `other` to this path.
    ///
    /// Returns `other` when it is absolute or when this is the empty path, and this path when
    /// `other` is the empty path.
    pub fn resolve(&self, other: &VirtualPath) -> VirtualPath {
        if other.absolute || self.is_empty_path() {
            return other.clone();
        }
        if other.is_empty_path() {
            return self.clone();
        }

        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        VirtualPath::new(segments, self.absolute)
    }

    /// Parse `name` and [`resolve`](VirtualPath::resolve) it against this path
    pub fn join(&self, name: &str) -> VirtualPath {
        self.resolve(&VirtualPath::parse(name))
    }

    /// The relative path leading from this path to `other`.
    ///
    /// Both paths are normalized first. The result climbs with `..` out of everything this path
    /// does not share with `other`, then descends into the rest of `other`.
    pub fn relativize(&self, other: &VirtualPath) -> VirtualPath {
        let base = self.normalize();
        let target = other.normalize();
        let base = base.names_only();
        let target = target.names_only();

        let common = base
            .iter()
            .zip(target)
            .take_while(|(a, b)| a == b)
            .count();

        let segments = std::iter::repeat(PARENT.to_owned())
            .take(base.len() - common)
            .chain(target[common..].iter().cloned())
            .collect();
        VirtualPath::new(segments, false)
    }

    /// The same names starting from the root. The empty path becomes the root.
    pub fn to_absolute(&self) -> VirtualPath {
        if self.is_empty_path() {
            VirtualPath::root()
        } else {
            VirtualPath::new(self.segments.clone(), true)
        }
    }

    /// Segments with the empty path counted as having none
    fn names_only(&self) -> &[String] {
        if self.is_empty_path() {
            &[]
        } else {
            &self.segments
        }
    }
}

impl Default for VirtualPath {
    fn default() -> Self {
        VirtualPath::empty()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for VirtualPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(VirtualPath::parse(s))
    }
}

impl From<&str> for VirtualPath {
    fn from(value: &str) -> Self {
        VirtualPath::parse(value)
    }
}
