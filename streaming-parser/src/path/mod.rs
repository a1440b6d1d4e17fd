mod matching;
mod parser;
mod segment;

use std::fmt::{Debug, Display, Write};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Serialize, Serializer};

use crate::error::{ConfigError, PathSyntaxError};
pub use segment::{Accessor, Segment};

/// An immutable JSON path: `Root` followed by zero or more segments.
///
/// Paths share their segment storage, so taking a prefix of a path (which is
/// what every matched fragment is) does not copy. Equality and hashing cover
/// the segments only; the rendered text is computed once on first use.
#[derive(Clone)]
pub struct Path {
    segments: Arc<[Segment]>,
    len: usize,
    rendered: OnceLock<String>,
}

impl Path {
    pub fn root() -> Self {
        Self::from_parsed(vec![Segment::Root])
    }

    /// Parses JSONPath text such as `$.orders[*].id` or `$..['a b'][2:10:2]`.
    pub fn parse(text: &str) -> Result<Self, PathSyntaxError> {
        parser::parse(text)
    }

    /// Builds a path from segments, under the same rules as [`Path::parse`]:
    /// the first segment must be `Root`, and recursive descent must be
    /// followed by a selector other than a wildcard. `Root, Recursive,
    /// Wildcard` is the one exception and reduces to the root path.
    pub fn from_segments<Segments>(segments: Segments) -> Result<Self, ConfigError>
    where
        Segments: IntoIterator<Item = Segment>,
    {
        let mut segments = segments.into_iter().collect::<Vec<_>>();
        match segments.first() {
            None => return Err(ConfigError::InvalidPath("a path cannot be empty")),
            Some(Segment::Root) => {}
            Some(_) => return Err(ConfigError::InvalidPath("a path must start at the root")),
        }

        if matches!(
            segments[..],
            [Segment::Root, Segment::Recursive, Segment::Wildcard(_)]
        ) {
            segments.truncate(1);
        }

        let mut previous_was_recursive = false;
        for segment in &segments[1..] {
            match segment {
                Segment::Root => {
                    return Err(ConfigError::InvalidPath(
                        "the root may only appear at the start of a path",
                    ))
                }
                Segment::Recursive | Segment::Wildcard(_) if previous_was_recursive => {
                    return Err(ConfigError::InvalidPath(
                        "recursive descent must be followed by a selector",
                    ))
                }
                segment => segment.validate().map_err(ConfigError::InvalidPath)?,
            }
            previous_was_recursive = matches!(segment, Segment::Recursive);
        }
        if previous_was_recursive {
            return Err(ConfigError::InvalidPath(
                "a path cannot end in recursive descent",
            ));
        }

        Ok(Self::from_parsed(segments))
    }

    /// For segment lists that are valid by construction.
    pub(crate) fn from_parsed(segments: Vec<Segment>) -> Self {
        let len = segments.len();
        Self {
            segments: segments.into(),
            len,
            rendered: OnceLock::new(),
        }
    }

    /// Number of segments, including the root.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments[..self.len]
    }

    pub fn last(&self) -> &Segment {
        &self.segments[self.len - 1]
    }

    pub fn is_root(&self) -> bool {
        self.len == 1
    }

    /// The first `len` segments of this path.
    pub(crate) fn prefix(&self, len: usize) -> Self {
        debug_assert!(len >= 1 && len <= self.len);
        if len == self.len {
            return self.clone();
        }
        Self {
            segments: Arc::clone(&self.segments),
            len,
            rendered: OnceLock::new(),
        }
    }

    /// Matches this pattern against a concrete token path. On success the
    /// result is the prefix of `concrete` the pattern consumed.
    pub fn matches(&self, concrete: &Path) -> Option<Path> {
        matching::match_len(self.segments(), concrete.segments()).map(|len| concrete.prefix(len))
    }

    /// Number of leading segments that each select exactly one location.
    pub(crate) fn fixed_len(&self) -> usize {
        self.segments()
            .iter()
            .take_while(|segment| segment.is_fixed())
            .count()
    }

    pub fn as_str(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut rendered = String::new();
            let segments = self.segments();
            for (i, segment) in segments.iter().enumerate() {
                // Writing into a String cannot fail.
                let _ = segment.write_fragment(segments.get(i + 1), &mut rendered);
            }
            rendered
        })
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments().hash(state);
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Debug for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Path(")?;
        f.write_str(self.as_str())?;
        f.write_char(')')
    }
}

impl FromStr for Path {
    type Err = PathSyntaxError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The part of a concrete path that a pattern matched, or `Noop` when no
/// pattern matched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fragment {
    Matched(Path),
    Noop,
}

impl Fragment {
    /// `Noop` is longer than any real path so that it never wins a
    /// shortest-match comparison.
    pub fn len(&self) -> usize {
        match self {
            Fragment::Matched(path) => path.len(),
            Fragment::Noop => usize::MAX,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Fragment::Matched(path) => Some(path),
            Fragment::Noop => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Fragment::Noop)
    }
}

impl Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fragment::Matched(path) => Display::fmt(path, f),
            Fragment::Noop => f.write_str("<noop>"),
        }
    }
}
