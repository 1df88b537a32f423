//! Path expressions for addressing locations inside a document
//!
//! Provides [`PathExpression`] for hierarchical addressing of values within a
//! JSON document.
//!
//! # Grammar
//! ```text
//! path    := segment ("." segment)*
//! segment := identifier ("[" integer "]")?
//! ```
//!
//! # Examples
//! - `name` → top-level key
//! - `sections.experience.jobs[0].company` → field of the first list item
//! - `skills[2]` → third element of a scalar list

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest array index a path may carry
///
/// Parsing rejects anything above it with [`PathError::InvalidIndex`], and
/// [`set`](crate::set) leaves the document untouched for hand-built paths
/// that exceed it.
pub const MAX_INDEX: usize = 65_535;

/// One step of a path: an object key, optionally followed by an array index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    key: String,
    index: Option<usize>,
}

impl Segment {
    /// Create a key-only segment
    #[inline]
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            index: None,
        }
    }

    /// Create an indexed segment (`key[index]`)
    ///
    /// Indices above [`MAX_INDEX`] are accepted here but cannot be assigned.
    #[inline]
    #[must_use]
    pub fn indexed(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            index: Some(index),
        }
    }

    /// Object key of this segment
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.key
    }

    /// Array index, if the segment is indexed
    #[inline]
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Same key without the index
    #[inline]
    #[must_use]
    pub fn without_index(&self) -> Self {
        Self::key(self.key.clone())
    }

    fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::EmptySegment);
        }

        let Some(open) = raw.find('[') else {
            if raw.contains(']') {
                return Err(PathError::UnbalancedBracket(raw.to_string()));
            }
            return Ok(Self::key(raw));
        };

        let key = &raw[..open];
        if key.is_empty() {
            return Err(PathError::MissingIdentifier(raw.to_string()));
        }
        if key.contains(']') {
            return Err(PathError::UnbalancedBracket(raw.to_string()));
        }

        let rest = &raw[open + 1..];
        let close = rest
            .find(']')
            .ok_or_else(|| PathError::UnbalancedBracket(raw.to_string()))?;
        if close + 1 != rest.len() {
            return Err(PathError::TrailingCharacters(raw.to_string()));
        }

        let digits = &rest[..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PathError::InvalidIndex(digits.to_string()));
        }
        let index = parse_index(digits)?;

        Ok(Self::indexed(key, index))
    }
}

/// Parse a run of ASCII digits as an index no larger than [`MAX_INDEX`]
fn parse_index(digits: &str) -> Result<usize, PathError> {
    digits
        .parse::<usize>()
        .ok()
        .filter(|index| *index <= MAX_INDEX)
        .ok_or_else(|| PathError::InvalidIndex(digits.to_string()))
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.key, index),
            None => f.write_str(&self.key),
        }
    }
}

/// Path within a document tree
///
/// Always holds at least one segment; the document root itself is not
/// addressable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathExpression(Vec<Segment>);

impl PathExpression {
    /// Create path from segments
    ///
    /// # Errors
    /// Returns [`PathError::Empty`] if `segments` is empty
    pub fn new(segments: Vec<Segment>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments))
    }

    /// Path consisting of a single key
    #[inline]
    #[must_use]
    pub fn single(key: impl Into<String>) -> Self {
        Self(vec![Segment::key(key)])
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> &Segment {
        // Constructors guarantee at least one segment
        &self.0[self.0.len() - 1]
    }

    /// Parent path, or `None` for a single-segment path
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a key segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::key(key));
        new
    }

    /// Address element `index` of the array at this path
    ///
    /// `skills` becomes `skills[index]`. Any index already on the last
    /// segment is replaced.
    #[inline]
    #[must_use]
    pub fn item(&self, index: usize) -> Self {
        let mut new = self.clone();
        let last = new.0.len() - 1;
        new.0[last].index = Some(index);
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Split an item path into its list path, item index and remainder
    ///
    /// Scans for the first indexed segment. `a.b[3].c` yields
    /// `(a.b, 3, [c])`; paths without an index yield `None`.
    #[must_use]
    pub fn split_item(&self) -> Option<(Self, usize, &[Segment])> {
        let position = self.0.iter().position(|s| s.index.is_some())?;
        let mut list = self.0[..=position].to_vec();
        let index = list[position].index?;
        list[position] = list[position].without_index();
        Some((Self(list), index, &self.0[position + 1..]))
    }

    /// Convert a JSON pointer (`/a/b/0/c`) into a path expression
    ///
    /// Numeric tokens become the index of the preceding key, which is how
    /// external validators report array positions.
    ///
    /// # Errors
    /// Returns error if the pointer is empty, does not start with `/`, or has
    /// an index with no key before it
    pub fn from_pointer(pointer: &str) -> Result<Self, PathError> {
        let Some(body) = pointer.strip_prefix('/') else {
            return Err(PathError::InvalidPointer(pointer.to_string()));
        };

        let mut segments: Vec<Segment> = Vec::new();
        for token in body.split('/') {
            let token = token.replace("~1", "/").replace("~0", "~");
            if token.is_empty() {
                return Err(PathError::InvalidPointer(pointer.to_string()));
            }
            if token.bytes().all(|b| b.is_ascii_digit()) {
                let index = parse_index(&token)?;
                match segments.last_mut() {
                    Some(last) if last.index.is_none() => last.index = Some(index),
                    _ => return Err(PathError::InvalidPointer(pointer.to_string())),
                }
            } else {
                segments.push(Segment::key(token));
            }
        }

        Self::new(segments).map_err(|_| PathError::InvalidPointer(pointer.to_string()))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }
}

impl Display for PathExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = s
            .split('.')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }
}

impl Serialize for PathExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to path expressions
///
/// Paths are generated by the system, so any of these indicates an internal
/// bug rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path has no segments
    #[error("path is empty")]
    Empty,

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Index with no identifier in front of it
    #[error("segment '{0}' has an index but no identifier")]
    MissingIdentifier(String),

    /// Index is not a non-negative integer no larger than [`MAX_INDEX`]
    #[error("invalid index: '{0}' (must be an integer from 0 to 65535)")]
    InvalidIndex(String),

    /// `[` without `]` or the other way round
    #[error("unbalanced bracket in segment '{0}'")]
    UnbalancedBracket(String),

    /// Characters after the closing bracket
    #[error("unexpected characters after index in segment '{0}'")]
    TrailingCharacters(String),

    /// Malformed JSON pointer
    #[error("invalid JSON pointer: '{0}'")]
    InvalidPointer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_path() {
        let path: PathExpression = "sections.experience.title".parse().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.last().name(), "title");
        assert_eq!(path.last().index(), None);
    }

    #[test]
    fn parse_indexed_segment() {
        let path: PathExpression = "sections.jobs[12].company".parse().unwrap();
        assert_eq!(path.segments()[1], Segment::indexed("jobs", 12));
        assert_eq!(path.to_string(), "sections.jobs[12].company");
    }

    #[test]
    fn parse_keeps_non_ascii_identifiers() {
        let path: PathExpression = "seções.experiência profissional".parse().unwrap();
        assert_eq!(path.segments()[1].name(), "experiência profissional");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!("".parse::<PathExpression>(), Err(PathError::Empty));
        assert_eq!("a..b".parse::<PathExpression>(), Err(PathError::EmptySegment));
        assert_eq!("a.".parse::<PathExpression>(), Err(PathError::EmptySegment));
    }

    #[test]
    fn parse_rejects_non_numeric_index() {
        let result = "skills[x]".parse::<PathExpression>();
        assert_eq!(result, Err(PathError::InvalidIndex("x".to_string())));

        let result = "skills[-1]".parse::<PathExpression>();
        assert!(matches!(result, Err(PathError::InvalidIndex(_))));

        let result = "skills[]".parse::<PathExpression>();
        assert!(matches!(result, Err(PathError::InvalidIndex(_))));
    }

    #[test]
    fn parse_bounds_index() {
        let path: PathExpression = "skills[65535]".parse().unwrap();
        assert_eq!(path.last().index(), Some(MAX_INDEX));

        assert_eq!(
            "skills[65536]".parse::<PathExpression>(),
            Err(PathError::InvalidIndex("65536".to_string()))
        );
        assert!(matches!(
            "a[18446744073709551615]".parse::<PathExpression>(),
            Err(PathError::InvalidIndex(_))
        ));
        assert!(matches!(
            "a[99999999999999999999999]".parse::<PathExpression>(),
            Err(PathError::InvalidIndex(_))
        ));
    }

    #[test]
    fn parse_rejects_malformed_brackets() {
        assert!(matches!(
            "skills[1".parse::<PathExpression>(),
            Err(PathError::UnbalancedBracket(_))
        ));
        assert!(matches!(
            "skills]".parse::<PathExpression>(),
            Err(PathError::UnbalancedBracket(_))
        ));
        assert!(matches!(
            "skills[1]x".parse::<PathExpression>(),
            Err(PathError::TrailingCharacters(_))
        ));
        assert!(matches!(
            "skills[1][2]".parse::<PathExpression>(),
            Err(PathError::TrailingCharacters(_))
        ));
        assert!(matches!(
            "[0].name".parse::<PathExpression>(),
            Err(PathError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn new_rejects_empty_segments() {
        assert_eq!(PathExpression::new(vec![]), Err(PathError::Empty));
    }

    #[test]
    fn item_and_child() {
        let list: PathExpression = "sections.experience.jobs".parse().unwrap();
        let field = list.item(3).child("company");
        assert_eq!(field.to_string(), "sections.experience.jobs[3].company");

        let renumbered = field.parent().unwrap().item(1).child("company");
        assert_eq!(renumbered.to_string(), "sections.experience.jobs[1].company");
    }

    #[test]
    fn split_item_path() {
        let path: PathExpression = "sections.exp.jobs[2].title".parse().unwrap();
        let (list, index, rest) = path.split_item().unwrap();
        assert_eq!(list.to_string(), "sections.exp.jobs");
        assert_eq!(index, 2);
        assert_eq!(rest, &[Segment::key("title")]);

        let simple: PathExpression = "skills[0]".parse().unwrap();
        let (list, index, rest) = simple.split_item().unwrap();
        assert_eq!(list.to_string(), "skills");
        assert_eq!(index, 0);
        assert!(rest.is_empty());

        let plain: PathExpression = "name".parse().unwrap();
        assert!(plain.split_item().is_none());
    }

    #[test]
    fn prefix_checks() {
        let a: PathExpression = "sections.exp".parse().unwrap();
        let b: PathExpression = "sections.exp.jobs[0]".parse().unwrap();
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
    }

    #[test]
    fn from_pointer_converts_indices() {
        let path = PathExpression::from_pointer("/sections/experience/jobs/0/company").unwrap();
        assert_eq!(path.to_string(), "sections.experience.jobs[0].company");

        let escaped = PathExpression::from_pointer("/a~1b/c~0d").unwrap();
        assert_eq!(escaped.segments()[0].name(), "a/b");
        assert_eq!(escaped.segments()[1].name(), "c~d");
    }

    #[test]
    fn from_pointer_rejects_malformed() {
        assert!(PathExpression::from_pointer("").is_err());
        assert!(PathExpression::from_pointer("a/b").is_err());
        assert!(PathExpression::from_pointer("/0").is_err());
        assert!(PathExpression::from_pointer("/a/0/1").is_err());
        assert_eq!(
            PathExpression::from_pointer("/a/18446744073709551615"),
            Err(PathError::InvalidIndex("18446744073709551615".to_string()))
        );
    }

    #[test]
    fn serde_as_string() {
        let path: PathExpression = "a.b[1].c".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a.b[1].c\"");

        let back: PathExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);

        let bad: Result<PathExpression, _> = serde_json::from_str("\"a[\"");
        assert!(bad.is_err());
    }
}
