//! Path patterns.
//!
//! # Responsibilities
//! - Represent the concrete path of a node in a JSON tree
//! - Compile dotted patterns (`vout.${number}.scriptPubKey.hex`) once
//! - Match a compiled pattern against a concrete path
//!
//! # Design Decisions
//! - `${number}` matches array indices only, `${label}` object keys only
//! - A literal segment matches a key with the same text or an index whose
//!   decimal form equals it
//! - `singleEntry` is the pattern of a scalar response root (empty path)
//! - No regex: matching is a single pass over equal-length sequences

use std::str::FromStr;

use thiserror::Error;

/// Wildcard for any array index.
pub const ANY_INDEX: &str = "${number}";
/// Wildcard for any object key.
pub const ANY_KEY: &str = "${label}";
/// Pattern addressing the root of a scalar response.
pub const ROOT: &str = "singleEntry";

/// One step of a concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Dotted form of a concrete path.
pub fn path_string(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Matcher for one segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentMatcher {
    Literal(String),
    AnyIndex,
    AnyKey,
}

impl SegmentMatcher {
    fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (SegmentMatcher::Literal(literal), PathSegment::Key(key)) => literal == key,
            (SegmentMatcher::Literal(literal), PathSegment::Index(index)) => {
                *literal == index.to_string()
            }
            (SegmentMatcher::AnyIndex, PathSegment::Index(_)) => true,
            (SegmentMatcher::AnyKey, PathSegment::Key(_)) => true,
            _ => false,
        }
    }

    /// Lower is more specific.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            SegmentMatcher::Literal(_) => 0,
            SegmentMatcher::AnyIndex => 1,
            SegmentMatcher::AnyKey => 2,
        }
    }
}

/// Pattern compilation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty path pattern")]
    Empty,

    #[error("path pattern '{0}' has an empty segment")]
    EmptySegment(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<SegmentMatcher>,
}

impl PathPattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }
        if source == ROOT {
            return Ok(Self {
                source: source.to_string(),
                segments: Vec::new(),
            });
        }

        let segments = source
            .split('.')
            .map(|segment| match segment {
                "" => Err(PatternError::EmptySegment(source.to_string())),
                ANY_INDEX => Ok(SegmentMatcher::AnyIndex),
                ANY_KEY => Ok(SegmentMatcher::AnyKey),
                literal => Ok(SegmentMatcher::Literal(literal.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[SegmentMatcher] {
        &self.segments
    }

    pub fn matches(&self, path: &[PathSegment]) -> bool {
        self.segments.len() == path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(matcher, segment)| matcher.matches(segment))
    }

    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, SegmentMatcher::Literal(_)))
            .count()
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_parse_segments() {
        let p = PathPattern::parse("vout.${number}.scriptPubKey.addresses.${number}").unwrap();
        assert_eq!(p.segments().len(), 5);
        assert_eq!(p.segments()[1], SegmentMatcher::AnyIndex);
        assert_eq!(p.literal_count(), 3);

        assert_eq!(PathPattern::parse(""), Err(PatternError::Empty));
        assert!(matches!(PathPattern::parse("a..b"), Err(PatternError::EmptySegment(_))));
    }

    #[test]
    fn test_wildcards_are_typed() {
        let any_index = PathPattern::parse("tx.${number}").unwrap();
        let any_key = PathPattern::parse("tx.${label}").unwrap();

        let indexed = [key("tx"), PathSegment::Index(2)];
        let keyed = [key("tx"), key("first")];

        assert!(any_index.matches(&indexed));
        assert!(!any_index.matches(&keyed));
        assert!(any_key.matches(&keyed));
        assert!(!any_key.matches(&indexed));
    }

    #[test]
    fn test_literal_matches_index_text() {
        let p = PathPattern::parse("signers.0.myPublicKey").unwrap();
        assert!(p.matches(&[key("signers"), PathSegment::Index(0), key("myPublicKey")]));
        assert!(!p.matches(&[key("signers"), PathSegment::Index(1), key("myPublicKey")]));
    }

    #[test]
    fn test_root_pattern() {
        let p = PathPattern::parse(ROOT).unwrap();
        assert!(p.matches(&[]));
        assert!(!p.matches(&[key("singleEntry")]));
    }

    #[test]
    fn test_path_string() {
        let path = [key("details"), PathSegment::Index(3), key("address")];
        assert_eq!(path_string(&path), "details.3.address");
    }
}
