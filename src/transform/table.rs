//! Transformer tables.
//!
//! # Responsibilities
//! - Hold compiled (pattern, transformer) entries
//! - Resolve exactly one transformer per concrete path
//!
//! # Precedence
//! Among matching entries the most specific wins:
//! 1. more literal segments
//! 2. left to right, literal beats `${number}` beats `${label}`
//! 3. earlier insertion
//!
//! Paths no entry matches resolve to pass-through.

use crate::transform::interaction::Transformer;
use crate::transform::pattern::{PathPattern, PathSegment, PatternError};

static PASS_THROUGH: Transformer = Transformer::PassThrough;

/// Compiled table of path patterns and their transformers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformerTable {
    entries: Vec<(PathPattern, Transformer)>,
}

impl TransformerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a table from `(pattern, transformer)` pairs.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, Transformer)>,
    ) -> Result<Self, PatternError> {
        let mut table = Self::new();
        for (pattern, transformer) in entries {
            table.insert(pattern, transformer)?;
        }
        Ok(table)
    }

    /// Insert an entry. A pattern already present is replaced in place.
    pub fn insert(&mut self, pattern: &str, transformer: Transformer) -> Result<(), PatternError> {
        let compiled = PathPattern::parse(pattern)?;
        match self.entries.iter_mut().find(|(p, _)| p.source() == pattern) {
            Some(entry) => entry.1 = transformer,
            None => self.entries.push((compiled, transformer)),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The winning entry for a concrete path, if any.
    pub fn resolve_entry(&self, path: &[PathSegment]) -> Option<&(PathPattern, Transformer)> {
        let mut best: Option<&(PathPattern, Transformer)> = None;
        for entry in self.entries.iter().filter(|(p, _)| p.matches(path)) {
            best = match best {
                Some(current) if !more_specific(&entry.0, &current.0) => Some(current),
                _ => Some(entry),
            };
        }
        best
    }

    /// The transformer for a concrete path, defaulting to pass-through.
    pub fn resolve(&self, path: &[PathSegment]) -> &Transformer {
        self.resolve_entry(path)
            .map(|(_, transformer)| transformer)
            .unwrap_or(&PASS_THROUGH)
    }
}

/// Strictly more specific; equal patterns keep insertion order.
fn more_specific(candidate: &PathPattern, current: &PathPattern) -> bool {
    let by_literals = candidate.literal_count().cmp(&current.literal_count());
    if by_literals.is_ne() {
        return by_literals.is_gt();
    }
    let ranks = |p: &PathPattern| p.segments().iter().map(|s| s.rank()).collect::<Vec<_>>();
    ranks(candidate) < ranks(current)
}
