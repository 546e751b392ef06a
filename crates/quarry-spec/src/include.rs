//! Eager-load navigation paths.

use std::fmt;

/// A navigation path such as `orders.lines.product`.
///
/// Built from an `include` followed by any number of `then_include` steps.
/// Only execution layers with relational navigation act on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludePath {
    segments: Vec<String>,
}

impl IncludePath {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![root.into()],
        }
    }

    /// Parses a dotted include string. Empty segments are dropped.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!segments.is_empty()).then_some(Self { segments })
    }

    pub fn then(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for IncludePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
