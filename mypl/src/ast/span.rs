//! Source location tracking

use serde::{Deserialize, Serialize};

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A node paired with where it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_disjoint() {
        let merged = Span::new(10, 20).merge(Span::new(0, 5));
        assert_eq!(merged, Span::new(0, 20));
    }

    #[test]
    fn test_span_merge_contained() {
        let merged = Span::new(0, 100).merge(Span::new(20, 30));
        assert_eq!(merged, Span::new(0, 100));
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(42, 99).to_string(), "42..99");
    }

    #[test]
    fn test_span_into_range() {
        let range: std::ops::Range<usize> = Span::new(5, 15).into();
        assert_eq!(range, 5..15);
    }

    #[test]
    fn test_spanned_keeps_span() {
        let s = Spanned::new("main".to_string(), Span::new(4, 8));
        assert_eq!(s.node, "main");
        assert_eq!(s.span, Span::new(4, 8));
    }
}
