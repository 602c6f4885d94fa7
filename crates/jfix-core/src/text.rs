use serde::{Deserialize, Serialize};

/// Identifier for a workspace file.
///
/// Hosts typically use a URI or a workspace-relative path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A half-open text range `[start, end)` in UTF-8 byte offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid range: {start}..{end}");
        Self { start, end }
    }

    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns `true` when `other` lies completely inside `self`.
    pub fn contains_range(self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersects(self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[must_use]
    pub fn shifted(self, delta: isize) -> Self {
        let start = self.start.saturating_add_signed(delta);
        let end = self.end.saturating_add_signed(delta);
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_half_open() {
        let range = TextRange::new(2, 5);
        assert!(range.contains(2));
        assert!(!range.contains(5));
        assert!(range.contains_range(TextRange::new(2, 5)));
        assert!(!range.contains_range(TextRange::new(1, 3)));
        assert!(range.intersects(TextRange::new(4, 9)));
        assert!(!range.intersects(TextRange::new(5, 9)));
    }

    #[test]
    fn shifting_moves_both_ends() {
        assert_eq!(TextRange::new(4, 6).shifted(-2), TextRange::new(2, 4));
        assert_eq!(TextRange::new(4, 6).shifted(3), TextRange::new(7, 9));
    }
}
