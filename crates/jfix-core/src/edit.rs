//! Text edit primitives.

use thiserror::Error;

use crate::TextRange;

/// Replace `range` of a text snapshot with `replacement`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EditError {
    #[error("edit range {range:?} is out of bounds for text length {text_len}")]
    RangeOutOfBounds { range: TextRange, text_len: usize },
    #[error("offset {offset} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: usize },
    #[error("overlapping edits: {first:?} overlaps {second:?}")]
    OverlappingEdits { first: TextRange, second: TextRange },
}

/// Apply a list of edits to a text snapshot.
///
/// Edits are first sorted by `(start, end)` and applied from the end of the text
/// backwards, so the result does not depend on the input order.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut edits = edits.to_vec();
    normalize_text_edits(text, &mut edits)?;

    let mut out = text.to_string();
    for edit in edits.into_iter().rev() {
        out.replace_range(edit.range.start..edit.range.end, &edit.replacement);
    }
    Ok(out)
}

/// Sort edits and check for overlaps / out-of-bounds ranges.
pub fn normalize_text_edits(text: &str, edits: &mut Vec<TextEdit>) -> Result<(), EditError> {
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    let text_len = text.len();
    for edit in edits.iter() {
        if edit.range.start > edit.range.end || edit.range.end > text_len {
            return Err(EditError::RangeOutOfBounds {
                range: edit.range,
                text_len,
            });
        }
        for offset in [edit.range.start, edit.range.end] {
            if !text.is_char_boundary(offset) {
                return Err(EditError::InvalidUtf8Boundary { offset });
            }
        }
    }

    for pair in edits.windows(2) {
        let first = &pair[0];
        let second = &pair[1];
        if first.range.end > second.range.start
            || (first.range.is_empty()
                && second.range.is_empty()
                && first.range.start == second.range.start)
        {
            return Err(EditError::OverlappingEdits {
                first: first.range,
                second: second.range,
            });
        }
    }

    // Coalesce back-to-back edits.
    let mut merged: Vec<TextEdit> = Vec::with_capacity(edits.len());
    for edit in edits.drain(..) {
        if let Some(last) = merged.last_mut() {
            if last.range.end == edit.range.start {
                last.range = TextRange::new(last.range.start, edit.range.end);
                last.replacement.push_str(&edit.replacement);
                continue;
            }
        }
        merged.push(edit);
    }
    *edits = merged;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn apply_multiple_edits_is_deterministic() {
        let text = "abcdef";
        let mut edits = vec![
            TextEdit::new(TextRange::new(2, 4), "XX"),
            TextEdit::insert(0, "!"),
            TextEdit::delete(TextRange::new(5, 6)),
        ];

        let out1 = apply_text_edits(text, &edits).unwrap();
        edits.reverse();
        let out2 = apply_text_edits(text, &edits).unwrap();

        assert_eq!(out1, out2);
        assert_eq!(out1, "!abXXe");
    }

    #[test]
    fn detect_overlapping_edits() {
        let edits = vec![
            TextEdit::new(TextRange::new(1, 4), "X"),
            TextEdit::new(TextRange::new(3, 5), "Y"),
        ];

        assert!(matches!(
            apply_text_edits("abcdef", &edits),
            Err(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn out_of_bounds_edit_is_rejected() {
        let edits = vec![TextEdit::delete(TextRange::new(2, 10))];
        assert_eq!(
            apply_text_edits("abc", &edits),
            Err(EditError::RangeOutOfBounds {
                range: TextRange::new(2, 10),
                text_len: 3,
            })
        );
    }
}
