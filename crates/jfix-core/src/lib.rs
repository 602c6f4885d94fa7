//! Core shared types for jfix.
//!
//! This crate is intentionally small: text ranges, text edits, file identifiers, Java
//! identifier rules and the language level model used to gate quick fixes.

mod edit;
mod identifier;
mod language_level;
mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, TextEdit};
pub use identifier::{is_java_identifier, is_java_keyword};
pub use language_level::{JavaFeature, JavaLanguageLevel};
pub use smol_str::SmolStr as Name;
pub use text::{FileId, TextRange};
