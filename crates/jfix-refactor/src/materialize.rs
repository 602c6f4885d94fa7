//! Turns a [`RewritePlan`] into text edits.

use std::collections::BTreeMap;

use jfix_core::{apply_text_edits, normalize_text_edits, EditError, FileId, Name, TextEdit, TextRange};
use jfix_hir::walk::Node;
use jfix_hir::{CompilationUnit, ExprId, Stmt, StmtId};
use thiserror::Error;

use crate::imports::ImportChanges;
use crate::plan::{EnhancedForHeader, LinkedPosition, RewriteOp, RewritePlan, Transplant};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("plan does not replace a loop")]
    MissingLoopReplacement,
    #[error("node {0:?} does not belong to the unit")]
    UnknownNode(Node),
    #[error("statement {0:?} is not a counted for loop")]
    NotALoop(StmtId),
    #[error("node {0:?} has no source range")]
    MissingSourceRange(Node),
    #[error("moved expression {0:?} is not part of the replaced loop header")]
    MoveOutsideLoop(ExprId),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Resolved linked positions, in post-edit coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedRanges {
    pub proposals: Vec<Name>,
    /// The header name first.
    pub ranges: Vec<TextRange>,
}

/// Edits for one file plus the linked ranges of the loop variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChange {
    pub file: FileId,
    /// Sorted, non-overlapping edits against the unit text.
    pub edits: Vec<TextEdit>,
    pub linked: LinkedRanges,
}

impl SourceChange {
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        apply_text_edits(text, &self.edits)
    }
}

/// Host text/tree rewrite service.
pub trait TreeRewriter {
    fn apply(&mut self, unit: &CompilationUnit, plan: &RewritePlan)
        -> Result<SourceChange, RewriteError>;
}

/// [`TreeRewriter`] that edits the unit's source text directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRewriter;

enum Tracked {
    /// `len` bytes at `offset` inside the replacement of edit `edit`.
    InEdit { edit: usize, offset: usize, len: usize },
    /// Text the edits leave alone.
    Original(TextRange),
}

impl TreeRewriter for TextRewriter {
    fn apply(
        &mut self,
        unit: &CompilationUnit,
        plan: &RewritePlan,
    ) -> Result<SourceChange, RewriteError> {
        let mut edits: Vec<TextEdit> = Vec::new();
        let mut header_name: Option<Tracked> = None;
        let mut replacements: BTreeMap<ExprId, Tracked> = BTreeMap::new();

        let mut saw_loop = false;
        for op in &plan.ops {
            match op {
                RewriteOp::ReplaceLoop {
                    loop_stmt,
                    header,
                    body,
                } => {
                    saw_loop = true;
                    let (edit, name_offset) = header_edit(unit, *loop_stmt, header, *body)?;
                    header_name = Some(Tracked::InEdit {
                        edit: edits.len(),
                        offset: name_offset,
                        len: header.name.len(),
                    });
                    edits.push(edit);
                }
                RewriteOp::RemoveStatement(stmt) => {
                    let range = stmt_range(unit, *stmt)?;
                    edits.push(TextEdit::delete(line_deletion(&unit.text, range)));
                }
                RewriteOp::ReplaceWithName { expr, name } => {
                    let range = expr_range(unit, *expr)?;
                    replacements.insert(
                        *expr,
                        Tracked::InEdit {
                            edit: edits.len(),
                            offset: 0,
                            len: name.len(),
                        },
                    );
                    edits.push(TextEdit::new(range, name.to_string()));
                }
            }
        }
        if !saw_loop {
            return Err(RewriteError::MissingLoopReplacement);
        }
        edits.extend(import_edits(unit, &plan.imports));

        let mut normalized = edits.clone();
        normalize_text_edits(&unit.text, &mut normalized)?;

        let mut tracked = Vec::with_capacity(plan.linked.positions.len());
        for position in &plan.linked.positions {
            let resolved = match position {
                LinkedPosition::HeaderName => header_name.as_ref(),
                LinkedPosition::Replacement(expr) => replacements.get(expr),
                LinkedPosition::Reference(expr) => {
                    tracked.push(map_range(&edits, &Tracked::Original(expr_range(unit, *expr)?)));
                    continue;
                }
            };
            if let Some(resolved) = resolved {
                tracked.push(map_range(&edits, resolved));
            }
        }

        tracing::debug!(
            target: "jfix.refactor",
            file = %unit.file.as_str(),
            edits = normalized.len(),
            linked = tracked.len(),
            "materialized rewrite"
        );

        Ok(SourceChange {
            file: unit.file.clone(),
            edits: normalized,
            linked: LinkedRanges {
                proposals: plan.linked.proposals.clone(),
                ranges: tracked,
            },
        })
    }
}

fn stmt_range(unit: &CompilationUnit, stmt: StmtId) -> Result<TextRange, RewriteError> {
    let range = unit
        .stmts
        .get(stmt.idx())
        .ok_or(RewriteError::UnknownNode(Node::Stmt(stmt)))?
        .range();
    if range.is_empty() || range.end > unit.text.len() {
        return Err(RewriteError::MissingSourceRange(Node::Stmt(stmt)));
    }
    Ok(range)
}

fn expr_range(unit: &CompilationUnit, expr: ExprId) -> Result<TextRange, RewriteError> {
    let range = unit
        .exprs
        .get(expr.idx())
        .ok_or(RewriteError::UnknownNode(Node::Expr(expr)))?
        .range();
    if range.is_empty() || range.end > unit.text.len() {
        return Err(RewriteError::MissingSourceRange(Node::Expr(expr)));
    }
    Ok(range)
}

/// Replace `for (...)` up to and including the closing parenthesis. Returns the edit and the
/// offset of the variable name inside its replacement.
fn header_edit(
    unit: &CompilationUnit,
    loop_stmt: StmtId,
    header: &EnhancedForHeader,
    body: StmtId,
) -> Result<(TextEdit, usize), RewriteError> {
    let loop_range = stmt_range(unit, loop_stmt)?;
    if !matches!(unit.stmt(loop_stmt), Stmt::For { .. }) {
        return Err(RewriteError::NotALoop(loop_stmt));
    }
    let body_range = stmt_range(unit, body)?;
    let missing = RewriteError::MissingSourceRange(Node::Stmt(loop_stmt));
    if !loop_range.contains_range(body_range) {
        return Err(missing);
    }
    let close = unit
        .slice(TextRange::new(loop_range.start, body_range.start))
        .rfind(')')
        .ok_or(missing)?;
    let header_range = TextRange::new(loop_range.start, loop_range.start + close + 1);

    let iterable = header.iterable.expr();
    let iterable_range = expr_range(unit, iterable)?;
    if matches!(header.iterable, Transplant::Move(_)) && !header_range.contains_range(iterable_range) {
        return Err(RewriteError::MoveOutsideLoop(iterable));
    }

    let prefix = format!("for ({} ", header.type_text);
    let text = format!("{prefix}{} : {})", header.name, unit.slice(iterable_range));
    Ok((TextEdit::new(header_range, text), prefix.len()))
}

/// Extend a statement range over its indentation and the preceding line break so the whole line
/// disappears.
fn line_deletion(text: &str, range: TextRange) -> TextRange {
    let line_start = text[..range.start]
        .trim_end_matches(|c: char| c == ' ' || c == '\t')
        .len();
    if text[..line_start].ends_with('\n') {
        TextRange::new(line_start - 1, range.end)
    } else {
        TextRange::new(line_start, range.end)
    }
}

fn map_range(edits: &[TextEdit], tracked: &Tracked) -> TextRange {
    match tracked {
        Tracked::InEdit { edit, offset, len } => {
            let target = &edits[*edit];
            let key = (target.range.start, target.range.end);
            let delta: isize = edits
                .iter()
                .filter(|other| (other.range.start, other.range.end) < key)
                .map(size_delta)
                .sum();
            let start = target.range.start + offset;
            TextRange::new(start, start + len).shifted(delta)
        }
        Tracked::Original(range) => {
            let delta: isize = edits
                .iter()
                .filter(|other| other.range.end <= range.start)
                .map(size_delta)
                .sum();
            range.shifted(delta)
        }
    }
}

fn size_delta(edit: &TextEdit) -> isize {
    edit.replacement.len() as isize - edit.range.len() as isize
}

/// Delete dead imports (with their line break) and insert new ones in sorted position.
fn import_edits(unit: &CompilationUnit, changes: &ImportChanges) -> Vec<TextEdit> {
    let text = &unit.text;
    let mut edits = Vec::new();
    let line_end = |range: TextRange| {
        if text[range.end..].starts_with('\n') {
            range.end + 1
        } else {
            range.end
        }
    };

    let all_removed = !unit.imports.is_empty()
        && unit.imports.iter().all(|import| changes.removed.contains(import));
    for (idx, import) in unit.imports.iter().enumerate() {
        if !changes.removed.contains(import) {
            continue;
        }
        let mut end = line_end(import.range);
        let is_last = idx + 1 == unit.imports.len();
        if all_removed && changes.added.is_empty() && is_last && text[end..].starts_with('\n') {
            end += 1;
        }
        edits.push(TextEdit::delete(TextRange::new(import.range.start, end)));
    }

    let mut added: Vec<&String> = changes.added.iter().collect();
    added.sort();
    if added.is_empty() {
        return edits;
    }

    if unit.imports.is_empty() {
        let block: String = added
            .iter()
            .map(|qualified_name| format!("import {qualified_name};\n"))
            .collect();
        let edit = match &unit.package {
            Some(package) if text[package.range.end..].starts_with("\n\n") => {
                TextEdit::insert(package.range.end + 2, format!("{block}\n"))
            }
            Some(package) => {
                TextEdit::insert(package.range.end, format!("\n\n{}", block.trim_end()))
            }
            None => TextEdit::insert(0, format!("{block}\n")),
        };
        edits.push(edit);
        return edits;
    }

    let mut inserts: BTreeMap<usize, String> = BTreeMap::new();
    for qualified_name in added {
        let offset = unit
            .imports
            .iter()
            .find(|import| !import.is_static && import.path.as_str() > qualified_name.as_str())
            .map(|import| import.range.start)
            .or_else(|| unit.imports.last().map(|import| line_end(import.range)))
            .unwrap_or(0);
        inserts
            .entry(offset)
            .or_default()
            .push_str(&format!("import {qualified_name};\n"));
    }
    edits.extend(
        inserts
            .into_iter()
            .map(|(offset, text)| TextEdit::insert(offset, text)),
    );
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::LinkedPositionGroup;
    use jfix_hir::UnitBuilder;
    use jfix_test_utils::Jdk;
    use pretty_assertions::assert_eq;

    #[test]
    fn removed_lines_take_their_indentation_along() {
        let text = "{\n    a;\n}";
        assert_eq!(line_deletion(text, TextRange::new(6, 8)), TextRange::new(1, 8));
        assert_eq!(line_deletion("a; b;", TextRange::new(3, 5)), TextRange::new(2, 5));
    }

    #[test]
    fn plans_must_replace_a_loop_of_the_unit() {
        let jdk = Jdk::new();
        let unit = UnitBuilder::new("A.java", &jdk.types).finish();
        let mut plan = RewritePlan {
            ops: Vec::new(),
            linked: LinkedPositionGroup::default(),
            imports: ImportChanges::default(),
        };
        assert_eq!(
            TextRewriter.apply(&unit, &plan),
            Err(RewriteError::MissingLoopReplacement)
        );

        let mut b = UnitBuilder::new("B.java", &jdk.types);
        let iterable = b.null();
        let body = b.block(vec![]);
        let loop_stmt = b.for_loop(vec![], None, vec![], body);
        plan.ops.push(RewriteOp::ReplaceLoop {
            loop_stmt,
            header: EnhancedForHeader {
                element_type: jdk.string,
                type_text: "String".to_string(),
                name: Name::new("s"),
                iterable: Transplant::Copy(iterable),
            },
            body,
        });
        assert_eq!(
            TextRewriter.apply(&unit, &plan),
            Err(RewriteError::UnknownNode(Node::Stmt(loop_stmt)))
        );
    }
}
