//! Describes the enhanced `for` rewrite of a classified loop without touching source text.

use jfix_core::Name;
use jfix_hir::walk::{walk, Descend, Node, ParentMap};
use jfix_hir::{CompilationUnit, Expr, ExprId, Stmt, StmtId};
use jfix_types::{TypeId, TypeStore};

use crate::classify::{ClassificationResult, Occurrence};
use crate::imports::{is_shadowed, ImportChanges, ImportRemover};
use crate::names::NameCandidateList;

/// How the iterable expression gets into the new header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transplant {
    /// The expression is relocated; used for calls, which must not be evaluated twice.
    Move(ExprId),
    /// The expression is duplicated.
    Copy(ExprId),
}

impl Transplant {
    #[must_use]
    pub fn expr(self) -> ExprId {
        match self {
            Transplant::Move(expr) | Transplant::Copy(expr) => expr,
        }
    }
}

/// `for (<type_text> <name> : <iterable>)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedForHeader {
    pub element_type: TypeId,
    pub type_text: String,
    pub name: Name,
    pub iterable: Transplant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOp {
    /// Replace the counted loop by an enhanced `for` that reuses `body`.
    ReplaceLoop {
        loop_stmt: StmtId,
        header: EnhancedForHeader,
        body: StmtId,
    },
    RemoveStatement(StmtId),
    ReplaceWithName { expr: ExprId, name: Name },
}

/// A position whose text is the loop variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedPosition {
    /// The name in the new header.
    HeaderName,
    /// An advance call replaced by the name.
    Replacement(ExprId),
    /// An existing reference to the element variable.
    Reference(ExprId),
}

/// Positions edited together when the user retypes the loop variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedPositionGroup {
    pub proposals: Vec<Name>,
    /// [`LinkedPosition::HeaderName`] first.
    pub positions: Vec<LinkedPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    pub ops: Vec<RewriteOp>,
    pub linked: LinkedPositionGroup,
    pub imports: ImportChanges,
}

impl RewritePlan {
    #[must_use]
    pub fn header(&self) -> Option<&EnhancedForHeader> {
        self.ops.iter().find_map(|op| match op {
            RewriteOp::ReplaceLoop { header, .. } => Some(header),
            _ => None,
        })
    }

    pub fn removed_statements(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.ops.iter().filter_map(|op| match op {
            RewriteOp::RemoveStatement(stmt) => Some(*stmt),
            _ => None,
        })
    }

    pub fn replaced_calls(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.ops.iter().filter_map(|op| match op {
            RewriteOp::ReplaceWithName { expr, .. } => Some(*expr),
            _ => None,
        })
    }
}

const FALLBACK_NAME: &str = "element";

/// Plan the conversion of an applicable loop.
///
/// The loop variable is the first name candidate. Per-iteration assignment statements that are
/// direct children of the body block are removed, as is the declaration of a pre-existing local
/// element; every other advance call is replaced by the loop variable.
pub fn plan(
    unit: &CompilationUnit,
    types: &TypeStore,
    classification: &ClassificationResult,
    names: &NameCandidateList,
) -> RewritePlan {
    let name = names
        .first()
        .cloned()
        .unwrap_or_else(|| Name::new(FALLBACK_NAME));
    let Stmt::For { body, .. } = unit.stmt(classification.loop_stmt) else {
        return RewritePlan {
            ops: Vec::new(),
            linked: LinkedPositionGroup::default(),
            imports: ImportChanges::default(),
        };
    };
    let body = *body;

    let mut remover = ImportRemover::new();
    let parents = ParentMap::new(unit);

    let mut removed: Vec<StmtId> = Vec::new();
    if let Some(stmt) = classification
        .element
        .and_then(|element| element.outer_declaration)
    {
        removed.push(stmt);
        remover.register_removed_node(Node::Stmt(stmt));
    }
    if let Stmt::Block { statements, .. } = unit.stmt(body) {
        for occurrence in &classification.occurrences {
            let stmt = match occurrence {
                Occurrence::Declaration { stmt, .. } => Some(*stmt),
                Occurrence::Assignment { assignment, .. } => {
                    parents.enclosing_stmt(Node::Expr(*assignment))
                }
            };
            if let Some(stmt) = stmt.filter(|stmt| statements.contains(stmt)) {
                if !removed.contains(&stmt) {
                    removed.push(stmt);
                    remover.register_removed_node(Node::Stmt(stmt));
                }
            }
        }
    }

    let element = classification.element.map(|element| element.var);
    let mut replaced = Vec::new();
    let mut references = Vec::new();
    walk(unit, Node::Stmt(body), &mut |node| match node {
        Node::Stmt(id) if removed.contains(&id) => Descend::Skip,
        Node::Stmt(_) => Descend::Children,
        Node::Expr(id) if classification.next_calls.contains(&id) => {
            replaced.push(id);
            Descend::Skip
        }
        Node::Expr(id) => {
            if let Expr::Name {
                binding: Some(var), ..
            } = unit.expr(id)
            {
                if Some(*var) == element {
                    references.push(id);
                }
            }
            Descend::Children
        }
    });

    let iterable = match unit.expr(classification.iterable_expr) {
        Expr::MethodCall { .. } => Transplant::Move(classification.iterable_expr),
        _ => Transplant::Copy(classification.iterable_expr),
    };
    // An import of another type with the same simple name forces the qualified spelling.
    let referenced = types.referenced_types(classification.element_type);
    let shadowed = referenced
        .iter()
        .any(|ty| is_shadowed(unit, types.ty(*ty).raw_qualified_name()));
    let element_type = types.ty(classification.element_type);
    let header = EnhancedForHeader {
        element_type: classification.element_type,
        type_text: if shadowed {
            element_type.qualified_name.clone()
        } else {
            element_type.name.clone()
        },
        name: name.clone(),
        iterable,
    };

    if !shadowed {
        for ty in referenced {
            remover.register_added_import(types.ty(ty).raw_qualified_name());
        }
    }
    remover.register_removed_node(Node::Stmt(classification.loop_stmt));
    remover.register_retained_node(Node::Stmt(body));
    remover.register_retained_node(Node::Expr(classification.iterable_expr));
    for call in &replaced {
        remover.register_removed_node(Node::Expr(*call));
    }
    let mut imports = ImportChanges::default();
    remover.apply_removes(unit, types, &mut imports);

    let mut ops = vec![RewriteOp::ReplaceLoop {
        loop_stmt: classification.loop_stmt,
        header,
        body,
    }];
    ops.extend(removed.iter().copied().map(RewriteOp::RemoveStatement));
    ops.extend(replaced.iter().map(|expr| RewriteOp::ReplaceWithName {
        expr: *expr,
        name: name.clone(),
    }));

    let mut positions = vec![LinkedPosition::HeaderName];
    positions.extend(replaced.iter().copied().map(LinkedPosition::Replacement));
    positions.extend(references.iter().copied().map(LinkedPosition::Reference));

    tracing::debug!(
        target: "jfix.refactor",
        name = %name,
        removed = removed.len(),
        replaced = replaced.len(),
        imports_added = imports.added.len(),
        imports_removed = imports.removed.len(),
        "planned enhanced for rewrite"
    );

    RewritePlan {
        ops,
        linked: LinkedPositionGroup {
            proposals: names.to_vec(),
            positions,
        },
        imports,
    }
}
