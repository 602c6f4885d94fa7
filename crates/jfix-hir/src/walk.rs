//! Explicit pre-order traversal over the HIR.
//!
//! The visitor decides per node whether the walk descends into its children, so pruning
//! (e.g. "do not look inside nested loops") is a visible part of each caller.

use std::collections::HashMap;

use crate::{CompilationUnit, Expr, ExprId, Stmt, StmtId, VarDecl};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Stmt(StmtId),
    Expr(ExprId),
}

/// Returned by a visitor to control descent into the visited node's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Descend {
    Children,
    Skip,
}

fn decl_children(decl: &VarDecl, out: &mut Vec<Node>) {
    out.extend(
        decl.fragments
            .iter()
            .filter_map(|fragment| fragment.initializer)
            .map(Node::Expr),
    );
}

/// Direct children of `node` in source order.
#[must_use]
pub fn children(unit: &CompilationUnit, node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    match node {
        Node::Stmt(id) => match unit.stmt(id) {
            Stmt::Block { statements, .. } => out.extend(statements.iter().copied().map(Node::Stmt)),
            Stmt::LocalVar { decl, .. } => decl_children(decl, &mut out),
            Stmt::Expr { expr, .. } => out.push(Node::Expr(*expr)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                out.push(Node::Expr(*condition));
                out.push(Node::Stmt(*then_branch));
                out.extend(else_branch.map(Node::Stmt));
            }
            Stmt::While {
                condition, body, ..
            } => {
                out.push(Node::Expr(*condition));
                out.push(Node::Stmt(*body));
            }
            Stmt::For {
                initializers,
                condition,
                updaters,
                body,
                ..
            } => {
                out.extend(initializers.iter().copied().map(Node::Expr));
                out.extend(condition.map(Node::Expr));
                out.extend(updaters.iter().copied().map(Node::Expr));
                out.push(Node::Stmt(*body));
            }
            Stmt::EnhancedFor { iterable, body, .. } => {
                out.push(Node::Expr(*iterable));
                out.push(Node::Stmt(*body));
            }
            Stmt::Return { expr, .. } => out.extend(expr.map(Node::Expr)),
            Stmt::Empty { .. } => {}
        },
        Node::Expr(id) => match unit.expr(id) {
            Expr::FieldAccess { receiver, .. } => out.push(Node::Expr(*receiver)),
            Expr::MethodCall { receiver, args, .. } => {
                out.extend(receiver.map(Node::Expr));
                out.extend(args.iter().copied().map(Node::Expr));
            }
            Expr::New { args, .. } => out.extend(args.iter().copied().map(Node::Expr)),
            Expr::Assignment { lhs, rhs, .. } | Expr::Binary { lhs, rhs, .. } => {
                out.push(Node::Expr(*lhs));
                out.push(Node::Expr(*rhs));
            }
            Expr::VarDecl { decl, .. } => decl_children(decl, &mut out),
            Expr::Cast { expr, .. } | Expr::Paren { expr, .. } => out.push(Node::Expr(*expr)),
            Expr::Unary { operand, .. } => out.push(Node::Expr(*operand)),
            Expr::Name { .. } | Expr::Literal { .. } | Expr::This { .. } | Expr::Missing { .. } => {}
        },
    }
    out
}

/// Pre-order walk starting at `root` (inclusive).
pub fn walk(unit: &CompilationUnit, root: Node, visit: &mut dyn FnMut(Node) -> Descend) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if visit(node) == Descend::Skip {
            continue;
        }
        let mut kids = children(unit, node);
        kids.reverse();
        stack.extend(kids);
    }
}

/// Roots of every executable region in the unit: field initializers, then method bodies.
#[must_use]
pub fn unit_roots(unit: &CompilationUnit) -> Vec<Node> {
    let mut roots: Vec<Node> = unit
        .field_fragments()
        .filter_map(|fragment| fragment.initializer)
        .map(Node::Expr)
        .collect();
    roots.extend(
        unit.methods()
            .filter_map(|(_, method)| method.body)
            .map(Node::Stmt),
    );
    roots
}

/// Child → parent links for every node reachable from [`unit_roots`].
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    parents: HashMap<Node, Node>,
}

impl ParentMap {
    pub fn new(unit: &CompilationUnit) -> Self {
        let mut parents = HashMap::new();
        for root in unit_roots(unit) {
            walk(unit, root, &mut |node| {
                for child in children(unit, node) {
                    parents.insert(child, node);
                }
                Descend::Children
            });
        }
        Self { parents }
    }

    #[must_use]
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.parents.get(&node).copied()
    }

    /// Closest statement that contains `node` (a statement is its own enclosing statement).
    #[must_use]
    pub fn enclosing_stmt(&self, node: Node) -> Option<StmtId> {
        let mut current = Some(node);
        while let Some(node) = current {
            if let Node::Stmt(id) = node {
                return Some(id);
            }
            current = self.parent(node);
        }
        None
    }

    /// Returns `true` when `node` lies inside the subtree of `ancestor` (inclusive).
    #[must_use]
    pub fn is_within(&self, node: Node, ancestor: Node) -> bool {
        let mut current = Some(node);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}
