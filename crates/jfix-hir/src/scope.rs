//! Which variable names are visible around a source position.

use jfix_core::Name;

use crate::walk::{walk, Descend, Node};
use crate::{CompilationUnit, Expr, Stmt, StmtId, VarDecl};

/// Scope queries a quick fix needs to pick non-conflicting names.
pub trait ScopeAnalyzer {
    /// Variables visible at `offset`: fields of the enclosing type, parameters of the enclosing
    /// method and locals declared earlier in enclosing blocks.
    fn declarations_before(&self, offset: usize) -> Vec<Name>;

    /// Variables declared at or after `offset` inside the innermost block that encloses it.
    fn declarations_after(&self, offset: usize) -> Vec<Name>;
}

/// [`ScopeAnalyzer`] over the HIR of a single compilation unit.
pub struct UnitScopes<'a> {
    unit: &'a CompilationUnit,
}

impl<'a> UnitScopes<'a> {
    pub fn new(unit: &'a CompilationUnit) -> Self {
        Self { unit }
    }

    fn enclosing_body(&self, offset: usize) -> Option<StmtId> {
        self.unit
            .methods()
            .filter(|(_, method)| method.range.start <= offset && offset <= method.range.end)
            .find_map(|(_, method)| method.body)
    }

    fn collect_before(&self, stmt: StmtId, offset: usize, out: &mut Vec<Name>) {
        match self.unit.stmt(stmt) {
            Stmt::Block { statements, .. } => {
                for child in statements {
                    let range = self.unit.stmt(*child).range();
                    if range.end <= offset {
                        if let Stmt::LocalVar { decl, .. } = self.unit.stmt(*child) {
                            push_decl_names(decl, out);
                        }
                    } else {
                        if range.start <= offset {
                            self.collect_before(*child, offset, out);
                        }
                        break;
                    }
                }
            }
            Stmt::For {
                initializers,
                body,
                range,
                ..
            } => {
                if range.start < offset {
                    for init in initializers {
                        if let Expr::VarDecl { decl, .. } = self.unit.expr(*init) {
                            push_decl_names(decl, out);
                        }
                    }
                }
                self.collect_in_child(*body, offset, out);
            }
            Stmt::EnhancedFor {
                parameter, body, ..
            } => {
                if self.unit.stmt(*body).range().contains(offset) {
                    out.push(parameter.name.clone());
                    self.collect_before(*body, offset, out);
                }
            }
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.collect_in_child(*then_branch, offset, out);
                if let Some(else_branch) = else_branch {
                    self.collect_in_child(*else_branch, offset, out);
                }
            }
            Stmt::While { body, .. } => self.collect_in_child(*body, offset, out),
            Stmt::LocalVar { .. } | Stmt::Expr { .. } | Stmt::Return { .. } | Stmt::Empty { .. } => {}
        }
    }

    fn collect_in_child(&self, child: StmtId, offset: usize, out: &mut Vec<Name>) {
        if self.unit.stmt(child).range().contains(offset) {
            self.collect_before(child, offset, out);
        }
    }

    fn innermost_block(&self, stmt: StmtId, offset: usize) -> Option<StmtId> {
        let range = self.unit.stmt(stmt).range();
        if !(range.start < offset && offset <= range.end) {
            return None;
        }
        let mut found = None;
        walk(self.unit, Node::Stmt(stmt), &mut |node| {
            let Node::Stmt(id) = node else {
                return Descend::Skip;
            };
            let range = self.unit.stmt(id).range();
            if !(range.start < offset && offset < range.end) {
                return Descend::Skip;
            }
            if matches!(self.unit.stmt(id), Stmt::Block { .. }) {
                found = Some(id);
            }
            Descend::Children
        });
        found
    }
}

fn push_decl_names(decl: &VarDecl, out: &mut Vec<Name>) {
    out.extend(decl.fragments.iter().map(|fragment| fragment.name.clone()));
}

impl ScopeAnalyzer for UnitScopes<'_> {
    fn declarations_before(&self, offset: usize) -> Vec<Name> {
        let mut out = Vec::new();
        if let Some(ty) = self
            .unit
            .types
            .iter()
            .find(|ty| ty.range.start <= offset && offset <= ty.range.end)
        {
            for field in &ty.fields {
                push_decl_names(&field.decl, &mut out);
            }
            if let Some(method) = ty
                .methods
                .iter()
                .find(|method| method.range.start <= offset && offset <= method.range.end)
            {
                out.extend(method.params.iter().map(|param| param.name.clone()));
            }
        }
        if let Some(body) = self.enclosing_body(offset) {
            self.collect_before(body, offset, &mut out);
        }
        out
    }

    fn declarations_after(&self, offset: usize) -> Vec<Name> {
        let mut out = Vec::new();
        let Some(block) = self
            .enclosing_body(offset)
            .and_then(|body| self.innermost_block(body, offset))
        else {
            return out;
        };
        let Stmt::Block { statements, .. } = self.unit.stmt(block) else {
            return out;
        };
        for child in statements {
            if self.unit.stmt(*child).range().start < offset {
                continue;
            }
            walk(self.unit, Node::Stmt(*child), &mut |node| {
                match node {
                    Node::Stmt(id) => match self.unit.stmt(id) {
                        Stmt::LocalVar { decl, .. } => push_decl_names(decl, &mut out),
                        Stmt::EnhancedFor { parameter, .. } => out.push(parameter.name.clone()),
                        _ => {}
                    },
                    Node::Expr(id) => {
                        if let Expr::VarDecl { decl, .. } = self.unit.expr(id) {
                            push_decl_names(decl, &mut out);
                        }
                    }
                }
                Descend::Children
            });
        }
        out
    }
}
