//! Import bookkeeping for rewrites that add and remove type references.

use std::collections::HashSet;

use indexmap::IndexSet;
use jfix_hir::walk::{unit_roots, walk, Descend, Node, ParentMap};
use jfix_hir::{CompilationUnit, Expr, ImportDecl, Stmt, TypeRef};
use jfix_types::{package_name, simple_name, TypeStore};

/// Reconciles the import list of a unit. Implemented by the host's import rewriter.
pub trait ImportCleanup {
    fn add_import(&mut self, qualified_name: &str);
    fn remove_import(&mut self, import: &ImportDecl);
}

/// [`ImportCleanup`] that records the decisions for later materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportChanges {
    pub added: Vec<String>,
    pub removed: Vec<ImportDecl>,
}

impl ImportChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl ImportCleanup for ImportChanges {
    fn add_import(&mut self, qualified_name: &str) {
        if !self.added.iter().any(|added| added == qualified_name) {
            self.added.push(qualified_name.to_string());
        }
    }

    fn remove_import(&mut self, import: &ImportDecl) {
        if !self.removed.contains(import) {
            self.removed.push(import.clone());
        }
    }
}

/// Tracks which nodes a rewrite removes, which it keeps (moves) and which types it starts
/// referencing, and works out which single-type imports became dead.
#[derive(Debug, Clone, Default)]
pub struct ImportRemover {
    added: IndexSet<String>,
    removed: Vec<Node>,
    retained: Vec<Node>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Live,
    Removed,
}

impl ImportRemover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_added_import(&mut self, qualified_name: &str) {
        self.added.insert(qualified_name.to_string());
    }

    pub fn register_removed_node(&mut self, node: Node) {
        if !self.removed.contains(&node) {
            self.removed.push(node);
        }
    }

    /// A node inside a removed subtree that survives the rewrite (e.g. a moved loop body).
    pub fn register_retained_node(&mut self, node: Node) {
        if !self.retained.contains(&node) {
            self.retained.push(node);
        }
    }

    #[must_use]
    pub fn has_removed_nodes(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Report added imports and imports that only removed nodes referenced to `cleanup`.
    pub fn apply_removes(
        &self,
        unit: &CompilationUnit,
        types: &TypeStore,
        cleanup: &mut dyn ImportCleanup,
    ) {
        let parents = ParentMap::new(unit);
        let liveness = |node: Node| {
            let mut current = Some(node);
            while let Some(node) = current {
                if self.retained.contains(&node) {
                    return Liveness::Live;
                }
                if self.removed.contains(&node) {
                    return Liveness::Removed;
                }
                current = parents.parent(node);
            }
            Liveness::Live
        };

        let mut live: HashSet<String> = HashSet::new();
        let mut touched: HashSet<String> = HashSet::new();

        for ty in &unit.types {
            for field in &ty.fields {
                collect_type_ref(types, &field.decl.ty, &mut live);
            }
            for method in &ty.methods {
                if let Some(return_type) = &method.return_type {
                    collect_type_ref(types, return_type, &mut live);
                }
                for param in &method.params {
                    collect_type_ref(types, &param.ty, &mut live);
                }
            }
        }

        for root in unit_roots(unit) {
            walk(unit, root, &mut |node| {
                let out = match liveness(node) {
                    Liveness::Live => &mut live,
                    Liveness::Removed => &mut touched,
                };
                for type_ref in node_type_refs(unit, node) {
                    collect_type_ref(types, type_ref, out);
                }
                Descend::Children
            });
        }

        for import in &unit.imports {
            if import.is_static || import.is_on_demand {
                continue;
            }
            let dead = touched.contains(&import.path)
                && !live.contains(&import.path)
                && !self.added.contains(&import.path);
            if dead {
                tracing::trace!(target: "jfix.refactor", import = %import.path, "import became unused");
                cleanup.remove_import(import);
            }
        }

        let unit_package = unit.package.as_ref().map(|package| package.name.as_str());
        for qualified_name in &self.added {
            let package = package_name(qualified_name);
            let implicit = package.is_none() || package == Some("java.lang") || package == unit_package;
            let imported = unit.imports.iter().any(|import| {
                !import.is_static
                    && if import.is_on_demand {
                        Some(import.path.as_str()) == package
                    } else {
                        import.path == *qualified_name
                    }
            });
            if !implicit && !imported {
                cleanup.add_import(qualified_name);
            }
        }
    }
}

/// Does the simple name of `qualified_name` already denote another type in `unit`, through a
/// single-type import or a top-level type declaration?
#[must_use]
pub fn is_shadowed(unit: &CompilationUnit, qualified_name: &str) -> bool {
    let simple = simple_name(qualified_name);
    let imported = unit.imports.iter().any(|import| {
        !import.is_static && import.simple_name() == Some(simple) && import.path != qualified_name
    });
    let declared = unit.types.iter().any(|ty| {
        let declared_name = match &unit.package {
            Some(package) => format!("{}.{}", package.name, ty.name),
            None => ty.name.to_string(),
        };
        ty.name.as_str() == simple && declared_name != qualified_name
    });
    imported || declared
}

fn node_type_refs(unit: &CompilationUnit, node: Node) -> Vec<&TypeRef> {
    match node {
        Node::Stmt(id) => match unit.stmt(id) {
            Stmt::LocalVar { decl, .. } => vec![&decl.ty],
            Stmt::EnhancedFor { parameter, .. } => vec![&parameter.ty],
            _ => Vec::new(),
        },
        Node::Expr(id) => match unit.expr(id) {
            Expr::VarDecl { decl, .. } => vec![&decl.ty],
            Expr::Cast { ty, .. } | Expr::New { ty, .. } => vec![ty],
            _ => Vec::new(),
        },
    }
}

fn collect_type_ref(types: &TypeStore, type_ref: &TypeRef, out: &mut HashSet<String>) {
    let Some(ty) = type_ref.ty else {
        return;
    };
    for referenced in types.referenced_types(ty) {
        out.insert(types.ty(referenced).raw_qualified_name().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jfix_hir::UnitBuilder;

    #[test]
    fn single_type_imports_and_declared_types_shadow_simple_names() {
        let types = TypeStore::new();
        let mut b = UnitBuilder::new("Demo.java", &types);
        b.package("com.acme")
            .import("java.awt.List")
            .import("java.util.*")
            .import("java.util.Iterator");
        let body = b.block(vec![]);
        b.class("Item", None).method("m", &[], body);
        let unit = b.finish();

        assert!(is_shadowed(&unit, "java.util.List"));
        assert!(!is_shadowed(&unit, "java.awt.List"));
        assert!(!is_shadowed(&unit, "java.util.Iterator"));
        assert!(!is_shadowed(&unit, "java.util.Map"));
        assert!(is_shadowed(&unit, "org.other.Item"));
        assert!(!is_shadowed(&unit, "com.acme.Item"));
    }
}
