//! Decides whether a counted `for` loop is driven by an iterator and can become an enhanced
//! `for` statement.

use jfix_config::JfixConfig;
use jfix_core::JavaLanguageLevel;
use jfix_hir::walk::{unit_roots, walk, Descend, Node};
use jfix_hir::{AssignOp, CompilationUnit, Expr, ExprId, Stmt, StmtId, VarDecl};
use jfix_types::{MethodId, TypeId, TypeStore, VarId, VariableKind};

pub(crate) const ITERATOR: &str = "java.util.Iterator";
pub(crate) const ENUMERATION: &str = "java.util.Enumeration";
pub(crate) const ITERABLE: &str = "java.lang.Iterable";

const ADVANCE_METHODS: [&str; 2] = ["next", "nextElement"];
const HAS_MORE_METHODS: [&str; 2] = ["hasNext", "hasMoreElements"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Require the loop to be driven only by the iterator (see `ConvertLoopConfig::strict`).
    pub strict: bool,
    pub language_level: JavaLanguageLevel,
}

impl ClassifyOptions {
    #[must_use]
    pub fn from_config(config: &JfixConfig) -> Self {
        Self {
            strict: config.convert_loop.strict,
            language_level: config.language_level(),
        }
    }
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            strict: true,
            language_level: JavaLanguageLevel::default(),
        }
    }
}

/// What the loop iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterableBinding {
    /// A local, parameter or field.
    Variable(VarId),
    /// A method whose result is iterated (`getItems().iterator()`).
    Method(MethodId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementBinding {
    pub var: VarId,
    /// `true` when the variable is declared inside the loop body.
    pub declared_in_loop: bool,
    /// `String s;` before the loop for a pre-existing local element. The header redeclares the
    /// variable, so the rewrite drops this statement.
    pub outer_declaration: Option<StmtId>,
}

/// A per-iteration `element = it.next()` found in the loop body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurrence {
    /// `T element = it.next();`
    Declaration { stmt: StmtId, var: VarId },
    /// `element = it.next()`; `lhs` is the assigned name.
    Assignment { assignment: ExprId, lhs: ExprId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub loop_stmt: StmtId,
    pub iterator: VarId,
    pub iterable: IterableBinding,
    /// Receiver of the `iterator()`/`elements()` call in the loop initializer.
    pub iterable_expr: ExprId,
    pub element: Option<ElementBinding>,
    /// Recognized per-iteration assignments, in document order.
    pub occurrences: Vec<Occurrence>,
    /// Every advance call (`it.next()`, `e.nextElement()`) on the iterator in the body.
    pub next_calls: Vec<ExprId>,
    pub element_type: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotApplicableReason {
    NotAForLoop,
    SourceLevelTooLow,
    NoIterator,
    NoIterable,
    ElementAssignedElsewhere,
    /// A pre-existing element is read outside the loop body, or cannot be redeclared in the
    /// header (a parameter, or a local declared together with other variables).
    ElementUsedOutsideLoop,
    UnsupportedCondition,
    IteratorUsedInBody,
    MultipleAdvanceCalls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Applicable(ClassificationResult),
    NotApplicable(NotApplicableReason),
}

impl Classification {
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        matches!(self, Classification::Applicable(_))
    }

    #[must_use]
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            Classification::Applicable(result) => Some(result),
            Classification::NotApplicable(_) => None,
        }
    }
}

/// Classify `loop_stmt`.
///
/// Unresolved bindings make the loop not applicable; they are never errors.
#[must_use]
pub fn classify(
    unit: &CompilationUnit,
    types: &TypeStore,
    loop_stmt: StmtId,
    options: ClassifyOptions,
) -> Classification {
    match classify_inner(unit, types, loop_stmt, options) {
        Ok(result) => Classification::Applicable(result),
        Err(reason) => {
            tracing::debug!(
                target: "jfix.refactor",
                file = %unit.file.as_str(),
                loop_stmt = ?loop_stmt,
                reason = ?reason,
                "loop is not convertible"
            );
            Classification::NotApplicable(reason)
        }
    }
}

fn classify_inner(
    unit: &CompilationUnit,
    types: &TypeStore,
    loop_stmt: StmtId,
    options: ClassifyOptions,
) -> Result<ClassificationResult, NotApplicableReason> {
    if !options.language_level.supports_enhanced_for() {
        return Err(NotApplicableReason::SourceLevelTooLow);
    }
    let Stmt::For {
        initializers,
        condition,
        updaters,
        body,
        ..
    } = unit.stmt(loop_stmt)
    else {
        return Err(NotApplicableReason::NotAForLoop);
    };

    let header = scan_initializers(unit, types, initializers);
    let iterator = header.iterator.ok_or(NotApplicableReason::NoIterator)?;
    let iterable_expr = header.iterable_expr.ok_or(NotApplicableReason::NoIterable)?;
    let iterable = header.iterable.ok_or(NotApplicableReason::NoIterable)?;

    let element_type = element_type(unit, types, iterator, iterable_expr);
    let (element, occurrences) =
        find_element(unit, types, *body, iterator, element_type);
    let next_calls = advance_calls(unit, types, *body, iterator);

    let element = match element {
        Some(var) if declares(unit, *body, var) => Some(ElementBinding {
            var,
            declared_in_loop: true,
            outer_declaration: None,
        }),
        Some(var) => Some(ElementBinding {
            var,
            declared_in_loop: false,
            outer_declaration: outer_element_declaration(unit, types, *body, var, &occurrences)?,
        }),
        None => None,
    };

    if options.strict {
        let driven_by_iterator = updaters.is_empty()
            && condition.is_some_and(|condition| {
                is_call_on_iterator(unit, types, condition, iterator, &HAS_MORE_METHODS)
            });
        if !driven_by_iterator {
            return Err(NotApplicableReason::UnsupportedCondition);
        }
        if next_calls.len() > 1 {
            return Err(NotApplicableReason::MultipleAdvanceCalls);
        }
        if iterator_escapes(unit, *body, iterator, &next_calls) {
            return Err(NotApplicableReason::IteratorUsedInBody);
        }
    }

    Ok(ClassificationResult {
        loop_stmt,
        iterator,
        iterable,
        iterable_expr,
        element,
        occurrences,
        next_calls,
        element_type,
    })
}

#[derive(Default)]
struct HeaderScan {
    iterator: Option<VarId>,
    iterable: Option<IterableBinding>,
    iterable_expr: Option<ExprId>,
}

/// Steps 1 and 2: iterator declarations and the receiver of the call that creates the iterator.
/// Every fragment is visited; later matches replace earlier ones.
fn scan_initializers(
    unit: &CompilationUnit,
    types: &TypeStore,
    initializers: &[ExprId],
) -> HeaderScan {
    let mut scan = HeaderScan::default();
    for init in initializers {
        let Expr::VarDecl { decl, .. } = unit.expr(*init) else {
            continue;
        };
        for fragment in &decl.fragments {
            if let Some(var) = fragment.binding {
                if types
                    .variable(var)
                    .ty
                    .is_some_and(|ty| is_iterator_like(types, ty))
                {
                    scan.iterator = Some(var);
                }
            }
            let Some(initializer) = fragment.initializer else {
                continue;
            };
            walk(unit, Node::Expr(initializer), &mut |node| {
                if let Node::Expr(id) = node {
                    record_iterable(unit, types, id, &mut scan);
                }
                Descend::Children
            });
        }
    }
    scan
}

fn record_iterable(unit: &CompilationUnit, types: &TypeStore, call: ExprId, scan: &mut HeaderScan) {
    let Expr::MethodCall {
        receiver: Some(receiver),
        method: Some(method),
        ..
    } = unit.expr(call)
    else {
        return;
    };
    let returns_iterator = unit
        .expr_type(call)
        .or(types.method(*method).return_type)
        .is_some_and(|ty| is_iterator_like(types, ty));
    if !returns_iterator {
        return;
    }
    let receiver_is_iterable = unit
        .expr_type(*receiver)
        .is_some_and(|ty| types.super_type(ty, ITERABLE).is_some());
    if !receiver_is_iterable {
        return;
    }
    scan.iterable_expr = Some(*receiver);
    scan.iterable = match unit.expr(*receiver) {
        Expr::Name { binding, .. } => binding.map(IterableBinding::Variable),
        Expr::FieldAccess { field, .. } => field.map(IterableBinding::Variable),
        Expr::MethodCall { method, .. } => method.map(IterableBinding::Method),
        _ => None,
    };
}

pub(crate) fn is_iterator_like(types: &TypeStore, ty: TypeId) -> bool {
    types.super_type(ty, ITERATOR).is_some() || types.super_type(ty, ENUMERATION).is_some()
}

/// Iterator type argument, else the iterable's `Iterable<T>` argument, else `Object`.
fn element_type(
    unit: &CompilationUnit,
    types: &TypeStore,
    iterator: VarId,
    iterable_expr: ExprId,
) -> TypeId {
    let from_iterator = types
        .variable(iterator)
        .ty
        .and_then(|ty| types.first_type_argument(ty));
    // A raw reference to a generic type has erased supertypes.
    let from_iterable = || {
        unit.expr_type(iterable_expr)
            .filter(|ty| types.ty(*ty).type_parameters.is_empty())
            .and_then(|ty| types.super_type(ty, ITERABLE))
            .and_then(|iterable| types.first_type_argument(iterable))
    };
    from_iterator
        .or_else(from_iterable)
        .unwrap_or_else(|| types.object())
}

/// Strip `(...)` and casts.
pub(crate) fn strip_parens_and_casts(unit: &CompilationUnit, mut expr: ExprId) -> ExprId {
    loop {
        match unit.expr(expr) {
            Expr::Paren { expr: inner, .. } | Expr::Cast { expr: inner, .. } => expr = *inner,
            _ => return expr,
        }
    }
}

/// Variable `expr` names when it is a resolved simple name or field access.
pub(crate) fn referenced_var(unit: &CompilationUnit, expr: ExprId) -> Option<VarId> {
    match unit.expr(expr) {
        Expr::Name { binding, .. } => *binding,
        Expr::FieldAccess { field, .. } => *field,
        _ => None,
    }
}

fn is_call_on_iterator(
    unit: &CompilationUnit,
    types: &TypeStore,
    expr: ExprId,
    iterator: VarId,
    methods: &[&str],
) -> bool {
    let Expr::MethodCall {
        receiver: Some(receiver),
        method: Some(method),
        args,
        ..
    } = unit.expr(strip_parens_and_casts(unit, expr))
    else {
        return false;
    };
    args.is_empty()
        && methods.contains(&types.method(*method).name.as_str())
        && referenced_var(unit, *receiver) == Some(iterator)
}

/// `it.next()` / `e.nextElement()` on the iterator, matched by binding.
pub(crate) fn is_advance_call(
    unit: &CompilationUnit,
    types: &TypeStore,
    expr: ExprId,
    iterator: VarId,
) -> bool {
    matches!(unit.expr(expr), Expr::MethodCall { .. })
        && is_call_on_iterator(unit, types, expr, iterator, &ADVANCE_METHODS)
}

/// Step 3: the element variable and its per-iteration assignments. Nested counted loops are not
/// searched.
fn find_element(
    unit: &CompilationUnit,
    types: &TypeStore,
    body: StmtId,
    iterator: VarId,
    element_type: TypeId,
) -> (Option<VarId>, Vec<Occurrence>) {
    let mut element = None;
    let mut occurrences = Vec::new();

    let feeds_element = |rhs: ExprId| {
        let rhs = strip_parens_and_casts(unit, rhs);
        unit.expr(rhs).is_null_literal() || is_advance_call(unit, types, rhs, iterator)
    };

    walk(unit, Node::Stmt(body), &mut |node| match node {
        Node::Stmt(id) => match unit.stmt(id) {
            Stmt::For { .. } => Descend::Skip,
            Stmt::LocalVar { decl, .. } => {
                let mut matched = false;
                for (var, initializer) in decl_fragments(decl) {
                    let is_element = feeds_element(initializer)
                        && types.variable(var).ty == Some(element_type);
                    if is_element {
                        element = Some(var);
                        occurrences.push(Occurrence::Declaration { stmt: id, var });
                        matched = true;
                    }
                }
                if matched {
                    Descend::Skip
                } else {
                    Descend::Children
                }
            }
            _ => Descend::Children,
        },
        Node::Expr(id) => {
            let Expr::Assignment {
                op: AssignOp::Assign,
                lhs,
                rhs,
                ..
            } = unit.expr(id)
            else {
                return Descend::Children;
            };
            if !feeds_element(*rhs) || unit.expr_type(*lhs) != Some(element_type) {
                return Descend::Children;
            }
            match referenced_var(unit, *lhs) {
                Some(var) => {
                    element = Some(var);
                    occurrences.push(Occurrence::Assignment {
                        assignment: id,
                        lhs: *lhs,
                    });
                    Descend::Skip
                }
                None => Descend::Children,
            }
        }
    });

    (element, occurrences)
}

fn decl_fragments(decl: &VarDecl) -> impl Iterator<Item = (VarId, ExprId)> + '_ {
    decl.fragments
        .iter()
        .filter_map(|fragment| Some((fragment.binding?, fragment.initializer?)))
}

/// Step 4: every advance call on the iterator anywhere in the body.
fn advance_calls(
    unit: &CompilationUnit,
    types: &TypeStore,
    body: StmtId,
    iterator: VarId,
) -> Vec<ExprId> {
    let mut calls = Vec::new();
    walk(unit, Node::Stmt(body), &mut |node| {
        if let Node::Expr(id) = node {
            if is_advance_call(unit, types, id, iterator) {
                calls.push(id);
            }
        }
        Descend::Children
    });
    calls
}

/// Does the subtree at `root` declare `var`?
fn declares(unit: &CompilationUnit, root: StmtId, var: VarId) -> bool {
    let mut found = false;
    walk(unit, Node::Stmt(root), &mut |node| {
        let declared = match node {
            Node::Stmt(id) => match unit.stmt(id) {
                Stmt::LocalVar { decl, .. } => decl_declares(decl, var),
                Stmt::EnhancedFor { parameter, .. } => parameter.binding == Some(var),
                _ => false,
            },
            Node::Expr(id) => match unit.expr(id) {
                Expr::VarDecl { decl, .. } => decl_declares(decl, var),
                _ => false,
            },
        };
        found |= declared;
        if found {
            Descend::Skip
        } else {
            Descend::Children
        }
    });
    found
}

fn decl_declares(decl: &VarDecl, var: VarId) -> bool {
    decl.fragments
        .iter()
        .any(|fragment| fragment.binding == Some(var))
}

/// Writes, reads and declarations of one variable seen by a walk.
#[derive(Default)]
struct VarUses {
    written: bool,
    referenced: bool,
    declarations: Vec<Node>,
}

impl VarUses {
    fn record(&mut self, unit: &CompilationUnit, node: Node, var: VarId) {
        match node {
            Node::Stmt(id) => {
                if let Stmt::LocalVar { decl, .. } = unit.stmt(id) {
                    if decl_declares(decl, var) {
                        self.declarations.push(node);
                        self.written |= initializes(decl, var);
                    }
                }
            }
            Node::Expr(id) => match unit.expr(id) {
                Expr::Assignment { lhs, .. } => self.written |= targets(unit, *lhs, var),
                Expr::Unary { op, operand, .. } if op.is_update() => {
                    self.written |= targets(unit, *operand, var);
                }
                Expr::VarDecl { decl, .. } if decl_declares(decl, var) => {
                    self.declarations.push(node);
                    self.written |= initializes(decl, var);
                }
                _ => self.referenced |= referenced_var(unit, id) == Some(var),
            },
        }
    }
}

fn targets(unit: &CompilationUnit, expr: ExprId, var: VarId) -> bool {
    referenced_var(unit, strip_parens_and_casts(unit, expr)) == Some(var)
}

/// Step 5, for an element declared before the loop.
///
/// The only writes allowed are the recognized per-iteration assignments in `body`; every other
/// assignment, `++`/`--` or initializer anywhere in the unit (nested loops and the loop header
/// included) rejects the loop. The variable must also not be read outside `body`: after the
/// rewrite it is no longer assigned there. A local is redeclared by the new header, so its own
/// declaration must be a single-variable statement the rewrite can drop; that statement is
/// returned.
fn outer_element_declaration(
    unit: &CompilationUnit,
    types: &TypeStore,
    body: StmtId,
    var: VarId,
    occurrences: &[Occurrence],
) -> Result<Option<StmtId>, NotApplicableReason> {
    let mut outside = VarUses {
        written: unit
            .field_fragments()
            .any(|fragment| fragment.binding == Some(var) && fragment.initializer.is_some()),
        ..VarUses::default()
    };
    for root in unit_roots(unit) {
        walk(unit, root, &mut |node| {
            if node == Node::Stmt(body) {
                return Descend::Skip;
            }
            outside.record(unit, node, var);
            Descend::Children
        });
    }

    let recognized: Vec<Node> = occurrences
        .iter()
        .filter_map(|occurrence| match occurrence {
            Occurrence::Assignment { assignment, .. } => Some(Node::Expr(*assignment)),
            Occurrence::Declaration { .. } => None,
        })
        .collect();
    let mut inside = VarUses::default();
    walk(unit, Node::Stmt(body), &mut |node| {
        if recognized.contains(&node) {
            return Descend::Skip;
        }
        inside.record(unit, node, var);
        Descend::Children
    });

    if outside.written || inside.written {
        tracing::trace!(
            target: "jfix.refactor",
            var = ?var,
            in_loop = inside.written,
            "element variable has other writes"
        );
        return Err(NotApplicableReason::ElementAssignedElsewhere);
    }
    if outside.referenced {
        return Err(NotApplicableReason::ElementUsedOutsideLoop);
    }
    match types.variable(var).kind {
        VariableKind::Field => Ok(None),
        VariableKind::Parameter => Err(NotApplicableReason::ElementUsedOutsideLoop),
        VariableKind::Local => match outside.declarations.as_slice() {
            [Node::Stmt(stmt)] if is_single_local(unit, *stmt) => Ok(Some(*stmt)),
            _ => Err(NotApplicableReason::ElementUsedOutsideLoop),
        },
    }
}

fn is_single_local(unit: &CompilationUnit, stmt: StmtId) -> bool {
    matches!(unit.stmt(stmt), Stmt::LocalVar { decl, .. } if decl.fragments.len() == 1)
}

fn initializes(decl: &VarDecl, var: VarId) -> bool {
    decl.fragments
        .iter()
        .any(|fragment| fragment.binding == Some(var) && fragment.initializer.is_some())
}

/// Any reference to the iterator in the body other than as the receiver of an advance call.
fn iterator_escapes(
    unit: &CompilationUnit,
    body: StmtId,
    iterator: VarId,
    next_calls: &[ExprId],
) -> bool {
    let receivers: Vec<ExprId> = next_calls
        .iter()
        .filter_map(|call| match unit.expr(*call) {
            Expr::MethodCall { receiver, .. } => *receiver,
            _ => None,
        })
        .collect();

    let mut escapes = false;
    walk(unit, Node::Stmt(body), &mut |node| {
        if let Node::Expr(id) = node {
            if receivers.contains(&id) {
                return Descend::Skip;
            }
            if referenced_var(unit, id) == Some(iterator) {
                escapes = true;
            }
        }
        if escapes {
            Descend::Skip
        } else {
            Descend::Children
        }
    });
    escapes
}

/// Every counted `for` statement in the unit, in document order.
#[must_use]
pub fn counted_loops(unit: &CompilationUnit) -> Vec<StmtId> {
    let mut loops = Vec::new();
    for root in unit_roots(unit) {
        walk(unit, root, &mut |node| {
            if let Node::Stmt(id) = node {
                if matches!(unit.stmt(id), Stmt::For { .. }) {
                    loops.push(id);
                }
            }
            Descend::Children
        });
    }
    loops
}
