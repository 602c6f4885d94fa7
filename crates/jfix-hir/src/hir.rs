use std::fmt;

use jfix_core::{FileId, Name, TextRange};
use jfix_types::{MethodId, TypeId, VarId};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        ExprId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        StmtId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtId({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena<T> {
    data: Vec<T>,
}

impl<T> Arena<T> {
    pub fn alloc(&mut self, value: T) -> u32 {
        let idx = self.data.len() as u32;
        self.data.push(value);
        idx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.data.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data.iter().enumerate().map(|(i, v)| (i as u32, v))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { data: Vec::new() }
    }
}

impl<T> std::ops::Index<ExprId> for Arena<T> {
    type Output = T;

    fn index(&self, index: ExprId) -> &Self::Output {
        &self.data[index.idx()]
    }
}

impl<T> std::ops::IndexMut<ExprId> for Arena<T> {
    fn index_mut(&mut self, index: ExprId) -> &mut Self::Output {
        &mut self.data[index.idx()]
    }
}

impl<T> std::ops::Index<StmtId> for Arena<T> {
    type Output = T;

    fn index(&self, index: StmtId) -> &Self::Output {
        &self.data[index.idx()]
    }
}

impl<T> std::ops::IndexMut<StmtId> for Arena<T> {
    fn index_mut(&mut self, index: StmtId) -> &mut Self::Output {
        &mut self.data[index.idx()]
    }
}

/// A compilation unit snapshot handed over by the host.
///
/// `text` is the source the ranges point into.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub file: FileId,
    pub text: String,
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub stmts: Arena<Stmt>,
    pub exprs: Arena<Expr>,
    pub(crate) expr_types: Vec<Option<TypeId>>,
}

impl CompilationUnit {
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            text: String::new(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
            stmts: Arena::default(),
            exprs: Arena::default(),
            expr_types: Vec::new(),
        }
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        StmtId::from_raw(self.stmts.alloc(stmt))
    }

    pub fn alloc_expr(&mut self, expr: Expr, ty: Option<TypeId>) -> ExprId {
        let id = ExprId::from_raw(self.exprs.alloc(expr));
        self.expr_types.push(ty);
        id
    }

    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    /// Static type the host resolved for `expr`, if any.
    #[must_use]
    pub fn expr_type(&self, expr: ExprId) -> Option<TypeId> {
        self.expr_types.get(expr.idx()).copied().flatten()
    }

    /// Source text covered by `range`.
    #[must_use]
    pub fn slice(&self, range: TextRange) -> &str {
        self.text.get(range.start..range.end).unwrap_or("")
    }

    /// Every method in the unit, with the index of its declaring type.
    pub fn methods(&self) -> impl Iterator<Item = (usize, &MethodDecl)> {
        self.types
            .iter()
            .enumerate()
            .flat_map(|(idx, ty)| ty.methods.iter().map(move |m| (idx, m)))
    }

    /// Every field fragment in the unit.
    pub fn field_fragments(&self) -> impl Iterator<Item = &VarFragment> {
        self.types
            .iter()
            .flat_map(|ty| ty.fields.iter())
            .flat_map(|field| field.decl.fragments.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: String,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Dotted import path without the trailing `.*` (`java.util.List`, `java.util`).
    pub path: String,
    pub is_static: bool,
    pub is_on_demand: bool,
    pub range: TextRange,
}

impl ImportDecl {
    /// Simple name a single-type import makes visible.
    #[must_use]
    pub fn simple_name(&self) -> Option<&str> {
        if self.is_on_demand {
            return None;
        }
        self.path.rsplit('.').next()
    }
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Name,
    pub binding: Option<TypeId>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub decl: VarDecl,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: Name,
    /// `None` for `void`.
    pub return_type: Option<TypeRef>,
    pub params: Vec<Param>,
    pub body: Option<StmtId>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: TypeRef,
    pub name: Name,
    pub binding: Option<VarId>,
    pub name_range: TextRange,
    pub range: TextRange,
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub ty: Option<TypeId>,
    pub range: TextRange,
}

impl TypeRef {
    pub fn new(text: impl Into<String>, ty: Option<TypeId>) -> Self {
        Self {
            text: text.into(),
            ty,
            range: TextRange::default(),
        }
    }
}

/// `Type a = x, b;` shared by local, field and for-initializer declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub ty: TypeRef,
    pub fragments: Vec<VarFragment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarFragment {
    pub name: Name,
    pub binding: Option<VarId>,
    pub initializer: Option<ExprId>,
    pub name_range: TextRange,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block {
        statements: Vec<StmtId>,
        range: TextRange,
    },
    LocalVar {
        decl: VarDecl,
        range: TextRange,
    },
    Expr {
        expr: ExprId,
        range: TextRange,
    },
    If {
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
        range: TextRange,
    },
    While {
        condition: ExprId,
        body: StmtId,
        range: TextRange,
    },
    /// Counted `for (init; condition; updaters) body`.
    For {
        initializers: Vec<ExprId>,
        condition: Option<ExprId>,
        updaters: Vec<ExprId>,
        body: StmtId,
        range: TextRange,
    },
    EnhancedFor {
        parameter: Param,
        iterable: ExprId,
        body: StmtId,
        range: TextRange,
    },
    Return {
        expr: Option<ExprId>,
        range: TextRange,
    },
    Empty {
        range: TextRange,
    },
}

impl Stmt {
    #[must_use]
    pub fn range(&self) -> TextRange {
        match self {
            Stmt::Block { range, .. }
            | Stmt::LocalVar { range, .. }
            | Stmt::Expr { range, .. }
            | Stmt::If { range, .. }
            | Stmt::While { range, .. }
            | Stmt::For { range, .. }
            | Stmt::EnhancedFor { range, .. }
            | Stmt::Return { range, .. }
            | Stmt::Empty { range } => *range,
        }
    }

    pub(crate) fn range_mut(&mut self) -> &mut TextRange {
        match self {
            Stmt::Block { range, .. }
            | Stmt::LocalVar { range, .. }
            | Stmt::Expr { range, .. }
            | Stmt::If { range, .. }
            | Stmt::While { range, .. }
            | Stmt::For { range, .. }
            | Stmt::EnhancedFor { range, .. }
            | Stmt::Return { range, .. }
            | Stmt::Empty { range } => range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Null,
    Bool,
    Int,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
}

impl AssignOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Lt,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// `++`/`--` write to their operand.
    #[must_use]
    pub fn is_update(self) -> bool {
        !matches!(self, UnaryOp::Not | UnaryOp::Neg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name {
        name: Name,
        binding: Option<VarId>,
        range: TextRange,
    },
    FieldAccess {
        receiver: ExprId,
        name: Name,
        field: Option<VarId>,
        name_range: TextRange,
        range: TextRange,
    },
    MethodCall {
        receiver: Option<ExprId>,
        name: Name,
        args: Vec<ExprId>,
        method: Option<MethodId>,
        name_range: TextRange,
        range: TextRange,
    },
    New {
        ty: TypeRef,
        args: Vec<ExprId>,
        range: TextRange,
    },
    Assignment {
        op: AssignOp,
        lhs: ExprId,
        rhs: ExprId,
        range: TextRange,
    },
    /// A declaration in expression position (`for` initializers).
    VarDecl {
        decl: VarDecl,
        range: TextRange,
    },
    Literal {
        kind: LiteralKind,
        value: String,
        range: TextRange,
    },
    Cast {
        ty: TypeRef,
        expr: ExprId,
        range: TextRange,
    },
    Paren {
        expr: ExprId,
        range: TextRange,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        range: TextRange,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
        range: TextRange,
    },
    This {
        range: TextRange,
    },
    Missing {
        range: TextRange,
    },
}

impl Expr {
    #[must_use]
    pub fn range(&self) -> TextRange {
        match self {
            Expr::Name { range, .. }
            | Expr::FieldAccess { range, .. }
            | Expr::MethodCall { range, .. }
            | Expr::New { range, .. }
            | Expr::Assignment { range, .. }
            | Expr::VarDecl { range, .. }
            | Expr::Literal { range, .. }
            | Expr::Cast { range, .. }
            | Expr::Paren { range, .. }
            | Expr::Binary { range, .. }
            | Expr::Unary { range, .. }
            | Expr::This { range }
            | Expr::Missing { range } => *range,
        }
    }

    pub(crate) fn range_mut(&mut self) -> &mut TextRange {
        match self {
            Expr::Name { range, .. }
            | Expr::FieldAccess { range, .. }
            | Expr::MethodCall { range, .. }
            | Expr::New { range, .. }
            | Expr::Assignment { range, .. }
            | Expr::VarDecl { range, .. }
            | Expr::Literal { range, .. }
            | Expr::Cast { range, .. }
            | Expr::Paren { range, .. }
            | Expr::Binary { range, .. }
            | Expr::Unary { range, .. }
            | Expr::This { range }
            | Expr::Missing { range } => range,
        }
    }

    #[must_use]
    pub fn is_null_literal(&self) -> bool {
        matches!(
            self,
            Expr::Literal {
                kind: LiteralKind::Null,
                ..
            }
        )
    }
}
