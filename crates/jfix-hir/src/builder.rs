use jfix_core::{FileId, Name, TextRange};
use jfix_types::{MethodId, TypeId, TypeStore, VarId};

use crate::printer::print_unit;
use crate::{
    AssignOp, BinaryOp, CompilationUnit, Expr, ExprId, FieldDecl, ImportDecl, LiteralKind,
    MethodDecl, PackageDecl, Param, Stmt, StmtId, TypeDecl, TypeRef, UnaryOp, VarDecl,
    VarFragment,
};

/// Builds a resolved [`CompilationUnit`] bottom-up.
///
/// Hosts that already have a parser lower into the arenas directly; the builder exists for
/// synthesized units (tests, fixtures, generated code). Names and static types are taken from
/// the bindings in the [`TypeStore`]. [`UnitBuilder::finish`] renders the source text and
/// assigns every node its range in it.
pub struct UnitBuilder<'a> {
    types: &'a TypeStore,
    unit: CompilationUnit,
}

impl<'a> UnitBuilder<'a> {
    pub fn new(file: impl Into<String>, types: &'a TypeStore) -> Self {
        Self {
            types,
            unit: CompilationUnit::new(FileId::new(file)),
        }
    }

    pub fn package(&mut self, name: &str) -> &mut Self {
        self.unit.package = Some(PackageDecl {
            name: name.to_string(),
            range: TextRange::default(),
        });
        self
    }

    pub fn import(&mut self, path: &str) -> &mut Self {
        let (path, is_on_demand) = match path.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (path, false),
        };
        self.unit.imports.push(ImportDecl {
            path: path.to_string(),
            is_static: false,
            is_on_demand,
            range: TextRange::default(),
        });
        self
    }

    /// Start a new top-level class; fields and methods are added to the latest class.
    pub fn class(&mut self, name: &str, binding: Option<TypeId>) -> &mut Self {
        self.unit.types.push(TypeDecl {
            name: Name::new(name),
            binding,
            fields: Vec::new(),
            methods: Vec::new(),
            range: TextRange::default(),
        });
        self
    }

    fn current_class(&mut self) -> &mut TypeDecl {
        if self.unit.types.is_empty() {
            self.class("Main", None);
        }
        let last = self.unit.types.len() - 1;
        &mut self.unit.types[last]
    }

    pub fn field(&mut self, var: VarId, initializer: Option<ExprId>) -> &mut Self {
        let decl = self.var_decl(&[(var, initializer)]);
        self.current_class().fields.push(FieldDecl {
            decl,
            range: TextRange::default(),
        });
        self
    }

    pub fn method(&mut self, name: &str, params: &[VarId], body: StmtId) -> &mut Self {
        let params = params
            .iter()
            .map(|var| {
                let binding = self.types.variable(*var);
                Param {
                    ty: self.type_ref_of_var(*var),
                    name: binding.name.clone(),
                    binding: Some(*var),
                    name_range: TextRange::default(),
                    range: TextRange::default(),
                }
            })
            .collect();
        self.current_class().methods.push(MethodDecl {
            name: Name::new(name),
            return_type: None,
            params,
            body: Some(body),
            range: TextRange::default(),
        });
        self
    }

    pub fn type_ref(&self, ty: TypeId) -> TypeRef {
        TypeRef::new(self.types.ty(ty).name.clone(), Some(ty))
    }

    fn type_ref_of_var(&self, var: VarId) -> TypeRef {
        match self.types.variable(var).ty {
            Some(ty) => self.type_ref(ty),
            None => TypeRef::new("Object", None),
        }
    }

    fn var_decl(&self, fragments: &[(VarId, Option<ExprId>)]) -> VarDecl {
        let ty = fragments
            .first()
            .map(|(var, _)| self.type_ref_of_var(*var))
            .unwrap_or_else(|| TypeRef::new("Object", None));
        let fragments = fragments
            .iter()
            .map(|(var, initializer)| VarFragment {
                name: self.types.variable(*var).name.clone(),
                binding: Some(*var),
                initializer: *initializer,
                name_range: TextRange::default(),
                range: TextRange::default(),
            })
            .collect();
        VarDecl { ty, fragments }
    }

    fn expr(&mut self, expr: Expr, ty: Option<TypeId>) -> ExprId {
        self.unit.alloc_expr(expr, ty)
    }

    fn stmt(&mut self, stmt: Stmt) -> StmtId {
        self.unit.alloc_stmt(stmt)
    }

    // Expressions.

    pub fn name(&mut self, var: VarId) -> ExprId {
        let binding = self.types.variable(var);
        let (name, ty) = (binding.name.clone(), binding.ty);
        self.expr(
            Expr::Name {
                name,
                binding: Some(var),
                range: TextRange::default(),
            },
            ty,
        )
    }

    /// A simple name the host could not resolve.
    pub fn unresolved_name(&mut self, name: &str) -> ExprId {
        self.expr(
            Expr::Name {
                name: Name::new(name),
                binding: None,
                range: TextRange::default(),
            },
            None,
        )
    }

    pub fn field_access(&mut self, receiver: ExprId, field: VarId) -> ExprId {
        let binding = self.types.variable(field);
        let (name, ty) = (binding.name.clone(), binding.ty);
        self.expr(
            Expr::FieldAccess {
                receiver,
                name,
                field: Some(field),
                name_range: TextRange::default(),
                range: TextRange::default(),
            },
            ty,
        )
    }

    pub fn this(&mut self, ty: Option<TypeId>) -> ExprId {
        self.expr(
            Expr::This {
                range: TextRange::default(),
            },
            ty,
        )
    }

    /// Call a resolved method. The static type is the method's return type unless
    /// `return_type` overrides it (e.g. `list.iterator()` on a `List<String>` returns
    /// `Iterator<String>` while the declared method returns `Iterator<E>`).
    pub fn call(
        &mut self,
        receiver: Option<ExprId>,
        method: MethodId,
        args: Vec<ExprId>,
        return_type: Option<TypeId>,
    ) -> ExprId {
        let binding = self.types.method(method);
        let name = binding.name.clone();
        let ty = return_type.or(binding.return_type);
        self.expr(
            Expr::MethodCall {
                receiver,
                name,
                args,
                method: Some(method),
                name_range: TextRange::default(),
                range: TextRange::default(),
            },
            ty,
        )
    }

    pub fn unresolved_call(
        &mut self,
        receiver: Option<ExprId>,
        name: &str,
        args: Vec<ExprId>,
    ) -> ExprId {
        self.expr(
            Expr::MethodCall {
                receiver,
                name: Name::new(name),
                args,
                method: None,
                name_range: TextRange::default(),
                range: TextRange::default(),
            },
            None,
        )
    }

    pub fn new_object(&mut self, ty: TypeId, args: Vec<ExprId>) -> ExprId {
        let ty_ref = self.type_ref(ty);
        self.expr(
            Expr::New {
                ty: ty_ref,
                args,
                range: TextRange::default(),
            },
            Some(ty),
        )
    }

    pub fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.assign_op(AssignOp::Assign, lhs, rhs)
    }

    pub fn assign_op(&mut self, op: AssignOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let ty = self.unit.expr_type(lhs);
        self.expr(
            Expr::Assignment {
                op,
                lhs,
                rhs,
                range: TextRange::default(),
            },
            ty,
        )
    }

    /// `Type a = x, b = y` in expression position (a `for` initializer).
    pub fn var_decl_expr(&mut self, fragments: &[(VarId, Option<ExprId>)]) -> ExprId {
        let decl = self.var_decl(fragments);
        self.expr(
            Expr::VarDecl {
                decl,
                range: TextRange::default(),
            },
            None,
        )
    }

    pub fn null(&mut self) -> ExprId {
        self.literal(LiteralKind::Null, "null", None)
    }

    pub fn literal(&mut self, kind: LiteralKind, value: &str, ty: Option<TypeId>) -> ExprId {
        self.expr(
            Expr::Literal {
                kind,
                value: value.to_string(),
                range: TextRange::default(),
            },
            ty,
        )
    }

    pub fn cast(&mut self, ty: TypeId, expr: ExprId) -> ExprId {
        let ty_ref = self.type_ref(ty);
        self.expr(
            Expr::Cast {
                ty: ty_ref,
                expr,
                range: TextRange::default(),
            },
            Some(ty),
        )
    }

    pub fn paren(&mut self, expr: ExprId) -> ExprId {
        let ty = self.unit.expr_type(expr);
        self.expr(
            Expr::Paren {
                expr,
                range: TextRange::default(),
            },
            ty,
        )
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        ty: Option<TypeId>,
    ) -> ExprId {
        self.expr(
            Expr::Binary {
                op,
                lhs,
                rhs,
                range: TextRange::default(),
            },
            ty,
        )
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        let ty = self.unit.expr_type(operand);
        self.expr(
            Expr::Unary {
                op,
                operand,
                range: TextRange::default(),
            },
            ty,
        )
    }

    // Statements.

    pub fn local(&mut self, var: VarId, initializer: Option<ExprId>) -> StmtId {
        self.locals(&[(var, initializer)])
    }

    /// `Type a = x, b;`: every fragment shares the first variable's declared type.
    pub fn locals(&mut self, fragments: &[(VarId, Option<ExprId>)]) -> StmtId {
        let decl = self.var_decl(fragments);
        self.stmt(Stmt::LocalVar {
            decl,
            range: TextRange::default(),
        })
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(Stmt::Expr {
            expr,
            range: TextRange::default(),
        })
    }

    pub fn block(&mut self, statements: Vec<StmtId>) -> StmtId {
        self.stmt(Stmt::Block {
            statements,
            range: TextRange::default(),
        })
    }

    pub fn if_stmt(
        &mut self,
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    ) -> StmtId {
        self.stmt(Stmt::If {
            condition,
            then_branch,
            else_branch,
            range: TextRange::default(),
        })
    }

    pub fn while_loop(&mut self, condition: ExprId, body: StmtId) -> StmtId {
        self.stmt(Stmt::While {
            condition,
            body,
            range: TextRange::default(),
        })
    }

    pub fn for_loop(
        &mut self,
        initializers: Vec<ExprId>,
        condition: Option<ExprId>,
        updaters: Vec<ExprId>,
        body: StmtId,
    ) -> StmtId {
        self.stmt(Stmt::For {
            initializers,
            condition,
            updaters,
            body,
            range: TextRange::default(),
        })
    }

    pub fn enhanced_for(&mut self, var: VarId, iterable: ExprId, body: StmtId) -> StmtId {
        let parameter = Param {
            ty: self.type_ref_of_var(var),
            name: self.types.variable(var).name.clone(),
            binding: Some(var),
            name_range: TextRange::default(),
            range: TextRange::default(),
        };
        self.stmt(Stmt::EnhancedFor {
            parameter,
            iterable,
            body,
            range: TextRange::default(),
        })
    }

    pub fn ret(&mut self, expr: Option<ExprId>) -> StmtId {
        self.stmt(Stmt::Return {
            expr,
            range: TextRange::default(),
        })
    }

    pub fn empty(&mut self) -> StmtId {
        self.stmt(Stmt::Empty {
            range: TextRange::default(),
        })
    }

    /// Render the unit and assign source ranges.
    pub fn finish(self) -> CompilationUnit {
        let mut unit = self.unit;
        print_unit(&mut unit);
        unit
    }
}
