//! Renders a HIR unit to Java source and records every node's range in the output.

use jfix_core::TextRange;

use crate::{CompilationUnit, Expr, ExprId, LiteralKind, Param, Stmt, StmtId, TypeRef, UnaryOp, VarDecl};

const INDENT: &str = "    ";

/// Replace `unit.text` with a rendering of the unit and update all ranges to point into it.
pub fn print_unit(unit: &mut CompilationUnit) {
    let mut printer = Printer {
        unit: &mut *unit,
        out: String::new(),
    };
    printer.print_header();
    printer.print_types();
    let out = printer.out;
    unit.text = out;
}

struct Printer<'u> {
    unit: &'u mut CompilationUnit,
    out: String,
}

impl Printer<'_> {
    fn pos(&self) -> usize {
        self.out.len()
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str(INDENT);
        }
    }

    fn print_header(&mut self) {
        if let Some(mut package) = self.unit.package.take() {
            let start = self.pos();
            self.out.push_str(&format!("package {};", package.name));
            package.range = TextRange::new(start, self.pos());
            self.out.push_str("\n\n");
            self.unit.package = Some(package);
        }

        let mut imports = std::mem::take(&mut self.unit.imports);
        for import in &mut imports {
            let start = self.pos();
            self.out.push_str("import ");
            if import.is_static {
                self.out.push_str("static ");
            }
            self.out.push_str(&import.path);
            if import.is_on_demand {
                self.out.push_str(".*");
            }
            self.out.push(';');
            import.range = TextRange::new(start, self.pos());
            self.out.push('\n');
        }
        if !imports.is_empty() {
            self.out.push('\n');
        }
        self.unit.imports = imports;
    }

    fn print_types(&mut self) {
        let mut types = std::mem::take(&mut self.unit.types);
        for (idx, ty) in types.iter_mut().enumerate() {
            if idx > 0 {
                self.out.push('\n');
            }
            let start = self.pos();
            self.out.push_str(&format!("class {} {{\n", ty.name));

            let mut first = true;
            for field in &mut ty.fields {
                self.indent(1);
                let field_start = self.pos();
                self.print_var_decl(&mut field.decl);
                self.out.push(';');
                field.range = TextRange::new(field_start, self.pos());
                self.out.push('\n');
                first = false;
            }
            for method in &mut ty.methods {
                if !first {
                    self.out.push('\n');
                }
                first = false;
                self.indent(1);
                let method_start = self.pos();
                match &mut method.return_type {
                    Some(ty) => self.print_type_ref(ty),
                    None => self.out.push_str("void"),
                }
                self.out.push_str(&format!(" {}(", method.name));
                for (idx, param) in method.params.iter_mut().enumerate() {
                    if idx > 0 {
                        self.out.push_str(", ");
                    }
                    self.print_param(param);
                }
                self.out.push(')');
                match method.body {
                    Some(body) => {
                        self.out.push(' ');
                        self.print_stmt(body, 1);
                    }
                    None => self.out.push(';'),
                }
                method.range = TextRange::new(method_start, self.pos());
                self.out.push('\n');
            }

            self.out.push('}');
            ty.range = TextRange::new(start, self.pos());
            self.out.push('\n');
        }
        self.unit.types = types;
    }

    fn print_type_ref(&mut self, ty: &mut TypeRef) {
        let start = self.pos();
        self.out.push_str(&ty.text);
        ty.range = TextRange::new(start, self.pos());
    }

    fn print_param(&mut self, param: &mut Param) {
        let start = self.pos();
        self.print_type_ref(&mut param.ty);
        self.out.push(' ');
        let name_start = self.pos();
        self.out.push_str(&param.name);
        param.name_range = TextRange::new(name_start, self.pos());
        param.range = TextRange::new(start, self.pos());
    }

    fn print_var_decl(&mut self, decl: &mut VarDecl) {
        self.print_type_ref(&mut decl.ty);
        self.out.push(' ');
        for (idx, fragment) in decl.fragments.iter_mut().enumerate() {
            if idx > 0 {
                self.out.push_str(", ");
            }
            let start = self.pos();
            self.out.push_str(&fragment.name);
            fragment.name_range = TextRange::new(start, self.pos());
            if let Some(init) = fragment.initializer {
                self.out.push_str(" = ");
                self.print_expr(init);
            }
            fragment.range = TextRange::new(start, self.pos());
        }
    }

    /// Prints a statement at the current position; nested lines use `level + 1`.
    fn print_stmt(&mut self, id: StmtId, level: usize) {
        let mut stmt = self.unit.stmts[id].clone();
        let start = self.pos();
        match &mut stmt {
            Stmt::Block { statements, .. } => {
                self.out.push('{');
                for child in statements.iter() {
                    self.out.push('\n');
                    self.indent(level + 1);
                    self.print_stmt(*child, level + 1);
                }
                self.out.push('\n');
                self.indent(level);
                self.out.push('}');
            }
            Stmt::LocalVar { decl, .. } => {
                self.print_var_decl(decl);
                self.out.push(';');
            }
            Stmt::Expr { expr, .. } => {
                self.print_expr(*expr);
                self.out.push(';');
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.out.push_str("if (");
                self.print_expr(*condition);
                self.out.push_str(") ");
                self.print_body(*then_branch, level);
                if let Some(else_branch) = else_branch {
                    self.out.push_str(" else ");
                    self.print_body(*else_branch, level);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.out.push_str("while (");
                self.print_expr(*condition);
                self.out.push_str(") ");
                self.print_body(*body, level);
            }
            Stmt::For {
                initializers,
                condition,
                updaters,
                body,
                ..
            } => {
                self.out.push_str("for (");
                self.print_expr_list(initializers);
                self.out.push(';');
                if let Some(condition) = condition {
                    self.out.push(' ');
                    self.print_expr(*condition);
                }
                self.out.push(';');
                if !updaters.is_empty() {
                    self.out.push(' ');
                    self.print_expr_list(updaters);
                }
                self.out.push_str(") ");
                self.print_body(*body, level);
            }
            Stmt::EnhancedFor {
                parameter,
                iterable,
                body,
                ..
            } => {
                self.out.push_str("for (");
                self.print_param(parameter);
                self.out.push_str(" : ");
                self.print_expr(*iterable);
                self.out.push_str(") ");
                self.print_body(*body, level);
            }
            Stmt::Return { expr, .. } => {
                self.out.push_str("return");
                if let Some(expr) = expr {
                    self.out.push(' ');
                    self.print_expr(*expr);
                }
                self.out.push(';');
            }
            Stmt::Empty { .. } => self.out.push(';'),
        }
        *stmt.range_mut() = TextRange::new(start, self.pos());
        self.unit.stmts[id] = stmt;
    }

    fn print_body(&mut self, body: StmtId, level: usize) {
        if matches!(self.unit.stmts[body], Stmt::Block { .. }) {
            self.print_stmt(body, level);
        } else {
            self.out.push('\n');
            self.indent(level + 1);
            self.print_stmt(body, level + 1);
        }
    }

    fn print_expr_list(&mut self, exprs: &[ExprId]) {
        for (idx, expr) in exprs.iter().enumerate() {
            if idx > 0 {
                self.out.push_str(", ");
            }
            self.print_expr(*expr);
        }
    }

    fn print_expr(&mut self, id: ExprId) {
        let mut expr = self.unit.exprs[id].clone();
        let start = self.pos();
        match &mut expr {
            Expr::Name { name, .. } => self.out.push_str(name),
            Expr::FieldAccess {
                receiver,
                name,
                name_range,
                ..
            } => {
                self.print_expr(*receiver);
                self.out.push('.');
                let name_start = self.pos();
                self.out.push_str(name);
                *name_range = TextRange::new(name_start, self.pos());
            }
            Expr::MethodCall {
                receiver,
                name,
                args,
                name_range,
                ..
            } => {
                if let Some(receiver) = receiver {
                    self.print_expr(*receiver);
                    self.out.push('.');
                }
                let name_start = self.pos();
                self.out.push_str(name);
                *name_range = TextRange::new(name_start, self.pos());
                self.out.push('(');
                self.print_expr_list(args);
                self.out.push(')');
            }
            Expr::New { ty, args, .. } => {
                self.out.push_str("new ");
                self.print_type_ref(ty);
                self.out.push('(');
                self.print_expr_list(args);
                self.out.push(')');
            }
            Expr::Assignment { op, lhs, rhs, .. } => {
                self.print_expr(*lhs);
                self.out.push_str(&format!(" {} ", op.as_str()));
                self.print_expr(*rhs);
            }
            Expr::VarDecl { decl, .. } => self.print_var_decl(decl),
            Expr::Literal { kind, value, .. } => match kind {
                LiteralKind::String => self.out.push_str(&format!("\"{value}\"")),
                LiteralKind::Null | LiteralKind::Bool | LiteralKind::Int => self.out.push_str(value),
            },
            Expr::Cast { ty, expr, .. } => {
                self.out.push('(');
                self.print_type_ref(ty);
                self.out.push_str(") ");
                self.print_expr(*expr);
            }
            Expr::Paren { expr, .. } => {
                self.out.push('(');
                self.print_expr(*expr);
                self.out.push(')');
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                self.print_expr(*lhs);
                self.out.push_str(&format!(" {} ", op.as_str()));
                self.print_expr(*rhs);
            }
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => {
                    self.out.push('!');
                    self.print_expr(*operand);
                }
                UnaryOp::Neg => {
                    self.out.push('-');
                    self.print_expr(*operand);
                }
                UnaryOp::PreIncrement => {
                    self.out.push_str("++");
                    self.print_expr(*operand);
                }
                UnaryOp::PreDecrement => {
                    self.out.push_str("--");
                    self.print_expr(*operand);
                }
                UnaryOp::PostIncrement => {
                    self.print_expr(*operand);
                    self.out.push_str("++");
                }
                UnaryOp::PostDecrement => {
                    self.print_expr(*operand);
                    self.out.push_str("--");
                }
            },
            Expr::This { .. } => self.out.push_str("this"),
            Expr::Missing { .. } => {}
        }
        *expr.range_mut() = TextRange::new(start, self.pos());
        self.unit.exprs[id] = expr;
    }
}
