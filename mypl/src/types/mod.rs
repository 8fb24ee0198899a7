//! Type checking
//!
//! Rejects every program the interpreter is allowed to assume well-typed.
//! Only a handful of checks remain dynamic: matrix shapes and bounds,
//! numeric literal range, string indices, and division by zero.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{CompileError, Result};
use crate::util::{find_similar_name, format_suggestion_hint};

/// How a parameter accepts arguments
#[derive(Debug, Clone)]
enum ParamKind {
    /// The given type, or nil
    Exact(Type),
    /// Any type (`print`)
    Any,
    /// int or double, widened to double (`m_singleton`)
    Numeric,
}

#[derive(Debug, Clone)]
struct Signature {
    params: Vec<ParamKind>,
    ret: Type,
}

/// Static checker for MyPL programs
#[derive(Debug)]
pub struct TypeChecker {
    /// Built-in and user function signatures
    functions: HashMap<String, Signature>,
    /// Record name -> field name -> field type
    records: HashMap<String, HashMap<String, Type>>,
    /// Local scopes, innermost last
    scopes: Vec<HashMap<String, Type>>,
    /// Declared return type of the function being checked
    ret_ty: Type,
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut checker = Self {
            functions: HashMap::new(),
            records: HashMap::new(),
            scopes: Vec::new(),
            ret_ty: Type::Nil,
        };
        checker.register_builtins();
        checker
    }

    fn register_builtins(&mut self) {
        use ParamKind::{Any, Exact, Numeric};

        let builtins = [
            ("print", vec![Any], Type::Nil),
            ("read", vec![], Type::String),
            ("length", vec![Exact(Type::String)], Type::Int),
            ("get", vec![Exact(Type::Int), Exact(Type::String)], Type::Char),
            ("stoi", vec![Exact(Type::String)], Type::Int),
            ("stod", vec![Exact(Type::String)], Type::Double),
            ("itos", vec![Exact(Type::Int)], Type::String),
            ("dtos", vec![Exact(Type::Double)], Type::String),
            ("m_print", vec![Exact(Type::Matrix)], Type::Nil),
            (
                "m_get",
                vec![Exact(Type::Matrix), Exact(Type::Int), Exact(Type::Int)],
                Type::Double,
            ),
            (
                "m_singleton",
                vec![Numeric, Exact(Type::Int), Exact(Type::Int)],
                Type::Matrix,
            ),
        ];
        for (name, params, ret) in builtins {
            self.functions
                .insert(name.to_string(), Signature { params, ret });
        }
    }

    /// Type check a program
    pub fn check_program(&mut self, program: &Program) -> Result<()> {
        // First pass: record names, so declarations may refer to each other in any order
        for decl in program.type_decls() {
            if self.records.contains_key(&decl.name.node) {
                return Err(CompileError::type_error(
                    format!("type '{}' is already declared", decl.name.node),
                    decl.name.span,
                ));
            }
            self.records.insert(decl.name.node.clone(), HashMap::new());
        }

        // Second pass: function signatures
        for decl in program.functions() {
            self.register_function(decl)?;
        }

        // Third pass: field types, inferred from their initializers
        for decl in program.type_decls() {
            self.check_type_decl(decl)?;
        }

        // Finally: function bodies
        for decl in program.functions() {
            self.check_function(decl)?;
        }

        match self.functions.get("main") {
            Some(sig) if sig.ret == Type::Int && sig.params.is_empty() => Ok(()),
            Some(_) => {
                let span = program
                    .functions()
                    .find(|f| f.name.node == "main")
                    .map_or(Span::new(0, 0), |f| f.name.span);
                Err(CompileError::type_error(
                    "main must take no parameters and return int",
                    span,
                ))
            }
            None => Err(CompileError::type_error(
                "program has no main function",
                Span::new(0, 0),
            )),
        }
    }

    fn register_function(&mut self, decl: &FunDecl) -> Result<()> {
        let name = &decl.name.node;
        if self.functions.contains_key(name) {
            return Err(CompileError::type_error(
                format!("function '{name}' is already declared"),
                decl.name.span,
            ));
        }
        self.check_type_exists(&decl.ret_ty)?;

        let mut params = Vec::with_capacity(decl.params.len());
        for (i, param) in decl.params.iter().enumerate() {
            self.check_type_exists(&param.ty)?;
            if decl.params[..i]
                .iter()
                .any(|p| p.name.node == param.name.node)
            {
                return Err(CompileError::type_error(
                    format!("duplicate parameter '{}' in '{name}'", param.name.node),
                    param.name.span,
                ));
            }
            params.push(ParamKind::Exact(param.ty.node.clone()));
        }

        self.functions.insert(
            name.clone(),
            Signature {
                params,
                ret: decl.ret_ty.node.clone(),
            },
        );
        Ok(())
    }

    fn check_type_decl(&mut self, decl: &TypeDecl) -> Result<()> {
        self.scopes = vec![HashMap::new()];
        let mut fields = HashMap::new();
        for field in &decl.fields {
            let ty = self.check_var_decl(field)?;
            fields.insert(field.name.node.clone(), ty);
        }
        self.scopes.clear();
        self.records.insert(decl.name.node.clone(), fields);
        Ok(())
    }

    fn check_function(&mut self, decl: &FunDecl) -> Result<()> {
        let params = decl
            .params
            .iter()
            .map(|p| (p.name.node.clone(), p.ty.node.clone()))
            .collect();
        self.scopes = vec![params];
        self.ret_ty = decl.ret_ty.node.clone();
        self.check_block(&decl.body)?;
        self.scopes.clear();
        Ok(())
    }

    fn check_type_exists(&self, ty: &Spanned<Type>) -> Result<()> {
        match &ty.node {
            Type::Named(name) if !self.records.contains_key(name) => {
                let suggestion =
                    find_similar_name(name, self.records.keys().map(String::as_str), 2);
                Err(CompileError::type_error(
                    format!("unknown type '{name}'{}", format_suggestion_hint(suggestion)),
                    ty.span,
                ))
            }
            _ => Ok(()),
        }
    }

    // ============================================
    // Scopes
    // ============================================

    fn declare(&mut self, name: &Spanned<String>, ty: Type) -> Result<()> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| CompileError::type_error("declaration outside any scope", name.span))?;
        if scope.contains_key(&name.node) {
            return Err(CompileError::type_error(
                format!("variable '{}' redefined in current scope", name.node),
                name.span,
            ));
        }
        scope.insert(name.node.clone(), ty);
        Ok(())
    }

    fn lookup(&self, name: &Spanned<String>) -> Result<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name.node))
            .cloned()
            .ok_or_else(|| {
                let suggestion = find_similar_name(
                    &name.node,
                    self.scopes.iter().flat_map(|s| s.keys().map(String::as_str)),
                    2,
                );
                CompileError::type_error(
                    format!(
                        "undefined variable '{}'{}",
                        name.node,
                        format_suggestion_hint(suggestion)
                    ),
                    name.span,
                )
            })
    }

    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    // ============================================
    // Statements
    // ============================================

    fn check_block(&mut self, stmts: &[Spanned<Stmt>]) -> Result<()> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<()> {
        match &stmt.node {
            Stmt::VarDecl(decl) => {
                self.check_var_decl(decl)?;
            }

            Stmt::Assign { target, value } => {
                let target_ty = self.path_type(target)?;
                let value_ty = self.check_expr(value)?;
                if value_ty != target_ty && value_ty != Type::Nil {
                    return Err(CompileError::type_error(
                        format!("cannot assign {value_ty} to {target_ty}"),
                        value.span,
                    ));
                }
            }

            Stmt::Call { func, args } => {
                self.check_call(func, args)?;
            }

            Stmt::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    self.expect_type(&branch.cond, Type::Bool)?;
                    self.with_scope(|tc| tc.check_block(&branch.body))?;
                }
                if let Some(body) = else_body {
                    self.with_scope(|tc| tc.check_block(body))?;
                }
            }

            Stmt::While { cond, body } => {
                self.expect_type(cond, Type::Bool)?;
                self.with_scope(|tc| tc.check_block(body))?;
            }

            Stmt::For {
                var,
                start,
                end,
                body,
            } => {
                self.with_scope(|tc| {
                    tc.declare(var, Type::Int)?;
                    tc.expect_type(start, Type::Int)?;
                    tc.expect_type(end, Type::Int)?;
                    tc.check_block(body)
                })?;
            }

            Stmt::Return(expr) => {
                let ty = self.check_expr(expr)?;
                if ty != Type::Nil && ty != self.ret_ty {
                    return Err(CompileError::type_error(
                        format!("expected return type {}, found {ty}", self.ret_ty),
                        expr.span,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Declare a variable and return its type
    fn check_var_decl(&mut self, decl: &VarDecl) -> Result<Type> {
        let init_ty = self.check_expr(&decl.init)?;
        let ty = match &decl.ty {
            Some(declared) => {
                self.check_type_exists(declared)?;
                if init_ty != declared.node && init_ty != Type::Nil {
                    return Err(CompileError::type_error(
                        format!(
                            "variable '{}' declared {} but initialized with {init_ty}",
                            decl.name.node, declared.node
                        ),
                        decl.init.span,
                    ));
                }
                declared.node.clone()
            }
            None => init_ty,
        };
        self.declare(&decl.name, ty.clone())?;
        Ok(ty)
    }

    fn expect_type(&mut self, expr: &Spanned<Expr>, expected: Type) -> Result<()> {
        let ty = self.check_expr(expr)?;
        if ty != expected {
            return Err(CompileError::type_error(
                format!("expected {expected}, found {ty}"),
                expr.span,
            ));
        }
        Ok(())
    }

    // ============================================
    // Expressions
    // ============================================

    fn check_expr(&mut self, expr: &Spanned<Expr>) -> Result<Type> {
        match &expr.node {
            Expr::IntLit(_) => Ok(Type::Int),
            Expr::DoubleLit(_) => Ok(Type::Double),
            Expr::StringLit(_) => Ok(Type::String),
            Expr::CharLit(_) => Ok(Type::Char),
            Expr::BoolLit(_) => Ok(Type::Bool),
            Expr::Nil => Ok(Type::Nil),

            Expr::Path(path) => self.path_type(path),

            Expr::New(name) => {
                let ty = Spanned::new(Type::Named(name.node.clone()), name.span);
                self.check_type_exists(&ty)?;
                Ok(ty.node)
            }

            Expr::Call { func, args } => self.check_call(func, args),

            Expr::Unary { op, expr: inner } => {
                let ty = self.check_expr(inner)?;
                let ok = match op {
                    UnOp::Not => ty == Type::Bool,
                    UnOp::Neg => ty.is_numeric(),
                    UnOp::Transpose => ty == Type::Matrix,
                };
                if !ok {
                    return Err(CompileError::type_error(
                        format!("operator '{op}' cannot be applied to {ty}"),
                        expr.span,
                    ));
                }
                Ok(ty)
            }

            Expr::Binary { left, op, right } => {
                let l = self.check_expr(left)?;
                let r = self.check_expr(right)?;
                binary_type(*op, &l, &r).ok_or_else(|| {
                    CompileError::type_error(
                        format!("operator '{op}' cannot be applied to {l} and {r}"),
                        expr.span,
                    )
                })
            }

            Expr::Matrix(rows) => {
                for elem in rows.iter().flatten() {
                    let ty = self.check_expr(elem)?;
                    if !ty.is_numeric() {
                        return Err(CompileError::type_error(
                            format!("matrix entries must be numeric, found {ty}"),
                            elem.span,
                        ));
                    }
                }
                Ok(Type::Matrix)
            }
        }
    }

    fn path_type(&self, path: &[Spanned<String>]) -> Result<Type> {
        let Some((root, fields)) = path.split_first() else {
            return Err(CompileError::type_error("empty path", Span::new(0, 0)));
        };
        let mut ty = self.lookup(root)?;
        for field in fields {
            let Type::Named(record) = &ty else {
                return Err(CompileError::type_error(
                    format!("cannot access field '{}' of {ty}", field.node),
                    field.span,
                ));
            };
            let record_fields = self.records.get(record).ok_or_else(|| {
                CompileError::type_error(format!("unknown type '{record}'"), field.span)
            })?;
            ty = match record_fields.get(&field.node) {
                Some(t) => t.clone(),
                None => {
                    let suggestion =
                        find_similar_name(&field.node, record_fields.keys().map(String::as_str), 2);
                    return Err(CompileError::type_error(
                        format!(
                            "type '{record}' has no field '{}'{}",
                            field.node,
                            format_suggestion_hint(suggestion)
                        ),
                        field.span,
                    ));
                }
            };
        }
        Ok(ty)
    }

    fn check_call(&mut self, func: &Spanned<String>, args: &[Spanned<Expr>]) -> Result<Type> {
        let Some(sig) = self.functions.get(&func.node).cloned() else {
            let suggestion =
                find_similar_name(&func.node, self.functions.keys().map(String::as_str), 2);
            return Err(CompileError::type_error(
                format!(
                    "undefined function '{}'{}",
                    func.node,
                    format_suggestion_hint(suggestion)
                ),
                func.span,
            ));
        };

        if sig.params.len() != args.len() {
            return Err(CompileError::type_error(
                format!(
                    "function '{}' expects {} argument(s), got {}",
                    func.node,
                    sig.params.len(),
                    args.len()
                ),
                func.span,
            ));
        }

        for (param, arg) in sig.params.iter().zip(args) {
            let ty = self.check_expr(arg)?;
            let ok = match param {
                ParamKind::Any => true,
                ParamKind::Numeric => ty.is_numeric() || ty == Type::Nil,
                ParamKind::Exact(expected) => ty == *expected || ty == Type::Nil,
            };
            if !ok {
                return Err(CompileError::type_error(
                    format!("argument of type {ty} does not match parameter of '{}'", func.node),
                    arg.span,
                ));
            }
        }
        Ok(sig.ret)
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Result type of `l op r`, or `None` when the operator does not apply
fn binary_type(op: BinOp, l: &Type, r: &Type) -> Option<Type> {
    let is_text = |t: &Type| matches!(t, Type::String | Type::Char);

    match op {
        BinOp::Add if l == &Type::Nil && r == &Type::Nil => Some(Type::Nil),
        BinOp::Add if l == &Type::Nil && is_text(r) => Some(r.clone()),
        BinOp::Add if is_text(l) && r == &Type::Nil => Some(l.clone()),
        BinOp::Add if is_text(l) && is_text(r) => Some(Type::String),

        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div
            if l == r && l.is_numeric() =>
        {
            Some(l.clone())
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul if l == &Type::Matrix && r == &Type::Matrix => {
            Some(Type::Matrix)
        }
        BinOp::Mul if (l == &Type::Matrix && r.is_numeric()) || (l.is_numeric() && r == &Type::Matrix) => {
            Some(Type::Matrix)
        }
        BinOp::Div if l == &Type::Matrix && r.is_numeric() => Some(Type::Matrix),

        BinOp::Mod if r == &Type::Int && matches!(l, Type::Int | Type::Matrix) => Some(l.clone()),
        BinOp::Pow if r == &Type::Int && matches!(l, Type::Int | Type::Double | Type::Matrix) => {
            Some(l.clone())
        }
        BinOp::ElemMul | BinOp::ElemDiv | BinOp::ElemPow
            if l == &Type::Matrix && r == &Type::Matrix =>
        {
            Some(Type::Matrix)
        }

        BinOp::And | BinOp::Or if l == &Type::Bool && r == &Type::Bool => Some(Type::Bool),

        BinOp::Eq | BinOp::Ne if l == &Type::Matrix || r == &Type::Matrix => None,
        BinOp::Eq | BinOp::Ne if l == r || l == &Type::Nil || r == &Type::Nil => Some(Type::Bool),

        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
            if l == r && matches!(l, Type::Int | Type::Double | Type::String | Type::Char) =>
        {
            Some(Type::Bool)
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn check(source: &str) -> Result<()> {
        let tokens = tokenize(source)?;
        let program = parse("test.mypl", source, tokens)?;
        TypeChecker::new().check_program(&program)
    }

    /// Check a body wrapped in `fun int main() ... return 0 end`
    fn check_main(body: &str) -> Result<()> {
        check(&format!("fun int main() {body} return 0 end"))
    }

    fn error_message(source: &str) -> String {
        check(source).unwrap_err().message().to_string()
    }

    #[test]
    fn test_minimal_program() {
        assert!(check("fun int main() return 0 end").is_ok());
    }

    #[test]
    fn test_main_required() {
        assert!(error_message("fun int helper() return 0 end").contains("no main"));
        assert!(check("fun nil main() return nil end").is_err());
        assert!(check("fun int main(x: int) return x end").is_err());
    }

    #[test]
    fn test_var_decl_inference_and_declared_type() {
        assert!(check_main("var x = 5 var y: int = x + 3").is_ok());
        assert!(check_main("var x: double = 5").is_err());
        assert!(check_main("var s: string = nil").is_ok());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert!(error_message("fun int main() var x = 1 var x = 2 return 0 end")
            .contains("redefined"));
        assert!(check_main("var x = 1 if true then var x = 2 end").is_ok());
    }

    #[test]
    fn test_undefined_variable_hint() {
        let msg = error_message("fun int main() var count = 1 return coutn end");
        assert!(msg.contains("did you mean `count`"));
    }

    #[test]
    fn test_assignment_compatibility() {
        assert!(check_main("var x = 1 x = 2").is_ok());
        assert!(check_main("var x = 1 x = \"a\"").is_err());
        assert!(check_main("var s = \"a\" s = nil").is_ok());
    }

    #[test]
    fn test_guards_must_be_bool() {
        assert!(check_main("if 1 then end").is_err());
        assert!(check_main("while nil do end").is_err());
        assert!(check_main("if 1 < 2 then elseif true then else end").is_ok());
    }

    #[test]
    fn test_for_loop_types() {
        assert!(check_main("var t = 0 for i = 1 to 10 do t = t + i end").is_ok());
        assert!(check_main("for i = 1.0 to 10 do end").is_err());
        assert!(check_main("for i = 1 to 10 do var i = 2 end").is_err());
    }

    #[test]
    fn test_return_types() {
        assert!(check("fun int f() return nil end fun int main() return f() end").is_ok());
        assert!(check("fun int f() return 1.5 end fun int main() return 0 end").is_err());
        assert!(check("fun nil f() return 1 end fun int main() return 0 end").is_err());
    }

    #[test]
    fn test_arithmetic_rules() {
        assert!(check_main("var a = 1 + 2").is_ok());
        assert!(check_main("var a = 1 + 2.0").is_err());
        assert!(check_main("var a = \"x\" + 'c'").is_ok());
        assert!(check_main("var a: string = 'c' + 'd'").is_ok());
        assert!(check_main("var a = nil + \"x\"").is_ok());
        assert!(check_main("var a = 7 % 2").is_ok());
        assert!(check_main("var a = 7.0 % 2.0").is_err());
        assert!(check_main("var a = 2 ^ 3 var b = 1.5 ^ 2").is_ok());
        assert!(check_main("var a = 2 ^ 1.5").is_err());
    }

    #[test]
    fn test_matrix_rules() {
        assert!(check_main("var m = [1, 2; 3, 4] var n = m * m var o = 2 * m var p = m / 2.0").is_ok());
        assert!(check_main("var m = [1, 2] var n = m .* m var o = m ./ m var p = m .^ m").is_ok());
        assert!(check_main("var m = [1, 2] var n = m % 3 var o = m ^ 2 var t = ~m").is_ok());
        assert!(check_main("var m = [1, 2] var n = 2.0 / m").is_err());
        assert!(check_main("var m = [1, 2] var b = m == m").is_err());
        assert!(check_main("var m = [1, 'a']").is_err());
    }

    #[test]
    fn test_comparison_rules() {
        assert!(check_main("var b = \"a\" < \"b\" var c = 'a' >= 'b'").is_ok());
        assert!(check_main("var b = true < false").is_err());
        assert!(check_main("var b = 1 == nil var c = nil != \"s\"").is_ok());
        assert!(check_main("var b = 1 == 1.0").is_err());
    }

    #[test]
    fn test_unary_rules() {
        assert!(check_main("var a = not true var b = neg 2.5 var c = ~[1]").is_ok());
        assert!(check_main("var a = not 1").is_err());
        assert!(check_main("var a = neg \"s\"").is_err());
    }

    #[test]
    fn test_records() {
        let src = "
            type Node var val = 0 var next: Node = nil end
            fun int main()
              var n = new Node
              n.next = new Node
              n.next.val = 3
              return n.next.val
            end";
        assert!(check(src).is_ok());

        let src = "
            type Node var val = 0 end
            fun int main() var n = new Node return n.vale end";
        assert!(error_message(src).contains("did you mean `val`"));

        assert!(check_main("var n = new Missing").is_err());
        assert!(check_main("var x = 1 var y = x.field").is_err());
    }

    #[test]
    fn test_record_equality() {
        let src = "
            type P var x = 0 end
            fun int main()
              var a = new P
              var b = a == nil
              var c = a != new P
              return 0
            end";
        assert!(check(src).is_ok());
    }

    #[test]
    fn test_forward_references() {
        let src = "
            fun int main() var b = new B return twice(b.a.x) end
            type B var a = new A end
            type A var x = 21 end
            fun int twice(n: int) return n * 2 end";
        assert!(check(src).is_ok());
    }

    #[test]
    fn test_field_initializers_see_earlier_fields() {
        assert!(check("type T var a = 1 var b = a + 1 end fun int main() return 0 end").is_ok());
        assert!(check("type T var b = a var a = 1 end fun int main() return 0 end").is_err());
    }

    #[test]
    fn test_duplicate_declarations() {
        assert!(check("type T var a = 1 end type T var b = 1 end fun int main() return 0 end")
            .is_err());
        assert!(check("fun int f() return 0 end fun int f() return 1 end fun int main() return 0 end")
            .is_err());
        assert!(check("fun nil print(s: string) end fun int main() return 0 end").is_err());
        assert!(check("fun int f(a: int, a: int) return a end fun int main() return 0 end")
            .is_err());
    }

    #[test]
    fn test_builtin_signatures() {
        assert!(check_main("print(1) print(\"s\") print([1]) var s: string = read()").is_ok());
        assert!(check_main("var n: int = length(\"abc\") var c: char = get(0, \"abc\")").is_ok());
        assert!(check_main("var a = stoi(\"1\") + 1 var b = stod(\"1\") + 1.0").is_ok());
        assert!(check_main("var s = itos(1) + dtos(2.0)").is_ok());
        assert!(check_main("var m = m_singleton(1, 2, 2) var d: double = m_get(m, 0, 0) m_print(m)").is_ok());
        assert!(check_main("var n = length(5)").is_err());
        assert!(check_main("var s = itos(nil)").is_ok());
        assert!(check_main("print(1, 2)").is_err());
    }

    #[test]
    fn test_call_user_function() {
        let src = "
            fun double avg(a: double, b: double) return (a + b) / 2.0 end
            fun int main() var x: double = avg(1.0, 2.0) return 0 end";
        assert!(check(src).is_ok());
        let src = "
            fun double avg(a: double, b: double) return (a + b) / 2.0 end
            fun int main() var x = avg(1, 2) return 0 end";
        assert!(check(src).is_err());
        assert!(error_message("fun int main() return mian() end").contains("undefined function"));
    }
}
