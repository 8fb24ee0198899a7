//! Parser tests for MyPL syntax

use crate::ast::{BinOp, Expr, Item, Program, Stmt, Type, UnOp};
use crate::lexer::tokenize;
use crate::parser::parse;

/// Helper to parse a program and return the AST
fn parse_program(source: &str) -> crate::Result<Program> {
    let tokens = tokenize(source)?;
    parse("test.mypl", source, tokens)
}

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Program {
    parse_program(source).expect("Parse should succeed")
}

/// Helper to check if parsing fails
fn parse_fails(source: &str) -> bool {
    parse_program(source).is_err()
}

/// Parse `fun int main() return <expr> end` and hand back the returned expression
fn parse_return_expr(expr: &str) -> Expr {
    let prog = parse_ok(&format!("fun int main() return {expr} end"));
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    let Stmt::Return(e) = &f.body[0].node else {
        panic!("Expected Return");
    };
    e.node.clone()
}

// ============================================
// Declarations
// ============================================

#[test]
fn test_parse_empty_program() {
    assert!(parse_ok("").items.is_empty());
}

#[test]
fn test_parse_function_signature() {
    let prog = parse_ok("fun double avg(a: int, b: Node) return 1.0 end");
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    assert_eq!(f.name.node, "avg");
    assert_eq!(f.ret_ty.node, Type::Double);
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.params[1].ty.node, Type::Named("Node".to_string()));
}

#[test]
fn test_parse_nil_return_type() {
    let prog = parse_ok("fun nil show() print(\"x\") end");
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    assert_eq!(f.ret_ty.node, Type::Nil);
    assert!(matches!(f.body[0].node, Stmt::Call { .. }));
}

#[test]
fn test_parse_type_decl() {
    let prog = parse_ok("type Pair var a: int = 0 var b = 2.5 var next: Pair = nil end");
    let Item::TypeDecl(t) = &prog.items[0] else {
        panic!("Expected TypeDecl");
    };
    assert_eq!(t.name.node, "Pair");
    assert_eq!(t.fields.len(), 3);
    assert!(t.fields[1].ty.is_none());
    assert_eq!(
        t.fields[2].ty.as_ref().map(|ty| ty.node.clone()),
        Some(Type::Named("Pair".to_string()))
    );
}

#[test]
fn test_parse_missing_end_fails() {
    assert!(parse_fails("fun int main() return 0"));
}

#[test]
fn test_parse_missing_return_type_fails() {
    assert!(parse_fails("fun main() return 0 end"));
}

// ============================================
// Statements
// ============================================

#[test]
fn test_parse_if_elseif_else() {
    let prog = parse_ok(
        "fun int main()
           if x < 1 then return 1
           elseif x < 2 then return 2
           elseif x < 3 then return 3
           else return 4
           end
         end",
    );
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    let Stmt::If { branches, else_body } = &f.body[0].node else {
        panic!("Expected If");
    };
    assert_eq!(branches.len(), 3);
    assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_parse_loops() {
    let prog = parse_ok(
        "fun int main()
           var i = 0
           while i < 10 do i = i + 1 end
           for j = 1 to 5 do i = i - j end
           return i
         end",
    );
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    assert!(matches!(f.body[1].node, Stmt::While { .. }));
    let Stmt::For { var, .. } = &f.body[2].node else {
        panic!("Expected For");
    };
    assert_eq!(var.node, "j");
}

#[test]
fn test_parse_dotted_assignment() {
    let prog = parse_ok("fun int main() p.next.value = 3 return 0 end");
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    let Stmt::Assign { target, .. } = &f.body[0].node else {
        panic!("Expected Assign");
    };
    let names: Vec<_> = target.iter().map(|s| s.node.as_str()).collect();
    assert_eq!(names, vec!["p", "next", "value"]);
}

#[test]
fn test_parse_statement_spans() {
    let source = "fun int main() var x = 1 return x end";
    let prog = parse_ok(source);
    let Item::FunDecl(f) = &prog.items[0] else {
        panic!("Expected FunDecl");
    };
    let span = f.body[0].span;
    assert_eq!(&source[span.start..span.end], "var x = 1");
}

// ============================================
// Expressions
// ============================================

#[test]
fn test_parse_binary_is_right_nested() {
    let Expr::Binary { left, op, right } = parse_return_expr("a - b - c") else {
        panic!("Expected Binary");
    };
    assert_eq!(op, BinOp::Sub);
    assert!(matches!(left.node, Expr::Path(_)));
    assert!(matches!(right.node, Expr::Binary { op: BinOp::Sub, .. }));
}

#[test]
fn test_parse_no_precedence() {
    // `*` does not bind tighter than `+`
    let Expr::Binary { op, right, .. } = parse_return_expr("1 * 2 + 3") else {
        panic!("Expected Binary");
    };
    assert_eq!(op, BinOp::Mul);
    assert!(matches!(right.node, Expr::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_parse_parens_group() {
    let Expr::Binary { left, op, .. } = parse_return_expr("(1 + 2) * 3") else {
        panic!("Expected Binary");
    };
    assert_eq!(op, BinOp::Mul);
    assert!(matches!(left.node, Expr::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_parse_prefix_covers_rest() {
    let Expr::Unary { op, expr } = parse_return_expr("not a and b") else {
        panic!("Expected Unary");
    };
    assert_eq!(op, UnOp::Not);
    assert!(matches!(expr.node, Expr::Binary { op: BinOp::And, .. }));

    assert!(matches!(
        parse_return_expr("neg 5"),
        Expr::Unary { op: UnOp::Neg, .. }
    ));
    assert!(matches!(
        parse_return_expr("~m"),
        Expr::Unary { op: UnOp::Transpose, .. }
    ));
}

#[test]
fn test_parse_matrix_literal() {
    let Expr::Matrix(rows) = parse_return_expr("[1, 2; 3, 4; 5, 6]") else {
        panic!("Expected Matrix");
    };
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == 2));
}

#[test]
fn test_parse_elementwise_operators() {
    for (src, expected) in [
        ("a .* b", BinOp::ElemMul),
        ("a ./ b", BinOp::ElemDiv),
        ("a .^ b", BinOp::ElemPow),
        ("a ^ 2", BinOp::Pow),
    ] {
        let Expr::Binary { op, .. } = parse_return_expr(src) else {
            panic!("Expected Binary for {src}");
        };
        assert_eq!(op, expected);
    }
}

#[test]
fn test_parse_call_and_new() {
    let Expr::Call { func, args } = parse_return_expr("m_get(m, 0, neg 1)") else {
        panic!("Expected Call");
    };
    assert_eq!(func.node, "m_get");
    assert_eq!(args.len(), 3);

    let Expr::New(name) = parse_return_expr("new Node") else {
        panic!("Expected New");
    };
    assert_eq!(name.node, "Node");
}

#[test]
fn test_parse_literals() {
    assert!(matches!(parse_return_expr("42"), Expr::IntLit(s) if s == "42"));
    assert!(matches!(parse_return_expr("2.50"), Expr::DoubleLit(s) if s == "2.50"));
    assert!(matches!(parse_return_expr("'c'"), Expr::CharLit('c')));
    assert!(matches!(parse_return_expr("\"hi\""), Expr::StringLit(s) if s == "hi"));
    assert!(matches!(parse_return_expr("true"), Expr::BoolLit(true)));
    assert!(matches!(parse_return_expr("nil"), Expr::Nil));
}

#[test]
fn test_parse_dangling_operator_fails() {
    assert!(parse_fails("fun int main() return 1 + end"));
}

#[test]
fn test_parse_error_reports_span() {
    let err = parse_program("fun int main() return ) end").unwrap_err();
    let span = err.span().expect("parser errors carry a span");
    assert_eq!(span.start, 22);
}
