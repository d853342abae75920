//! Pre-order traversal helpers.

use crate::expr::Expr;
use crate::stmt::Stmt;

/// Calls `f` on `stmt` and every statement nested in it, parents first.
pub fn walk_stmts<'a>(stmt: &'a Stmt, f: &mut impl FnMut(&'a Stmt)) {
    f(stmt);
    for child in stmt.children() {
        walk_stmts(child, f);
    }
}

/// Calls `f` on `expr` and every subexpression, parents first.
pub fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    for child in expr.children() {
        walk_expr(child, f);
    }
}

/// Calls `f` on every expression anywhere under `stmt`.
pub fn walk_stmt_exprs<'a>(stmt: &'a Stmt, f: &mut impl FnMut(&'a Expr)) {
    walk_stmts(stmt, &mut |s| {
        for expr in s.exprs() {
            walk_expr(expr, f);
        }
    });
}

/// Rewrites every expression under `stmt` bottom-up: children are visited
/// before the expression that contains them.
pub fn rewrite_stmt_exprs(stmt: &mut Stmt, f: &mut impl FnMut(&mut Expr)) {
    for expr in stmt.exprs_mut() {
        rewrite_expr(expr, f);
    }
    for child in stmt.children_mut() {
        rewrite_stmt_exprs(child, f);
    }
}

/// Rewrites `expr` bottom-up.
pub fn rewrite_expr(expr: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    for child in expr.children_mut() {
        rewrite_expr(child, f);
    }
    f(expr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, ExprKind};
    use crate::ty::TypeRef;

    #[test]
    fn walks_all_exprs() {
        let stmt = Stmt::block(vec![
            Stmt::local("x", TypeRef::i32(), Some(Expr::int(1))),
            Stmt::assign(
                "x",
                Expr::binary(BinaryOp::Add, Expr::local("x"), Expr::int(2)),
            ),
        ]);
        let mut count = 0;
        walk_stmt_exprs(&stmt, &mut |_| count += 1);
        assert_eq!(count, 4);
    }

    #[test]
    fn rewrite_is_bottom_up() {
        let mut expr = Expr::binary(BinaryOp::Add, Expr::local("a"), Expr::local("b"));
        let mut order = Vec::new();
        rewrite_expr(&mut expr, &mut |e| {
            order.push(matches!(e.kind, ExprKind::Binary { .. }));
        });
        assert_eq!(order, vec![false, false, true]);
    }
}
