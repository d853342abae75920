//! Constant folding with readonly-field and single-assignment-local
//! propagation.

use crate::value::{eval_binary, eval_cast, eval_unary};
use silica_ast::visit::{rewrite_expr, rewrite_stmt_exprs, walk_stmts};
use silica_ast::{AssignTarget, BinaryOp, Expr, ExprKind, Literal, Stmt, StmtKind, SyntaxTree};
use std::collections::HashMap;

/// Folds every constant expression in `tree` and returns the number of
/// rewrites performed.
pub fn fold_constants(tree: &mut SyntaxTree) -> usize {
    let mut changes = 0;
    let no_locals = HashMap::new();

    // Field initializers may refer to other readonly fields.
    loop {
        let fields = constant_fields(tree);
        let mut round = 0;
        for ty in &mut tree.types {
            for field in &mut ty.fields {
                if let Some(init) = &mut field.initializer {
                    rewrite_expr(init, &mut |e| round += fold_one(e, &fields, &no_locals));
                }
            }
        }
        changes += round;
        if round == 0 {
            break;
        }
    }

    let fields = constant_fields(tree);
    for ty in &mut tree.types {
        for method in &mut ty.methods {
            let Some(body) = &mut method.body else {
                continue;
            };
            loop {
                let locals = constant_locals(body);
                let mut round = 0;
                rewrite_stmt_exprs(body, &mut |e| round += fold_one(e, &fields, &locals));
                changes += round;
                if round == 0 {
                    break;
                }
            }
        }
    }
    changes
}

fn field_key(declaring_type: &str, name: &str) -> String {
    format!("{declaring_type}::{name}")
}

/// Readonly fields whose initializer is a literal.
fn constant_fields(tree: &SyntaxTree) -> HashMap<String, Literal> {
    let mut out = HashMap::new();
    for ty in &tree.types {
        for field in &ty.fields {
            if !field.is_readonly {
                continue;
            }
            if let Some(literal) = field.initializer.as_ref().and_then(Expr::as_literal) {
                out.insert(field_key(&ty.full_name, &field.name), *literal);
            }
        }
    }
    out
}

/// Locals declared once with a literal initializer and never assigned again.
fn constant_locals(body: &Stmt) -> HashMap<String, Literal> {
    let mut decls: HashMap<&str, (usize, Option<Literal>)> = HashMap::new();
    let mut reassigned: Vec<&str> = Vec::new();
    walk_stmts(body, &mut |stmt| match &stmt.kind {
        StmtKind::LocalDecl { name, ty, init } => {
            let entry = decls.entry(name.as_str()).or_insert((0, None));
            entry.0 += 1;
            entry.1 = if ty.is_array() {
                None
            } else {
                init.as_ref().and_then(Expr::as_literal).copied()
            };
        }
        StmtKind::Assign {
            target: AssignTarget::Local(name),
            ..
        } => reassigned.push(name),
        StmtKind::ParallelInvoke { index, results, .. } => {
            reassigned.push(index);
            if let Some(results) = results {
                reassigned.push(results);
            }
        }
        _ => {}
    });
    decls
        .into_iter()
        .filter(|(name, (count, _))| *count == 1 && !reassigned.contains(name))
        .filter_map(|(name, (_, literal))| literal.map(|l| (name.to_string(), l)))
        .collect()
}

/// Folds one node whose children are already folded. Returns 1 on a rewrite.
fn fold_one(
    expr: &mut Expr,
    fields: &HashMap<String, Literal>,
    locals: &HashMap<String, Literal>,
) -> usize {
    let folded = match &expr.kind {
        ExprKind::Local(name) => locals.get(name).copied(),
        ExprKind::Field(field) => fields
            .get(&field_key(&field.declaring_type, &field.name))
            .copied(),
        ExprKind::Unary { op, operand } => operand.as_literal().and_then(|l| eval_unary(*op, l)),
        ExprKind::Binary { op, lhs, rhs } => match (lhs.as_literal(), rhs.as_literal()) {
            (Some(a), Some(b)) => eval_binary(*op, a, b),
            (Some(Literal::Bool(false)), None) if *op == BinaryOp::LogicAnd => {
                Some(Literal::Bool(false))
            }
            (Some(Literal::Bool(true)), None) if *op == BinaryOp::LogicOr => {
                Some(Literal::Bool(true))
            }
            _ => None,
        },
        ExprKind::Cast { ty, operand } => operand.as_literal().and_then(|l| eval_cast(ty, l)),
        ExprKind::Conditional {
            condition,
            if_true,
            if_false,
        } => {
            if let Some(Literal::Bool(taken)) = condition.as_literal() {
                let chosen = if *taken { if_true } else { if_false };
                let replacement = (**chosen).clone();
                *expr = replacement;
                return 1;
            }
            None
        }
        _ => None,
    };
    match folded {
        Some(literal) => {
            expr.kind = ExprKind::Literal(literal);
            1
        }
        None => 0,
    }
}
