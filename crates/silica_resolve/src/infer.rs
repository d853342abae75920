//! Array-length inference from allocation sites, assignments, call
//! arguments and return values.

use crate::arrays::{field_array_key, member_array_key, return_array_key, ArraySizeTable};
use crate::error::ResolveError;
use silica_ast::visit::{rewrite_stmt_exprs, walk_stmt_exprs, walk_stmts};
use silica_ast::{AssignTarget, Expr, ExprKind, Literal, StmtKind, SyntaxTree, TypeIndex};

/// Full names of every method, indexed like the tree.
fn member_names(tree: &SyntaxTree) -> Vec<Vec<String>> {
    tree.types
        .iter()
        .map(|ty| ty.methods.iter().map(|m| ty.member_full_name(m)).collect())
        .collect()
}

struct Scope<'a> {
    member: &'a str,
    index: &'a TypeIndex,
    names: &'a [Vec<String>],
    table: &'a ArraySizeTable,
}

impl Scope<'_> {
    fn callee_name(&self, expr: &Expr) -> Option<&str> {
        let ExprKind::Call { target, .. } = &expr.kind else {
            return None;
        };
        let handle = self.index.resolve_call(target)?;
        Some(self.names[handle.type_pos as usize][handle.method_pos as usize].as_str())
    }

    /// Length of an array-valued expression, if known.
    fn length_of(&self, expr: &Expr) -> Option<u32> {
        match &expr.kind {
            ExprKind::NewArray { length, .. } => length
                .as_literal()
                .and_then(Literal::as_int)
                .and_then(|v| u32::try_from(v).ok()),
            ExprKind::Local(name) | ExprKind::Parameter(name) => {
                self.table.get(&member_array_key(self.member, name))
            }
            ExprKind::Field(field) => self
                .table
                .get(&field_array_key(&field.declaring_type, &field.name)),
            ExprKind::Call { .. } => self
                .callee_name(expr)
                .and_then(|callee| self.table.get(&return_array_key(callee))),
            ExprKind::Conditional {
                if_true, if_false, ..
            } => {
                let a = self.length_of(if_true)?;
                let b = self.length_of(if_false)?;
                (a == b).then_some(a)
            }
            ExprKind::Cast { operand, .. } => self.length_of(operand),
            _ => None,
        }
    }
}

/// Runs one inference sweep over `tree`, recording every length it can
/// derive. Returns the number of new entries.
pub fn infer_lengths(
    tree: &SyntaxTree,
    index: &TypeIndex,
    table: &mut ArraySizeTable,
) -> Result<usize, ResolveError> {
    let names = member_names(tree);
    let mut observed: Vec<(String, u32)> = Vec::new();

    for (type_pos, ty) in tree.types.iter().enumerate() {
        let type_scope = Scope {
            member: &ty.full_name,
            index,
            names: &names,
            table,
        };
        for field in &ty.fields {
            if let Some(length) = field.initializer.as_ref().and_then(|e| type_scope.length_of(e)) {
                observed.push((field_array_key(&ty.full_name, &field.name), length));
            }
        }

        for (method_pos, method) in ty.methods.iter().enumerate() {
            let Some(body) = &method.body else {
                continue;
            };
            let member = names[type_pos][method_pos].as_str();
            let scope = Scope {
                member,
                index,
                names: &names,
                table,
            };
            let mut observe = |key: String, length: Option<u32>| {
                if let Some(length) = length {
                    observed.push((key, length));
                }
            };

            walk_stmts(body, &mut |stmt| match &stmt.kind {
                StmtKind::LocalDecl {
                    name,
                    init: Some(init),
                    ..
                } => observe(member_array_key(member, name), scope.length_of(init)),
                StmtKind::Assign { target, value } => {
                    let key = match target {
                        AssignTarget::Local(name) | AssignTarget::Parameter(name) => {
                            member_array_key(member, name)
                        }
                        AssignTarget::Field(field) => {
                            field_array_key(&field.declaring_type, &field.name)
                        }
                    };
                    observe(key, scope.length_of(value));
                }
                StmtKind::Return(Some(value)) => {
                    observe(return_array_key(member), scope.length_of(value))
                }
                StmtKind::ParallelInvoke {
                    count,
                    results: Some(results),
                    ..
                } => observe(
                    member_array_key(member, results),
                    count
                        .as_literal()
                        .and_then(Literal::as_int)
                        .and_then(|v| u32::try_from(v).ok()),
                ),
                _ => {}
            });

            walk_stmt_exprs(body, &mut |expr| {
                let ExprKind::Call { target, args } = &expr.kind else {
                    return;
                };
                let Some(handle) = index.resolve_call(target) else {
                    return;
                };
                let callee = tree.method(handle);
                let callee_name = &names[handle.type_pos as usize][handle.method_pos as usize];
                for (param, arg) in callee.parameters.iter().zip(args) {
                    if param.ty.is_array() {
                        if let Some(length) = scope.length_of(arg) {
                            observed.push((member_array_key(callee_name, &param.name), length));
                        }
                    }
                }
            });
        }
    }

    let mut added = 0;
    for (key, length) in observed {
        if table.record(&key, length)? {
            log::debug!("inferred length {length} for `{key}`");
            added += 1;
        }
    }
    Ok(added)
}

/// Replaces `array.Length` reads of sized arrays with literals. Returns the
/// number of rewrites.
pub fn fold_array_lengths(tree: &mut SyntaxTree, index: &TypeIndex, table: &ArraySizeTable) -> usize {
    let names = member_names(tree);
    let mut changes = 0;
    for (type_pos, ty) in tree.types.iter_mut().enumerate() {
        for (method_pos, method) in ty.methods.iter_mut().enumerate() {
            let Some(body) = &mut method.body else {
                continue;
            };
            let scope = Scope {
                member: &names[type_pos][method_pos],
                index,
                names: &names,
                table,
            };
            rewrite_stmt_exprs(body, &mut |expr| {
                let ExprKind::ArrayLength(array) = &expr.kind else {
                    return;
                };
                if let Some(length) = scope.length_of(array) {
                    if let Ok(length) = i32::try_from(length) {
                        expr.kind = ExprKind::Literal(Literal::i32(length));
                        changes += 1;
                    }
                }
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_ast::{
        Expr, MemberRef, MethodDecl, Parameter, Stmt, TypeDecl, TypeKind, TypeRef, Visibility,
    };

    fn ints() -> TypeRef {
        TypeRef::array_of(TypeRef::i32())
    }

    fn tree() -> SyntaxTree {
        let mut ty = TypeDecl::new("K", TypeKind::Class, Visibility::Public);
        ty.methods.push(MethodDecl::new(
            "Make",
            vec![],
            ints(),
            Some(Stmt::block(vec![Stmt::ret(Some(Expr::new_array(
                TypeRef::i32(),
                Expr::int(3),
            )))])),
        ));
        ty.methods.push(MethodDecl::new(
            "Sum",
            vec![Parameter::new("xs", ints())],
            TypeRef::i32(),
            Some(Stmt::block(vec![Stmt::ret(Some(Expr::length_of(Expr::param("xs"))))])),
        ));
        let make = MemberRef {
            declaring_type: "K".into(),
            name: "Make".into(),
            parameter_types: vec![],
        };
        let sum = MemberRef {
            declaring_type: "K".into(),
            name: "Sum".into(),
            parameter_types: vec![ints()],
        };
        ty.methods.push(MethodDecl::new(
            "Run",
            vec![],
            TypeRef::i32(),
            Some(Stmt::block(vec![
                Stmt::local("data", ints(), Some(Expr::call(make, vec![]))),
                Stmt::ret(Some(Expr::call(sum, vec![Expr::local("data")]))),
            ])),
        ));
        SyntaxTree::new(vec![ty])
    }

    fn run_to_fixpoint(tree: &mut SyntaxTree) -> ArraySizeTable {
        let index = TypeIndex::build(tree).unwrap();
        let mut table = ArraySizeTable::default();
        while infer_lengths(tree, &index, &mut table).unwrap() > 0 {}
        fold_array_lengths(tree, &index, &table);
        table
    }

    #[test]
    fn propagates_through_returns_locals_and_params() {
        let mut tree = tree();
        let table = run_to_fixpoint(&mut tree);
        assert_eq!(table.get("K.Make()::return"), Some(3));
        assert_eq!(table.get("K.Run()::data"), Some(3));
        assert_eq!(table.get("K.Sum(i32[])::xs"), Some(3));
    }

    #[test]
    fn length_reads_become_literals() {
        let mut tree = tree();
        run_to_fixpoint(&mut tree);
        let body = tree.types[0].methods[1].body.as_ref().unwrap();
        let ret = body.children()[0];
        assert_eq!(ret.exprs()[0].as_literal(), Some(&Literal::i32(3)));
    }

    #[test]
    fn conflicting_call_sites_error() {
        let mut tree = tree();
        let sum = MemberRef {
            declaring_type: "K".into(),
            name: "Sum".into(),
            parameter_types: vec![ints()],
        };
        let extra = Stmt::expr(Expr::call(
            sum,
            vec![Expr::new_array(TypeRef::i32(), Expr::int(7))],
        ));
        if let Some(body) = &mut tree.types[0].methods[2].body {
            if let StmtKind::Block(stmts) = &mut body.kind {
                stmts.insert(0, extra);
            }
        }
        tree.assign_ids();
        let index = TypeIndex::build(&tree).unwrap();
        let mut table = ArraySizeTable::default();
        let mut result = Ok(0);
        for _ in 0..4 {
            result = infer_lengths(&tree, &index, &mut table);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(
            result,
            Err(ResolveError::ConflictingArrayLength { ref array, .. }) if array == "K.Sum(i32[])::xs"
        ));
    }

    #[test]
    fn non_constant_allocation_is_left_unresolved() {
        let mut ty = TypeDecl::new("K", TypeKind::Class, Visibility::Public);
        ty.methods.push(MethodDecl::new(
            "Run",
            vec![Parameter::new("n", TypeRef::i32())],
            TypeRef::Void,
            Some(Stmt::block(vec![Stmt::local(
                "buf",
                ints(),
                Some(Expr::new_array(TypeRef::i32(), Expr::param("n"))),
            )])),
        ));
        let mut tree = SyntaxTree::new(vec![ty]);
        let table = run_to_fixpoint(&mut tree);
        assert!(table.get("K.Run(i32)::buf").is_none());
        assert!(table.require("K.Run(i32)::buf").is_err());
    }
}
