//! Statements.

use crate::expr::{Expr, FieldRef};
use crate::ids::NodeId;
use crate::ty::TypeRef;
use serde::{Deserialize, Serialize};

/// The target of a plain assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    /// A local variable.
    Local(String),
    /// A parameter.
    Parameter(String),
    /// A field.
    Field(FieldRef),
}

/// A statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// Node id, assigned when the tree is numbered.
    #[serde(default)]
    pub id: NodeId,
    /// What the statement is.
    pub kind: StmtKind,
}

/// The kinds of statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `T name = init;`
    LocalDecl {
        /// Variable name, unique within the method.
        name: String,
        /// Declared type.
        ty: TypeRef,
        /// Optional initializer.
        init: Option<Expr>,
    },
    /// `target = value;`
    Assign {
        /// Assigned location.
        target: AssignTarget,
        /// Assigned value.
        value: Expr,
    },
    /// `array[index] = value;`
    ArrayAssign {
        /// The array.
        array: Expr,
        /// Element index.
        index: Expr,
        /// Stored value.
        value: Expr,
    },
    /// `if (condition) then_branch else else_branch`
    If {
        /// The condition.
        condition: Expr,
        /// Taken when the condition holds.
        then_branch: Box<Stmt>,
        /// Taken otherwise.
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (condition) body`
    While {
        /// Loop condition, checked before each iteration.
        condition: Expr,
        /// Loop body.
        body: Box<Stmt>,
    },
    /// `for (init; condition; step) body`
    For {
        /// Runs once before the loop.
        init: Option<Box<Stmt>>,
        /// Loop condition; `None` loops until `break`.
        condition: Option<Expr>,
        /// Runs after each iteration.
        step: Option<Box<Stmt>>,
        /// Loop body.
        body: Box<Stmt>,
    },
    /// `return value;`
    Return(Option<Expr>),
    /// An expression evaluated for its effect.
    Expr(Expr),
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// Starts `count` concurrent invocations of `call` with `index` bound to
    /// `0..count`, then waits for all of them. Results land in the array
    /// local `results` when given.
    ParallelInvoke {
        /// Number of concurrent invocations.
        count: Expr,
        /// Name of the invocation index visible inside `call`.
        index: String,
        /// The invoked call expression.
        call: Expr,
        /// Optional array local receiving one result per invocation.
        results: Option<String>,
    },
}

impl Stmt {
    /// Creates an unnumbered statement.
    pub fn new(kind: StmtKind) -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            kind,
        }
    }

    /// `T name = init;`
    pub fn local(name: impl Into<String>, ty: TypeRef, init: Option<Expr>) -> Self {
        Self::new(StmtKind::LocalDecl {
            name: name.into(),
            ty,
            init,
        })
    }

    /// `name = value;` for a local.
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            target: AssignTarget::Local(name.into()),
            value,
        })
    }

    /// `array[index] = value;`
    pub fn array_assign(array: Expr, index: Expr, value: Expr) -> Self {
        Self::new(StmtKind::ArrayAssign {
            array,
            index,
            value,
        })
    }

    /// `if`/`else`.
    pub fn if_else(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Self::new(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    /// `while`.
    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    /// `for`.
    pub fn for_loop(init: Option<Stmt>, condition: Option<Expr>, step: Option<Stmt>, body: Stmt) -> Self {
        Self::new(StmtKind::For {
            init: init.map(Box::new),
            condition,
            step: step.map(Box::new),
            body: Box::new(body),
        })
    }

    /// `return value;`
    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return(value))
    }

    /// An expression statement.
    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    /// A block.
    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(stmts))
    }

    /// A parallel invocation.
    pub fn parallel(count: Expr, index: impl Into<String>, call: Expr, results: Option<String>) -> Self {
        Self::new(StmtKind::ParallelInvoke {
            count,
            index: index.into(),
            call,
            results,
        })
    }

    /// Returns the expressions owned directly by this statement.
    pub fn exprs(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::LocalDecl { init, .. } => init.iter().collect(),
            StmtKind::Assign { value, .. } => vec![value],
            StmtKind::ArrayAssign {
                array,
                index,
                value,
            } => vec![array, index, value],
            StmtKind::If { condition, .. } | StmtKind::While { condition, .. } => vec![condition],
            StmtKind::For { condition, .. } => condition.iter().collect(),
            StmtKind::Return(value) => value.iter().collect(),
            StmtKind::Expr(expr) => vec![expr],
            StmtKind::ParallelInvoke { count, call, .. } => vec![count, call],
            StmtKind::Block(_) | StmtKind::Break | StmtKind::Continue => Vec::new(),
        }
    }

    /// Returns the expressions owned directly by this statement, mutably.
    pub fn exprs_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            StmtKind::LocalDecl { init, .. } => init.iter_mut().collect(),
            StmtKind::Assign { value, .. } => vec![value],
            StmtKind::ArrayAssign {
                array,
                index,
                value,
            } => vec![array, index, value],
            StmtKind::If { condition, .. } | StmtKind::While { condition, .. } => vec![condition],
            StmtKind::For { condition, .. } => condition.iter_mut().collect(),
            StmtKind::Return(value) => value.iter_mut().collect(),
            StmtKind::Expr(expr) => vec![expr],
            StmtKind::ParallelInvoke { count, call, .. } => vec![count, call],
            StmtKind::Block(_) | StmtKind::Break | StmtKind::Continue => Vec::new(),
        }
    }

    /// Returns the nested statements in source order.
    pub fn children(&self) -> Vec<&Stmt> {
        match &self.kind {
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                let mut out = vec![&**then_branch];
                out.extend(else_branch.as_deref());
                out
            }
            StmtKind::While { body, .. } => vec![&**body],
            StmtKind::For {
                init, step, body, ..
            } => {
                let mut out: Vec<&Stmt> = init.as_deref().into_iter().collect();
                out.push(body);
                out.extend(step.as_deref());
                out
            }
            StmtKind::Block(stmts) => stmts.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the nested statements mutably, in source order.
    pub fn children_mut(&mut self) -> Vec<&mut Stmt> {
        match &mut self.kind {
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                let mut out = vec![&mut **then_branch];
                out.extend(else_branch.as_deref_mut());
                out
            }
            StmtKind::While { body, .. } => vec![&mut **body],
            StmtKind::For {
                init, step, body, ..
            } => {
                let mut out: Vec<&mut Stmt> = init.as_deref_mut().into_iter().collect();
                out.push(body);
                out.extend(step.as_deref_mut());
                out
            }
            StmtKind::Block(stmts) => stmts.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` if this statement is or contains a loop.
    pub fn contains_loop(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::While { .. } | StmtKind::For { .. } | StmtKind::ParallelInvoke { .. }
        ) || self.children().into_iter().any(Stmt::contains_loop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinaryOp;

    #[test]
    fn for_children_order() {
        let stmt = Stmt::for_loop(
            Some(Stmt::local("i", TypeRef::i32(), Some(Expr::int(0)))),
            Some(Expr::binary(BinaryOp::Lt, Expr::local("i"), Expr::int(4))),
            Some(Stmt::assign(
                "i",
                Expr::binary(BinaryOp::Add, Expr::local("i"), Expr::int(1)),
            )),
            Stmt::block(vec![]),
        );
        let children = stmt.children();
        assert_eq!(children.len(), 3);
        assert!(matches!(children[0].kind, StmtKind::LocalDecl { .. }));
        assert!(matches!(children[1].kind, StmtKind::Block(_)));
        assert!(matches!(children[2].kind, StmtKind::Assign { .. }));
        assert_eq!(stmt.exprs().len(), 1);
    }

    #[test]
    fn loop_detection() {
        let body = Stmt::block(vec![Stmt::if_else(
            Expr::bool(true),
            Stmt::while_loop(Expr::bool(false), Stmt::block(vec![])),
            None,
        )]);
        assert!(body.contains_loop());
        assert!(!Stmt::ret(None).contains_loop());
    }

    #[test]
    fn if_children_include_else() {
        let stmt = Stmt::if_else(
            Expr::bool(true),
            Stmt::new(StmtKind::Break),
            Some(Stmt::new(StmtKind::Continue)),
        );
        assert_eq!(stmt.children().len(), 2);
    }
}
