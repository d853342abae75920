//! Statements and control flow.

use super::expr::coerce_lowered;
use super::{Binding, Builder, LoopExits, Lowered, FINISHED};
use crate::error::TransformError;
use silica_ast::{AssignTarget, Expr, ExprKind, Stmt, StmtKind};
use silica_common::InternalError;
use silica_ir::{HwExpr, HwStmt, HwTarget, HwType, PortKind, SignalRef, Transition};
use silica_timing::Operator;

impl Builder<'_> {
    /// Lowers `s`. Statements after a `return`, `break` or `continue` in the
    /// same block are unreachable and skipped.
    pub(super) fn stmt(&mut self, s: &Stmt) -> Result<(), TransformError> {
        if self.terminated {
            return Ok(());
        }
        match &s.kind {
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt)?;
                }
            }
            StmtKind::LocalDecl { name, ty, init } => {
                let ty = self.local_type(ty, name)?;
                let value = match init {
                    Some(init) => Some(self.value(init, &ty)?),
                    None => None,
                };
                let var = self.declare(name, ty.clone(), format!("local {name}"));
                self.bind(name, Binding::Var { name: var.clone(), ty: ty.clone() });
                if let Some(value) = value {
                    self.emit(HwStmt::set_var(var, coerce_lowered(&value, &ty)), value.cost);
                }
            }
            StmtKind::Assign { target, value } => match target {
                AssignTarget::Local(name) | AssignTarget::Parameter(name) => {
                    let Binding::Var { name: var, ty } = self.lookup(name)? else {
                        return Err(self.unsupported(format!("assignment to `{name}`")));
                    };
                    let value = self.value(value, &ty)?;
                    self.emit(HwStmt::set_var(var, coerce_lowered(&value, &ty)), value.cost);
                }
                AssignTarget::Field(field) => {
                    return Err(self.unsupported(format!(
                        "assignment to field `{}.{}`",
                        field.declaring_type, field.name
                    )))
                }
            },
            StmtKind::ArrayAssign {
                array,
                index,
                value,
            } => self.array_assign(array, index, value)?,
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_else(condition, then_branch, else_branch.as_deref())?,
            StmtKind::While { condition, body } => self.for_loop(None, Some(condition), None, body)?,
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => self.for_loop(init.as_deref(), condition.as_ref(), step.as_deref(), body)?,
            StmtKind::Return(value) => self.ret(value.as_ref())?,
            StmtKind::Expr(e) => {
                self.prepare(e)?;
                if !self.results.contains_key(&e.id) {
                    // evaluated for nothing; keep any temporaries it needs
                    self.expr(e)?;
                }
            }
            StmtKind::Break | StmtKind::Continue => {
                let current = self.current;
                let member = self.member;
                let is_break = matches!(s.kind, StmtKind::Break);
                let exits = self.loops.last_mut().ok_or_else(|| {
                    TransformError::unsupported(
                        if is_break {
                            "`break` outside a loop"
                        } else {
                            "`continue` outside a loop"
                        },
                        member.full_name.clone(),
                    )
                })?;
                if is_break {
                    exits.breaks.push(current);
                } else {
                    exits.continues.push(current);
                }
                self.terminated = true;
            }
            StmtKind::ParallelInvoke {
                count,
                index,
                call,
                results,
            } => self.parallel_invoke(s.id, count, index, call, results.as_deref())?,
        }
        Ok(())
    }

    /// Evaluates a value stored into a location of type `ty`. A fresh
    /// array is all zeroes.
    fn value(&mut self, e: &Expr, ty: &HwType) -> Result<Lowered, TransformError> {
        if let (ExprKind::NewArray { .. }, HwType::Array { .. }) = (&e.kind, ty) {
            return Ok(Lowered::free(
                HwExpr::Int {
                    value: 0,
                    ty: ty.clone(),
                },
                ty.clone(),
            ));
        }
        self.prepare(e)?;
        self.expr(e)
    }

    fn array_assign(&mut self, array: &Expr, index: &Expr, value: &Expr) -> Result<(), TransformError> {
        let (ExprKind::Local(name) | ExprKind::Parameter(name)) = &array.kind else {
            return Err(self.unsupported("store into an array that is not a local or parameter"));
        };
        let Binding::Var {
            name: var,
            ty: HwType::Array { element, .. },
        } = self.lookup(name)?
        else {
            return Err(self.unsupported(format!("element store into non-array `{name}`")));
        };
        self.prepare(index)?;
        self.prepare(value)?;
        let index = self.expr(index)?;
        let value = self.expr(value)?;
        let cost = self.op_cost(Operator::Index, &index.ty, None)? + index.cost.max(value.cost);
        self.emit(
            HwStmt::Assign {
                target: HwTarget::Element {
                    array: var,
                    index: index.expr,
                },
                value: coerce_lowered(&value, &element),
            },
            cost,
        );
        Ok(())
    }

    /// Evaluates a branch condition into the open state and returns the
    /// state that branches.
    fn condition(&mut self, condition: &Expr) -> Result<(usize, HwExpr), TransformError> {
        self.prepare(condition)?;
        let value = self.expr(condition)?;
        self.reserve(value.cost);
        Ok((self.current, coerce_lowered(&value, &HwType::Boolean)))
    }

    fn if_else(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), TransformError> {
        let (from, condition) = self.condition(condition)?;

        let then_state = self.new_state("if: then");
        self.enter(then_state);
        self.stmt(then_branch)?;
        let then_exit = (!self.terminated).then_some(self.current);

        let mut else_state = None;
        let mut else_exit = None;
        if let Some(else_branch) = else_branch {
            let state = self.new_state("if: else");
            self.enter(state);
            self.stmt(else_branch)?;
            else_state = Some(state);
            else_exit = (!self.terminated).then_some(self.current);
        }

        let join = self.new_state("if: join");
        self.set_transition(
            from,
            Transition::Branch {
                condition,
                if_true: Self::id(then_state),
                if_false: Self::id(else_state.unwrap_or(join)),
            },
        );
        for exit in [then_exit, else_exit].into_iter().flatten() {
            self.set_transition(exit, Transition::Goto(Self::id(join)));
        }
        self.enter(join);
        self.terminated = else_branch.is_some() && then_exit.is_none() && else_exit.is_none();
        Ok(())
    }

    /// Lowers `while` (no init or step) and `for` loops.
    fn for_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        step: Option<&Stmt>,
        body: &Stmt,
    ) -> Result<(), TransformError> {
        if let Some(init) = init {
            self.stmt(init)?;
            if self.terminated {
                return Ok(());
            }
        }
        let head = if self.is_fresh() && self.states[self.current].wait_cycles == 0 {
            self.states[self.current].label = "loop: head".into();
            self.current
        } else {
            self.advance("loop: head")
        };
        let test = match condition {
            Some(condition) => Some(self.condition(condition)?),
            None => None,
        };
        let from = self.current;

        self.loops.push(LoopExits::default());
        let body_state = self.new_state("loop: body");
        self.enter(body_state);
        self.stmt(body)?;
        let body_exit = (!self.terminated).then_some(self.current);
        let exits = self
            .loops
            .pop()
            .ok_or_else(|| InternalError::new("loop exits missing"))?;

        let continue_target = match step {
            Some(step) => {
                let state = self.new_state("loop: step");
                self.enter(state);
                self.stmt(step)?;
                if !self.terminated {
                    self.set_transition(self.current, Transition::Goto(Self::id(head)));
                }
                state
            }
            None => head,
        };
        for exit in body_exit.into_iter().chain(exits.continues) {
            self.set_transition(exit, Transition::Goto(Self::id(continue_target)));
        }

        let exit = self.new_state("loop: exit");
        self.set_transition(
            from,
            match test {
                Some((_, condition)) => Transition::Branch {
                    condition,
                    if_true: Self::id(body_state),
                    if_false: Self::id(exit),
                },
                None => Transition::Goto(Self::id(body_state)),
            },
        );
        for exit_from in exits.breaks {
            self.set_transition(exit_from, Transition::Goto(Self::id(exit)));
        }
        self.enter(exit);
        Ok(())
    }

    fn ret(&mut self, value: Option<&Expr>) -> Result<(), TransformError> {
        let return_type = self.frame().return_type.clone();
        let return_var = self.frame().return_var.clone();
        match (value, return_type) {
            (Some(value), Some(ty)) => {
                let value = self.value(value, &ty)?;
                let expr = coerce_lowered(&value, &ty);
                let stmt = match return_var {
                    Some(var) => HwStmt::set_var(var, expr),
                    None => HwStmt::drive(SignalRef::Own(PortKind::Return), expr),
                };
                self.emit(stmt, value.cost);
            }
            (None, None) => {}
            (Some(value), None) => {
                self.prepare(value)?;
            }
            (None, Some(_)) => return Err(self.unsupported("`return` without a value")),
        }
        self.set_transition(self.current, Transition::Goto(FINISHED));
        if self.frames.len() > 1 {
            let current = self.current;
            self.frame_mut().returns.push(current);
        }
        self.terminated = true;
        Ok(())
    }
}
