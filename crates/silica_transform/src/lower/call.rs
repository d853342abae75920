//! Calls: invocation handshakes, inlined calls, guarded evaluation and
//! parallel invokes.
//!
//! Calls that do not depend on each other are started together. A batch
//! takes four steps: wait until every target slot has dropped `Finished`
//! from its previous use, raise `Started` with the arguments, wait for every
//! `Finished`, then read the results and drop `Started`.

use super::expr::coerce_lowered;
use super::{Binding, Builder, Frame, Lowered};
use crate::callgraph::call_group;
use crate::error::TransformError;
use silica_ast::{BinaryOp, Expr, ExprKind, Literal, MemberHandle, NodeId};
use silica_common::InternalError;
use silica_ir::{
    HwBinaryOp, HwExpr, HwStmt, HwTarget, HwType, HwUnaryOp, PortKind, SignalRef, Transition,
};
use silica_resolve::arrays::member_array_key;

/// One call of a batch, arguments already evaluated.
struct PendingCall {
    target: String,
    slot: u32,
    arguments: Vec<(String, HwExpr)>,
    return_type: Option<HwType>,
}

impl PendingCall {
    fn port(&self, port: PortKind) -> SignalRef {
        SignalRef::Invocation {
            target: self.target.clone(),
            slot: self.slot,
            port,
        }
    }
}

fn all(conditions: impl IntoIterator<Item = HwExpr>) -> HwExpr {
    conditions
        .into_iter()
        .reduce(|acc, next| HwExpr::Binary {
            op: HwBinaryOp::And,
            lhs: Box::new(acc),
            rhs: Box::new(next),
            ty: HwType::Boolean,
        })
        .unwrap_or(HwExpr::Bool(true))
}

fn not(expr: HwExpr) -> HwExpr {
    HwExpr::Unary {
        op: HwUnaryOp::Not,
        operand: Box::new(expr),
    }
}

/// Returns true for expressions that evaluate some operands only
/// conditionally, where those operands contain calls.
fn is_guarded(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Conditional {
            if_true, if_false, ..
        } => if_true.contains_call() || if_false.contains_call(),
        ExprKind::Binary { op, rhs, .. } => op.is_logical() && rhs.contains_call(),
        _ => false,
    }
}

impl Builder<'_> {
    /// Evaluates every call in `e` ahead of `e` itself, in dependency order.
    pub(super) fn prepare(&mut self, e: &Expr) -> Result<(), TransformError> {
        loop {
            let mut calls = Vec::new();
            let mut guarded = None;
            self.find_ready(e, &mut calls, &mut guarded);
            if !calls.is_empty() {
                self.invoke(&calls)?;
            } else if let Some(guarded) = guarded {
                self.guarded(guarded)?;
            } else {
                return Ok(());
            }
        }
    }

    fn is_evaluated(&self, e: &Expr) -> bool {
        self.results.contains_key(&e.id)
    }

    /// Returns true if `e` contains a call not yet evaluated.
    fn is_pending(&self, e: &Expr) -> bool {
        !self.is_evaluated(e)
            && (matches!(e.kind, ExprKind::Call { .. })
                || e.children().into_iter().any(|c| self.is_pending(c)))
    }

    /// Collects the calls whose arguments are ready, or failing that the
    /// first guarded expression whose unconditional operand is ready.
    fn find_ready<'e>(
        &self,
        e: &'e Expr,
        calls: &mut Vec<&'e Expr>,
        guarded: &mut Option<&'e Expr>,
    ) {
        if !self.is_pending(e) {
            return;
        }
        match &e.kind {
            ExprKind::Call { args, .. } => {
                if args.iter().any(|a| self.is_pending(a)) {
                    for arg in args {
                        self.find_ready(arg, calls, guarded);
                    }
                } else {
                    calls.push(e);
                }
            }
            ExprKind::Conditional { condition, .. } if is_guarded(e) => {
                if self.is_pending(condition) {
                    self.find_ready(condition, calls, guarded);
                } else if guarded.is_none() {
                    *guarded = Some(e);
                }
            }
            ExprKind::Binary { lhs, .. } if is_guarded(e) => {
                if self.is_pending(lhs) {
                    self.find_ready(lhs, calls, guarded);
                } else if guarded.is_none() {
                    *guarded = Some(e);
                }
            }
            _ => {
                for child in e.children() {
                    self.find_ready(child, calls, guarded);
                }
            }
        }
    }

    fn resolve<'e>(&self, e: &'e Expr) -> Result<(MemberHandle, &'e [Expr]), TransformError> {
        let ExprKind::Call { target, args } = &e.kind else {
            return Err(InternalError::new("expected a call expression").into());
        };
        let handle = self.ctx.types.resolve_call(target).ok_or_else(|| {
            self.unsupported(format!(
                "call to unknown member `{}.{}`",
                target.declaring_type, target.name
            ))
        })?;
        Ok((handle, args.as_slice()))
    }

    /// Evaluates the arguments of a call against the callee's parameters.
    fn arguments(
        &mut self,
        handle: MemberHandle,
        callee: &str,
        args: &[Expr],
    ) -> Result<Vec<(String, HwType, Lowered)>, TransformError> {
        let ctx = self.ctx;
        let parameters = &ctx.tree.method(handle).parameters;
        if parameters.len() != args.len() {
            return Err(self.unsupported(format!(
                "call to `{callee}` with {} arguments",
                args.len()
            )));
        }
        let mut out = Vec::with_capacity(args.len());
        for (param, arg) in parameters.iter().zip(args) {
            let ty = self.parameter_type(callee, param)?;
            let value = self.expr(arg)?;
            out.push((param.name.clone(), ty, value));
        }
        Ok(out)
    }

    /// Prepares a hardware call: arguments that take time are computed into
    /// temporaries first so the start state only drives ports.
    fn pending_call(
        &mut self,
        handle: MemberHandle,
        callee: String,
        group: NodeId,
        args: &[Expr],
    ) -> Result<PendingCall, TransformError> {
        let slot = self.take_slot(group, &callee)?;
        let mut arguments = Vec::with_capacity(args.len());
        for (name, ty, value) in self.arguments(handle, &callee, args)? {
            let mut expr = coerce_lowered(&value, &ty);
            if value.cost > 0.0 {
                let temp = self.temp(ty, format!("argument {name} of {callee}"));
                self.emit(HwStmt::set_var(temp.clone(), expr), value.cost);
                expr = HwExpr::var(temp);
            }
            arguments.push((name, expr));
        }
        Ok(PendingCall {
            return_type: self.callee_return_type(handle)?,
            target: callee,
            slot,
            arguments,
        })
    }

    fn invoke(&mut self, calls: &[&Expr]) -> Result<(), TransformError> {
        let mut batch = Vec::new();
        let mut ids = Vec::new();
        for call in calls {
            let (handle, args) = self.resolve(call)?;
            let (callee, inlined) = self.callee(handle);
            if inlined {
                let value = self.inline_call(handle, &callee, args)?;
                self.results.insert(call.id, value);
            } else {
                let group = call_group(self.ctx, call.id).ok_or_else(|| {
                    InternalError::new(format!("call {:?} is outside any statement", call.id))
                })?;
                batch.push(self.pending_call(handle, callee, group, args)?);
                ids.push(call.id);
            }
        }
        if batch.is_empty() {
            return Ok(());
        }
        let values = self.issue(batch)?;
        for (id, value) in ids.into_iter().zip(values) {
            self.results.insert(id, value);
        }
        Ok(())
    }

    /// Runs the handshake for a batch of calls and returns their results.
    fn issue(&mut self, calls: Vec<PendingCall>) -> Result<Vec<Option<Lowered>>, TransformError> {
        let label = |what: &str| {
            let targets: Vec<&str> = calls.iter().map(|c| c.target.as_str()).collect();
            format!("{what} {}", targets.join(", "))
        };
        let (ready_label, start_label, wait_label, collect_label) = (
            label("await idle"),
            label("start"),
            label("await"),
            label("collect"),
        );

        let ready = if self.is_fresh() && self.states[self.current].wait_cycles == 0 {
            self.states[self.current].label = ready_label;
            self.current
        } else {
            self.advance(ready_label)
        };
        let start = self.new_state(start_label);
        self.set_transition(
            ready,
            Transition::WaitFor {
                condition: all(
                    calls
                        .iter()
                        .map(|c| not(HwExpr::Signal(c.port(PortKind::Finished)))),
                ),
                next: Self::id(start),
            },
        );
        for call in &calls {
            for (name, value) in &call.arguments {
                self.states[start].body.push(HwStmt::drive(
                    call.port(PortKind::Parameter(name.clone())),
                    value.clone(),
                ));
            }
            self.states[start]
                .body
                .push(HwStmt::drive(call.port(PortKind::Started), HwExpr::Bool(true)));
        }
        let wait = self.new_state(wait_label);
        self.set_transition(start, Transition::Goto(Self::id(wait)));
        let collect = self.new_state(collect_label);
        self.set_transition(
            wait,
            Transition::WaitFor {
                condition: all(
                    calls
                        .iter()
                        .map(|c| HwExpr::Signal(c.port(PortKind::Finished))),
                ),
                next: Self::id(collect),
            },
        );
        self.enter(collect);

        let mut values = Vec::with_capacity(calls.len());
        for call in &calls {
            let value = match &call.return_type {
                Some(ty) => {
                    let temp = self.temp(ty.clone(), format!("result of {}", call.target));
                    self.push(HwStmt::set_var(
                        temp.clone(),
                        HwExpr::Signal(call.port(PortKind::Return)),
                    ));
                    Some(Lowered::free(HwExpr::var(temp), ty.clone()))
                }
                None => None,
            };
            self.push(HwStmt::drive(call.port(PortKind::Started), HwExpr::Bool(false)));
            values.push(value);
        }
        Ok(values)
    }

    /// Expands a call in place.
    fn inline_call(
        &mut self,
        handle: MemberHandle,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<Lowered>, TransformError> {
        let ctx = self.ctx;
        let method = ctx.tree.method(handle);
        let body = method
            .body
            .as_ref()
            .ok_or_else(|| self.unsupported(format!("call to `{callee}` without a body")))?;
        let arguments = self.arguments(handle, callee, args)?;
        let return_type = self.callee_return_type(handle)?;
        let return_var = return_type
            .clone()
            .map(|ty| self.temp(ty, format!("value returned by {callee}")));

        self.inlined += 1;
        let simple = method.name.rsplit('.').next().unwrap_or(&method.name);
        self.frames.push(Frame {
            member: callee.to_string(),
            prefix: format!("{simple}.{}.", self.inlined),
            locals: Default::default(),
            return_type: return_type.clone(),
            return_var: return_var.clone(),
            returns: Vec::new(),
        });
        for (name, ty, value) in arguments {
            let var = self.declare(&name, ty.clone(), format!("parameter {name} of {callee}"));
            self.emit(HwStmt::set_var(var.clone(), coerce_lowered(&value, &ty)), value.cost);
            self.bind(&name, Binding::Var { name: var, ty });
        }
        self.stmt(body)?;
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| InternalError::new("inline frame missing"))?;

        let mut exits = frame.returns;
        if !self.terminated {
            exits.push(self.current);
        }
        if exits.len() == 1 && exits[0] == self.current {
            // a single fall-through exit keeps going in the same state
            self.set_transition(self.current, Transition::Goto(super::FINISHED));
            self.terminated = false;
        } else {
            let join = self.new_state(format!("return from {callee}"));
            for exit in exits {
                self.set_transition(exit, Transition::Goto(Self::id(join)));
            }
            self.enter(join);
        }
        Ok(return_var.zip(return_type).map(|(var, ty)| Lowered::free(HwExpr::var(var), ty)))
    }

    /// Lowers a conditional or short-circuit expression whose conditional
    /// operand contains calls into branch states.
    fn guarded(&mut self, e: &Expr) -> Result<(), TransformError> {
        match &e.kind {
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let ty = self.infer(e)?;
                let var = self.temp(ty.clone(), "conditional value");
                let condition = self.expr(condition)?;
                self.reserve(condition.cost);
                let from = self.current;

                let mut exits = Vec::with_capacity(2);
                let mut targets = Vec::with_capacity(2);
                for (branch, label) in [(if_true, "conditional: true"), (if_false, "conditional: false")] {
                    let state = self.new_state(label);
                    targets.push(state);
                    self.enter(state);
                    self.prepare(branch)?;
                    let value = self.expr(branch)?;
                    self.emit(HwStmt::set_var(var.clone(), coerce_lowered(&value, &ty)), value.cost);
                    exits.push(self.current);
                }
                let join = self.new_state("conditional: join");
                self.set_transition(
                    from,
                    Transition::Branch {
                        condition: coerce_lowered(&condition, &HwType::Boolean),
                        if_true: Self::id(targets[0]),
                        if_false: Self::id(targets[1]),
                    },
                );
                for exit in exits {
                    self.set_transition(exit, Transition::Goto(Self::id(join)));
                }
                self.enter(join);
                self.results
                    .insert(e.id, Some(Lowered::free(HwExpr::var(var), ty)));
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let var = self.temp(HwType::Boolean, "short-circuit value");
                let left = self.expr(lhs)?;
                self.emit(
                    HwStmt::set_var(var.clone(), coerce_lowered(&left, &HwType::Boolean)),
                    left.cost,
                );
                let from = self.current;
                let right_state = self.new_state("evaluate right operand");
                self.enter(right_state);
                self.prepare(rhs)?;
                let right = self.expr(rhs)?;
                self.emit(
                    HwStmt::set_var(var.clone(), coerce_lowered(&right, &HwType::Boolean)),
                    right.cost,
                );
                let right_exit = self.current;
                let join = self.new_state("short-circuit join");
                let (if_true, if_false) = if *op == BinaryOp::LogicAnd {
                    (right_state, join)
                } else {
                    (join, right_state)
                };
                self.set_transition(
                    from,
                    Transition::Branch {
                        condition: HwExpr::var(var.clone()),
                        if_true: Self::id(if_true),
                        if_false: Self::id(if_false),
                    },
                );
                self.set_transition(right_exit, Transition::Goto(Self::id(join)));
                self.enter(join);
                self.results
                    .insert(e.id, Some(Lowered::free(HwExpr::var(var), HwType::Boolean)));
            }
            _ => return Err(InternalError::new("expected a guarded expression").into()),
        }
        Ok(())
    }

    /// Starts `count` copies of `call` at once, binding `index` to each copy's
    /// position, and stores the results in `results` when given.
    pub(super) fn parallel_invoke(
        &mut self,
        group: NodeId,
        count: &Expr,
        index: &str,
        call: &Expr,
        results: Option<&str>,
    ) -> Result<(), TransformError> {
        let copies = count
            .as_literal()
            .and_then(Literal::as_int)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| self.unsupported("parallel invoke with a non-constant count"))?;
        let (handle, args) = self.resolve(call)?;
        let (callee, inlined) = self.callee(handle);
        if inlined {
            return Err(InternalError::new(format!("parallel target {callee} was inlined")).into());
        }

        let previous = self.frame().locals.get(index).cloned();
        let mut batch = Vec::with_capacity(copies as usize);
        for i in 0..copies {
            self.bind(
                index,
                Binding::Const {
                    value: HwExpr::Int {
                        value: i64::from(i),
                        ty: HwType::Signed(32),
                    },
                    ty: HwType::Signed(32),
                },
            );
            batch.push(self.pending_call(handle, callee.clone(), group, args)?);
        }
        match previous {
            Some(binding) => self.bind(index, binding),
            None => {
                self.frame_mut().locals.remove(index);
            }
        }

        let values = self.issue(batch)?;
        let Some(results) = results else {
            return Ok(());
        };
        let (array, element) = match self.frame().locals.get(results).cloned() {
            Some(Binding::Var {
                name,
                ty: HwType::Array { element, .. },
            }) => (name, *element),
            Some(_) => {
                return Err(self.unsupported(format!("parallel results stored in non-array `{results}`")))
            }
            None => {
                let element = self
                    .callee_return_type(handle)?
                    .ok_or_else(|| self.unsupported(format!("results of void `{callee}`")))?;
                let key = member_array_key(&self.frame().member, results);
                let length = self.ctx.arrays.get(&key).unwrap_or(copies);
                let ty = HwType::Array {
                    element: Box::new(element.clone()),
                    length,
                };
                let name = self.declare(results, ty.clone(), format!("results of {callee}"));
                self.bind(results, Binding::Var { name: name.clone(), ty });
                (name, element)
            }
        };
        for (i, value) in values.into_iter().enumerate() {
            let Some(value) = value else { continue };
            self.push(HwStmt::Assign {
                target: HwTarget::Element {
                    array: array.clone(),
                    index: HwExpr::Int {
                        value: i as i64,
                        ty: HwType::Signed(32),
                    },
                },
                value: coerce_lowered(&value, &element),
            });
        }
        Ok(())
    }
}
