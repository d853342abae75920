//! Lowering one member's body into a state machine.
//!
//! The builder keeps one open state and appends statements to it until the
//! accumulated combinational delay would pass one clock cycle; an operation
//! longer than a cycle gets a state of its own held for the extra cycles.
//! Control flow and calls close the open state and continue in a fresh one.
//!
//! State 0 is idle and state 1 copies the parameters in. The finished state
//! is appended last, and every transition to [`FINISHED`] is pointed at it
//! once the body is done.

mod call;
mod expr;
mod stmt;

use crate::callgraph::{CallPlan, MemberPlan};
use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::types;
use silica_ast::{MemberHandle, NodeId};
use silica_common::InternalError;
use silica_ir::{
    ArchitectureComponent, ComponentPort, Declaration, HwExpr, HwStmt, HwType, HwUnaryOp,
    OutgoingInvocation, PortKind, SignalRef, State, StateId, Transition,
};
use silica_resolve::arrays::{member_array_key, return_array_key};
use std::collections::HashMap;

/// Placeholder target for the finished state.
const FINISHED: StateId = StateId::from_raw(u32::MAX);

/// A value in a member's scope.
#[derive(Debug, Clone)]
enum Binding {
    /// A process variable.
    Var { name: String, ty: HwType },
    /// A fixed value, such as a parallel invoke index.
    Const { value: HwExpr, ty: HwType },
}

/// The member whose body is being lowered. Inlined calls push a frame.
#[derive(Debug)]
struct Frame {
    /// Full name, used for array keys.
    member: String,
    /// Prefix of variables declared in this frame.
    prefix: String,
    locals: HashMap<String, Binding>,
    /// Return type, `None` for `void`.
    return_type: Option<HwType>,
    /// Variable receiving the return value of an inlined call.
    return_var: Option<String>,
    /// States that leave through a `return` of an inlined call.
    returns: Vec<usize>,
}

/// Exits of the innermost loop, patched once the loop is lowered.
#[derive(Debug, Default)]
struct LoopExits {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// Lowered expression with its type and combinational delay in cycles.
#[derive(Debug, Clone)]
struct Lowered {
    expr: HwExpr,
    ty: HwType,
    cost: f64,
}

impl Lowered {
    fn free(expr: HwExpr, ty: HwType) -> Self {
        Self { expr, ty, cost: 0.0 }
    }
}

struct Builder<'a> {
    ctx: &'a TransformationContext,
    plan: &'a CallPlan,
    member: &'a MemberPlan,
    states: Vec<State>,
    current: usize,
    /// Delay already spent in the open state.
    budget: f64,
    /// Set after `return`, `break` and `continue` until control rejoins.
    terminated: bool,
    declarations: Vec<Declaration>,
    declared: HashMap<String, HwType>,
    frames: Vec<Frame>,
    loops: Vec<LoopExits>,
    temps: u32,
    inlined: u32,
    /// Next free slot per statement group and callee.
    slots: HashMap<(NodeId, String), u32>,
    /// Values of calls and guarded expressions already evaluated, `None`
    /// for `void` calls.
    results: HashMap<NodeId, Option<Lowered>>,
}

/// Lowers the member described by `member` into a component.
pub fn lower_member(
    ctx: &TransformationContext,
    plan: &CallPlan,
    member: &MemberPlan,
) -> Result<ArchitectureComponent, TransformError> {
    let name = member.full_name.as_str();
    let method = ctx.tree.method(member.handle);
    let body = method
        .body
        .as_ref()
        .ok_or_else(|| TransformError::unsupported("member without a body", name))?;

    let mut parameters = Vec::with_capacity(method.parameters.len());
    for param in &method.parameters {
        parameters.push(ComponentPort {
            name: param.name.clone(),
            ty: types::hw_type(
                &param.ty,
                &member_array_key(name, &param.name),
                &ctx.arrays,
                name,
            )?,
        });
    }
    let return_type = types::return_type(
        &method.return_type,
        &return_array_key(name),
        &ctx.arrays,
        name,
    )?;

    let mut builder = Builder::new(ctx, plan, member, return_type.clone());
    builder.start(&parameters);
    builder.stmt(body)?;
    let states = builder.finish();

    let mut component = ArchitectureComponent {
        name: name.to_string(),
        parameters,
        return_type,
        declarations: builder.declarations,
        states,
        invocations: member
            .invocations
            .iter()
            .map(|(target, slots)| OutgoingInvocation {
                target: target.clone(),
                slots: *slots,
            })
            .collect(),
        instance_count: member.instances,
        worst_case_cycles: None,
    };
    component.worst_case_cycles = component.compute_worst_case_cycles();
    log::debug!(
        "lowered {name}: {} states, {} variables",
        component.states.len(),
        component.declarations.len()
    );
    Ok(component)
}

impl<'a> Builder<'a> {
    fn new(
        ctx: &'a TransformationContext,
        plan: &'a CallPlan,
        member: &'a MemberPlan,
        return_type: Option<HwType>,
    ) -> Self {
        Self {
            ctx,
            plan,
            member,
            states: Vec::new(),
            current: 0,
            budget: 0.0,
            terminated: false,
            declarations: Vec::new(),
            declared: HashMap::new(),
            frames: vec![Frame {
                member: member.full_name.clone(),
                prefix: String::new(),
                locals: HashMap::new(),
                return_type,
                return_var: None,
                returns: Vec::new(),
            }],
            loops: Vec::new(),
            temps: 0,
            inlined: 0,
            slots: HashMap::new(),
            results: HashMap::new(),
        }
    }

    /// Creates the idle state and the state copying parameters in.
    fn start(&mut self, parameters: &[ComponentPort]) {
        let idle = self.new_state("idle");
        self.states[idle].body.push(HwStmt::drive(
            SignalRef::Own(PortKind::Finished),
            HwExpr::Bool(false),
        ));
        self.states[idle].transition = Transition::WaitFor {
            condition: HwExpr::own(PortKind::Started),
            next: StateId::from_raw(1),
        };
        self.current = self.new_state("start");
        for param in parameters {
            let var = self.declare(&param.name, param.ty.clone(), format!("parameter {}", param.name));
            self.frame_mut().locals.insert(
                param.name.clone(),
                Binding::Var {
                    name: var.clone(),
                    ty: param.ty.clone(),
                },
            );
            self.push(HwStmt::set_var(
                var,
                HwExpr::own(PortKind::Parameter(param.name.clone())),
            ));
        }
    }

    /// Appends the finished state and resolves [`FINISHED`].
    fn finish(&mut self) -> Vec<State> {
        let finished = self.new_state("finished");
        let finished_id = StateId::from_raw(finished as u32);
        self.states[finished].body.push(HwStmt::drive(
            SignalRef::Own(PortKind::Finished),
            HwExpr::Bool(true),
        ));
        self.states[finished].transition = Transition::WaitFor {
            condition: HwExpr::Unary {
                op: HwUnaryOp::Not,
                operand: Box::new(HwExpr::own(PortKind::Started)),
            },
            next: ArchitectureComponent::idle_state(),
        };
        let patch = |id: &mut StateId| {
            if *id == FINISHED {
                *id = finished_id;
            }
        };
        for state in &mut self.states {
            match &mut state.transition {
                Transition::Goto(next) | Transition::WaitFor { next, .. } => patch(next),
                Transition::Branch {
                    if_true, if_false, ..
                } => {
                    patch(if_true);
                    patch(if_false);
                }
            }
        }
        std::mem::take(&mut self.states)
    }

    fn frame(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn member_name(&self) -> &str {
        &self.member.full_name
    }

    fn unsupported(&self, construct: impl Into<String>) -> TransformError {
        TransformError::unsupported(construct, self.member_name())
    }

    /// Appends a state that falls through to the finished state.
    fn new_state(&mut self, label: impl Into<String>) -> usize {
        let index = self.states.len();
        self.states.push(State {
            id: StateId::from_raw(index as u32),
            label: label.into(),
            body: Vec::new(),
            wait_cycles: 0,
            transition: Transition::Goto(FINISHED),
        });
        index
    }

    fn id(index: usize) -> StateId {
        StateId::from_raw(index as u32)
    }

    fn set_transition(&mut self, from: usize, transition: Transition) {
        self.states[from].transition = transition;
    }

    /// Closes the open state with a jump to a new one and continues there.
    fn advance(&mut self, label: impl Into<String>) -> usize {
        let next = self.new_state(label);
        if !self.terminated {
            self.set_transition(self.current, Transition::Goto(Self::id(next)));
        }
        self.enter(next);
        next
    }

    /// Continues in `state`, reachable from elsewhere.
    fn enter(&mut self, state: usize) {
        self.current = state;
        self.budget = 0.0;
        self.terminated = false;
    }

    /// Returns true while nothing has been scheduled in the open state.
    fn is_fresh(&self) -> bool {
        self.states[self.current].body.is_empty() && self.budget == 0.0
    }

    fn push(&mut self, stmt: HwStmt) {
        self.states[self.current].body.push(stmt);
    }

    /// Reserves `cost` cycles of delay in the open state, moving to a new
    /// state first when it does not fit.
    fn reserve(&mut self, cost: f64) {
        if cost > 1.0 {
            if !self.is_fresh() {
                self.advance("state");
            }
            let extra = cost.ceil() as u32 - 1;
            self.states[self.current].wait_cycles = extra;
            // nothing else shares a multi-cycle state
            self.budget = f64::INFINITY;
        } else {
            if self.budget + cost > 1.0 {
                self.advance("state");
            }
            self.budget += cost;
        }
    }

    /// Schedules a statement whose slowest path takes `cost` cycles.
    fn emit(&mut self, stmt: HwStmt, cost: f64) {
        self.reserve(cost);
        self.push(stmt);
    }

    /// Declares a variable in the current frame and returns its name. A name
    /// reused with another type gets a numbered variant.
    fn declare(&mut self, name: &str, ty: HwType, comment: String) -> String {
        let base = format!("{}{name}", self.frame().prefix);
        let mut candidate = base.clone();
        let mut n = 1;
        loop {
            match self.declared.get(&candidate) {
                None => {
                    self.declared.insert(candidate.clone(), ty.clone());
                    self.declarations.push(Declaration {
                        name: candidate.clone(),
                        ty,
                        comment: Some(comment),
                    });
                    return candidate;
                }
                Some(existing) if *existing == ty => return candidate,
                Some(_) => {
                    candidate = format!("{base}.{n}");
                    n += 1;
                }
            }
        }
    }

    /// Declares a fresh temporary.
    fn temp(&mut self, ty: HwType, comment: impl Into<String>) -> String {
        let name = format!("temp.{}", self.temps);
        self.temps += 1;
        self.declared.insert(name.clone(), ty.clone());
        self.declarations.push(Declaration {
            name: name.clone(),
            ty,
            comment: Some(comment.into()),
        });
        name
    }

    fn lookup(&self, name: &str) -> Result<Binding, TransformError> {
        self.frame()
            .locals
            .get(name)
            .cloned()
            .ok_or_else(|| self.unsupported(format!("use of undeclared variable `{name}`")))
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        self.frame_mut().locals.insert(name.to_string(), binding);
    }

    /// Hardware type of a local, parameter or return value of the current
    /// frame.
    fn local_type(&self, ty: &silica_ast::TypeRef, name: &str) -> Result<HwType, TransformError> {
        let member = &self.frame().member;
        types::hw_type(ty, &member_array_key(member, name), &self.ctx.arrays, self.member_name())
    }

    /// Full name of a called member and whether it is inlined.
    fn callee(&self, handle: MemberHandle) -> (String, bool) {
        (self.ctx.member_name(handle), self.plan.is_inlined(handle))
    }

    /// Takes the next invocation slot of `callee` for calls in `group`.
    fn take_slot(&mut self, group: NodeId, callee: &str) -> Result<u32, TransformError> {
        let limit = self.member.invocations.get(callee).copied().unwrap_or(0);
        let next = self.slots.entry((group, callee.to_string())).or_insert(0);
        let slot = *next;
        if slot >= limit {
            return Err(InternalError::new(format!(
                "{}: call to {callee} needs slot {slot} but only {limit} were planned",
                self.member.full_name
            ))
            .into());
        }
        *next += 1;
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::select_entry_points;
    use silica_ast::{
        BinaryOp, Expr, MemberRef, MethodDecl, Modifiers, Parameter, Stmt, SyntaxTree, TypeDecl,
        TypeKind, TypeRef, Visibility,
    };
    use silica_config::HardwareGenerationConfig;

    fn entry(name: &str, params: &[&str], body: Stmt) -> MethodDecl {
        MethodDecl::new(
            name,
            params.iter().map(|p| Parameter::new(*p, TypeRef::i32())).collect(),
            TypeRef::i32(),
            Some(body),
        )
        .with_modifiers(Modifiers {
            visibility: Visibility::Public,
            is_virtual: true,
            ..Modifiers::default()
        })
    }

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::call(
            MemberRef {
                declaring_type: "Demo.K".into(),
                name: name.into(),
                parameter_types: args.iter().map(|_| TypeRef::i32()).collect(),
            },
            args,
        )
    }

    fn lower_all(methods: Vec<MethodDecl>) -> Vec<ArchitectureComponent> {
        let mut ty = TypeDecl::new("Demo.K", TypeKind::Class, Visibility::Public);
        ty.methods = methods;
        let config = HardwareGenerationConfig::new("Nexys A7-100T");
        let mut ctx =
            TransformationContext::prepare(&SyntaxTree::new(vec![ty]), &config, "id".into())
                .unwrap();
        let entries = select_entry_points(&ctx);
        let plan = CallPlan::build(&mut ctx, &entries).unwrap();
        plan.members()
            .map(|m| lower_member(&ctx, &plan, m).unwrap())
            .collect()
    }

    fn component<'c>(all: &'c [ArchitectureComponent], name: &str) -> &'c ArchitectureComponent {
        all.iter().find(|c| c.name == name).unwrap()
    }

    fn waits_on_invocation(state: &State) -> bool {
        matches!(
            &state.transition,
            Transition::WaitFor { condition: HwExpr::Signal(SignalRef::Invocation { .. }), .. }
        )
    }

    #[test]
    fn fast_body_fits_in_the_start_state() {
        let body = Stmt::ret(Some(Expr::binary(BinaryOp::Add, Expr::param("a"), Expr::param("b"))));
        let all = lower_all(vec![entry("Run", &["a", "b"], body)]);
        let run = component(&all, "Demo.K.Run(i32,i32)");
        assert_eq!(run.states.len(), 3);
        assert_eq!(run.states[1].body.len(), 3);
        assert_eq!(run.return_type, Some(HwType::Signed(32)));
        assert_eq!(run.worst_case_cycles, Some(2));
        assert!(run.declaration("a").is_some());
    }

    #[test]
    fn slow_operations_get_held_states() {
        // 23.32 ns at 100 MHz
        let body = Stmt::ret(Some(Expr::binary(BinaryOp::Div, Expr::param("a"), Expr::param("b"))));
        let all = lower_all(vec![entry("Run", &["a", "b"], body)]);
        let run = component(&all, "Demo.K.Run(i32,i32)");
        assert_eq!(run.states[2].wait_cycles, 2);
        assert_eq!(run.worst_case_cycles, Some(5));
    }

    #[test]
    fn constant_divisor_is_cheaper() {
        let body = Stmt::ret(Some(Expr::binary(BinaryOp::Div, Expr::param("a"), Expr::int(4))));
        let all = lower_all(vec![entry("Run", &["a"], body)]);
        let run = component(&all, "Demo.K.Run(i32)");
        assert!(run.states.iter().all(|s| s.wait_cycles == 0));
    }

    #[test]
    fn calls_use_the_invocation_handshake() {
        let run = entry("Run", &["a"], Stmt::ret(Some(call("Twice", vec![Expr::param("a")]))));
        let twice = MethodDecl::new(
            "Twice",
            vec![Parameter::new("x", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(Expr::binary(BinaryOp::Add, Expr::param("x"), Expr::param("x"))))),
        );
        let all = lower_all(vec![run, twice]);
        let run = component(&all, "Demo.K.Run(i32)");
        assert_eq!(run.invocations.len(), 1);
        assert_eq!(run.invocations[0].target, "Demo.K.Twice(i32)");
        assert!(run.states.iter().any(waits_on_invocation));
        assert_eq!(run.worst_case_cycles, None);
        let started = run.states.iter().flat_map(|s| &s.body).any(|stmt| {
            matches!(
                stmt,
                HwStmt::Assign {
                    target: silica_ir::HwTarget::Signal(SignalRef::Invocation { port: PortKind::Started, .. }),
                    value: HwExpr::Bool(true),
                }
            )
        });
        assert!(started);
        assert_eq!(component(&all, "Demo.K.Twice(i32)").instance_count, 1);
    }

    #[test]
    fn loops_have_no_static_bound() {
        let body = Stmt::block(vec![
            Stmt::local("i", TypeRef::i32(), Some(Expr::int(0))),
            Stmt::while_loop(
                Expr::binary(BinaryOp::Lt, Expr::local("i"), Expr::param("n")),
                Stmt::assign("i", Expr::binary(BinaryOp::Add, Expr::local("i"), Expr::int(1))),
            ),
            Stmt::ret(Some(Expr::local("i"))),
        ]);
        let all = lower_all(vec![entry("Count", &["n"], body)]);
        let count = component(&all, "Demo.K.Count(i32)");
        assert_eq!(count.worst_case_cycles, None);
        assert!(count
            .states
            .iter()
            .any(|s| matches!(s.transition, Transition::Branch { .. })));
    }

    #[test]
    fn inlined_calls_get_their_own_variables() {
        let mut square = MethodDecl::new(
            "Square",
            vec![Parameter::new("x", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(Expr::binary(BinaryOp::Mul, Expr::param("x"), Expr::param("x"))))),
        );
        square.modifiers.inline_hint = true;
        let run = entry("Run", &["a"], Stmt::ret(Some(call("Square", vec![Expr::param("a")]))));
        let all = lower_all(vec![run, square]);
        assert_eq!(all.len(), 1);
        let run = &all[0];
        assert!(run.invocations.is_empty());
        assert!(run.declaration("Square.1.x").is_some());
        assert!(run.worst_case_cycles.is_some());
    }

    #[test]
    fn parallel_invoke_fills_the_results_array() {
        let body = Stmt::block(vec![
            Stmt::parallel(
                Expr::int(4),
                "i",
                call("Work", vec![Expr::local("i")]),
                Some("out".into()),
            ),
            Stmt::ret(Some(Expr::element(Expr::local("out"), Expr::int(3)))),
        ]);
        let work = MethodDecl::new(
            "Work",
            vec![Parameter::new("k", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(Expr::param("k")))),
        );
        let all = lower_all(vec![entry("Run", &[], body), work]);
        let run = component(&all, "Demo.K.Run()");
        assert_eq!(run.invocations[0].slots, 4);
        assert_eq!(component(&all, "Demo.K.Work(i32)").instance_count, 4);
        assert_eq!(
            run.declaration("out").map(|d| &d.ty),
            Some(&HwType::Array {
                element: Box::new(HwType::Signed(32)),
                length: 4
            })
        );
    }

    #[test]
    fn every_transition_is_resolved() {
        let body = Stmt::block(vec![
            Stmt::if_else(
                Expr::binary(BinaryOp::Gt, Expr::param("a"), Expr::int(0)),
                Stmt::ret(Some(Expr::int(1))),
                None,
            ),
            Stmt::ret(Some(Expr::int(0))),
        ]);
        let all = lower_all(vec![entry("Sign", &["a"], body)]);
        let sign = component(&all, "Demo.K.Sign(i32)");
        let count = sign.states.len() as u32;
        for state in &sign.states {
            assert!(state.transition.targets().iter().all(|t| t.as_raw() < count));
        }
        assert_eq!(sign.worst_case_cycles, Some(3));
    }
}
