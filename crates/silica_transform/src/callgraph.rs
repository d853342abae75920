//! Call graph, recursion checks and instance planning.
//!
//! Calls are grouped by the statement that contains them: every call to
//! the same member from one statement is assumed to be live at the same
//! time, and a parallel invoke of `n` copies counts `n` times. A caller
//! needs as many invocation slots for a callee as its largest group, and a
//! callee needs, per caller, that many instances for every instance of the
//! caller. Entry points add one instance for the external dispatch.
//!
//! Recursive members are bounded by their configured instance count: the
//! demand from outside plus the largest group of self-calls must fit.
//! Recursion with no configured bound and mutual recursion are rejected.

use crate::context::TransformationContext;
use crate::error::{ConfigurationError, TransformError};
use log::debug;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use silica_ast::visit::{walk_expr, walk_stmts};
use silica_ast::{ExprKind, Literal, MemberHandle, NodeId, NodeKind, StmtKind};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Calls made by one member.
#[derive(Debug, Clone, Default)]
struct CallerSummary {
    /// Largest statement group per callee.
    groups: BTreeMap<MemberHandle, u32>,
    /// Callees started from a parallel invoke.
    parallel: BTreeSet<MemberHandle>,
}

/// What the generated hardware for one member looks like from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPlan {
    /// Position in the tree.
    pub handle: MemberHandle,
    /// Full name.
    pub full_name: String,
    /// Physical instances to build.
    pub instances: u32,
    /// Started by the external member-id dispatch.
    pub is_entry: bool,
    /// Invocation slots per callee full name.
    pub invocations: BTreeMap<String, u32>,
}

/// The result of call planning: which members become components, which are
/// inlined, and how many instances and slots each gets.
#[derive(Debug, Clone, Default)]
pub struct CallPlan {
    members: BTreeMap<String, MemberPlan>,
    inlined: BTreeSet<MemberHandle>,
    entry_points: Vec<MemberHandle>,
}

impl CallPlan {
    /// Plans every member reachable from `entry_points`.
    ///
    /// Looks up each hardware member in the instance-count table, which
    /// records a default entry for members with no configured prefix.
    pub fn build(
        ctx: &mut TransformationContext,
        entry_points: &[MemberHandle],
    ) -> Result<Self, TransformError> {
        let summaries = collect_calls(ctx, entry_points)?;
        reject_mutual_recursion(ctx, &summaries)?;

        let parallel: BTreeSet<MemberHandle> = summaries
            .values()
            .flat_map(|s| s.parallel.iter().copied())
            .collect();
        let entries: BTreeSet<MemberHandle> = entry_points.iter().copied().collect();
        let view: &TransformationContext = ctx;
        let inlined: BTreeSet<MemberHandle> = summaries
            .keys()
            .copied()
            .filter(|&h| !entries.contains(&h) && is_inlinable(view, &summaries, &parallel, h))
            .collect();

        let order = caller_first_order(&summaries, &inlined)?;
        let mut instances: BTreeMap<MemberHandle, u32> = BTreeMap::new();
        let mut members = BTreeMap::new();
        for handle in order {
            let full_name = ctx.member_name(handle);
            let mut outside: u32 = u32::from(entries.contains(&handle));
            for (caller, summary) in &summaries {
                if *caller == handle {
                    continue;
                }
                if let (Some(group), Some(count)) =
                    (summary.groups.get(&handle), instances.get(caller))
                {
                    outside = outside.saturating_add(count.saturating_mul(*group));
                }
            }
            let self_calls = summaries
                .get(&handle)
                .and_then(|s| s.groups.get(&handle))
                .copied()
                .unwrap_or(0);

            let entry = ctx.instances.lookup(&full_name).clone();
            let allocated = if self_calls > 0 {
                if entry.is_default {
                    return Err(TransformError::unsupported(
                        "recursive call without a configured instance count",
                        full_name,
                    ));
                }
                let required = outside.saturating_add(self_calls);
                if required > entry.max {
                    return Err(ConfigurationError::InstanceBoundExceeded {
                        member: full_name,
                        configured: entry.max,
                        required,
                    }
                    .into());
                }
                entry.max
            } else {
                if !entry.is_default && outside > entry.max {
                    return Err(ConfigurationError::InstanceBoundExceeded {
                        member: full_name,
                        configured: entry.max,
                        required: outside,
                    }
                    .into());
                }
                outside.max(1)
            };
            debug!(
                "{full_name}: {allocated} instances (outside demand {outside}, self calls {self_calls})"
            );
            instances.insert(handle, allocated);

            let invocations = summaries
                .get(&handle)
                .map(|s| {
                    s.groups
                        .iter()
                        .filter(|(callee, _)| !inlined.contains(callee))
                        .map(|(callee, slots)| (ctx.member_name(*callee), *slots))
                        .collect()
                })
                .unwrap_or_default();
            members.insert(
                full_name.clone(),
                MemberPlan {
                    handle,
                    full_name,
                    instances: allocated,
                    is_entry: entries.contains(&handle),
                    invocations,
                },
            );
        }

        Ok(Self {
            members,
            inlined,
            entry_points: entry_points.to_vec(),
        })
    }

    /// Members that become components, by full name.
    pub fn members(&self) -> impl Iterator<Item = &MemberPlan> {
        self.members.values()
    }

    /// Returns the plan of a component member.
    pub fn member(&self, full_name: &str) -> Option<&MemberPlan> {
        self.members.get(full_name)
    }

    /// Returns true if calls to `handle` are expanded in place.
    pub fn is_inlined(&self, handle: MemberHandle) -> bool {
        self.inlined.contains(&handle)
    }

    /// The entry points this plan was built for.
    pub fn entry_points(&self) -> &[MemberHandle] {
        &self.entry_points
    }

    /// Every caller of `target` with its slot count, by caller name.
    pub fn callers_of<'a>(&'a self, target: &'a str) -> impl Iterator<Item = (&'a MemberPlan, u32)> {
        self.members
            .values()
            .filter_map(move |m| m.invocations.get(target).map(|slots| (m, *slots)))
    }
}

/// Returns the statement group of a call: its enclosing statement.
pub fn call_group(ctx: &TransformationContext, call: NodeId) -> Option<NodeId> {
    ctx.parents.enclosing(call, NodeKind::Statement)
}

fn collect_calls(
    ctx: &TransformationContext,
    entry_points: &[MemberHandle],
) -> Result<BTreeMap<MemberHandle, CallerSummary>, TransformError> {
    let mut summaries: BTreeMap<MemberHandle, CallerSummary> = BTreeMap::new();
    let mut pending: Vec<MemberHandle> = entry_points.to_vec();
    while let Some(handle) = pending.pop() {
        if summaries.contains_key(&handle) {
            continue;
        }
        let summary = summarize(ctx, handle)?;
        pending.extend(summary.groups.keys().copied());
        summaries.insert(handle, summary);
    }
    Ok(summaries)
}

fn summarize(
    ctx: &TransformationContext,
    handle: MemberHandle,
) -> Result<CallerSummary, TransformError> {
    let member = ctx.member_name(handle);
    let method = ctx.tree.method(handle);
    let Some(body) = &method.body else {
        return Err(TransformError::unsupported("member without a body", member));
    };

    // (statement, callee) -> live calls
    let mut groups: HashMap<(NodeId, MemberHandle), u32> = HashMap::new();
    let mut parallel = BTreeSet::new();
    let mut failure: Option<TransformError> = None;

    walk_stmts(body, &mut |stmt| {
        if failure.is_some() {
            return;
        }
        if let StmtKind::ParallelInvoke { count, call, .. } = &stmt.kind {
            let copies = match count.as_literal().and_then(Literal::as_int) {
                Some(n) if n > 0 => u32::try_from(n).ok(),
                _ => None,
            };
            let Some(copies) = copies else {
                failure = Some(TransformError::unsupported(
                    "parallel invoke with a non-constant count",
                    member.clone(),
                ));
                return;
            };
            let ExprKind::Call { target, args } = &call.kind else {
                failure = Some(TransformError::unsupported(
                    "parallel invoke of something other than a call",
                    member.clone(),
                ));
                return;
            };
            if args.iter().any(|a| a.contains_call()) {
                failure = Some(TransformError::unsupported(
                    "call inside a parallel invoke argument",
                    member.clone(),
                ));
                return;
            }
            match ctx.types.resolve_call(target) {
                Some(callee) => {
                    *groups.entry((stmt.id, callee)).or_default() += copies;
                    parallel.insert(callee);
                }
                None => failure = Some(unknown_call(target, &member)),
            }
            return;
        }
        for expr in stmt.exprs() {
            walk_expr(expr, &mut |e| {
                if failure.is_some() {
                    return;
                }
                if let ExprKind::Call { target, .. } = &e.kind {
                    match ctx.types.resolve_call(target) {
                        Some(callee) => {
                            let group = call_group(ctx, e.id).unwrap_or(stmt.id);
                            *groups.entry((group, callee)).or_default() += 1;
                        }
                        None => failure = Some(unknown_call(target, &member)),
                    }
                }
            });
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let mut summary = CallerSummary {
        parallel,
        ..CallerSummary::default()
    };
    for ((_, callee), count) in groups {
        let slot = summary.groups.entry(callee).or_default();
        *slot = (*slot).max(count);
    }
    Ok(summary)
}

fn unknown_call(target: &silica_ast::MemberRef, member: &str) -> TransformError {
    TransformError::unsupported(
        format!(
            "call to unknown member `{}.{}{}`",
            target.declaring_type,
            target.name,
            silica_ast::tree::signature_suffix(&target.parameter_types)
        ),
        member,
    )
}

fn reject_mutual_recursion(
    ctx: &TransformationContext,
    summaries: &BTreeMap<MemberHandle, CallerSummary>,
) -> Result<(), TransformError> {
    let (graph, _) = build_graph(summaries, &BTreeSet::new(), true);
    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let mut names: Vec<String> = scc.iter().map(|&n| ctx.member_name(graph[n])).collect();
            names.sort();
            return Err(TransformError::unsupported(
                format!("mutual recursion between {}", names.join(", ")),
                names[0].clone(),
            ));
        }
    }
    Ok(())
}

fn build_graph(
    summaries: &BTreeMap<MemberHandle, CallerSummary>,
    skip: &BTreeSet<MemberHandle>,
    self_loops: bool,
) -> (DiGraph<MemberHandle, ()>, BTreeMap<MemberHandle, NodeIndex>) {
    let mut graph = DiGraph::new();
    let nodes: BTreeMap<MemberHandle, NodeIndex> = summaries
        .keys()
        .filter(|h| !skip.contains(h))
        .map(|&h| (h, graph.add_node(h)))
        .collect();
    for (caller, summary) in summaries {
        let Some(&from) = nodes.get(caller) else {
            continue;
        };
        for callee in summary.groups.keys() {
            if !self_loops && callee == caller {
                continue;
            }
            if let Some(&to) = nodes.get(callee) {
                graph.add_edge(from, to, ());
            }
        }
    }
    (graph, nodes)
}

/// Hardware members, every caller before its callees.
fn caller_first_order(
    summaries: &BTreeMap<MemberHandle, CallerSummary>,
    inlined: &BTreeSet<MemberHandle>,
) -> Result<Vec<MemberHandle>, TransformError> {
    let (graph, _) = build_graph(summaries, inlined, false);
    let order = toposort(&graph, None).map_err(|cycle| {
        silica_common::InternalError::new(format!(
            "call graph cycle through {:?} survived the recursion check",
            graph[cycle.node_id()]
        ))
    })?;
    Ok(order.into_iter().map(|n| graph[n]).collect())
}

fn is_inlinable(
    ctx: &TransformationContext,
    summaries: &BTreeMap<MemberHandle, CallerSummary>,
    parallel: &BTreeSet<MemberHandle>,
    handle: MemberHandle,
) -> bool {
    let method = ctx.tree.method(handle);
    let is_leaf = summaries
        .get(&handle)
        .map(|s| s.groups.is_empty())
        .unwrap_or(true);
    method.modifiers.inline_hint
        && is_leaf
        && !parallel.contains(&handle)
        && ctx.instances.find(&ctx.member_name(handle)).is_none()
        && method
            .body
            .as_ref()
            .map(|body| !body.contains_loop())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_ast::{
        BinaryOp, Expr, MemberRef, MethodDecl, Modifiers, Parameter, Stmt, SyntaxTree, TypeDecl,
        TypeKind, TypeRef, Visibility,
    };
    use silica_config::HardwareGenerationConfig;

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

    fn public_virtual() -> Modifiers {
        Modifiers {
            visibility: Visibility::Public,
            is_virtual: true,
            ..Modifiers::default()
        }
    }

    fn plan(methods: Vec<MethodDecl>, config: HardwareGenerationConfig) -> Result<(CallPlan, TransformationContext), TransformError> {
        let mut ty = TypeDecl::new("Demo.K", TypeKind::Class, Visibility::Public);
        ty.methods = methods;
        let mut ctx =
            TransformationContext::prepare(&SyntaxTree::new(vec![ty]), &config, "id".into())?;
        let entries = crate::entry::select_entry_points(&ctx);
        let plan = CallPlan::build(&mut ctx, &entries)?;
        Ok((plan, ctx))
    }

    fn square() -> MethodDecl {
        MethodDecl::new(
            "Square",
            vec![Parameter::new("x", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(Expr::binary(
                BinaryOp::Mul,
                Expr::param("x"),
                Expr::param("x"),
            )))),
        )
    }

    fn config() -> HardwareGenerationConfig {
        HardwareGenerationConfig::new("Nexys A7-100T")
    }

    #[test]
    fn statement_groups_set_slots_and_instances() {
        // Run(a) => Square(a) + Square(a + 1)
        let run = MethodDecl::new(
            "Run",
            vec![Parameter::new("a", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(Expr::binary(
                BinaryOp::Add,
                call("Square", vec![Expr::param("a")]),
                call(
                    "Square",
                    vec![Expr::binary(BinaryOp::Add, Expr::param("a"), Expr::int(1))],
                ),
            )))),
        )
        .with_modifiers(public_virtual());
        let (plan, ctx) = plan(vec![run, square()], config()).unwrap();
        let run = plan.member("Demo.K.Run(i32)").unwrap();
        assert!(run.is_entry);
        assert_eq!(run.instances, 1);
        assert_eq!(run.invocations.get("Demo.K.Square(i32)"), Some(&2));
        let square = plan.member("Demo.K.Square(i32)").unwrap();
        assert_eq!(square.instances, 2);
        // default entries persist in the table
        assert!(ctx.instances.find("Demo.K.Square(i32)").unwrap().is_default);
    }

    #[test]
    fn separate_statements_do_not_add_up() {
        let run = MethodDecl::new(
            "Run",
            vec![Parameter::new("a", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::block(vec![
                Stmt::local("x", TypeRef::i32(), Some(call("Square", vec![Expr::param("a")]))),
                Stmt::ret(Some(call("Square", vec![Expr::local("x")]))),
            ])),
        )
        .with_modifiers(public_virtual());
        let (plan, _) = plan(vec![run, square()], config()).unwrap();
        assert_eq!(plan.member("Demo.K.Square(i32)").unwrap().instances, 1);
    }

    #[test]
    fn configured_bound_is_enforced_for_plain_members() {
        let run = MethodDecl::new(
            "Run",
            vec![Parameter::new("a", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(Expr::binary(
                BinaryOp::Add,
                call("Square", vec![Expr::param("a")]),
                call("Square", vec![Expr::param("a")]),
            )))),
        )
        .with_modifiers(public_virtual());
        let err = plan(
            vec![run, square()],
            config().with_instance_count("Demo.K.Square", 1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Configuration(ConfigurationError::InstanceBoundExceeded {
                configured: 1,
                required: 2,
                ..
            })
        ));
    }

    #[test]
    fn inline_hinted_leaves_are_inlined() {
        let mut sq = square();
        sq.modifiers.inline_hint = true;
        let run = MethodDecl::new(
            "Run",
            vec![Parameter::new("a", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(call("Square", vec![Expr::param("a")])))),
        )
        .with_modifiers(public_virtual());
        let (plan, ctx) = plan(vec![run, sq], config()).unwrap();
        let handle = ctx.types.member_by_full_name("Demo.K.Square(i32)").unwrap();
        assert!(plan.is_inlined(handle));
        assert!(plan.member("Demo.K.Square(i32)").is_none());
        assert!(plan.member("Demo.K.Run(i32)").unwrap().invocations.is_empty());
    }

    #[test]
    fn mutual_recursion_is_rejected() {
        let ping = MethodDecl::new(
            "Ping",
            vec![Parameter::new("n", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(call("Pong", vec![Expr::param("n")])))),
        )
        .with_modifiers(public_virtual());
        let pong = MethodDecl::new(
            "Pong",
            vec![Parameter::new("n", TypeRef::i32())],
            TypeRef::i32(),
            Some(Stmt::ret(Some(call("Ping", vec![Expr::param("n")])))),
        );
        let err = plan(vec![ping, pong], config()).unwrap_err();
        assert_eq!(err.code(), "E400");
        assert!(err.to_string().contains("mutual recursion"));
    }

    #[test]
    fn unknown_callee_is_rejected() {
        let run = MethodDecl::new(
            "Run",
            vec![],
            TypeRef::i32(),
            Some(Stmt::ret(Some(call("Missing", vec![])))),
        )
        .with_modifiers(public_virtual());
        let err = plan(vec![run], config()).unwrap_err();
        assert!(err.to_string().contains("Demo.K.Missing()"));
    }
}
