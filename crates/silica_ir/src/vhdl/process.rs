//! One clocked process per physical instance of a component.

use super::names::Names;
use super::render::{default_value, vhdl_type, Scope};
use super::Emitter;
use crate::component::{ArchitectureComponent, State, Transition};
use crate::hw::{PortKind, SignalRef};

/// Writes the process implementing `instance` of `component`.
pub fn write_component_process(
    out: &mut Emitter,
    names: &Names<'_>,
    component: &ArchitectureComponent,
    instance: u32,
) {
    let scope = Scope::new(names, component, instance);
    let max_wait = component
        .states
        .iter()
        .map(|s| s.wait_cycles)
        .max()
        .unwrap_or(0);

    if names.verbose() {
        out.comment(&format!("{} instance {instance}", component.name));
        if let Some(cycles) = component.worst_case_cycles {
            out.comment(&format!("worst case {cycles} clock cycles"));
        }
    }
    out.line(format!(
        "{}: process (Clock)",
        names.process_label(&component.name, instance)
    ));
    out.indent();
    let states: Vec<String> = component.states.iter().map(|s| names.state(s.id)).collect();
    out.line(format!("type state_t is ({});", states.join(", ")));
    out.line(format!(
        "variable state : state_t := {};",
        names.state(ArchitectureComponent::idle_state())
    ));
    if max_wait > 0 {
        out.line(format!("variable wait_count : natural range 0 to {max_wait} := 0;"));
    }
    for decl in &component.declarations {
        if names.verbose() {
            if let Some(comment) = &decl.comment {
                out.comment(comment);
            }
        }
        out.line(format!(
            "variable {} : {} := {};",
            scope.variable(&decl.name),
            vhdl_type(&decl.ty),
            default_value(&decl.ty)
        ));
    }
    out.dedent();
    out.line("begin");
    out.indent();
    out.line("if rising_edge(Clock) then");
    out.indent();
    out.line("if Reset = '1' then");
    out.indent();
    out.line(format!(
        "state := {};",
        names.state(ArchitectureComponent::idle_state())
    ));
    if max_wait > 0 {
        out.line("wait_count := 0;");
    }
    out.line(format!(
        "{} <= false;",
        scope.signal(&SignalRef::Own(PortKind::Finished))
    ));
    for invocation in &component.invocations {
        for slot in 0..invocation.slots {
            out.line(format!(
                "{} <= false;",
                scope.signal(&SignalRef::Invocation {
                    target: invocation.target.clone(),
                    slot,
                    port: PortKind::Started,
                })
            ));
        }
    }
    out.dedent();
    out.line("else");
    out.indent();
    out.line("case state is");
    out.indent();
    for state in &component.states {
        write_state(out, names, &scope, state);
    }
    out.dedent();
    out.line("end case;");
    out.dedent();
    out.line("end if;");
    out.dedent();
    out.line("end if;");
    out.dedent();
    out.line("end process;");
}

fn write_state(out: &mut Emitter, names: &Names<'_>, scope: &Scope<'_, '_>, state: &State) {
    out.line(format!("when {} =>", names.state(state.id)));
    out.indent();
    if names.verbose() && !state.label.is_empty() {
        out.comment(&state.label);
    }
    if state.wait_cycles == 0 {
        scope.stmts(out, &state.body);
        write_transition(out, names, scope, &state.transition);
    } else {
        out.line("if wait_count = 0 then");
        out.indent();
        scope.stmts(out, &state.body);
        if state.body.is_empty() {
            out.line("null;");
        }
        out.dedent();
        out.line("end if;");
        out.line(format!("if wait_count < {} then", state.wait_cycles));
        out.indent();
        out.line("wait_count := wait_count + 1;");
        out.dedent();
        out.line("else");
        out.indent();
        out.line("wait_count := 0;");
        write_transition(out, names, scope, &state.transition);
        out.dedent();
        out.line("end if;");
    }
    out.dedent();
}

fn write_transition(
    out: &mut Emitter,
    names: &Names<'_>,
    scope: &Scope<'_, '_>,
    transition: &Transition,
) {
    match transition {
        Transition::Goto(next) => out.line(format!("state := {};", names.state(*next))),
        Transition::Branch {
            condition,
            if_true,
            if_false,
        } => {
            out.line(format!("if {} then", scope.expr(condition)));
            out.indent();
            out.line(format!("state := {};", names.state(*if_true)));
            out.dedent();
            out.line("else");
            out.indent();
            out.line(format!("state := {};", names.state(*if_false)));
            out.dedent();
            out.line("end if;");
        }
        Transition::WaitFor { condition, next } => {
            out.line(format!("if {} then", scope.expr(condition)));
            out.indent();
            out.line(format!("state := {};", names.state(*next)));
            out.dedent();
            out.line("end if;");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Declaration, OutgoingInvocation};
    use crate::hw::{HwExpr, HwStmt, HwType, HwUnaryOp};
    use crate::ids::StateId;
    use silica_config::GenerationMode;

    fn component() -> ArchitectureComponent {
        let started = HwExpr::own(PortKind::Started);
        ArchitectureComponent {
            name: "T.Run()".into(),
            parameters: vec![],
            return_type: None,
            declarations: vec![Declaration {
                name: "i".into(),
                ty: HwType::Signed(32),
                comment: Some("loop counter".into()),
            }],
            states: vec![
                State {
                    id: StateId::from_raw(0),
                    label: "idle".into(),
                    body: vec![],
                    wait_cycles: 0,
                    transition: Transition::WaitFor {
                        condition: started.clone(),
                        next: StateId::from_raw(1),
                    },
                },
                State {
                    id: StateId::from_raw(1),
                    label: "divide".into(),
                    body: vec![HwStmt::set_var("i", HwExpr::var("i"))],
                    wait_cycles: 2,
                    transition: Transition::Goto(StateId::from_raw(2)),
                },
                State {
                    id: StateId::from_raw(2),
                    label: "finished".into(),
                    body: vec![HwStmt::drive(
                        SignalRef::Own(PortKind::Finished),
                        HwExpr::Bool(true),
                    )],
                    wait_cycles: 0,
                    transition: Transition::WaitFor {
                        condition: HwExpr::Unary {
                            op: HwUnaryOp::Not,
                            operand: Box::new(started),
                        },
                        next: StateId::from_raw(0),
                    },
                },
            ],
            invocations: vec![OutgoingInvocation {
                target: "T.Helper()".into(),
                slots: 1,
            }],
            instance_count: 1,
            worst_case_cycles: Some(4),
        }
    }

    #[test]
    fn compact_process_has_no_comments() {
        let comps = vec![component()];
        let names = Names::new(GenerationMode::Compact, &comps);
        let mut out = Emitter::default();
        write_component_process(&mut out, &names, &comps[0], 0);
        let text = out.finish();
        assert!(!text.contains("--"));
        assert!(text.starts_with("c0_0: process (Clock)"));
        assert!(text.contains("type state_t is (s0, s1, s2);"));
        assert!(text.contains("variable wait_count : natural range 0 to 2 := 0;"));
        assert!(text.contains("if wait_count < 2 then"));
        assert!(text.contains("variable v0 : signed(31 downto 0) := (others => '0');"));
        assert!(text.contains("x_T_Helper___from_c0_0_0_start <= false;"));
    }

    #[test]
    fn verbose_process_keeps_labels() {
        let comps = vec![component()];
        let names = Names::new(GenerationMode::Verbose, &comps);
        let mut out = Emitter::default();
        write_component_process(&mut out, &names, &comps[0], 0);
        let text = out.finish();
        assert!(text.contains("-- T.Run() instance 0"));
        assert!(text.contains("-- worst case 4 clock cycles"));
        assert!(text.contains("-- loop counter"));
        assert!(text.contains("-- divide"));
        assert!(text.contains("\\T.Run().0.Finished\\ <= true;"));
        assert!(text.contains("if (not \\T.Run().0.Started\\) then"));
    }
}
