//! Architecture components: one member's state machine.
//!
//! States are numbered from 0. State 0 is always the idle state waiting for
//! `Started`; the last state always raises `Finished` and waits for the
//! caller to drop `Started` before returning to idle.

use crate::hw::{HwExpr, HwStmt, HwType};
use crate::ids::StateId;
use serde::{Deserialize, Serialize};

/// How control leaves a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    /// Unconditional.
    Goto(StateId),
    /// Two-way guarded branch.
    Branch {
        /// The guard.
        condition: HwExpr,
        /// Taken when the guard holds.
        if_true: StateId,
        /// Taken otherwise.
        if_false: StateId,
    },
    /// Stay until the guard holds, then move on.
    WaitFor {
        /// The guard.
        condition: HwExpr,
        /// The next state.
        next: StateId,
    },
}

impl Transition {
    /// Returns every possible successor.
    pub fn targets(&self) -> Vec<StateId> {
        match self {
            Transition::Goto(next) | Transition::WaitFor { next, .. } => vec![*next],
            Transition::Branch {
                if_true, if_false, ..
            } => vec![*if_true, *if_false],
        }
    }
}

/// One state of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Position in [`ArchitectureComponent::states`].
    pub id: StateId,
    /// Human-readable purpose, emitted as a comment in verbose mode.
    pub label: String,
    /// Statements executed on entry.
    pub body: Vec<HwStmt>,
    /// Extra clock cycles to hold the state after the body, for multi-cycle
    /// operations.
    pub wait_cycles: u32,
    /// How control leaves.
    pub transition: Transition,
}

/// A process variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Variable name.
    pub name: String,
    /// Variable type.
    pub ty: HwType,
    /// What the variable holds, emitted in verbose mode.
    pub comment: Option<String>,
}

/// A typed port of an invocation interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPort {
    /// Parameter name.
    pub name: String,
    /// Port type.
    pub ty: HwType,
}

/// Calls this component makes to one other member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingInvocation {
    /// Full name of the called member.
    pub target: String,
    /// Number of invocation slots, i.e. calls that can be live at once.
    pub slots: u32,
}

/// The generated hardware for one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureComponent {
    /// Full name of the member.
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ComponentPort>,
    /// Return type, if any.
    pub return_type: Option<HwType>,
    /// Process variables.
    pub declarations: Vec<Declaration>,
    /// States; see the module docs for the fixed first and last states.
    pub states: Vec<State>,
    /// Outgoing invocations, sorted by target.
    pub invocations: Vec<OutgoingInvocation>,
    /// Number of physical copies of this state machine.
    pub instance_count: u32,
    /// Clock cycles from start to finish when statically bounded.
    pub worst_case_cycles: Option<u64>,
}

impl ArchitectureComponent {
    /// The idle state.
    pub fn idle_state() -> StateId {
        StateId::from_raw(0)
    }

    /// The finished state.
    pub fn finished_state(&self) -> StateId {
        StateId::from_raw(self.states.len().saturating_sub(1) as u32)
    }

    /// Returns the declaration of a variable.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Returns the longest start-to-finish path in clock cycles, counting one
    /// cycle plus the wait cycles of every state passed through.
    ///
    /// `None` when the path length depends on run-time data: any loop, or any
    /// wait on another component.
    pub fn compute_worst_case_cycles(&self) -> Option<u64> {
        let finished = self.finished_state();
        if self.states.len() < 2 {
            return None;
        }
        // memo[i]: longest path from state i to the finished state.
        let mut memo: Vec<Option<u64>> = vec![None; self.states.len()];
        let mut on_stack = vec![false; self.states.len()];
        self.longest_from(StateId::from_raw(1), finished, &mut memo, &mut on_stack)
    }

    fn longest_from(
        &self,
        state: StateId,
        finished: StateId,
        memo: &mut Vec<Option<u64>>,
        on_stack: &mut Vec<bool>,
    ) -> Option<u64> {
        if state == finished {
            return Some(1);
        }
        if let Some(known) = memo[state.index()] {
            return Some(known);
        }
        if on_stack[state.index()] || state == Self::idle_state() {
            return None;
        }
        let current = self.states.get(state.index())?;
        if matches!(current.transition, Transition::WaitFor { .. }) {
            return None;
        }
        on_stack[state.index()] = true;
        let mut best = 0;
        for next in current.transition.targets() {
            best = best.max(self.longest_from(next, finished, memo, on_stack)?);
        }
        on_stack[state.index()] = false;
        let total = best + 1 + u64::from(current.wait_cycles);
        memo[state.index()] = Some(total);
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: u32, wait_cycles: u32, transition: Transition) -> State {
        State {
            id: StateId::from_raw(id),
            label: format!("s{id}"),
            body: vec![],
            wait_cycles,
            transition,
        }
    }

    fn component(states: Vec<State>) -> ArchitectureComponent {
        ArchitectureComponent {
            name: "T.M()".into(),
            parameters: vec![],
            return_type: None,
            declarations: vec![],
            states,
            invocations: vec![],
            instance_count: 1,
            worst_case_cycles: None,
        }
    }

    fn idle() -> State {
        state(
            0,
            0,
            Transition::WaitFor {
                condition: HwExpr::Bool(true),
                next: StateId::from_raw(1),
            },
        )
    }

    fn finished(id: u32) -> State {
        state(
            id,
            0,
            Transition::WaitFor {
                condition: HwExpr::Bool(true),
                next: StateId::from_raw(0),
            },
        )
    }

    #[test]
    fn straight_line_cycles() {
        let c = component(vec![
            idle(),
            state(1, 2, Transition::Goto(StateId::from_raw(2))),
            finished(2),
        ]);
        // state 1: 1 + 2 wait, finished: 1
        assert_eq!(c.compute_worst_case_cycles(), Some(4));
    }

    #[test]
    fn branch_takes_longest() {
        let c = component(vec![
            idle(),
            state(
                1,
                0,
                Transition::Branch {
                    condition: HwExpr::Bool(true),
                    if_true: StateId::from_raw(2),
                    if_false: StateId::from_raw(3),
                },
            ),
            state(2, 5, Transition::Goto(StateId::from_raw(3))),
            finished(3),
        ]);
        assert_eq!(c.compute_worst_case_cycles(), Some(1 + 6 + 1));
    }

    #[test]
    fn loops_are_unbounded() {
        let c = component(vec![
            idle(),
            state(
                1,
                0,
                Transition::Branch {
                    condition: HwExpr::Bool(true),
                    if_true: StateId::from_raw(1),
                    if_false: StateId::from_raw(2),
                },
            ),
            finished(2),
        ]);
        assert_eq!(c.compute_worst_case_cycles(), None);
    }

    #[test]
    fn fixed_states() {
        let c = component(vec![idle(), finished(1)]);
        assert_eq!(ArchitectureComponent::idle_state().as_raw(), 0);
        assert_eq!(c.finished_state().as_raw(), 1);
        assert_eq!(c.compute_worst_case_cycles(), Some(1));
    }
}
