//! Invocation proxies: who may start each component.

use crate::callgraph::CallPlan;
use silica_ir::{ArchitectureComponent, InvocationProxy, InvocationSlot, EXTERNAL_CALLER};

/// Builds one proxy per component, sorted by target.
///
/// Every caller instance owns as many slots as its plan gives it for the
/// target, and entry points get one extra slot for the member-id dispatch.
pub fn build_proxies(plan: &CallPlan, components: &[ArchitectureComponent]) -> Vec<InvocationProxy> {
    let mut proxies: Vec<InvocationProxy> = components
        .iter()
        .map(|component| {
            let mut slots = Vec::new();
            for (caller, count) in plan.callers_of(&component.name) {
                for caller_instance in 0..caller.instances {
                    slots.extend((0..count).map(|slot| InvocationSlot {
                        caller: caller.full_name.clone(),
                        caller_instance,
                        slot,
                    }));
                }
            }
            if plan.member(&component.name).is_some_and(|m| m.is_entry) {
                slots.push(InvocationSlot {
                    caller: EXTERNAL_CALLER.to_string(),
                    caller_instance: 0,
                    slot: 0,
                });
            }
            InvocationProxy::new(
                component.name.clone(),
                component.instance_count,
                slots,
                component.parameters.clone(),
                component.return_type.clone(),
            )
        })
        .collect();
    proxies.sort_by(|a, b| a.target.cmp(&b.target));
    proxies
}
