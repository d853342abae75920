//! Final assembly: canonical ordering, the member-id table and VHDL.

use crate::callgraph::CallPlan;
use crate::context::TransformationContext;
use crate::error::TransformError;
use silica_common::InternalError;
use silica_ir::{
    write_vhdl, ArchitectureComponent, EntryPointInfo, HardwareDescription, InvocationProxy,
    MemberIdTable, ParameterShape, TransformedManifest,
};

/// Orders everything canonically and renders the description.
///
/// Components and proxies are sorted by member name, so the output does not
/// depend on the order the parallel phase finished in.
pub fn assemble(
    ctx: &TransformationContext,
    plan: &CallPlan,
    mut components: Vec<ArchitectureComponent>,
    mut proxies: Vec<InvocationProxy>,
) -> Result<HardwareDescription, TransformError> {
    components.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(pair) = components.windows(2).find(|w| w[0].name == w[1].name) {
        return Err(InternalError::new(format!("component {} generated twice", pair[0].name)).into());
    }
    proxies.sort_by(|a, b| a.target.cmp(&b.target));

    let member_ids = MemberIdTable::from_names(
        plan.members()
            .filter(|m| m.is_entry)
            .map(|m| m.full_name.clone()),
    );
    let mut entry_points = Vec::with_capacity(member_ids.len());
    for entry in member_ids.iter() {
        let plan_entry = plan.member(&entry.full_name).ok_or_else(|| {
            InternalError::new(format!("entry point {} has no plan", entry.full_name))
        })?;
        let method = ctx.tree.method(plan_entry.handle);
        entry_points.push(EntryPointInfo {
            member_id: entry.id,
            full_name: entry.full_name.clone(),
            parameters: method
                .parameters
                .iter()
                .map(|p| ParameterShape {
                    name: p.name.clone(),
                    ty: p.ty.to_string(),
                })
                .collect(),
            return_type: method.return_type.to_string(),
            is_async: method.modifiers.is_async,
            is_explicit_interface: method.explicit_interface.is_some(),
        });
    }

    let manifest = TransformedManifest {
        components,
        proxies,
        member_ids,
        entry_points,
    };
    let device = ctx.timing.device().clone();
    let source = write_vhdl(&manifest, &device, &ctx.identity, ctx.config.generation_mode);
    Ok(HardwareDescription {
        identity: ctx.identity.clone(),
        source,
        device,
        manifest,
    })
}
