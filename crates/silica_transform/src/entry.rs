//! Hardware entry-point selection.
//!
//! A member is an entry point if it explicitly implements a member of an
//! interface present in the tree (visibility is not consulted), or if it is
//! public, declared on a public class, and either virtual or name-matching a
//! member of one of the class's interfaces. The interface list of a type is
//! already flattened, so no inheritance walk happens here. Members without a
//! body never qualify, and configured entry-point prefixes narrow the set.

use crate::context::TransformationContext;
use log::debug;
use silica_ast::{
    name_alternates, MemberHandle, MemberRef, MethodDecl, TypeDecl, TypeKind, Visibility,
};

/// Returns true if `method` of `ty` qualifies, before prefix filtering.
pub fn is_entry_point(ctx: &TransformationContext, ty: &TypeDecl, method: &MethodDecl) -> bool {
    if method.body.is_none() || ty.kind == TypeKind::Interface {
        return false;
    }
    if let Some(interface) = &method.explicit_interface {
        return implements_explicitly(ctx, ty, interface, method);
    }
    if method.modifiers.visibility != Visibility::Public
        || ty.visibility != Visibility::Public
        || ty.kind != TypeKind::Class
    {
        return false;
    }
    method.modifiers.is_virtual || matches_interface_member(ctx, ty, method)
}

fn implements_explicitly(
    ctx: &TransformationContext,
    ty: &TypeDecl,
    interface: &str,
    method: &MethodDecl,
) -> bool {
    let target = MemberRef {
        declaring_type: interface.to_string(),
        name: method.name.clone(),
        parameter_types: method.parameters.iter().map(|p| p.ty.clone()).collect(),
    };
    let found = ctx
        .types
        .resolve_call(&target)
        .map(|handle| ctx.tree.declaring_type(handle).kind == TypeKind::Interface)
        .unwrap_or(false);
    if !found {
        debug!(
            "{} names interface `{interface}`, which has no matching member in the tree",
            ty.member_full_name(method)
        );
    }
    found
}

fn matches_interface_member(
    ctx: &TransformationContext,
    ty: &TypeDecl,
    method: &MethodDecl,
) -> bool {
    ty.interfaces.iter().any(|interface| {
        let is_interface = ctx
            .tree
            .find_type(interface)
            .map(|decl| decl.kind == TypeKind::Interface)
            .unwrap_or(false);
        is_interface
            && name_alternates(&method.name)
                .iter()
                .any(|name| !ctx.types.methods_named(interface, name).is_empty())
    })
}

/// Selects every entry point, in member-name order.
pub fn select_entry_points(ctx: &TransformationContext) -> Vec<MemberHandle> {
    let prefixes = &ctx.config.hardware_entry_point_prefixes;
    let mut out: Vec<(String, MemberHandle)> = Vec::new();
    for (type_pos, ty) in ctx.tree.types.iter().enumerate() {
        for (method_pos, method) in ty.methods.iter().enumerate() {
            if !is_entry_point(ctx, ty, method) {
                continue;
            }
            let full_name = ty.member_full_name(method);
            if !prefixes.is_empty() && !prefixes.iter().any(|p| full_name.starts_with(p.as_str())) {
                debug!("{full_name} filtered out by entry point prefixes");
                continue;
            }
            out.push((
                full_name,
                MemberHandle {
                    type_pos: type_pos as u32,
                    method_pos: method_pos as u32,
                },
            ));
        }
    }
    out.sort();
    debug!("selected {} entry points", out.len());
    out.into_iter().map(|(_, handle)| handle).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_ast::{Modifiers, Stmt, SyntaxTree, TypeRef};
    use silica_config::HardwareGenerationConfig;

    fn public_virtual() -> Modifiers {
        Modifiers {
            visibility: Visibility::Public,
            is_virtual: true,
            ..Modifiers::default()
        }
    }

    fn method(name: &str, modifiers: Modifiers) -> MethodDecl {
        MethodDecl::new(name, vec![], TypeRef::Void, Some(Stmt::block(vec![])))
            .with_modifiers(modifiers)
    }

    fn context(types: Vec<TypeDecl>, prefixes: &[&str]) -> TransformationContext {
        let mut config = HardwareGenerationConfig::new("Nexys A7-100T");
        config.hardware_entry_point_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        TransformationContext::prepare(&SyntaxTree::new(types), &config, "id".into()).unwrap()
    }

    fn names(ctx: &TransformationContext) -> Vec<String> {
        select_entry_points(ctx)
            .into_iter()
            .map(|h| ctx.member_name(h))
            .collect()
    }

    #[test]
    fn public_virtual_on_public_class() {
        let mut ty = TypeDecl::new("Demo.K", TypeKind::Class, Visibility::Public);
        ty.methods.push(method("Run", public_virtual()));
        ty.methods.push(method(
            "Hidden",
            Modifiers {
                is_virtual: true,
                ..Modifiers::default()
            },
        ));
        let ctx = context(vec![ty], &[]);
        assert_eq!(names(&ctx), vec!["Demo.K.Run()"]);
    }

    #[test]
    fn internal_class_does_not_qualify() {
        let mut ty = TypeDecl::new("Demo.K", TypeKind::Class, Visibility::Internal);
        ty.methods.push(method("Run", public_virtual()));
        let ctx = context(vec![ty], &[]);
        assert!(names(&ctx).is_empty());
    }

    #[test]
    fn prefixes_filter() {
        let mut a = TypeDecl::new("Demo.A", TypeKind::Class, Visibility::Public);
        a.methods.push(method("Run", public_virtual()));
        let mut b = TypeDecl::new("Other.B", TypeKind::Class, Visibility::Public);
        b.methods.push(method("Run", public_virtual()));
        let ctx = context(vec![a, b], &["Demo."]);
        assert_eq!(names(&ctx), vec!["Demo.A.Run()"]);
    }

    #[test]
    fn abstract_members_without_body_are_skipped() {
        let mut ty = TypeDecl::new("Demo.K", TypeKind::Class, Visibility::Public);
        ty.methods.push(
            MethodDecl::new("Run", vec![], TypeRef::Void, None).with_modifiers(public_virtual()),
        );
        let ctx = context(vec![ty], &[]);
        assert!(names(&ctx).is_empty());
    }
}
