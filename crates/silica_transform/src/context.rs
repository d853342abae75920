//! The per-request transformation context.

use crate::error::TransformError;
use log::debug;
use silica_ast::{MemberHandle, ParentIndex, SyntaxTree, TypeIndex};
use silica_common::{ContentHasher, SilicaResult};
use silica_config::{CanonicalConfig, HardwareGenerationConfig, InstanceCountTable};
use silica_resolve::ArraySizeTable;
use silica_timing::TimingModel;

/// Version folded into every identity, so output from another silica
/// build is never reused.
pub const IDENTITY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Computes the transformation identity of `tree` under `config`.
///
/// Only the canonical projection of the configuration takes part, so map
/// and list order in the configuration never changes the identity.
pub fn transformation_identity(
    tree: &SyntaxTree,
    config: &HardwareGenerationConfig,
) -> SilicaResult<String> {
    let tree_hash = tree.content_hash()?;
    let canonical = CanonicalConfig::from_config(config).to_canonical_string();
    let mut hasher = ContentHasher::new();
    hasher
        .update_str(IDENTITY_VERSION)
        .update(tree_hash.as_bytes())
        .update_str(&canonical);
    Ok(hasher.finish().to_string())
}

/// Everything one transformation run reads.
///
/// Built sequentially by [`TransformationContext::prepare`]; shared
/// read-only by the parallel per-member phase. The instance-count table is
/// the one exception: call planning fills in default entries before the
/// parallel phase starts.
#[derive(Debug)]
pub struct TransformationContext {
    /// Transformation identity.
    pub identity: String,
    /// The resolved (constant-folded) tree.
    pub tree: SyntaxTree,
    /// The active configuration.
    pub config: HardwareGenerationConfig,
    /// Member and type lookup over `tree`.
    pub types: TypeIndex,
    /// Parent links over `tree`.
    pub parents: ParentIndex,
    /// Every known array length.
    pub arrays: ArraySizeTable,
    /// Instance bounds, defaults included once looked up.
    pub instances: InstanceCountTable,
    /// Device timing.
    pub timing: TimingModel,
}

impl TransformationContext {
    /// Resolves `tree` and loads everything the later phases need.
    pub fn prepare(
        tree: &SyntaxTree,
        config: &HardwareGenerationConfig,
        identity: String,
    ) -> Result<Self, TransformError> {
        let timing = TimingModel::for_config(config)?;
        let resolved = silica_resolve::resolve(tree, config)?;
        let types = TypeIndex::build(&resolved.tree).map_err(silica_resolve::ResolveError::from)?;
        let parents = ParentIndex::build(&resolved.tree);
        debug!(
            "prepared {identity}: {} members, {} arrays, device {}",
            types.member_count(),
            resolved.arrays.len(),
            timing.device().name
        );
        Ok(Self {
            identity,
            tree: resolved.tree,
            config: config.clone(),
            types,
            parents,
            arrays: resolved.arrays,
            instances: InstanceCountTable::from_config(config),
            timing,
        })
    }

    /// Full name of a member.
    pub fn member_name(&self, handle: MemberHandle) -> String {
        self.tree.member_full_name(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_ast::{MethodDecl, TypeDecl, TypeKind, TypeRef, Visibility};
    use silica_config::GenerationMode;

    fn tree() -> SyntaxTree {
        let mut ty = TypeDecl::new("Demo.K", TypeKind::Class, Visibility::Public);
        ty.methods.push(MethodDecl::new("Run", vec![], TypeRef::Void, None));
        SyntaxTree::new(vec![ty])
    }

    #[test]
    fn identity_ignores_configuration_order() {
        let a = HardwareGenerationConfig::new("Nexys A7-100T")
            .with_instance_count("A", 1)
            .with_instance_count("B", 2)
            .with_array_length("x", 4)
            .with_array_length("y", 5);
        let b = HardwareGenerationConfig::new("Nexys A7-100T")
            .with_instance_count("B", 2)
            .with_instance_count("A", 1)
            .with_array_length("y", 5)
            .with_array_length("x", 4);
        assert_eq!(
            transformation_identity(&tree(), &a).unwrap(),
            transformation_identity(&tree(), &b).unwrap()
        );
    }

    #[test]
    fn identity_tracks_mode_and_tree() {
        let config = HardwareGenerationConfig::new("Nexys A7-100T");
        let base = transformation_identity(&tree(), &config).unwrap();
        let compact = config.clone().with_generation_mode(GenerationMode::Compact);
        assert_ne!(base, transformation_identity(&tree(), &compact).unwrap());
        let mut other = tree();
        other.types[0].methods[0].name = "Go".into();
        assert_ne!(base, transformation_identity(&other, &config).unwrap());
    }

    #[test]
    fn identity_ignores_caching_flag() {
        let config = HardwareGenerationConfig::new("Nexys A7-100T");
        assert_eq!(
            transformation_identity(&tree(), &config).unwrap(),
            transformation_identity(&tree(), &config.clone().with_caching(false)).unwrap()
        );
    }

    #[test]
    fn prepare_rejects_unknown_device() {
        let err = TransformationContext::prepare(
            &tree(),
            &HardwareGenerationConfig::new("No Such Board"),
            "id".into(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "E302");
    }
}
