//! The transformation entry point.

use crate::assemble::assemble;
use crate::callgraph::CallPlan;
use crate::context::{transformation_identity, TransformationContext};
use crate::entry::select_entry_points;
use crate::error::{ConfigurationError, TransformError};
use crate::lower::lower_member;
use crate::proxy::build_proxies;
use log::info;
use rayon::prelude::*;
use silica_ast::SyntaxTree;
use silica_cache::HardwareCache;
use silica_common::{CancellationToken, InternalError};
use silica_config::{validate_config, HardwareGenerationConfig};
use silica_ir::HardwareDescription;
use std::sync::Arc;
use std::time::Instant;

/// Transforms `tree` into hardware under `config`.
///
/// With caching enabled and a `cache` given, concurrent requests for the
/// same identity run once and later requests are served from the store.
/// `cancel` is checked between phases and before each member.
pub fn transform(
    tree: &SyntaxTree,
    config: &HardwareGenerationConfig,
    cache: Option<&HardwareCache>,
    cancel: &CancellationToken,
) -> Result<Arc<HardwareDescription>, TransformError> {
    validate_config(config)?;
    let identity = transformation_identity(tree, config)?;
    match cache {
        Some(cache) if config.enable_caching => {
            cache.get_or_compute(&identity, || run(tree, config, identity.clone(), cancel))
        }
        _ => run(tree, config, identity, cancel).map(Arc::new),
    }
}

fn check(cancel: &CancellationToken) -> Result<(), TransformError> {
    if cancel.is_cancelled() {
        Err(TransformError::Cancelled)
    } else {
        Ok(())
    }
}

/// Runs every phase of one transformation.
pub fn run(
    tree: &SyntaxTree,
    config: &HardwareGenerationConfig,
    identity: String,
    cancel: &CancellationToken,
) -> Result<HardwareDescription, TransformError> {
    let started = Instant::now();
    info!("transforming {identity} for {}", config.device);

    let mut ctx = TransformationContext::prepare(tree, config, identity)?;
    let entry_points = select_entry_points(&ctx);
    if entry_points.is_empty() {
        return Err(ConfigurationError::NoEntryPoints.into());
    }
    let plan = CallPlan::build(&mut ctx, &entry_points)?;
    check(cancel)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_degree_of_parallelism)
        .build()
        .map_err(|e| InternalError::new(format!("cannot start worker pool: {e}")))?;
    let members: Vec<_> = plan.members().collect();
    let components = pool.install(|| {
        members
            .par_iter()
            .map(|member| {
                check(cancel)?;
                lower_member(&ctx, &plan, member)
            })
            .collect::<Result<Vec<_>, TransformError>>()
    })?;
    check(cancel)?;

    let proxies = build_proxies(&plan, &components);
    let description = assemble(&ctx, &plan, components, proxies)?;
    info!(
        "transformed {} in {:.1?}: {} components, {} entry points",
        description.identity,
        started.elapsed(),
        description.manifest.components.len(),
        description.manifest.entry_points.len()
    );
    Ok(description)
}
