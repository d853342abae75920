//! `silica generate`: the end-to-end run.
//!
//! 1. Load the configuration (explicit path or `silica.toml` in the cwd)
//! 2. Read the syntax tree from JSON
//! 3. Transform, optionally through an on-disk cache
//! 4. Write `hardware.vhd`, `member_ids.json` and `manifest.json`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};
use silica_ast::SyntaxTree;
use silica_cache::{FileStore, HardwareCache};
use silica_common::CancellationToken;
use silica_config::CONFIG_FILE_NAME;
use silica_ir::HardwareDescription;

use crate::{GenerateArgs, GlobalArgs};

/// VHDL output file name.
pub const SOURCE_FILE: &str = "hardware.vhd";
/// Member-id table file name.
pub const MEMBER_IDS_FILE: &str = "member_ids.json";
/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Runs the `silica generate` command. Returns 1 if transformation failed.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = silica_config::load_config(&config_path)?;
    let tree = SyntaxTree::from_json(&std::fs::read_to_string(&args.tree)?)?;

    let cache = args
        .cache_dir
        .as_deref()
        .map(|dir| HardwareCache::new(Arc::new(FileStore::new(dir))));

    let start = Instant::now();
    let description = match silica_transform::transform(
        &tree,
        &config,
        cache.as_ref(),
        &CancellationToken::new(),
    ) {
        Ok(description) => description,
        Err(e) => {
            error!("[{}] {e}", e.code());
            return Ok(1);
        }
    };
    info!(
        "generated {} components for {} in {:.2?}",
        description.manifest.components.len(),
        description.device.name,
        start.elapsed()
    );

    write_outputs(&args.out, &description)?;
    if !global.quiet {
        eprintln!(
            "    Finished {} ({})",
            args.out.join(SOURCE_FILE).display(),
            &description.identity[..description.identity.len().min(16)]
        );
    }
    Ok(0)
}

fn write_outputs(out: &Path, description: &HardwareDescription) -> std::io::Result<()> {
    std::fs::create_dir_all(out)?;
    std::fs::write(out.join(SOURCE_FILE), &description.source)?;
    std::fs::write(
        out.join(MEMBER_IDS_FILE),
        serde_json::to_string_pretty(description.member_ids())?,
    )?;
    std::fs::write(
        out.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&description.manifest)?,
    )?;
    Ok(())
}
