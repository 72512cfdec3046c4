use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::batch::{BatchContext, FixedPolicy};
use crate::format_spec::FormatSpec;
use crate::generator::DestinationPathGenerator;
use crate::output::{RenameEntry, RenameResult};
use crate::rename::StepPhase;

use super::{batch_context, OperationEnv};

/// Arguments of a rename run. `None` fields fall back to the config.
#[derive(Debug, Clone, Default)]
pub struct RenameRequest {
    /// Absolute source paths in the order the counter is assigned.
    pub sources: Vec<PathBuf>,
    pub pattern: Option<String>,
    pub start: Option<u32>,
    pub dest_dir: Option<PathBuf>,
    pub unique: Option<bool>,
    pub dry_run: bool,
}

/// Rename operation - returns structured data
pub fn rename_operation(request: &RenameRequest, env: &mut OperationEnv<'_>) -> Result<RenameResult> {
    let config = env.config;
    let pattern = request
        .pattern
        .clone()
        .unwrap_or_else(|| config.defaults.pattern.clone());
    let spec = FormatSpec::parse(&pattern);

    let mut session = env.open_session(request.sources.clone());
    let mut options = config.generate_options();
    options.case_insensitive = session.case_insensitive();
    if let Some(start) = request.start {
        options.start = start;
    }
    if let Some(unique) = request.unique {
        options.unique = unique;
    }
    options.dest_dir.clone_from(&request.dest_dir);

    let generator = DestinationPathGenerator::new(spec, options)
        .with_context(|| format!("Cannot rename with pattern '{pattern}'"))?;

    // Filling in destinations is an in-memory edit; any failure there is fatal.
    let mut edit_policy = FixedPolicy::abort();
    let mut edit_ctx = BatchContext::new(&mut edit_policy);
    let generated = session.generate(&generator, &mut edit_ctx)?;

    let plan = session.plan_renames()?;
    let staged = plan
        .steps
        .iter()
        .filter(|s| s.phase == StepPhase::Staged)
        .count();

    let pairs = session.working_set().rename_items().pairs();
    let renames: Vec<RenameEntry> = request
        .sources
        .iter()
        .filter_map(|source| {
            pairs.get(source).map(|dest| RenameEntry {
                from: source.display().to_string(),
                to: dest.display().to_string(),
            })
        })
        .collect();
    let warnings = generated
        .warnings
        .iter()
        .map(|(path, warning)| format!("{}: {warning}", path.display()))
        .collect();

    let mut result = RenameResult {
        pattern,
        renames,
        staged,
        next_counter: generated.next_counter,
        dry_run: request.dry_run,
        warnings,
        report: None,
        use_color: env.use_color,
    };
    if request.dry_run || result.renames.is_empty() {
        return Ok(result);
    }

    let mut oplog = env.open_operation_log()?;
    let mut ctx = batch_context(&mut *env.policy, oplog.as_mut(), env.cancel);
    ctx.log(&format!(
        "Renaming {} files with pattern '{}'",
        result.renames.len(),
        result.pattern
    ));
    session.commit_renames(&mut ctx)?;
    let report = ctx.into_report();

    session
        .save()
        .with_context(|| format!("Failed to write undo log: {}", session.log_path().display()))?;

    result.report = Some(report);
    Ok(result)
}
