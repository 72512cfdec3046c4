use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::format_spec::FormatSpec;
use crate::generator::DestinationPathGenerator;
use crate::output::NextSeqResult;
use crate::rename::detect_case_insensitive_fs;

/// Find the first starting counter that renames `sources` without touching
/// any file outside the batch.
pub fn next_seq_operation(
    sources: &[PathBuf],
    pattern: Option<&str>,
    start: Option<u32>,
    dest_dir: Option<PathBuf>,
    config: &Config,
) -> Result<NextSeqResult> {
    let pattern = pattern.unwrap_or(&config.defaults.pattern).to_string();
    let mut options = config.generate_options();
    if let Some(start) = start {
        options.start = start;
    }
    if let Some(parent) = sources.first().and_then(|p| p.parent()) {
        options.case_insensitive = detect_case_insensitive_fs(parent);
    }
    options.dest_dir = dest_dir;
    let start = options.start;

    let generator = DestinationPathGenerator::new(FormatSpec::parse(&pattern), options)
        .with_context(|| format!("Cannot number files with pattern '{pattern}'"))?;
    let next = generator.find_next_avail_seq_count(sources)?;

    Ok(NextSeqResult {
        pattern,
        start,
        next,
    })
}
