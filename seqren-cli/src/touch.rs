use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use seqren_core::{resolve_sources, touch_operation, OperationEnv, OutputFormatter, TouchRequest};
use std::path::PathBuf;

use crate::cli::args::OutputArgs;
use crate::cli::OutputFormat;
use crate::ensure_complete;

/// New values for a touch; `None` leaves the value as it is.
#[derive(Debug, Default)]
pub struct TouchChanges {
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub readonly: Option<bool>,
}

pub fn handle_touch(
    paths: &[PathBuf],
    changes: TouchChanges,
    dry_run: bool,
    output: &OutputArgs,
    env: &mut OperationEnv<'_>,
) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let request = TouchRequest {
        sources: resolve_sources(paths, &working_dir)?,
        modified: changes.modified,
        accessed: changes.accessed,
        created: changes.created,
        readonly: changes.readonly,
        dry_run,
    };
    let result = touch_operation(&request, env)?;

    match output.output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => {
            if !output.quiet {
                print!("{}", result.format_summary());
            }
        },
    }

    ensure_complete(result.report.as_ref())
}
