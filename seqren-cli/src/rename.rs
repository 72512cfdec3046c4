use anyhow::{Context, Result};
use seqren_core::{rename_operation, resolve_sources, OperationEnv, OutputFormatter, RenameRequest};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::cli::args::{NumberingArgs, OutputArgs};
use crate::cli::OutputFormat;
use crate::ensure_complete;

#[allow(clippy::too_many_arguments)]
pub fn handle_rename(
    paths: Vec<PathBuf>,
    numbering: NumberingArgs,
    recursive: bool,
    no_unique: bool,
    dry_run: bool,
    output: &OutputArgs,
    env: &mut OperationEnv<'_>,
) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let paths = if recursive { expand_dirs(&paths)? } else { paths };
    let sources = resolve_sources(&paths, &working_dir)?;

    let request = RenameRequest {
        sources,
        pattern: numbering.pattern,
        start: numbering.start,
        dest_dir: numbering.dest_dir.map(|dir| working_dir.join(dir)),
        unique: no_unique.then_some(false),
        dry_run,
    };
    let result = rename_operation(&request, env)?;

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

/// Replace each directory with the files below it, sorted by name.
fn expand_dirs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to read directory {}", path.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
