use anyhow::{Context, Result};
use seqren_core::{next_seq_operation, parse_seq_operation, resolve_sources, Config, OutputFormatter};
use std::path::PathBuf;

use crate::cli::args::NumberingArgs;
use crate::cli::OutputFormat;

pub fn handle_next_seq(
    paths: &[PathBuf],
    numbering: NumberingArgs,
    output: OutputFormat,
    config: &Config,
) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let sources = resolve_sources(paths, &working_dir)?;
    let result = next_seq_operation(
        &sources,
        numbering.pattern.as_deref(),
        numbering.start,
        numbering.dest_dir.map(|dir| working_dir.join(dir)),
        config,
    )?;
    println!("{}", result.format(output.into()));
    Ok(())
}

/// A name that does not match is reported, not an error.
pub fn handle_parse_seq(name: &str, pattern: Option<&str>, output: OutputFormat, config: &Config) -> Result<()> {
    let result = parse_seq_operation(name, pattern, config);
    println!("{}", result.format(output.into()));
    Ok(())
}
