use anyhow::Result;
use seqren_core::{history_operation, OperationEnv, OutputFormatter};

use crate::cli::OutputFormat;

pub fn handle_history(limit: Option<usize>, output: OutputFormat, env: &OperationEnv<'_>) -> Result<()> {
    let result = history_operation(limit, env)?;
    println!("{}", result.format(output.into()));
    Ok(())
}
