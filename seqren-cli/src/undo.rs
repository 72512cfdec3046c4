use anyhow::Result;
use seqren_core::{undo_operation, OperationEnv, OutputFormatter};

use crate::cli::args::OutputArgs;
use crate::cli::OutputFormat;
use crate::ensure_complete;

pub fn handle_undo(output: &OutputArgs, env: &mut OperationEnv<'_>) -> Result<()> {
    let result = undo_operation(env)?;

    match output.output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => {
            if !output.quiet {
                print!("{}", result.format_summary());
            }
        },
    }

    ensure_complete(Some(&result.report))
}
