use anyhow::Result;

use crate::command::MacroCommand;
use crate::model::CommandModel;
use crate::output::{HistoryItem, HistoryResult};

use super::OperationEnv;

fn item(stack: &str, batch: &MacroCommand) -> HistoryItem {
    HistoryItem {
        stack: stack.to_string(),
        kind: batch.kind().key().to_string(),
        timestamp: batch
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        description: batch.description(),
        commands: batch.len(),
    }
}

/// History operation - newest undo entries first, then the redo entries
pub fn history_operation(limit: Option<usize>, env: &OperationEnv<'_>) -> Result<HistoryResult> {
    let model = CommandModel::load(&env.undo_log, env.config.undo.max_depth);

    let entries = model
        .undo_stack()
        .iter()
        .rev()
        .map(|batch| item("undo", batch))
        .chain(model.redo_stack().iter().rev().map(|batch| item("redo", batch)))
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    Ok(HistoryResult {
        entries,
        use_color: env.use_color,
    })
}
