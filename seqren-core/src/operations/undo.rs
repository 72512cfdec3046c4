use anyhow::{bail, Context, Result};

use crate::output::{RedoResult, UndoResult};

use super::{batch_context, OperationEnv};

/// High-level undo operation - equivalent to `seqren undo` command
pub fn undo_operation(env: &mut OperationEnv<'_>) -> Result<UndoResult> {
    let mut session = env.open_session(Vec::new());
    let Some(description) = session.model().undo_description() else {
        bail!("Nothing to undo");
    };
    let expected = session.model().undo_stack().last().map_or(0, |m| m.len());

    let mut oplog = env.open_operation_log()?;
    let mut ctx = batch_context(&mut *env.policy, oplog.as_mut(), env.cancel);
    ctx.log(&format!("Undoing: {description}"));
    let done = session.undo(&mut ctx);
    let report = ctx.into_report();

    session
        .save()
        .with_context(|| format!("Failed to write undo log: {}", session.log_path().display()))?;

    let commands = done.as_ref().map_or(0, |m| m.len());
    Ok(UndoResult {
        kind: done.as_ref().map_or("NONE", |m| m.kind().key()).to_string(),
        description,
        commands,
        partial: commands < expected,
        report,
        use_color: env.use_color,
    })
}

/// High-level redo operation - equivalent to `seqren redo` command
pub fn redo_operation(env: &mut OperationEnv<'_>) -> Result<RedoResult> {
    let mut session = env.open_session(Vec::new());
    let Some(description) = session.model().redo_description() else {
        bail!("Nothing to redo");
    };
    let expected = session.model().redo_stack().last().map_or(0, |m| m.len());

    let mut oplog = env.open_operation_log()?;
    let mut ctx = batch_context(&mut *env.policy, oplog.as_mut(), env.cancel);
    ctx.log(&format!("Redoing: {description}"));
    let done = session.redo(&mut ctx);
    let report = ctx.into_report();

    session
        .save()
        .with_context(|| format!("Failed to write undo log: {}", session.log_path().display()))?;

    let commands = done.as_ref().map_or(0, |m| m.len());
    Ok(RedoResult {
        kind: done.as_ref().map_or("NONE", |m| m.kind().key()).to_string(),
        description,
        commands,
        partial: commands < expected,
        report,
        use_color: env.use_color,
    })
}
