use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::path::PathBuf;

use crate::batch::{BatchContext, FixedPolicy};
use crate::file_state::{Attributes, FileState};
use crate::output::{TouchEntry, TouchResult};

use super::{batch_context, OperationEnv};

#[derive(Debug, Clone, Default)]
pub struct TouchRequest {
    pub sources: Vec<PathBuf>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    /// `Some(true)` sets read-only, `Some(false)` clears it.
    pub readonly: Option<bool>,
    pub dry_run: bool,
}

impl TouchRequest {
    fn edit(&self, state: &FileState) -> FileState {
        let mut next = state.clone();
        if let Some(modified) = self.modified {
            next.modified = Some(modified);
        }
        if let Some(accessed) = self.accessed {
            next.accessed = Some(accessed);
        }
        if let Some(created) = self.created {
            next.created = Some(created);
        }
        if let Some(readonly) = self.readonly {
            next.attributes = next.attributes.with(Attributes::READONLY, readonly);
        }
        next
    }
}

/// Parse a time argument: `now`, RFC 3339, `YYYY-MM-DD HH:MM:SS` or
/// `YYYY-MM-DD` (the last two in local time).
pub fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Ok(time.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| anyhow!("Invalid time '{input}': expected 'now', RFC 3339 or 'YYYY-MM-DD[ HH:MM:SS]'"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Time '{input}' does not exist in the local time zone"))
}

fn describe_changes(before: &FileState, after: &FileState) -> Vec<String> {
    let mut changes = Vec::new();
    let time = |t: Option<DateTime<Utc>>| {
        t.map_or_else(
            || "-".to_string(),
            |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    };
    if before.modified != after.modified {
        changes.push(format!("modified {}", time(after.modified)));
    }
    if before.accessed != after.accessed {
        changes.push(format!("accessed {}", time(after.accessed)));
    }
    if before.created != after.created {
        changes.push(format!("created {}", time(after.created)));
    }
    if before.attributes.readonly() != after.attributes.readonly() {
        changes.push(if after.attributes.readonly() { "read-only" } else { "writable" }.to_string());
    }
    changes
}

/// Touch operation - returns structured data
pub fn touch_operation(request: &TouchRequest, env: &mut OperationEnv<'_>) -> Result<TouchResult> {
    let mut session = env.open_session(request.sources.clone());

    let mut edit_policy = FixedPolicy::abort();
    let mut edit_ctx = BatchContext::new(&mut edit_policy);
    session.set_touch(|state| request.edit(state), &mut edit_ctx)?;

    let files: Vec<TouchEntry> = session
        .working_set()
        .touch_items()?
        .modified()
        .map(|item| TouchEntry {
            path: item.source().path.display().to_string(),
            changes: describe_changes(item.source(), &item.dest),
        })
        .collect();

    let mut result = TouchResult {
        files,
        dry_run: request.dry_run,
        report: None,
        use_color: env.use_color,
    };
    if request.dry_run || result.files.is_empty() {
        return Ok(result);
    }

    let mut oplog = env.open_operation_log()?;
    let mut ctx = batch_context(&mut *env.policy, oplog.as_mut(), env.cancel);
    ctx.log(&format!("Touching {} files", result.files.len()));
    session.commit_touch(&mut ctx)?;
    result.report = Some(ctx.into_report());

    session
        .save()
        .with_context(|| format!("Failed to write undo log: {}", session.log_path().display()))?;
    Ok(result)
}
