//! High-level operations that correspond to CLI commands
//!
//! These modules contain the core logic for each seqren operation, separated
//! from CLI concerns like argument parsing and output formatting.

pub mod history;
pub mod next_seq;
pub mod parse_seq;
pub mod rename;
pub mod touch;
pub mod undo;

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use crate::batch::{BatchContext, FailurePolicy};
use crate::config::Config;
use crate::oplog::OperationLog;
use crate::session::Session;

pub use history::history_operation;
pub use next_seq::next_seq_operation;
pub use parse_seq::parse_seq_operation;
pub use rename::{rename_operation, RenameRequest};
pub use touch::{parse_time, touch_operation, TouchRequest};
pub use undo::{redo_operation, undo_operation};

/// Everything an operation needs besides its own arguments.
pub struct OperationEnv<'a> {
    pub config: &'a Config,
    pub undo_log: PathBuf,
    pub operation_log: Option<PathBuf>,
    pub policy: &'a mut dyn FailurePolicy,
    pub cancel: Option<&'a AtomicBool>,
    pub use_color: bool,
}

impl OperationEnv<'_> {
    pub(crate) fn open_session(&self, sources: Vec<PathBuf>) -> Session {
        Session::open(sources, self.undo_log.clone(), self.config.undo.max_depth)
    }

    pub(crate) fn open_operation_log(&self) -> Result<Option<OperationLog>> {
        self.operation_log
            .as_deref()
            .map(|path| {
                OperationLog::open(path)
                    .with_context(|| format!("Failed to open operation log: {}", path.display()))
            })
            .transpose()
    }
}

/// Context for a batch that runs under the caller's policy.
pub(crate) fn batch_context<'b>(
    policy: &'b mut dyn FailurePolicy,
    log: Option<&'b mut OperationLog>,
    cancel: Option<&'b AtomicBool>,
) -> BatchContext<'b> {
    let ctx = BatchContext::new(policy).with_log(log);
    match cancel {
        Some(flag) => ctx.with_cancel(flag),
        None => ctx,
    }
}

/// Make every path absolute, check it exists, and drop repeats while keeping
/// the order given.
pub fn resolve_sources(paths: &[PathBuf], working_dir: &Path) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        bail!("No files given");
    }

    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        // The undo log stores paths as text.
        if path.to_str().is_none() {
            bail!("Invalid path (not UTF-8): {}", path.display());
        }
        let absolute = if path.is_absolute() {
            path.clone()
        } else {
            working_dir.join(path)
        };
        if absolute.symlink_metadata().is_err() {
            bail!("File not found: {}", path.display());
        }
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        if seen.insert(absolute.clone()) {
            sources.push(absolute);
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_sources_keeps_order_and_drops_repeats() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::write(root.join("b.txt"), "").unwrap();
        fs::write(root.join("a.txt"), "").unwrap();

        let sources = resolve_sources(
            &[
                PathBuf::from("b.txt"),
                PathBuf::from("a.txt"),
                root.join("b.txt"),
            ],
            &root,
        )
        .unwrap();
        assert_eq!(sources, vec![root.join("b.txt"), root.join("a.txt")]);
    }

    #[test]
    fn test_resolve_sources_rejects_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let err = resolve_sources(&[PathBuf::from("nope.txt")], temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("File not found: nope.txt"));
        assert!(resolve_sources(&[], temp_dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_sources_rejects_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let name = PathBuf::from(OsStr::from_bytes(b"bad\xff.txt"));
        let err = resolve_sources(&[name], temp_dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid path (not UTF-8)"));
    }
}
