use std::io;
use std::path::Path;

use crate::batch::BatchContext;
use crate::command::MacroCommand;
use crate::items::WorkingSet;
use crate::undo_log;

/// Default cap on the number of undo steps kept.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Undo and redo stacks of executed batches. Front of each stack is the oldest.
#[derive(Debug, Clone)]
pub struct CommandModel {
    undo: Vec<MacroCommand>,
    redo: Vec<MacroCommand>,
    max_depth: usize,
}

impl Default for CommandModel {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl CommandModel {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Load both stacks from the log at `log_path` and its redo sibling.
    pub fn load(log_path: &Path, max_depth: usize) -> Self {
        let mut model = Self::new(max_depth);
        model.undo = undo_log::load_from_path(log_path);
        model.redo = undo_log::load_from_path(&undo_log::redo_log_path(log_path));
        model.prune();
        model
    }

    /// Rewrite the log and its redo sibling. Only file operations are written.
    pub fn save(&self, log_path: &Path) -> io::Result<()> {
        undo_log::save_to_path(log_path, &self.undo)?;
        let redo_path = undo_log::redo_log_path(log_path);
        if self.redo.iter().any(MacroCommand::is_persisted) {
            undo_log::save_to_path(&redo_path, &self.redo)
        } else if redo_path.exists() {
            std::fs::remove_file(redo_path)
        } else {
            Ok(())
        }
    }

    /// Execute `batch` and push what survived onto the undo stack. A new
    /// action invalidates the redo stack.
    pub fn execute(
        &mut self,
        mut batch: MacroCommand,
        items: Option<&mut WorkingSet>,
        ctx: &mut BatchContext<'_>,
    ) -> bool {
        if !batch.execute(items, ctx) {
            return false;
        }
        if batch.is_persisted() {
            self.drop_edits();
        }
        self.redo.clear();
        self.undo.push(batch);
        self.prune();
        true
    }

    /// Undo the newest batch. Commands whose inverse failed stay on the undo
    /// stack; the rest move to the redo stack. Returns the part that was undone.
    pub fn undo(&mut self, items: Option<&mut WorkingSet>, ctx: &mut BatchContext<'_>) -> Option<MacroCommand> {
        let batch = self.undo.pop()?;
        let persisted = batch.is_persisted();
        let split = batch.unexecute(items, ctx);
        if let Some(leftover) = split.leftover {
            self.undo.push(leftover);
        }
        if persisted && split.done.is_some() {
            self.drop_edits();
        }
        if let Some(done) = &split.done {
            self.redo.push(done.clone());
        }
        split.done
    }

    /// Redo the newest undone batch. Commands that failed again stay on the
    /// redo stack. Returns the part that was redone.
    pub fn redo(&mut self, items: Option<&mut WorkingSet>, ctx: &mut BatchContext<'_>) -> Option<MacroCommand> {
        let batch = self.redo.pop()?;
        let persisted = batch.is_persisted();
        let split = batch.reexecute(items, ctx);
        if let Some(leftover) = split.leftover {
            self.redo.push(leftover);
        }
        if persisted && split.done.is_some() {
            self.drop_edits();
        }
        if let Some(done) = &split.done {
            self.undo.push(done.clone());
            self.prune();
        }
        split.done
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo.last().map(MacroCommand::description)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo.last().map(MacroCommand::description)
    }

    pub fn undo_stack(&self) -> &[MacroCommand] {
        &self.undo
    }

    pub fn redo_stack(&self) -> &[MacroCommand] {
        &self.redo
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    // Edits belong to an item set that is replaced once files move.
    fn drop_edits(&mut self) {
        self.undo.retain(MacroCommand::is_persisted);
        self.redo.retain(MacroCommand::is_persisted);
    }

    fn prune(&mut self) {
        if self.undo.len() > self.max_depth {
            let excess = self.undo.len() - self.max_depth;
            self.undo.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FixedPolicy;
    use crate::command::{Command, CommandKind, PathChange};
    use std::path::PathBuf;

    fn edit_macro(source: &str, before: &str, after: &str) -> MacroCommand {
        let mut batch = MacroCommand::new(CommandKind::Edit, format!("edit {source}"));
        batch.push(Command::Edit(PathChange {
            source: PathBuf::from(source),
            before: PathBuf::from(before),
            after: PathBuf::from(after),
        }));
        batch
    }

    fn dest(set: &mut WorkingSet, source: &str) -> PathBuf {
        set.rename_items()
            .find(Path::new(source))
            .unwrap()
            .dest
            .clone()
    }

    #[test]
    fn test_undo_redo_edits() {
        let mut set = WorkingSet::new(vec![PathBuf::from("/a")]);
        let mut model = CommandModel::default();
        let mut policy = FixedPolicy::ignore();
        let mut ctx = BatchContext::new(&mut policy);

        assert!(model.execute(edit_macro("/a", "", "/x"), Some(&mut set), &mut ctx));
        assert!(model.execute(edit_macro("/a", "/x", "/y"), Some(&mut set), &mut ctx));
        assert_eq!(dest(&mut set, "/a"), PathBuf::from("/y"));
        assert_eq!(model.undo_description().as_deref(), Some("edit /a"));

        model.undo(Some(&mut set), &mut ctx).unwrap();
        assert_eq!(dest(&mut set, "/a"), PathBuf::from("/x"));
        assert!(model.can_redo());

        model.redo(Some(&mut set), &mut ctx).unwrap();
        assert_eq!(dest(&mut set, "/a"), PathBuf::from("/y"));
        assert!(!model.can_redo());
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut set = WorkingSet::new(vec![PathBuf::from("/a")]);
        let mut model = CommandModel::default();
        let mut policy = FixedPolicy::ignore();
        let mut ctx = BatchContext::new(&mut policy);

        model.execute(edit_macro("/a", "", "/x"), Some(&mut set), &mut ctx);
        model.undo(Some(&mut set), &mut ctx);
        assert!(model.can_redo());
        model.execute(edit_macro("/a", "", "/z"), Some(&mut set), &mut ctx);
        assert!(!model.can_redo());
    }

    #[test]
    fn test_failed_batch_is_not_pushed() {
        let mut set = WorkingSet::new(vec![PathBuf::from("/a")]);
        let mut model = CommandModel::default();
        let mut policy = FixedPolicy::ignore();
        let mut ctx = BatchContext::new(&mut policy);

        assert!(!model.execute(edit_macro("/missing", "", "/x"), Some(&mut set), &mut ctx));
        assert!(!model.can_undo());
    }

    #[test]
    fn test_depth_is_capped() {
        let mut set = WorkingSet::new(vec![PathBuf::from("/a")]);
        let mut model = CommandModel::new(2);
        let mut policy = FixedPolicy::ignore();
        let mut ctx = BatchContext::new(&mut policy);

        for n in 0..5 {
            model.execute(edit_macro("/a", "", &format!("/x{n}")), Some(&mut set), &mut ctx);
        }
        assert_eq!(model.undo_stack().len(), 2);
    }
}
