use std::io;
use std::path::{Path, PathBuf};

use crate::batch::BatchContext;
use crate::command::{Command, CommandKind, MacroCommand, PathChange, StateChange};
use crate::error::Result;
use crate::file_state::FileState;
use crate::generator::{DestinationPathGenerator, Generated};
use crate::items::WorkingSet;
use crate::model::CommandModel;
use crate::rename::{build_rename_macro, detect_case_insensitive_fs, plan_renames, RenamePlan};

/// One invocation's worth of state: the chosen files, their editable
/// destinations and the undo history loaded from the log.
#[derive(Debug)]
pub struct Session {
    working_set: WorkingSet,
    model: CommandModel,
    log_path: PathBuf,
    case_insensitive: bool,
}

impl Session {
    /// Open a session over `sources`, loading the history at `log_path`.
    pub fn open(sources: Vec<PathBuf>, log_path: PathBuf, max_depth: usize) -> Self {
        let case_insensitive = sources
            .first()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(cfg!(any(windows, target_os = "macos")), detect_case_insensitive_fs);
        Self {
            working_set: WorkingSet::new(sources),
            model: CommandModel::load(&log_path, max_depth),
            log_path,
            case_insensitive,
        }
    }

    pub fn working_set(&mut self) -> &mut WorkingSet {
        &mut self.working_set
    }

    pub fn model(&self) -> &CommandModel {
        &self.model
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Fill every rename destination from `generator`, as one undoable edit.
    pub fn generate(&mut self, generator: &DestinationPathGenerator, ctx: &mut BatchContext<'_>) -> Result<Generated> {
        let generated = generator.generate(self.working_set.sources())?;
        let items = self.working_set.rename_items();
        let changes: Vec<PathChange> = generated
            .pairs
            .iter()
            .filter_map(|(source, after)| {
                let before = items.find(source)?.dest.clone();
                (&before != after).then(|| PathChange {
                    source: source.clone(),
                    before,
                    after: after.clone(),
                })
            })
            .collect();

        if !changes.is_empty() {
            let mut batch = MacroCommand::new(
                CommandKind::ChangeDestPaths,
                format!("Generate names with {}", generator.spec()),
            );
            batch.push(Command::ChangeDestPaths(changes));
            self.model.execute(batch, Some(&mut self.working_set), ctx);
        }
        Ok(generated)
    }

    /// Set one rename destination by hand.
    pub fn set_destination(&mut self, source: &Path, dest: PathBuf, ctx: &mut BatchContext<'_>) -> bool {
        let before = self
            .working_set
            .rename_items()
            .find(source)
            .map(|item| item.dest.clone())
            .unwrap_or_default();
        let mut batch = MacroCommand::new(CommandKind::Edit, "");
        batch.push(Command::Edit(PathChange {
            source: source.to_path_buf(),
            before,
            after: dest,
        }));
        self.model.execute(batch, Some(&mut self.working_set), ctx)
    }

    /// Change every touch destination with `edit`, as one undoable edit.
    pub fn set_touch<F>(&mut self, mut edit: F, ctx: &mut BatchContext<'_>) -> Result<bool>
    where
        F: FnMut(&FileState) -> FileState,
    {
        let items = self.working_set.touch_items()?;
        let changes: Vec<StateChange> = items
            .iter()
            .filter_map(|item| {
                let after = edit(&item.dest);
                (after != item.dest).then(|| StateChange {
                    source: item.source().path.clone(),
                    before: item.dest.clone(),
                    after,
                })
            })
            .collect();
        if changes.is_empty() {
            return Ok(false);
        }

        let mut batch = MacroCommand::new(CommandKind::ChangeDestStates, "");
        batch.push(Command::ChangeDestFileStates(changes));
        Ok(self.model.execute(batch, Some(&mut self.working_set), ctx))
    }

    /// Put every destination back to its source.
    pub fn reset(&mut self, ctx: &mut BatchContext<'_>) -> bool {
        let paths: Vec<PathChange> = self
            .working_set
            .built_rename_items()
            .into_iter()
            .flat_map(|items| items.iter())
            .filter(|item| !item.dest.as_os_str().is_empty())
            .map(|item| PathChange {
                source: item.source().to_path_buf(),
                before: item.dest.clone(),
                after: PathBuf::new(),
            })
            .collect();
        let states: Vec<StateChange> = self
            .working_set
            .built_touch_items()
            .into_iter()
            .flat_map(|items| items.modified())
            .map(|item| StateChange {
                source: item.source().path.clone(),
                before: item.dest.clone(),
                after: item.source().clone(),
            })
            .collect();
        if paths.is_empty() && states.is_empty() {
            return false;
        }

        let mut batch = MacroCommand::new(CommandKind::ResetDestinations, "");
        batch.push(Command::ResetDestinations { paths, states });
        self.model.execute(batch, Some(&mut self.working_set), ctx)
    }

    /// Plan the pending renames without running them.
    pub fn plan_renames(&mut self) -> Result<RenamePlan> {
        let pairs = self.working_set.rename_items().pairs();
        plan_renames(&pairs, self.case_insensitive)
    }

    /// Run the pending renames as one batch. The working set follows the files
    /// to their new locations.
    pub fn commit_renames(&mut self, ctx: &mut BatchContext<'_>) -> Result<(RenamePlan, bool)> {
        let plan = self.plan_renames()?;
        if plan.steps.is_empty() {
            return Ok((plan, false));
        }
        let batch = build_rename_macro(&plan, "");
        let executed = self.model.execute(batch, None, ctx);
        if executed {
            if let Some(done) = self.model.undo_stack().last() {
                let moves = done.moves(false);
                self.working_set.follow_moves(&moves);
            }
        }
        Ok((plan, executed))
    }

    /// Apply the pending touch destinations as one batch.
    pub fn commit_touch(&mut self, ctx: &mut BatchContext<'_>) -> Result<bool> {
        let mut batch = MacroCommand::new(CommandKind::Touch, "").stamped_now();
        for item in self.working_set.touch_items()?.modified() {
            batch.push(Command::TouchFile {
                from: item.source().clone(),
                to: item.dest.clone(),
            });
        }
        if batch.is_empty() {
            return Ok(false);
        }

        let executed = self.model.execute(batch, None, ctx);
        self.refresh();
        Ok(executed)
    }

    /// Undo the newest batch, returning what was undone.
    pub fn undo(&mut self, ctx: &mut BatchContext<'_>) -> Option<MacroCommand> {
        let done = self.model.undo(Some(&mut self.working_set), ctx)?;
        self.after_file_batch(&done, true);
        Some(done)
    }

    /// Redo the newest undone batch, returning what was redone.
    pub fn redo(&mut self, ctx: &mut BatchContext<'_>) -> Option<MacroCommand> {
        let done = self.model.redo(Some(&mut self.working_set), ctx)?;
        self.after_file_batch(&done, false);
        Some(done)
    }

    /// Persist the history.
    pub fn save(&self) -> io::Result<()> {
        self.model.save(&self.log_path)
    }

    pub fn close(self) -> io::Result<()> {
        self.save()
    }

    fn after_file_batch(&mut self, done: &MacroCommand, undone: bool) {
        match done.kind() {
            CommandKind::Rename => self.working_set.follow_moves(&done.moves(undone)),
            CommandKind::Touch => self.refresh(),
            _ => {},
        }
    }

    fn refresh(&mut self) {
        let sources = self.working_set.sources().to_vec();
        self.working_set.rebuild(sources);
    }
}
