use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::batch::BatchContext;
use crate::error::{Error, Result};
use crate::file_ops;
use crate::file_state::FileState;
use crate::items::WorkingSet;

/// Type tag of a command, also used as the undo-log key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Rename,
    Touch,
    ChangeDestPaths,
    ChangeDestStates,
    ResetDestinations,
    Edit,
}

impl CommandKind {
    pub fn key(self) -> &'static str {
        match self {
            Self::Rename => "RENAME",
            Self::Touch => "TOUCH",
            Self::ChangeDestPaths => "CHANGE_DEST_PATHS",
            Self::ChangeDestStates => "CHANGE_DEST_STATES",
            Self::ResetDestinations => "RESET_DESTINATIONS",
            Self::Edit => "EDIT",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [
            Self::Rename,
            Self::Touch,
            Self::ChangeDestPaths,
            Self::ChangeDestStates,
            Self::ResetDestinations,
            Self::Edit,
        ]
        .into_iter()
        .find(|kind| kind.key() == key)
    }

    /// Only file operations go to the undo log; edits live in memory.
    pub fn is_persisted(self) -> bool {
        matches!(self, Self::Rename | Self::Touch)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One destination path edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub source: PathBuf,
    pub before: PathBuf,
    pub after: PathBuf,
}

impl PathChange {
    fn swapped(&self) -> Self {
        Self {
            source: self.source.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }
}

/// One destination file-state edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub source: PathBuf,
    pub before: FileState,
    pub after: FileState,
}

impl StateChange {
    fn swapped(&self) -> Self {
        Self {
            source: self.source.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }
}

/// A single reversible operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RenameFile { from: PathBuf, to: PathBuf },
    /// Apply `to` onto the file; `from` is the state it replaces.
    TouchFile { from: FileState, to: FileState },
    ChangeDestPaths(Vec<PathChange>),
    ChangeDestFileStates(Vec<StateChange>),
    ResetDestinations {
        paths: Vec<PathChange>,
        states: Vec<StateChange>,
    },
    Edit(PathChange),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::RenameFile { .. } => CommandKind::Rename,
            Self::TouchFile { .. } => CommandKind::Touch,
            Self::ChangeDestPaths(_) => CommandKind::ChangeDestPaths,
            Self::ChangeDestFileStates(_) => CommandKind::ChangeDestStates,
            Self::ResetDestinations { .. } => CommandKind::ResetDestinations,
            Self::Edit(_) => CommandKind::Edit,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.kind().is_persisted()
    }

    pub fn description(&self) -> String {
        match self {
            Self::RenameFile { from, to } => {
                format!("Rename {} -> {}", from.display(), to.display())
            },
            Self::TouchFile { to, .. } => format!("Touch {}", to.path.display()),
            Self::ChangeDestPaths(changes) => {
                format!("Change {} destination path(s)", changes.len())
            },
            Self::ChangeDestFileStates(changes) => {
                format!("Change {} destination state(s)", changes.len())
            },
            Self::ResetDestinations { paths, states } => {
                format!("Reset {} destination(s)", paths.len() + states.len())
            },
            Self::Edit(change) => format!("Edit destination of {}", change.source.display()),
        }
    }

    /// Run the command. File commands touch the disk; edit commands change the
    /// destinations held by `items` and fail without one.
    pub fn execute(&self, items: Option<&mut WorkingSet>) -> Result<()> {
        match self {
            Self::RenameFile { from, to } => {
                file_ops::rename_file(from, to).map_err(|source| Error::Rename {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })
            },
            Self::TouchFile { to, .. } => to.apply().map_err(|source| Error::Touch {
                path: to.path.clone(),
                source,
            }),
            Self::ChangeDestPaths(changes) => {
                apply_path_changes(items.ok_or(Error::NoWorkingSet)?, changes)
            },
            Self::ChangeDestFileStates(changes) => {
                apply_state_changes(items.ok_or(Error::NoWorkingSet)?, changes)
            },
            Self::ResetDestinations { paths, states } => {
                let items = items.ok_or(Error::NoWorkingSet)?;
                apply_path_changes(items, paths)?;
                apply_state_changes(items, states)
            },
            Self::Edit(change) => {
                apply_path_changes(items.ok_or(Error::NoWorkingSet)?, std::slice::from_ref(change))
            },
        }
    }

    /// The command that reverts this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::RenameFile { from, to } => Self::RenameFile {
                from: to.clone(),
                to: from.clone(),
            },
            Self::TouchFile { from, to } => Self::TouchFile {
                from: to.clone(),
                to: from.clone(),
            },
            Self::ChangeDestPaths(changes) => {
                Self::ChangeDestPaths(changes.iter().map(PathChange::swapped).collect())
            },
            Self::ChangeDestFileStates(changes) => {
                Self::ChangeDestFileStates(changes.iter().map(StateChange::swapped).collect())
            },
            Self::ResetDestinations { paths, states } => Self::ResetDestinations {
                paths: paths.iter().map(PathChange::swapped).collect(),
                states: states.iter().map(StateChange::swapped).collect(),
            },
            Self::Edit(change) => Self::Edit(change.swapped()),
        }
    }
}

// Every source is checked first so an edit is applied whole or not at all.
fn apply_path_changes(items: &mut WorkingSet, changes: &[PathChange]) -> Result<()> {
    let rename_items = items.rename_items();
    if let Some(missing) = changes
        .iter()
        .find(|c| rename_items.find(&c.source).is_none())
    {
        return Err(Error::UnknownItem(missing.source.clone()));
    }
    for change in changes {
        rename_items.set_dest(&change.source, change.after.clone())?;
    }
    Ok(())
}

fn apply_state_changes(items: &mut WorkingSet, changes: &[StateChange]) -> Result<()> {
    if changes.is_empty() {
        return Ok(());
    }
    let touch_items = items.touch_items()?;
    if let Some(missing) = changes.iter().find(|c| touch_items.find(&c.source).is_none()) {
        return Err(Error::UnknownItem(missing.source.clone()));
    }
    for change in changes {
        touch_items.set_dest(&change.source, change.after.clone())?;
    }
    Ok(())
}

/// Outcome of undoing or redoing a macro: the part that ran and the part that
/// is still in its previous state.
#[derive(Debug, Default)]
pub struct Split {
    pub done: Option<MacroCommand>,
    pub leftover: Option<MacroCommand>,
}

/// An ordered batch of commands handled as one undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCommand {
    kind: CommandKind,
    tag: String,
    timestamp: Option<DateTime<FixedOffset>>,
    commands: Vec<Command>,
}

impl MacroCommand {
    pub fn new(kind: CommandKind, tag: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            timestamp: None,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn stamped_now(self) -> Self {
        self.with_timestamp(chrono::Local::now().fixed_offset())
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_persisted(&self) -> bool {
        self.kind.is_persisted()
    }

    pub fn description(&self) -> String {
        if !self.tag.is_empty() {
            return self.tag.clone();
        }
        let noun = match self.kind {
            CommandKind::Rename => "rename",
            CommandKind::Touch => "touch",
            _ => "edit",
        };
        let plural = if self.commands.len() == 1 { "" } else { "s" };
        format!("{} {noun}{plural}", self.commands.len())
    }

    /// Moves performed by the rename commands, in execution order.
    pub fn moves(&self, undone: bool) -> Vec<(PathBuf, PathBuf)> {
        let moves = self.commands.iter().filter_map(|command| match command {
            Command::RenameFile { from, to } => Some((from.clone(), to.clone())),
            _ => None,
        });
        if undone {
            moves.rev().map(|(from, to)| (to, from)).collect()
        } else {
            moves.collect()
        }
    }

    /// Paths touched by this macro's file commands.
    pub fn paths(&self) -> Vec<&Path> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::RenameFile { to, .. } => Some(to.as_path()),
                Command::TouchFile { to, .. } => Some(to.path.as_path()),
                _ => None,
            })
            .collect()
    }

    /// Execute every command; failed ones are dropped from the macro.
    /// Returns true when at least one command survived.
    pub fn execute(&mut self, items: Option<&mut WorkingSet>, ctx: &mut BatchContext<'_>) -> bool {
        let commands = std::mem::take(&mut self.commands);
        let (done, _) = ctx.run(commands, items, false);
        self.commands = done;
        !self.commands.is_empty()
    }

    /// Run the inverses in reverse order. Commands whose inverse did not run
    /// stay applied and come back as the leftover.
    pub fn unexecute(self, items: Option<&mut WorkingSet>, ctx: &mut BatchContext<'_>) -> Split {
        let mut commands = self.commands.clone();
        commands.reverse();
        let (mut done, mut not_done) = ctx.run(commands, items, true);
        done.reverse();
        not_done.reverse();
        self.split(done, not_done)
    }

    /// Run the commands again after an undo.
    pub fn reexecute(self, items: Option<&mut WorkingSet>, ctx: &mut BatchContext<'_>) -> Split {
        let (done, not_done) = ctx.run(self.commands.clone(), items, false);
        self.split(done, not_done)
    }

    fn split(self, done: Vec<Command>, not_done: Vec<Command>) -> Split {
        let part = |commands: Vec<Command>| {
            (!commands.is_empty()).then(|| Self {
                kind: self.kind,
                tag: self.tag.clone(),
                timestamp: self.timestamp,
                commands,
            })
        };
        Split {
            done: part(done),
            leftover: part(not_done),
        }
    }

    pub(crate) fn from_parts(
        kind: CommandKind,
        timestamp: Option<DateTime<FixedOffset>>,
        commands: Vec<Command>,
    ) -> Self {
        Self {
            kind,
            tag: String::new(),
            timestamp,
            commands,
        }
    }
}
