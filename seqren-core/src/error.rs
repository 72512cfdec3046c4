use std::io;
use std::path::PathBuf;

use crate::rename::RenameConflict;

/// Error type shared by the core modules.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The pattern can never produce distinct names.
    #[error("invalid pattern '{0}': it needs a counter (#, %d) or a wildcard (*, ?)")]
    InvalidPattern(String),

    /// Every dup-count suffix up to the cap collided.
    #[error("could not find a unique name for {} after {max} attempts", .path.display())]
    DupCountExceeded { path: PathBuf, max: u32 },

    /// No starting counter yields a collision-free batch.
    #[error("no collision-free starting counter between {start} and {max}")]
    NoAvailableSeqCount { start: u32, max: u32 },

    /// Destination conflicts that cannot be resolved automatically.
    #[error("found {} rename conflict(s):\n{}", .0.len(), format_conflicts(.0))]
    Conflicts(Vec<RenameConflict>),

    /// Sources or destinations of a working set are not unique.
    #[error("working set is not distinct: {0}")]
    NotDistinct(String),

    /// No free intermediate name was found for a two-phase rename.
    #[error("could not find a free intermediate name for {}", .path.display())]
    IntermediateExhausted { path: PathBuf },

    /// A rename failed at the OS level.
    #[error("failed to rename {} to {}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or applying file metadata failed.
    #[error("failed to update {}", .path.display())]
    Touch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File system I/O failure outside a single command.
    #[error("I/O error while accessing {}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    /// An edit command referenced a source that is not in the working set.
    #[error("no item for {} in the working set", .0.display())]
    UnknownItem(PathBuf),

    /// An edit command ran without a working set to edit.
    #[error("edit commands need a working set")]
    NoWorkingSet,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io(path.into(), error)
    }

    /// Message including the chain of sources, for reports and logs.
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        message
    }
}

fn format_conflicts(conflicts: &[RenameConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shared result alias for the core crate.
pub type Result<T> = std::result::Result<T, Error>;
