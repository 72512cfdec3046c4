use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::command::{Command, CommandKind, MacroCommand};
use crate::error::{Error, Result};
use crate::format_spec::{FormatSpec, MAX_DUP_COUNT};
use crate::items::{path_key, PathPairMap};

/// Windows reserved filenames that cannot be used
const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Decorator for intermediate names: a bracketed counter before the extension.
const INTERMEDIATE_PATTERN: &str = "*[#]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConflict {
    pub sources: Vec<PathBuf>,
    pub target: PathBuf,
    pub kind: ConflictKind,
}

impl fmt::Display for RenameConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "  {}: {} -> {}", self.kind, sources, self.target.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Multiple sources map to the same target
    MultipleToOne,
    /// Target exists and is not part of the batch
    ExistingFile,
    /// Target is a Windows reserved name
    WindowsReserved,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MultipleToOne => "multiple sources map to the same destination",
            Self::ExistingFile => "destination already exists",
            Self::WindowsReserved => "destination is a reserved name",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Straight to the destination.
    Direct,
    /// Moved aside to an intermediate name.
    Staged,
    /// Intermediate name to the destination, after every first-phase step.
    Delayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameStep {
    pub from: PathBuf,
    pub to: PathBuf,
    pub phase: StepPhase,
}

#[derive(Debug, Clone, Default)]
pub struct RenamePlan {
    pub steps: Vec<RenameStep>,
    pub conflicts: Vec<RenameConflict>,
    pub case_insensitive_fs: bool,
}

impl RenamePlan {
    pub fn requires_staging(&self) -> bool {
        self.steps.iter().any(|s| s.phase == StepPhase::Staged)
    }
}

/// Check if the filesystem at the given path is case-insensitive
pub fn detect_case_insensitive_fs(path: &Path) -> bool {
    // Assume case-sensitive if we can't test
    let Ok(temp_dir) = TempDir::new_in(path) else {
        return false;
    };

    let test_file_lower = temp_dir.path().join("test_case_a");
    let test_file_upper = temp_dir.path().join("test_case_A");

    if fs::write(&test_file_lower, b"test").is_err() {
        return false;
    }

    // On case-insensitive FS, this will succeed
    fs::metadata(&test_file_upper).is_ok()
}

/// Check if a filename is a Windows reserved name
/// Always checks regardless of platform to ensure cross-platform compatibility
pub fn is_windows_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name).to_uppercase();
    WINDOWS_RESERVED.contains(&base.as_str())
}

/// Sources are unique and destinations are unique.
pub fn is_distinct_working_set(pairs: &PathPairMap, case_insensitive: bool) -> bool {
    let mut sources = HashSet::new();
    let mut dests = HashSet::new();
    pairs.iter().all(|(source, dest)| {
        sources.insert(path_key(source, case_insensitive))
            && dests.insert(path_key(dest, case_insensitive))
    })
}

/// Plan the renames for `pairs`, reporting conflicts instead of failing on them.
///
/// Pairs whose destination equals the source are skipped. A destination still
/// occupied by another batch source is reached in two phases through an
/// intermediate name.
pub fn plan_renames_with_conflicts(pairs: &PathPairMap, case_insensitive: bool) -> Result<RenamePlan> {
    let pairs: Vec<(&PathBuf, &PathBuf)> = pairs.iter().filter(|(s, d)| s != d).collect();

    let mut source_keys = HashSet::new();
    for (source, _) in &pairs {
        if !source_keys.insert(path_key(source, case_insensitive)) {
            return Err(Error::NotDistinct(format!(
                "{} appears more than once",
                source.display()
            )));
        }
    }

    let conflicts = find_conflicts(&pairs, &source_keys, case_insensitive);
    if !conflicts.is_empty() {
        return Ok(RenamePlan {
            steps: Vec::new(),
            conflicts,
            case_insensitive_fs: case_insensitive,
        });
    }

    let mut planned: HashSet<PathBuf> = source_keys.clone();
    planned.extend(pairs.iter().map(|(_, d)| path_key(d, case_insensitive)));

    let mut vacated = HashSet::new();
    let mut filled = HashSet::new();
    let mut steps = Vec::new();
    let mut delayed = Vec::new();

    for (source, dest) in pairs {
        let source_key = path_key(source, case_insensitive);
        let dest_key = path_key(dest, case_insensitive);
        let occupied = dest_key != source_key
            && (filled.contains(&dest_key)
                || (source_keys.contains(&dest_key) && !vacated.contains(&dest_key)));

        vacated.insert(source_key);
        if occupied {
            let intermediate = find_intermediate(dest, &planned, case_insensitive)?;
            let intermediate_key = path_key(&intermediate, case_insensitive);
            planned.insert(intermediate_key.clone());
            filled.insert(intermediate_key);
            steps.push(RenameStep {
                from: source.clone(),
                to: intermediate.clone(),
                phase: StepPhase::Staged,
            });
            delayed.push(RenameStep {
                from: intermediate,
                to: dest.clone(),
                phase: StepPhase::Delayed,
            });
        } else {
            filled.insert(dest_key);
            steps.push(RenameStep {
                from: source.clone(),
                to: dest.clone(),
                phase: StepPhase::Direct,
            });
        }
    }
    steps.extend(delayed);

    Ok(RenamePlan {
        steps,
        conflicts: Vec::new(),
        case_insensitive_fs: case_insensitive,
    })
}

/// Like [`plan_renames_with_conflicts`], but conflicts are an error.
pub fn plan_renames(pairs: &PathPairMap, case_insensitive: bool) -> Result<RenamePlan> {
    let plan = plan_renames_with_conflicts(pairs, case_insensitive)?;
    if plan.conflicts.is_empty() {
        Ok(plan)
    } else {
        Err(Error::Conflicts(plan.conflicts))
    }
}

/// One rename command per planned step, in order.
pub fn build_rename_macro(plan: &RenamePlan, tag: &str) -> MacroCommand {
    let mut batch = MacroCommand::new(CommandKind::Rename, tag).stamped_now();
    for step in &plan.steps {
        batch.push(Command::RenameFile {
            from: step.from.clone(),
            to: step.to.clone(),
        });
    }
    batch
}

fn find_conflicts(
    pairs: &[(&PathBuf, &PathBuf)],
    source_keys: &HashSet<PathBuf>,
    case_insensitive: bool,
) -> Vec<RenameConflict> {
    let mut conflicts = Vec::new();

    let mut by_target: BTreeMap<PathBuf, (PathBuf, Vec<PathBuf>)> = BTreeMap::new();
    for (source, dest) in pairs {
        by_target
            .entry(path_key(dest, case_insensitive))
            .or_insert_with(|| ((*dest).clone(), Vec::new()))
            .1
            .push((*source).clone());
    }

    for (key, (target, sources)) in by_target {
        if sources.len() > 1 {
            conflicts.push(RenameConflict {
                sources,
                target,
                kind: ConflictKind::MultipleToOne,
            });
            continue;
        }

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_windows_reserved(&name) {
            conflicts.push(RenameConflict {
                sources,
                target,
                kind: ConflictKind::WindowsReserved,
            });
        } else if !source_keys.contains(&key) && fs::symlink_metadata(&target).is_ok() {
            conflicts.push(RenameConflict {
                sources,
                target,
                kind: ConflictKind::ExistingFile,
            });
        }
    }

    conflicts
}

fn find_intermediate(dest: &Path, planned: &HashSet<PathBuf>, case_insensitive: bool) -> Result<PathBuf> {
    let spec = FormatSpec::new(INTERMEDIATE_PATTERN, "");
    let dir = dest.parent().unwrap_or_else(|| Path::new(""));
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    (1..=MAX_DUP_COUNT)
        .map(|n| dir.join(spec.format_name(&name, n, None).text))
        .find(|candidate| {
            !planned.contains(&path_key(candidate, case_insensitive))
                && fs::symlink_metadata(candidate).is_err()
        })
        .ok_or_else(|| Error::IntermediateExhausted {
            path: dest.to_path_buf(),
        })
}
