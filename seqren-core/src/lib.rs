#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod batch;
pub mod command;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod file_state;
pub mod format_spec;
pub mod generator;
pub mod items;
pub mod model;
pub mod oplog;
pub mod operations;
pub mod output;
pub mod rename;
pub mod session;
pub mod undo_log;

pub use batch::{BatchContext, BatchReport, FailedItem, FailureDecision, FailurePolicy, FixedPolicy};
pub use command::{Command, CommandKind, MacroCommand, PathChange, Split, StateChange};
pub use config::Config;
pub use error::{Error, Result};
pub use file_state::{Attributes, FileState};
pub use format_spec::{FormatOutput, FormatPart, FormatSpec, FormatWarning, MAX_DUP_COUNT};
pub use generator::{DestinationPathGenerator, GenerateOptions, Generated, MAX_SEQ_COUNT};
pub use items::{PathPairMap, RenameItem, RenameItems, TouchItem, TouchItems, WorkingSet};
pub use model::CommandModel;
pub use operations::{
    history_operation, next_seq_operation, parse_seq_operation, parse_time, redo_operation,
    rename_operation, resolve_sources, touch_operation, undo_operation, OperationEnv,
    RenameRequest, TouchRequest,
};
pub use oplog::OperationLog;
pub use output::{OutputFormat, OutputFormatter};
pub use rename::{
    build_rename_macro, detect_case_insensitive_fs, is_distinct_working_set, plan_renames,
    plan_renames_with_conflicts, ConflictKind, RenameConflict, RenamePlan, RenameStep, StepPhase,
};
pub use session::Session;
pub use undo_log::{default_log_path, load_from_path, save_to_path};
