use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::{OnErrorArg, OutputFormat};

/// Sequence-numbered batch renames and touches with persistent undo
#[derive(Parser, Debug)]
#[command(name = "seqren")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Undo log location (defaults to the executable path plus .undo.log)
    #[arg(long, global = true, env = "SEQREN_UNDO_LOG", value_name = "PATH")]
    pub undo_log: Option<PathBuf>,

    /// Append every file operation to this log
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// What to do when a file operation fails
    #[arg(long, global = true, value_enum, default_value = "prompt")]
    pub on_error: OnErrorArg,
}

/// Output arguments shared by every reporting command
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format for machine consumption
    #[arg(long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Suppress summary output
    #[arg(long)]
    pub quiet: bool,
}

/// Numbering arguments shared by rename and next-seq
#[derive(Args, Debug, Clone)]
pub struct NumberingArgs {
    /// Rename pattern: # runs and %d for the counter, * and ? copy from the old name
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Counter for the first file
    #[arg(short, long)]
    pub start: Option<u32>,

    /// Move every file into this directory
    #[arg(long, value_name = "DIR")]
    pub dest_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename files to sequence-numbered names
    Rename {
        /// Files to rename, in counter order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        numbering: NumberingArgs,

        /// Rename the files inside directories instead of the directories
        #[arg(short, long)]
        recursive: bool,

        /// Allow several files to get the same name (fails on collision)
        #[arg(long)]
        no_unique: bool,

        /// Show the renames without running them
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Change file times and the read-only flag
    Touch {
        /// Files to touch
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Modification time: now, RFC 3339 or YYYY-MM-DD[ HH:MM:SS]
        #[arg(long, value_parser = seqren_core::parse_time)]
        modified: Option<DateTime<Utc>>,

        /// Access time
        #[arg(long, value_parser = seqren_core::parse_time)]
        accessed: Option<DateTime<Utc>>,

        /// Creation time (Windows and macOS only)
        #[arg(long, value_parser = seqren_core::parse_time)]
        created: Option<DateTime<Utc>>,

        /// Set the read-only flag
        #[arg(long, conflicts_with = "writable")]
        readonly: bool,

        /// Clear the read-only flag
        #[arg(long)]
        writable: bool,

        /// Show the changes without applying them
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Undo the most recent batch
    Undo {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Redo the most recently undone batch
    Redo {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the undo and redo stacks
    History {
        /// Limit number of entries shown
        #[arg(long)]
        limit: Option<usize>,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Print the first counter that renames the files without collisions
    NextSeq {
        /// Files that would be renamed
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        numbering: NumberingArgs,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Recover the counter from a generated file name
    ParseSeq {
        /// File name to parse
        name: String,

        /// Pattern the name was generated with
        #[arg(short, long)]
        pattern: Option<String>,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Show version information
    Version {
        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,

        /// Write the completion file here instead of stdout
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}
