use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use seqren_core::output::VersionResult;
use seqren_core::{
    default_log_path, BatchReport, Config, Error, FailurePolicy, FixedPolicy, OperationEnv,
    OutputFormatter,
};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod cli;
mod history;
mod prompt;
mod redo;
mod rename;
mod seq;
mod touch;
mod undo;

use cli::{Cli, Commands, OnErrorArg, OutputFormat};
use prompt::PromptPolicy;
use touch::TouchChanges;

fn main() {
    // Set up signal handler for graceful shutdown (both SIGINT and SIGTERM)
    let interrupted = Arc::new(AtomicBool::new(false));

    // Handle SIGINT (Ctrl-C)
    let interrupted_clone = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived SIGINT. Finishing the current file...");
        interrupted_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Warning: failed to set SIGINT handler: {e}");
    }

    // Handle SIGTERM
    let interrupted_clone = Arc::clone(&interrupted);
    let registered = unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, move || {
            interrupted_clone.store(true, Ordering::SeqCst);
        })
    };
    if let Err(e) = registered {
        eprintln!("Warning: failed to set SIGTERM handler: {e}");
    }

    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
            .unwrap_or_else(|e| {
                eprintln!("Error: {e:#}");
                process::exit(2);
            });
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {e:#}; using defaults");
        Config::default()
    });
    let use_color =
        !cli.no_color && config.defaults.use_color.unwrap_or(true) && io::stdout().is_terminal();

    let result = run(cli, &config, use_color, &interrupted);

    // Check if we were interrupted during execution
    if interrupted.load(Ordering::SeqCst) {
        eprintln!("Operation interrupted");
        process::exit(130);
    }

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(exit_code(&e));
        },
    }
}

fn run(cli: Cli, config: &Config, use_color: bool, interrupted: &AtomicBool) -> Result<()> {
    let mut policy = failure_policy(cli.on_error);
    let mut env = OperationEnv {
        config,
        undo_log: undo_log_path(cli.undo_log, config),
        operation_log: cli.log_file.or_else(|| config.log.operation_log_path()),
        policy: policy.as_mut(),
        cancel: Some(interrupted),
        use_color,
    };

    match cli.command {
        Commands::Rename {
            paths,
            numbering,
            recursive,
            no_unique,
            dry_run,
            output,
        } => rename::handle_rename(paths, numbering, recursive, no_unique, dry_run, &output, &mut env),

        Commands::Touch {
            paths,
            modified,
            accessed,
            created,
            readonly,
            writable,
            dry_run,
            output,
        } => {
            let changes = TouchChanges {
                modified,
                accessed,
                created,
                readonly: (readonly || writable).then_some(readonly),
            };
            touch::handle_touch(&paths, changes, dry_run, &output, &mut env)
        },

        Commands::Undo { output } => undo::handle_undo(&output, &mut env),

        Commands::Redo { output } => redo::handle_redo(&output, &mut env),

        Commands::History { limit, output } => history::handle_history(limit, output, &env),

        Commands::NextSeq {
            paths,
            numbering,
            output,
        } => seq::handle_next_seq(&paths, numbering, output, config),

        Commands::ParseSeq {
            name,
            pattern,
            output,
        } => seq::handle_parse_seq(&name, pattern.as_deref(), output, config),

        Commands::Version { output } => handle_version(output),

        Commands::Completions { shell, out_dir } => {
            let mut cmd = Cli::command();
            match out_dir {
                Some(dir) => generate_completions(shell, &mut cmd, "seqren", &dir),
                None => {
                    clap_complete::generate(shell, &mut cmd, "seqren", &mut io::stdout());
                    Ok(())
                },
            }
        },
    }
}

fn failure_policy(on_error: OnErrorArg) -> Box<dyn FailurePolicy> {
    match on_error {
        OnErrorArg::Prompt if io::stdin().is_terminal() => Box::new(PromptPolicy::new(io::stdin().lock())),
        // Nobody to ask.
        OnErrorArg::Prompt | OnErrorArg::Abort => Box::new(FixedPolicy::abort()),
        OnErrorArg::Ignore => Box::new(FixedPolicy::ignore()),
    }
}

/// `--undo-log` / `SEQREN_UNDO_LOG`, then the config, then next to the executable.
fn undo_log_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.or_else(|| config.undo.log_path.clone())
        .unwrap_or_else(default_log_path)
}

/// Fail the command when part of a batch did not run. The summary has
/// already been printed by then.
pub fn ensure_complete(report: Option<&BatchReport>) -> Result<()> {
    match report {
        Some(report) if !report.is_complete() => bail!(
            "{} of {} operations did not complete",
            report.total - report.executed,
            report.total
        ),
        _ => Ok(()),
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    let core = error.chain().find_map(|e| e.downcast_ref::<Error>());
    match core {
        Some(Error::Conflicts(_) | Error::NotDistinct(_)) => 1,
        Some(
            Error::InvalidPattern(_)
            | Error::DupCountExceeded { .. }
            | Error::NoAvailableSeqCount { .. }
            | Error::UnknownItem(_),
        ) => 2,
        Some(_) => 3,
        None => {
            let message = error.to_string();
            if message.contains("conflict") {
                1 // Conflicts
            } else if message.contains("Invalid") || message.contains("not found") || message.contains("No files") {
                2 // Invalid input
            } else {
                3 // Internal error
            }
        },
    }
}

// Generate shell completions
pub fn generate_completions<G: clap_complete::Generator>(
    gen: G,
    cmd: &mut clap::Command,
    name: &str,
    out_dir: &Path,
) -> Result<()> {
    use clap_complete::generate_to;
    use std::fs;

    fs::create_dir_all(out_dir)?;
    let path = generate_to(gen, cmd, name, out_dir)?;
    println!("Generated completion file: {}", path.display());
    Ok(())
}

fn handle_version(output: OutputFormat) -> Result<()> {
    let version_result = VersionResult {
        name: "seqren".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("{}", version_result.format(output.into()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;
    use tempfile::TempDir;

    #[test]
    fn test_generate_completions_bash() {
        let temp_dir = TempDir::new().unwrap();
        let mut cmd = Cli::command();
        let result = generate_completions(Shell::Bash, &mut cmd, "seqren", temp_dir.path());
        assert!(result.is_ok());

        // Check that the completion file was created
        let completion_file = temp_dir.path().join("seqren.bash");
        assert!(completion_file.exists());

        let content = std::fs::read_to_string(&completion_file).unwrap();
        assert!(content.contains("seqren"));
        assert!(content.contains("next-seq"));
    }

    #[test]
    fn test_generate_completions_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("completions");
        let mut cmd = Cli::command();

        generate_completions(Shell::Zsh, &mut cmd, "seqren", &nested_path).unwrap();
        assert!(nested_path.join("_seqren").exists());
    }

    #[test]
    fn test_exit_codes() {
        let conflict = anyhow::Error::new(Error::Conflicts(Vec::new()));
        assert_eq!(exit_code(&conflict), 1);

        let invalid = anyhow::Error::new(Error::InvalidPattern("x".to_string())).context("Cannot rename");
        assert_eq!(exit_code(&invalid), 2);

        assert_eq!(exit_code(&anyhow::anyhow!("File not found: a.txt")), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("Nothing to undo")), 3);
    }

    #[test]
    fn test_ensure_complete() {
        assert!(ensure_complete(None).is_ok());
        let report = BatchReport {
            total: 2,
            executed: 1,
            ..BatchReport::default()
        };
        let err = ensure_complete(Some(&report)).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 operations did not complete");
    }

    #[test]
    fn test_undo_log_flag_wins() {
        let mut config = Config::default();
        config.undo.log_path = Some(PathBuf::from("/from/config.log"));
        assert_eq!(
            undo_log_path(Some(PathBuf::from("/from/flag.log")), &config),
            PathBuf::from("/from/flag.log")
        );
        assert_eq!(undo_log_path(None, &config), PathBuf::from("/from/config.log"));
    }
}
