//! Text format for persisting undo and redo stacks.
//!
//! ```text
//! <RENAME [2] 2026-10-18T09:30:00+00:00>
//! "/photos/a.jpg" -> "/photos/IMG_001.jpg"
//! "/photos/b.jpg" -> "/photos/IMG_002.jpg"
//! <END OF BATCH>
//!
//! <TOUCH [1] 2026-10-18T09:31:00+00:00>
//! {"path":"/photos/c.jpg",...} -> {"path":"/photos/c.jpg",...}
//! <END OF BATCH>
//! ```
//!
//! Loading is forgiving: malformed lines and unknown tags are skipped, and a
//! batch without its end tag is dropped.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::command::{Command, CommandKind, MacroCommand};
use crate::file_state::FileState;

const END_TAG: &str = "<END OF BATCH>";

/// Suffix appended to the executable path for the default log location.
pub const LOG_SUFFIX: &str = ".undo.log";

/// Executable path plus [`LOG_SUFFIX`].
pub fn default_log_path() -> PathBuf {
    std::env::current_exe().map_or_else(
        |_| PathBuf::from(format!("seqren{LOG_SUFFIX}")),
        |exe| append_to_path(&exe, LOG_SUFFIX),
    )
}

/// Sibling file holding the redo stack.
pub fn redo_log_path(log_path: &Path) -> PathBuf {
    append_to_path(log_path, ".redo")
}

fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// Write every persisted macro of `stack`, oldest first.
pub fn write_stack<W: Write>(stack: &[MacroCommand], mut writer: W) -> io::Result<()> {
    let mut first = true;
    for batch in stack.iter().filter(|m| m.is_persisted() && !m.is_empty()) {
        if !first {
            writeln!(writer)?;
        }
        first = false;

        match batch.timestamp() {
            Some(ts) => writeln!(writer, "<{} [{}] {}>", batch.kind().key(), batch.len(), ts.to_rfc3339())?,
            None => writeln!(writer, "<{} [{}]>", batch.kind().key(), batch.len())?,
        }
        for command in batch.commands() {
            writeln!(writer, "{}", format_command(command)?)?;
        }
        writeln!(writer, "{END_TAG}")?;
    }
    writer.flush()
}

fn json_path(path: &Path) -> io::Result<String> {
    let text = path.to_str().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not valid UTF-8: {}", path.display()),
        )
    })?;
    Ok(Value::String(text.to_owned()).to_string())
}

fn format_command(command: &Command) -> io::Result<String> {
    match command {
        Command::RenameFile { from, to } => Ok(format!("{} -> {}", json_path(from)?, json_path(to)?)),
        Command::TouchFile { from, to } => Ok(format!(
            "{} -> {}",
            serde_json::to_string(from)?,
            serde_json::to_string(to)?
        )),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} commands are not persisted", other.kind()),
        )),
    }
}

struct OpenBatch {
    kind: CommandKind,
    timestamp: Option<DateTime<FixedOffset>>,
    commands: Vec<Command>,
}

/// Read a stack written by [`write_stack`]. Never fails.
pub fn read_stack<R: BufRead>(reader: R) -> Vec<MacroCommand> {
    let mut stack = Vec::new();
    let mut open: Option<OpenBatch> = None;
    // Inside an unknown batch: skip lines until its end tag.
    let mut skipping = false;

    for line in reader.lines() {
        let Ok(line) = line else {
            eprintln!("Warning: undo log is not valid text past this point, ignoring the rest");
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == END_TAG {
            if let Some(batch) = open.take() {
                if !batch.commands.is_empty() {
                    stack.push(MacroCommand::from_parts(batch.kind, batch.timestamp, batch.commands));
                }
            }
            skipping = false;
            continue;
        }

        if let Some(header) = parse_header(line) {
            // A new tag before the end tag means the previous batch was cut short.
            skipping = header.is_none();
            open = header.map(|(kind, timestamp)| OpenBatch {
                kind,
                timestamp,
                commands: Vec::new(),
            });
            continue;
        }

        if skipping {
            continue;
        }
        if let Some(batch) = open.as_mut() {
            if let Some(command) = parse_command(batch.kind, line) {
                batch.commands.push(command);
            }
        }
    }

    stack
}

/// `Some(None)` for a tag with an unknown kind, `None` for a non-tag line.
#[allow(clippy::option_option)]
fn parse_header(line: &str) -> Option<Option<(CommandKind, Option<DateTime<FixedOffset>>)>> {
    let inner = line.strip_prefix('<')?.strip_suffix('>')?;
    let mut parts = inner.split_whitespace();
    let key = parts.next()?;
    let count = parts.next()?;
    if !(count.starts_with('[') && count.ends_with(']')) {
        return None;
    }

    let Some(kind) = CommandKind::from_key(key).filter(|k| k.is_persisted()) else {
        return Some(None);
    };
    let timestamp = parts
        .next()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok());
    Some(Some((kind, timestamp)))
}

fn parse_command(kind: CommandKind, line: &str) -> Option<Command> {
    let (before, after) = split_pair(line)?;
    match kind {
        CommandKind::Rename => Some(Command::RenameFile {
            from: PathBuf::from(before.as_str()?),
            to: PathBuf::from(after.as_str()?),
        }),
        CommandKind::Touch => Some(Command::TouchFile {
            from: serde_json::from_value::<FileState>(before).ok()?,
            to: serde_json::from_value::<FileState>(after).ok()?,
        }),
        _ => None,
    }
}

/// Split `<json> -> <json>` into its two values.
fn split_pair(line: &str) -> Option<(Value, Value)> {
    let mut stream = serde_json::Deserializer::from_str(line).into_iter::<Value>();
    let before = stream.next()?.ok()?;
    let rest = line[stream.byte_offset()..].trim_start();
    let rest = rest.strip_prefix("->")?;
    let after = serde_json::from_str::<Value>(rest).ok()?;
    Some((before, after))
}

/// Rewrite the log at `path` with `stack`.
pub fn save_to_path(path: &Path, stack: &[MacroCommand]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    write_stack(stack, BufWriter::new(file))
}

/// Load the log at `path`. A missing file is an empty stack; an unreadable
/// one is an empty stack and a warning.
pub fn load_from_path(path: &Path) -> Vec<MacroCommand> {
    if !path.exists() {
        return Vec::new();
    }
    match File::open(path) {
        Ok(file) => read_stack(BufReader::new(file)),
        Err(e) => {
            eprintln!("Warning: failed to read undo log {}: {e}", path.display());
            Vec::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Vec<MacroCommand> {
        read_stack(text.as_bytes())
    }

    #[test]
    fn test_header_parsing() {
        let (kind, ts) = parse_header("<RENAME [3] 2026-10-18T09:30:00+02:00>")
            .unwrap()
            .unwrap();
        assert_eq!(kind, CommandKind::Rename);
        assert_eq!(ts.unwrap().to_rfc3339(), "2026-10-18T09:30:00+02:00");

        let (_, ts) = parse_header("<TOUCH [1]>").unwrap().unwrap();
        assert!(ts.is_none());

        assert_eq!(parse_header("<DELETE [1]>"), Some(None));
        assert_eq!(parse_header("\"a\" -> \"b\""), None);
        assert_eq!(parse_header("<RENAME>"), None);
    }

    #[test]
    fn test_paths_with_arrows_and_quotes() {
        let command = parse_command(CommandKind::Rename, r#""/a -> b \"x\".txt" -> "/c.txt""#).unwrap();
        assert_eq!(
            command,
            Command::RenameFile {
                from: PathBuf::from("/a -> b \"x\".txt"),
                to: PathBuf::from("/c.txt"),
            }
        );
    }

    #[test]
    fn test_truncated_batch_is_dropped() {
        let stack = read(concat!(
            "<RENAME [1]>\n",
            "\"/a\" -> \"/b\"\n",
            "<RENAME [1]>\n",
            "\"/c\" -> \"/d\"\n",
            "<END OF BATCH>\n",
            "<RENAME [1]>\n",
            "\"/e\" -> \"/f\"\n",
        ));
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack[0].moves(false),
            vec![(PathBuf::from("/c"), PathBuf::from("/d"))]
        );
    }

    #[test]
    fn test_unknown_tags_and_stray_lines_are_skipped() {
        let stack = read(concat!(
            "\"/stray\" -> \"/line\"\n",
            "<DELETE [1]>\n",
            "\"/x\" -> \"/y\"\n",
            "<END OF BATCH>\n",
            "<RENAME [2]>\n",
            "not a command\n",
            "\"/a\" -> \"/b\"\n",
            "<END OF BATCH>\n",
            "<RENAME [1]>\n",
            "garbage\n",
            "<END OF BATCH>\n",
        ));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].len(), 1);
    }

    #[test]
    fn test_edit_macros_are_not_written() {
        let mut edits = MacroCommand::new(CommandKind::Edit, "");
        edits.push(Command::Edit(crate::command::PathChange {
            source: PathBuf::from("/a"),
            before: PathBuf::new(),
            after: PathBuf::from("/b"),
        }));
        let mut out = Vec::new();
        write_stack(&[edits], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_not_written_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut batch = MacroCommand::new(CommandKind::Rename, "");
        batch.push(Command::RenameFile {
            from: PathBuf::from(OsStr::from_bytes(b"/v/bad\xff.txt")),
            to: PathBuf::from("/v/1.txt"),
        });
        let mut out = Vec::new();
        let err = write_stack(&[batch], &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_log_paths() {
        let log = PathBuf::from("/opt/seqren.undo.log");
        assert_eq!(redo_log_path(&log), PathBuf::from("/opt/seqren.undo.log.redo"));
        assert!(default_log_path().to_string_lossy().ends_with(LOG_SUFFIX));
    }
}
