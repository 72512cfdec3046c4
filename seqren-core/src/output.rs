use comfy_table::{Cell, Color, Table};
use nu_ansi_term::Color as AnsiColor;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;

use crate::batch::BatchReport;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEntry {
    pub from: String,
    pub to: String,
}

/// Result of a rename operation
#[derive(Debug, Serialize)]
pub struct RenameResult {
    pub pattern: String,
    pub renames: Vec<RenameEntry>,
    /// Renames that went through an intermediate name
    pub staged: usize,
    pub next_counter: u32,
    pub dry_run: bool,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
    #[serde(skip)]
    pub use_color: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchEntry {
    pub path: String,
    pub changes: Vec<String>,
}

/// Result of a touch operation
#[derive(Debug, Serialize)]
pub struct TouchResult {
    pub files: Vec<TouchEntry>,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
    #[serde(skip)]
    pub use_color: bool,
}

/// Result of an undo operation
#[derive(Debug, Serialize)]
pub struct UndoResult {
    pub kind: String,
    pub description: String,
    pub commands: usize,
    /// Part of the batch could not be undone and is still on the undo stack
    pub partial: bool,
    pub report: BatchReport,
    #[serde(skip)]
    pub use_color: bool,
}

/// Result of a redo operation
#[derive(Debug, Serialize)]
pub struct RedoResult {
    pub kind: String,
    pub description: String,
    pub commands: usize,
    pub partial: bool,
    pub report: BatchReport,
    #[serde(skip)]
    pub use_color: bool,
}

/// Result of a history operation
#[derive(Debug, Serialize)]
pub struct HistoryResult {
    pub entries: Vec<HistoryItem>,
    #[serde(skip)]
    pub use_color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    /// "undo" or "redo"
    pub stack: String,
    pub kind: String,
    pub timestamp: Option<String>,
    pub description: String,
    pub commands: usize,
}

/// Result of a next-seq operation
#[derive(Debug, Serialize, Deserialize)]
pub struct NextSeqResult {
    pub pattern: String,
    pub start: u32,
    pub next: u32,
}

/// Result of a parse-seq operation
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseSeqResult {
    pub name: String,
    pub pattern: String,
    pub counter: Option<u32>,
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }
    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

/// Partial-failure lines for a batch report; empty when everything ran.
fn format_report(report: &BatchReport, use_color: bool) -> String {
    if report.is_complete() {
        return String::new();
    }
    let summary = report.summary();
    if use_color {
        format!("{}\n", AnsiColor::Red.paint(summary))
    } else {
        format!("{summary}\n")
    }
}

fn table(headers: &[&str], use_color: bool) -> Table {
    let mut table = Table::new();
    if use_color {
        table.enforce_styling();
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    } else {
        table.set_header(headers.to_vec());
    }
    table
}

impl OutputFormatter for RenameResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.report.as_ref().map_or(true, BatchReport::is_complete),
            "operation": "rename",
            "pattern": self.pattern,
            "dry_run": self.dry_run,
            "renames": self.renames,
            "staged": self.staged,
            "next_counter": self.next_counter,
            "warnings": self.warnings,
            "report": self.report,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        for warning in &self.warnings {
            writeln!(output, "Warning: {warning}").unwrap();
        }

        if self.renames.is_empty() {
            output.push_str("Nothing to rename\n");
            return output;
        }

        if self.dry_run {
            let mut table = table(&["From", "To"], self.use_color);
            for entry in &self.renames {
                table.add_row(vec![&entry.from, &entry.to]);
            }
            writeln!(output, "{table}").unwrap();
            writeln!(output, "Dry run: {} files would be renamed", self.renames.len()).unwrap();
            if self.staged > 0 {
                writeln!(output, "{} renames need an intermediate name", self.staged).unwrap();
            }
            return output;
        }

        let executed = self.report.as_ref().map_or(0, |r| r.executed);
        writeln!(output, "✓ Renamed {} files ({} operations)", self.renames.len(), executed).unwrap();
        if let Some(report) = &self.report {
            output.push_str(&format_report(report, self.use_color));
        }
        output.push_str("Undo with: seqren undo\n");
        output
    }
}

impl OutputFormatter for TouchResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.report.as_ref().map_or(true, BatchReport::is_complete),
            "operation": "touch",
            "dry_run": self.dry_run,
            "files": self.files,
            "report": self.report,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.files.is_empty() {
            return "Nothing to touch\n".to_string();
        }

        let mut output = String::new();
        if self.dry_run {
            let mut table = table(&["File", "Changes"], self.use_color);
            for entry in &self.files {
                table.add_row(vec![entry.path.clone(), entry.changes.join(", ")]);
            }
            writeln!(output, "{table}").unwrap();
            writeln!(output, "Dry run: {} files would be touched", self.files.len()).unwrap();
            return output;
        }

        let executed = self.report.as_ref().map_or(0, |r| r.executed);
        writeln!(output, "✓ Touched {executed} files").unwrap();
        if let Some(report) = &self.report {
            output.push_str(&format_report(report, self.use_color));
        }
        output.push_str("Undo with: seqren undo\n");
        output
    }
}

impl OutputFormatter for UndoResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": !self.partial,
            "operation": "undo",
            "kind": self.kind,
            "description": self.description,
            "commands": self.commands,
            "partial": self.partial,
            "report": self.report,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = format!("✓ Undid {}: {}\n", self.kind.to_lowercase(), self.description);
        output.push_str(&format_report(&self.report, self.use_color));
        if self.partial {
            output.push_str("The rest of this batch stays on the undo stack\n");
        }
        output.push_str("Redo with: seqren redo\n");
        output
    }
}

impl OutputFormatter for RedoResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": !self.partial,
            "operation": "redo",
            "kind": self.kind,
            "description": self.description,
            "commands": self.commands,
            "partial": self.partial,
            "report": self.report,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = format!("✓ Redid {}: {}\n", self.kind.to_lowercase(), self.description);
        output.push_str(&format_report(&self.report, self.use_color));
        if self.partial {
            output.push_str("The rest of this batch stays on the redo stack\n");
        }
        output
    }
}

impl OutputFormatter for HistoryResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "entries": self.entries
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.entries.is_empty() {
            return "No history entries found".to_string();
        }

        let mut table = table(&["Stack", "Type", "Date", "Files", "Description"], self.use_color);
        for entry in &self.entries {
            table.add_row(vec![
                entry.stack.clone(),
                entry.kind.clone(),
                entry.timestamp.clone().unwrap_or_else(|| "-".to_string()),
                entry.commands.to_string(),
                entry.description.clone(),
            ]);
        }
        table.to_string()
    }
}

impl OutputFormatter for NextSeqResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        self.next.to_string()
    }
}

impl OutputFormatter for ParseSeqResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        match self.counter {
            Some(counter) => counter.to_string(),
            None => format!("'{}' does not match '{}'", self.name, self.pattern),
        }
    }
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "name": self.name,
            "version": self.version,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}
