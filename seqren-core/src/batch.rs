use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::command::Command;
use crate::error::Error;
use crate::items::WorkingSet;
use crate::oplog::OperationLog;

/// What to do after a command failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Run the same command again.
    Retry,
    /// Drop the failed command and carry on.
    Ignore,
    /// Drop the failed command and everything after it.
    Abort,
}

/// Decides how a batch reacts to a failed command.
pub trait FailurePolicy {
    fn decide(&mut self, command: &Command, error: &Error) -> FailureDecision;
}

impl<F> FailurePolicy for F
where
    F: FnMut(&Command, &Error) -> FailureDecision,
{
    fn decide(&mut self, command: &Command, error: &Error) -> FailureDecision {
        self(command, error)
    }
}

/// A policy that always answers the same way. There is no fixed retry policy
/// since it would loop forever on a persistent failure.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(FailureDecision);

impl FixedPolicy {
    pub fn ignore() -> Self {
        Self(FailureDecision::Ignore)
    }

    pub fn abort() -> Self {
        Self(FailureDecision::Abort)
    }
}

impl FailurePolicy for FixedPolicy {
    fn decide(&mut self, _command: &Command, _error: &Error) -> FailureDecision {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub description: String,
    pub error: String,
}

/// Outcome of running one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub executed: usize,
    pub failed: Vec<FailedItem>,
    /// Commands never attempted because of an abort or cancellation.
    pub skipped: usize,
    pub aborted: bool,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.executed == self.total
    }

    /// "N of M operations completed; the following K did not: ..."
    pub fn summary(&self) -> String {
        let mut out = format!("{} of {} operations completed", self.executed, self.total);
        let not_done = self.total - self.executed;
        if not_done == 0 {
            return out;
        }
        let _ = write!(out, "; the following {not_done} did not:");
        for item in &self.failed {
            let _ = write!(out, "\n  {}: {}", item.description, item.error);
        }
        if self.skipped > 0 {
            let reason = if self.cancelled { "cancelled" } else { "aborted" };
            let _ = write!(out, "\n  {} more not attempted ({reason})", self.skipped);
        }
        out
    }
}

/// Collaborators for one batch run: the failure policy, an optional operation
/// log and an optional cancellation flag.
pub struct BatchContext<'a> {
    policy: &'a mut dyn FailurePolicy,
    log: Option<&'a mut OperationLog>,
    cancel: Option<&'a AtomicBool>,
    report: BatchReport,
}

impl<'a> BatchContext<'a> {
    pub fn new(policy: &'a mut dyn FailurePolicy) -> Self {
        Self {
            policy,
            log: None,
            cancel: None,
            report: BatchReport::default(),
        }
    }

    #[must_use]
    pub fn with_log(mut self, log: Option<&'a mut OperationLog>) -> Self {
        self.log = log;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    pub fn into_report(self) -> BatchReport {
        self.report
    }

    pub fn log(&mut self, message: &str) {
        if let Some(log) = self.log.as_deref_mut() {
            if let Err(e) = log.log(message) {
                eprintln!("Warning: failed to write operation log: {e}");
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run each command (or its inverse) under the failure policy.
    ///
    /// Returns the commands that ran and the ones that did not, each in the
    /// order they were given.
    pub(crate) fn run(
        &mut self,
        commands: Vec<Command>,
        mut items: Option<&mut WorkingSet>,
        inverse: bool,
    ) -> (Vec<Command>, Vec<Command>) {
        let mut done = Vec::new();
        let mut not_done = Vec::new();
        let mut remaining = commands.into_iter();
        self.report.total += remaining.len();

        while let Some(command) = remaining.next() {
            if self.is_cancelled() {
                self.report.cancelled = true;
                self.log("Cancelled, discarding remaining commands");
                self.report.skipped += 1 + remaining.len();
                not_done.push(command);
                not_done.extend(remaining.by_ref());
                break;
            }

            let step = if inverse { command.inverse() } else { command.clone() };
            let outcome = loop {
                self.log(&step.description());
                match step.execute(items.as_deref_mut()) {
                    Ok(()) => break Ok(()),
                    Err(error) => {
                        self.log(&format!("Failed: {}", error.detailed()));
                        match self.policy.decide(&step, &error) {
                            FailureDecision::Retry => self.log("Retrying"),
                            decision => break Err((decision, error)),
                        }
                    },
                }
            };

            match outcome {
                Ok(()) => {
                    self.report.executed += 1;
                    done.push(command);
                },
                Err((decision, error)) => {
                    self.report.failed.push(FailedItem {
                        description: step.description(),
                        error: error.detailed(),
                    });
                    not_done.push(command);
                    if decision == FailureDecision::Abort {
                        self.report.aborted = true;
                        self.log("Aborted, discarding remaining commands");
                        self.report.skipped += remaining.len();
                        not_done.extend(remaining.by_ref());
                        break;
                    }
                },
            }
        }

        (done, not_done)
    }
}
