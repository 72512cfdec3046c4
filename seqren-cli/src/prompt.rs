use seqren_core::{Command, Error, FailureDecision, FailurePolicy};
use std::io::{self, BufRead, Write};

/// Asks on stderr what to do about each failed file operation.
pub struct PromptPolicy<R> {
    input: R,
}

impl<R: BufRead> PromptPolicy<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn ask(&mut self) -> io::Result<FailureDecision> {
        loop {
            eprint!("[r]etry, [i]gnore, [a]bort? ");
            io::stderr().flush()?;

            let mut line = String::new();
            // End of input counts as abort.
            if self.input.read_line(&mut line)? == 0 {
                return Ok(FailureDecision::Abort);
            }
            match line.trim().to_lowercase().as_str() {
                "r" | "retry" => return Ok(FailureDecision::Retry),
                "i" | "ignore" => return Ok(FailureDecision::Ignore),
                "a" | "abort" => return Ok(FailureDecision::Abort),
                _ => eprintln!("Invalid choice. Please enter r, i, or a."),
            }
        }
    }
}

impl<R: BufRead> FailurePolicy for PromptPolicy<R> {
    fn decide(&mut self, command: &Command, error: &Error) -> FailureDecision {
        eprintln!("\n{} failed: {}", command.description(), error.detailed());
        self.ask().unwrap_or(FailureDecision::Abort)
    }
}
