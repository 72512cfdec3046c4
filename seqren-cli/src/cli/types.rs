use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for seqren_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// How a failed file operation is handled.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OnErrorArg {
    /// Ask on the terminal; abort when stdin is not a terminal
    #[default]
    Prompt,
    /// Skip the failed file and carry on
    Ignore,
    /// Stop the batch at the first failure
    Abort,
}
