use crate::config::Config;
use crate::format_spec::FormatSpec;
use crate::output::ParseSeqResult;

/// Recover the counter a pattern put into `name`.
pub fn parse_seq_operation(name: &str, pattern: Option<&str>, config: &Config) -> ParseSeqResult {
    let pattern = pattern.unwrap_or(&config.defaults.pattern);
    let spec = FormatSpec::parse(pattern);
    ParseSeqResult {
        name: name.to_string(),
        pattern: pattern.to_string(),
        counter: spec.parse_seq_count(name),
    }
}
