use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Upper bound for the dup-count decorator and intermediate-name probes.
pub const MAX_DUP_COUNT: u32 = 200;

/// Printf widths above this are treated as literal text.
const MAX_WIDTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Octal,
    LowerHex,
    UpperHex,
}

impl Radix {
    fn base(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Octal => 8,
            Self::LowerHex | Self::UpperHex => 16,
        }
    }
}

/// How a counter token renders its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub width: usize,
    pub zero_pad: bool,
    pub left_justify: bool,
    pub radix: Radix,
}

impl NumberFormat {
    /// Format of a `#` run: zero padded decimal, one digit per `#`.
    pub fn hashes(width: usize) -> Self {
        Self {
            width,
            zero_pad: true,
            left_justify: false,
            radix: Radix::Decimal,
        }
    }

    pub fn render(&self, value: u32) -> String {
        let digits = match self.radix {
            Radix::Decimal => value.to_string(),
            Radix::Octal => format!("{value:o}"),
            Radix::LowerHex => format!("{value:x}"),
            Radix::UpperHex => format!("{value:X}"),
        };
        let pad = self.width.saturating_sub(digits.len());
        if pad == 0 {
            digits
        } else if self.left_justify {
            digits + &" ".repeat(pad)
        } else if self.zero_pad {
            "0".repeat(pad) + &digits
        } else {
            " ".repeat(pad) + &digits
        }
    }

    /// Every way this token can match a prefix of `input`, longest digit run first.
    /// Each entry is (value, chars consumed).
    fn match_prefix(&self, input: &[char]) -> Vec<(u32, usize)> {
        let space_padded = !self.zero_pad && !self.left_justify;
        let mut start = 0;
        if space_padded {
            while input.get(start) == Some(&' ') {
                start += 1;
            }
        }

        let base = self.radix.base();
        let run = input[start..]
            .iter()
            .take_while(|c| c.is_digit(base))
            .count();

        let mut matches = Vec::new();
        for len in (1..=run).rev() {
            let digits: String = input[start..start + len].iter().collect();
            let Ok(value) = u32::from_str_radix(&digits, base) else {
                continue;
            };
            let mut used = start + len;
            if self.left_justify {
                while input.get(used) == Some(&' ') {
                    used += 1;
                }
            }
            matches.push((value, used));
        }
        matches
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    Counter(NumberFormat),
    /// `*`
    AnyRest,
    /// `?`
    AnyOne,
}

/// Non-fatal problem found while formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatWarning {
    /// A `?` at this pattern offset had no source character left to copy.
    SourceExhausted { offset: usize },
}

impl std::fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceExhausted { offset } => {
                write!(f, "'?' at position {offset} has no source character left")
            },
        }
    }
}

/// Result of a forward formatting pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOutput {
    pub text: String,
    pub warnings: Vec<FormatWarning>,
}

impl FormatOutput {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// One tokenized sub-pattern (file name or extension).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPart {
    pattern: String,
    tokens: Vec<(usize, Token)>,
}

impl FormatPart {
    pub fn parse(pattern: &str) -> Self {
        Self::parse_with(pattern, false)
    }

    /// Tokenize; when `counter_taken` is set every counter token is literal text.
    fn parse_with(pattern: &str, counter_taken: bool) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut counter_seen = counter_taken;
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '#' => {
                    let run = chars[i..].iter().take_while(|&&c| c == '#').count();
                    if counter_seen {
                        tokens.extend((i..i + run).map(|at| (at, Token::Literal('#'))));
                    } else {
                        tokens.push((i, Token::Counter(NumberFormat::hashes(run))));
                        counter_seen = true;
                    }
                    i += run;
                },
                '%' => match parse_printf(&chars[i..]) {
                    Some((number, len)) => {
                        if counter_seen {
                            tokens.extend((i..i + len).map(|at| (at, Token::Literal(chars[at]))));
                        } else {
                            tokens.push((i, Token::Counter(number)));
                            counter_seen = true;
                        }
                        i += len;
                    },
                    None => {
                        tokens.push((i, Token::Literal('%')));
                        i += 1;
                    },
                },
                '*' => {
                    tokens.push((i, Token::AnyRest));
                    i += 1;
                },
                '?' => {
                    tokens.push((i, Token::AnyOne));
                    i += 1;
                },
                c => {
                    tokens.push((i, Token::Literal(c)));
                    i += 1;
                },
            }
        }

        Self {
            pattern: pattern.to_string(),
            tokens,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn has_counter(&self) -> bool {
        self.tokens
            .iter()
            .any(|(_, t)| matches!(t, Token::Counter(_)))
    }

    pub fn has_wildcard(&self) -> bool {
        self.tokens
            .iter()
            .any(|(_, t)| matches!(t, Token::AnyRest | Token::AnyOne))
    }

    /// Produce a concrete string from `source` and `counter`.
    pub fn format(&self, source: &str, counter: u32) -> FormatOutput {
        let source: Vec<char> = source.chars().collect();
        let mut cursor = 0;
        let mut out = FormatOutput::default();

        for (offset, token) in &self.tokens {
            match token {
                Token::Literal(c) => out.text.push(*c),
                Token::Counter(number) => out.text.push_str(&number.render(counter)),
                Token::AnyRest => {
                    out.text.extend(&source[cursor..]);
                    cursor = source.len();
                },
                Token::AnyOne => {
                    if let Some(c) = source.get(cursor) {
                        out.text.push(*c);
                        cursor += 1;
                    } else {
                        out.warnings
                            .push(FormatWarning::SourceExhausted { offset: *offset });
                    }
                },
            }
        }

        out
    }

    /// Recover the counter from a string this part produced.
    pub fn parse_seq_count(&self, candidate: &str) -> Option<u32> {
        if !self.has_counter() {
            return None;
        }
        let chars: Vec<char> = candidate.chars().collect();
        match_tokens(&self.tokens, &chars).flatten()
    }

    fn matches(&self, candidate: &str) -> Option<Option<u32>> {
        let chars: Vec<char> = candidate.chars().collect();
        match_tokens(&self.tokens, &chars)
    }
}

/// Parse `%[-0]*<width>?<type>` at the start of `chars`.
fn parse_printf(chars: &[char]) -> Option<(NumberFormat, usize)> {
    let mut i = 1;
    let mut left_justify = false;
    let mut zero_pad = false;
    while let Some(&c) = chars.get(i) {
        match c {
            '-' => left_justify = true,
            '0' => zero_pad = true,
            _ => break,
        }
        i += 1;
    }

    let width_start = i;
    while chars.get(i).is_some_and(char::is_ascii_digit) {
        i += 1;
    }
    let width = if i > width_start {
        let digits: String = chars[width_start..i].iter().collect();
        digits.parse::<usize>().ok().filter(|w| *w <= MAX_WIDTH)?
    } else {
        0
    };

    let radix = match chars.get(i)? {
        'd' | 'i' | 'u' => Radix::Decimal,
        'o' => Radix::Octal,
        'x' => Radix::LowerHex,
        'X' => Radix::UpperHex,
        _ => return None,
    };

    Some((
        NumberFormat {
            width,
            zero_pad: zero_pad && !left_justify,
            left_justify,
            radix,
        },
        i + 1,
    ))
}

/// Lock-step matcher. `Some(counter)` when the whole input matched; the inner
/// option is the counter value if a counter token was crossed.
fn match_tokens(tokens: &[(usize, Token)], input: &[char]) -> Option<Option<u32>> {
    Matcher {
        tokens,
        input,
        memo: HashMap::new(),
    }
    .at(0, 0)
}

/// Backtracking over `*` is memoized on (token, offset), so each pair is
/// solved once whatever the number of wildcards.
struct Matcher<'a> {
    tokens: &'a [(usize, Token)],
    input: &'a [char],
    memo: HashMap<(usize, usize), Option<Option<u32>>>,
}

impl Matcher<'_> {
    fn at(&mut self, token: usize, offset: usize) -> Option<Option<u32>> {
        if let Some(known) = self.memo.get(&(token, offset)) {
            return *known;
        }
        let result = self.step(token, offset);
        self.memo.insert((token, offset), result);
        result
    }

    fn step(&mut self, token: usize, offset: usize) -> Option<Option<u32>> {
        let (tokens, whole) = (self.tokens, self.input);
        let input = &whole[offset..];
        let Some((_, current)) = tokens.get(token) else {
            return input.is_empty().then_some(None);
        };

        match current {
            Token::Literal(c) => (input.first() == Some(c))
                .then(|| self.at(token + 1, offset + 1))
                .flatten(),
            Token::AnyOne => (!input.is_empty())
                .then(|| self.at(token + 1, offset + 1))
                .flatten(),
            Token::AnyRest => (offset..=whole.len()).find_map(|next| self.at(token + 1, next)),
            Token::Counter(number) => number
                .match_prefix(input)
                .into_iter()
                .find_map(|(value, used)| self.at(token + 1, offset + used).map(|_| Some(value))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExtensionRule {
    Format(FormatPart),
    Drop,
}

/// A complete rename pattern: file name part plus extension part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    fname: FormatPart,
    ext: ExtensionRule,
    ext_explicit: bool,
}

impl FormatSpec {
    /// Build from separate sub-patterns. An empty extension keeps the source
    /// extension (`*`), a lone `.` drops it.
    pub fn new(fname: &str, ext: &str) -> Self {
        let fname = FormatPart::parse(fname);
        let counter_taken = fname.has_counter();
        let (ext, ext_explicit) = match ext {
            "" => (ExtensionRule::Format(FormatPart::parse("*")), false),
            "." => (ExtensionRule::Drop, true),
            pattern => (
                ExtensionRule::Format(FormatPart::parse_with(pattern, counter_taken)),
                true,
            ),
        };
        Self {
            fname,
            ext,
            ext_explicit,
        }
    }

    /// Split a combined pattern at its last `.`.
    pub fn parse(pattern: &str) -> Self {
        match pattern.rfind('.') {
            Some(dot) => {
                let ext = &pattern[dot + 1..];
                Self::new(&pattern[..dot], if ext.is_empty() { "." } else { ext })
            },
            None => Self::new(pattern, ""),
        }
    }

    /// The combined pattern string this spec was built from.
    pub fn pattern(&self) -> String {
        match &self.ext {
            ExtensionRule::Drop => format!("{}.", self.fname.pattern()),
            ExtensionRule::Format(_) if !self.ext_explicit => self.fname.pattern().to_string(),
            ExtensionRule::Format(ext) => format!("{}.{}", self.fname.pattern(), ext.pattern()),
        }
    }

    pub fn fname(&self) -> &FormatPart {
        &self.fname
    }

    pub fn drops_extension(&self) -> bool {
        self.ext == ExtensionRule::Drop
    }

    /// A usable spec contains a counter or a wildcard in the file name part or
    /// in an explicitly given extension part.
    pub fn validate(&self) -> Result<()> {
        let fname_ok = self.fname.has_counter() || self.fname.has_wildcard();
        let ext_ok = self.ext_explicit
            && matches!(&self.ext, ExtensionRule::Format(p) if p.has_counter() || p.has_wildcard());
        if fname_ok || ext_ok {
            Ok(())
        } else {
            Err(Error::InvalidPattern(self.pattern()))
        }
    }

    /// Format a file name. `dup` appends the `_(n)` decorator to the name part.
    pub fn format_name(&self, file_name: &str, counter: u32, dup: Option<u32>) -> FormatOutput {
        let (stem, ext) = split_name(file_name);
        let mut out = self.fname.format(stem, counter);
        if let Some(dup) = dup {
            out.text.push_str(&dup_suffix(dup));
        }

        if let ExtensionRule::Format(part) = &self.ext {
            let ext_out = part.format(ext, counter);
            if !ext_out.text.is_empty() {
                out.text.push('.');
                out.text.push_str(&ext_out.text);
            }
            out.warnings.extend(ext_out.warnings);
        }
        out
    }

    /// Format a full destination path for `source`. The directory is the
    /// source's own unless `dest_dir` overrides it.
    pub fn format_path(
        &self,
        source: &Path,
        counter: u32,
        dup: Option<u32>,
        dest_dir: Option<&Path>,
    ) -> (PathBuf, Vec<FormatWarning>) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out = self.format_name(&name, counter, dup);
        let dir = dest_dir
            .or_else(|| source.parent())
            .unwrap_or_else(|| Path::new(""));
        (dir.join(out.text), out.warnings)
    }

    /// Recover the counter from a generated file name.
    pub fn parse_seq_count(&self, file_name: &str) -> Option<u32> {
        let ext_counter = matches!(&self.ext, ExtensionRule::Format(p) if p.has_counter());
        if !self.fname.has_counter() && !ext_counter {
            return None;
        }

        let mut splits = vec![(file_name, None)];
        splits.extend(
            file_name
                .char_indices()
                .rev()
                .filter(|(_, c)| *c == '.')
                .map(|(i, _)| (&file_name[..i], Some(&file_name[i + 1..]))),
        );

        splits.into_iter().find_map(|(stem, ext)| {
            let stem_counter = self.fname.matches(stem)?;
            let ext_counter = match (&self.ext, ext) {
                (ExtensionRule::Drop, None) => None,
                (ExtensionRule::Drop, Some(_)) => return None,
                (ExtensionRule::Format(part), Some(ext)) => part.matches(ext)?,
                (ExtensionRule::Format(part), None) => part.matches("")?,
            };
            stem_counter.or(ext_counter)
        })
    }

    pub fn parse_seq_count_path(&self, path: &Path) -> Option<u32> {
        path.file_name()
            .and_then(|name| self.parse_seq_count(&name.to_string_lossy()))
    }
}

impl std::fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// The `_(n)` decorator used to break naming collisions.
pub fn dup_suffix(dup: u32) -> String {
    format!("_({dup})")
}

/// Split a file name into stem and extension at the last dot. Dot-files have
/// no extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(dot) => (&name[..dot], &name[dot + 1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_run_is_zero_padded() {
        let part = FormatPart::parse("IMG_###");
        assert_eq!(part.format("", 7).text, "IMG_007");
        assert_eq!(part.format("", 1234).text, "IMG_1234");
    }

    #[test]
    fn test_only_first_counter_consumes() {
        let part = FormatPart::parse("#_##_%d");
        assert_eq!(part.format("", 5).text, "5_##_%d");
    }

    #[test]
    fn test_printf_variants() {
        assert_eq!(FormatPart::parse("%d").format("", 42).text, "42");
        assert_eq!(FormatPart::parse("%05d").format("", 42).text, "00042");
        assert_eq!(FormatPart::parse("%4d").format("", 42).text, "  42");
        assert_eq!(FormatPart::parse("%-4d|").format("", 42).text, "42  |");
        assert_eq!(FormatPart::parse("%x").format("", 255).text, "ff");
        assert_eq!(FormatPart::parse("%X").format("", 255).text, "FF");
        assert_eq!(FormatPart::parse("%o").format("", 8).text, "10");
    }

    #[test]
    fn test_bare_percent_is_literal() {
        assert_eq!(FormatPart::parse("100%").format("", 1).text, "100%");
        assert_eq!(FormatPart::parse("%q#").format("", 3).text, "%q3");
        assert_eq!(FormatPart::parse("%%d").format("", 9).text, "%9");
    }

    #[test]
    fn test_wildcards() {
        let part = FormatPart::parse("??-*");
        assert_eq!(part.format("holiday", 1).text, "ho-liday");

        let part = FormatPart::parse("*_#");
        assert_eq!(part.format("holiday", 3).text, "holiday_3");
    }

    #[test]
    fn test_question_past_end_is_a_warning() {
        let part = FormatPart::parse("???#");
        let out = part.format("ab", 1);
        assert_eq!(out.text, "ab1");
        assert_eq!(
            out.warnings,
            vec![FormatWarning::SourceExhausted { offset: 2 }]
        );
        assert!(!out.is_clean());
    }

    #[test]
    fn test_parse_seq_count_with_wildcard_and_separator() {
        let part = FormatPart::parse("*_###");
        assert_eq!(part.parse_seq_count("my_photo_042"), Some(42));
        assert_eq!(part.parse_seq_count("my_photo"), None);
    }

    #[test]
    fn test_parse_seq_count_requires_counter() {
        let part = FormatPart::parse("*-copy");
        assert_eq!(part.parse_seq_count("a-copy"), None);
    }

    #[test]
    fn test_parse_seq_count_rejects_short_or_long_candidates() {
        let part = FormatPart::parse("IMG_###");
        assert_eq!(part.parse_seq_count("IMG_"), None);
        assert_eq!(part.parse_seq_count("IM"), None);
        assert_eq!(part.parse_seq_count("IMG_001x"), None);
        assert_eq!(part.parse_seq_count("IMG_001"), Some(1));
    }

    #[test]
    fn test_parse_seq_count_space_and_hex_padding() {
        assert_eq!(FormatPart::parse("n%4d").parse_seq_count("n  42"), Some(42));
        assert_eq!(FormatPart::parse("%-4d|").parse_seq_count("42  |"), Some(42));
        assert_eq!(FormatPart::parse("0x%04X").parse_seq_count("0x00FF"), Some(255));
    }

    #[test]
    fn test_spec_splits_combined_pattern() {
        let spec = FormatSpec::parse("IMG_###.jpg");
        assert_eq!(spec.format_name("dsc.png", 1, None).text, "IMG_001.jpg");

        let keep = FormatSpec::parse("IMG_###");
        assert_eq!(keep.format_name("dsc.png", 1, None).text, "IMG_001.png");

        let drop = FormatSpec::parse("IMG_###.");
        assert_eq!(drop.format_name("dsc.png", 1, None).text, "IMG_001");
        assert!(drop.drops_extension());
    }

    #[test]
    fn test_spec_pattern_round_trips() {
        for pattern in ["IMG_###", "IMG_###.", "*_#.txt"] {
            assert_eq!(FormatSpec::parse(pattern).pattern(), pattern);
        }
    }

    #[test]
    fn test_dup_decorator_goes_on_name_part() {
        let spec = FormatSpec::parse("*");
        assert_eq!(
            spec.format_name("report.pdf", 1, Some(3)).text,
            "report_(3).pdf"
        );
    }

    #[test]
    fn test_counter_in_extension_only_when_name_has_none() {
        let spec = FormatSpec::new("*", "#");
        assert_eq!(spec.format_name("log.txt", 4, None).text, "log.4");

        let spec = FormatSpec::new("#", "#");
        assert_eq!(spec.format_name("log.txt", 4, None).text, "4.#");
    }

    #[test]
    fn test_validate() {
        assert!(FormatSpec::parse("photo_#").validate().is_ok());
        assert!(FormatSpec::parse("*").validate().is_ok());
        assert!(FormatSpec::new("photo", "#").validate().is_ok());
        assert!(matches!(
            FormatSpec::parse("photo").validate(),
            Err(Error::InvalidPattern(_))
        ));
        assert!(FormatSpec::parse("photo.jpg").validate().is_err());
    }

    #[test]
    fn test_parse_seq_count_many_wildcards_is_fast() {
        let started = std::time::Instant::now();
        let spec = FormatSpec::parse("*a*a*a*a*a*_#");
        assert_eq!(spec.parse_seq_count(&"a".repeat(80)), None);
        assert_eq!(spec.parse_seq_count(&format!("{}_12", "a".repeat(80))), Some(12));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_spec_parse_seq_count_handles_dotted_stems() {
        let spec = FormatSpec::parse("*_###");
        assert_eq!(spec.parse_seq_count("my.photo_007.jpg"), Some(7));

        let drop = FormatSpec::parse("*_###.");
        assert_eq!(drop.parse_seq_count("my.photo_007"), Some(7));
    }

    #[test]
    fn test_format_path_uses_dest_dir() {
        let spec = FormatSpec::parse("#");
        let (path, warnings) = spec.format_path(
            Path::new("/in/a.txt"),
            2,
            None,
            Some(Path::new("/out")),
        );
        assert_eq!(path, PathBuf::from("/out/2.txt"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a.tar.gz"), ("a.tar", "gz"));
        assert_eq!(split_name(".bashrc"), (".bashrc", ""));
        assert_eq!(split_name("README"), ("README", ""));
    }
}
