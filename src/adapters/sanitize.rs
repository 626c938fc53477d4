//! Log sanitization for measurement values and identifiers.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`], which redacts:
//! - Biomarker values written as `code=value` or `name: value`
//! - Assessment IDs (UUIDs)
//! - Email addresses
//!
//! The primary protection is still to keep raw measurements out of log calls;
//! the assessment service only logs percentile and category at `info`.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<RedactionPatterns> = OnceLock::new();
static MAX_BYTES: OnceLock<usize> = OnceLock::new();

/// Default cap on bytes sanitized per line (16 KiB).
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Redaction {
    regex: Regex,
    replacement: &'static str,
}

struct RedactionPatterns {
    set: RegexSet,
    rules: Vec<Redaction>,
}

/// Set the per-line sanitize cap. Only the first call takes effect.
pub fn set_max_bytes(max_bytes: usize) {
    if max_bytes > 0 {
        let _ = MAX_BYTES.set(max_bytes);
    }
}

fn max_bytes() -> usize {
    MAX_BYTES.get().copied().unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn patterns() -> &'static RedactionPatterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Biomarker codes or names followed by a number
            (
                r"(?i)\b(LBXGLU|LBXGH|LBXTR|BMXBMI|fasting_glucose|glucose|hba1c|triglycerides|bmi)(\s*[:=]\s*)-?\d+(?:\.\d+)?",
                "${1}${2}[REDACTED]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Redaction {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        RedactionPatterns { set, rules }
    })
}

/// Redact biomarker values and identifiers from a string.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check whether a string would be altered by [`sanitize`].
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_bytes());
    patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let sanitized = sanitize(&String::from_utf8_lossy(bytes));
        self.inner.write_all(sanitized.as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline must not buffer without bound.
        if self.buffer.len() > max_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_biomarker_values() {
        let s = sanitize("input LBXGLU=126.5 hba1c: 6.1 BMI = 31");
        assert_eq!(s, "input LBXGLU=[REDACTED] hba1c: [REDACTED] BMI = [REDACTED]");
    }

    #[test]
    fn test_sanitize_uuid() {
        let s = sanitize("assessment 550e8400-e29b-41d4-a716-446655440000 done");
        assert!(s.contains("[REDACTED-UUID]"));
        assert!(!s.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_email() {
        assert!(sanitize("sent to someone@clinic.org").contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_percentile_and_category_pass_through() {
        let line = "Assessment complete: percentile=62, category=ELEVATED";
        assert!(!contains_sensitive(line));
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let s = sanitize_with_limit("glucose=100 and a long tail of text", 12);
        assert!(s.ends_with("[TRUNCATED]"));
        assert!(!s.contains("100"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut out = Vec::new();
        {
            let mut w = SanitizingWriter::new(&mut out);
            w.write_all(b"tg=").unwrap();
            w.write_all(b"210\nsecond line\n").unwrap();
            w.flush().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "tg=210\nsecond line\n");

        let mut out = Vec::new();
        {
            let mut w = SanitizingWriter::new(&mut out);
            w.write_all(b"triglycerides=").unwrap();
            w.write_all(b"210\n").unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "triglycerides=[REDACTED]\n");
    }
}
