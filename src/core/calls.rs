//! Balanced-construct extraction: `name(...)` calls and `{...}` payloads.
//!
//! Candidate names are matched with one compiled alternation; the closing
//! delimiter is then found by a quote-aware depth scan, so parentheses inside
//! string literals never count. Unbalanced candidates are dropped.

use std::sync::Arc;

use itertools::Itertools;
use moka::sync::Cache;
use regex::Regex;
use tracing::warn;

use crate::core::lexer::QuoteState;
use crate::infra::line_index::NewlineIndex;

/// A recognized `identifier(...)` invocation. Borrowed from the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call<'a>
{
    pub name: &'a str,
    /// Text strictly between the outer parentheses
    pub arg_text: &'a str,
    /// Offset of the first byte of `name`
    pub start: usize,
    /// Offset one past the closing ')'
    pub end: usize,
    /// 1-based line of `start`
    pub line: usize,
}

/// Compiled name-alternation patterns keyed by the (sorted) candidate set.
///
/// Owned by a `CallScanner`; safe to share across worker threads.
#[derive(Clone)]
pub struct NamePatternCache
{
    inner: Cache<String, Regex>,
}

impl NamePatternCache
{
    pub fn new(capacity: u64) -> Self
    {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// Fetch or compile the alternation for `names`.
    pub fn pattern(
        &self,
        names: &[&str],
    ) -> Result<Regex, Arc<regex::Error>>
    {
        let mut sorted: Vec<&str> = names.to_vec();
        // Longest first so a shorter alias never shadows a longer one
        sorted.sort_unstable_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then(a.cmp(b))
        });
        sorted.dedup();

        let key = sorted.join("\u{1f}");
        self.inner
            .try_get_with(key, || {
                let alternation = sorted
                    .iter()
                    .map(|n| regex::escape(n))
                    .join("|");
                Regex::new(&format!(r"\b(?:{alternation})\b"))
            })
    }

    /// Number of compiled patterns currently held.
    pub fn len(&self) -> u64
    {
        self.inner
            .run_pending_tasks();
        self.inner
            .entry_count()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

impl Default for NamePatternCache
{
    fn default() -> Self
    {
        Self::new(64)
    }
}

/// Finds balanced calls for arbitrary candidate-name sets.
#[derive(Clone, Default)]
pub struct CallScanner
{
    patterns: NamePatternCache,
}

impl CallScanner
{
    pub fn new(patterns: NamePatternCache) -> Self
    {
        Self { patterns }
    }

    pub fn patterns(&self) -> &NamePatternCache
    {
        &self.patterns
    }

    /// Find every `name(...)` with balanced, quote-aware parentheses.
    ///
    /// Expects comment- and heredoc-stripped text. A candidate whose
    /// parentheses never close is skipped and scanning resumes just past
    /// its name.
    pub fn iter_calls<'a>(
        &self,
        text: &'a str,
        names: &[&str],
        index: &NewlineIndex,
    ) -> Vec<Call<'a>>
    {
        if names.is_empty()
        {
            return Vec::new();
        }

        let rx = match self
            .patterns
            .pattern(names)
        {
            Ok(rx) => rx,
            Err(err) =>
            {
                warn!(error = %err, "could not compile call-name pattern");
                return Vec::new();
            }
        };

        let bytes = text.as_bytes();
        let mut calls = Vec::new();
        let mut i = 0usize;

        while let Some(m) = rx.find_at(text, i)
        {
            let mut j = m.end();
            while j < bytes.len() && bytes[j].is_ascii_whitespace()
            {
                j += 1;
            }
            if bytes.get(j) != Some(&b'(')
            {
                i = m.end();
                continue;
            }

            match find_balanced(text, j, b'(', b')')
            {
                Some(close) =>
                {
                    calls.push(Call {
                        name: m.as_str(),
                        arg_text: &text[j + 1..close],
                        start: m.start(),
                        end: close + 1,
                        line: index.line_of(m.start()),
                    });
                    i = close + 1;
                }
                None => i = m.end(),
            }
        }

        calls
    }
}

/// Offset of the delimiter closing the one at `open`, tracking depth and
/// string state. `None` when `text[open]` is not `open_b` or never balances.
pub fn find_balanced(
    text: &str,
    open: usize,
    open_b: u8,
    close_b: u8,
) -> Option<usize>
{
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&open_b)
    {
        return None;
    }

    let mut state = QuoteState::default();
    let mut depth = 0usize;

    for (k, &b) in bytes[open..]
        .iter()
        .enumerate()
    {
        if !state.step(b)
        {
            continue;
        }
        if b == open_b
        {
            depth += 1;
        }
        else if b == close_b
        {
            depth -= 1;
            if depth == 0
            {
                return Some(open + k);
            }
        }
    }

    None
}

/// Extract a balanced `{...}` payload starting at `open`.
/// Returns the inner text and the offset one past the closing brace.
pub fn extract_braced_payload(
    text: &str,
    open: usize,
) -> Option<(&str, usize)>
{
    let close = find_balanced(text, open, b'{', b'}')?;
    Some((&text[open + 1..close], close + 1))
}
