//! Filepath: src/core/lexer.rs
//! Tolerant lexical scanner for PG source text.
//!
//! Two passes, both line-count preserving so that every later line number
//! computed against the cleaned text still points at the original line:
//! - `strip_comments`: removes `#` comments outside string literals,
//!   leaving heredoc bodies untouched.
//! - `strip_heredocs`: blanks heredoc body and terminator lines to empty
//!   (newline kept) so call scanning never sees template text as code.
//!
//! Nothing here fails. An unterminated quote only affects its own line; an
//! unterminated heredoc swallows the rest of the file as body.

/// Quote/escape state machine shared by every scanner in the crate.
///
/// Tracks single quotes, double quotes and backslash escapes. Works on bytes:
/// all delimiters are ASCII, so multi-byte chars can never be mistaken for one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteState
{
    in_single: bool,
    in_double: bool,
    escape: bool,
}

impl QuoteState
{
    /// Feed one byte. Returns `true` when the byte is structural code: not
    /// escaped, not a quote toggle, and outside both string states.
    #[inline]
    pub fn step(
        &mut self,
        b: u8,
    ) -> bool
    {
        if self.escape
        {
            self.escape = false;
            return false;
        }
        match b
        {
            b'\\' =>
            {
                self.escape = true;
                false
            }
            b'\'' if !self.in_double =>
            {
                self.in_single = !self.in_single;
                false
            }
            b'"' if !self.in_single =>
            {
                self.in_double = !self.in_double;
                false
            }
            _ => !self.in_single && !self.in_double,
        }
    }
}

/// Role of a physical line relative to heredoc structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole<'a>
{
    /// Ordinary code; `opens` carries the terminator when this line
    /// introduces a heredoc.
    Code
    {
        opens: Option<&'a str>,
    },
    /// Inside a heredoc body.
    Body
    {
        terminator: &'a str,
    },
    /// The line that closes the current heredoc.
    Terminator,
}

/// One physical line, `text` including its trailing '\n' when present.
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a>
{
    /// Byte offset of the first byte of the line
    pub offset: usize,
    /// 1-based line number
    pub number: usize,
    pub text: &'a str,
    pub role: LineRole<'a>,
}

impl SourceLine<'_>
{
    /// True when `text` ends with '\n'.
    pub fn has_newline(&self) -> bool
    {
        self.text
            .ends_with('\n')
    }
}

/// Iterator over '\n'-delimited lines annotated with heredoc roles.
pub struct HeredocLines<'a>
{
    text: &'a str,
    pos: usize,
    number: usize,
    pending: Option<&'a str>,
}

impl<'a> HeredocLines<'a>
{
    pub fn new(text: &'a str) -> Self
    {
        Self {
            text,
            pos: 0,
            number: 0,
            pending: None,
        }
    }
}

impl<'a> Iterator for HeredocLines<'a>
{
    type Item = SourceLine<'a>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.pos >= self
            .text
            .len()
        {
            return None;
        }

        let rest = &self.text[self.pos..];
        let len = memchr::memchr(b'\n', rest.as_bytes()).map_or(rest.len(), |i| i + 1);
        let line = &rest[..len];
        let offset = self.pos;
        self.pos += len;
        self.number += 1;

        let role = match self.pending
        {
            Some(term) if line.trim() == term =>
            {
                self.pending = None;
                LineRole::Terminator
            }
            Some(term) => LineRole::Body { terminator: term },
            None =>
            {
                let opens = scan_heredoc_terminator(line);
                self.pending = opens;
                LineRole::Code { opens }
            }
        };

        Some(SourceLine {
            offset,
            number: self.number,
            text: line,
            role,
        })
    }
}

/// Detect a heredoc introducer outside string literals and return its
/// terminator token.
///
/// Accepts `<<TOKEN`, `<<"TOKEN"`, `<<'TOKEN'` and `<<-TOKEN`, with optional
/// whitespace before the token. The first `<<` outside strings decides: a
/// shift like `1 << 2` yields `None` without looking further. Scanning stops
/// at a `#` outside strings.
pub fn scan_heredoc_terminator(line: &str) -> Option<&str>
{
    let bytes = line.as_bytes();
    let mut state = QuoteState::default();

    let mut i = 0usize;
    while i + 1 < bytes.len()
    {
        if !state.step(bytes[i])
        {
            i += 1;
            continue;
        }
        // A comment cannot introduce a heredoc
        if bytes[i] == b'#'
        {
            return None;
        }
        if bytes[i] != b'<' || bytes[i + 1] != b'<'
        {
            i += 1;
            continue;
        }

        let mut j = i + 2;
        if bytes.get(j) == Some(&b'-')
        {
            j += 1;
        }
        while j < bytes.len() && bytes[j].is_ascii_whitespace()
        {
            j += 1;
        }
        let first = *bytes.get(j)?;

        if first == b'\'' || first == b'"'
        {
            let start = j + 1;
            let close = memchr::memchr(first, &bytes[start..])?;
            return Some(&line[start..start + close]);
        }

        if !(first.is_ascii_alphabetic() || first == b'_')
        {
            return None;
        }
        let start = j;
        j += 1;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_')
        {
            j += 1;
        }
        return Some(&line[start..j]);
    }

    None
}

/// Cut a line at the first `#` outside string literals. The cut drops the
/// line terminator too; callers restore it.
fn strip_line_comment(line: &str) -> &str
{
    let mut state = QuoteState::default();
    for (i, &b) in line
        .as_bytes()
        .iter()
        .enumerate()
    {
        if state.step(b) && b == b'#'
        {
            return &line[..i];
        }
    }
    line
}

/// Remove Perl line comments, preserving strings and heredoc bodies.
pub fn strip_comments(text: &str) -> String
{
    let mut out = String::with_capacity(text.len());

    for line in HeredocLines::new(text)
    {
        match line.role
        {
            LineRole::Code { .. } =>
            {
                let kept = strip_line_comment(line.text);
                out.push_str(kept);
                if kept.len() < line
                    .text
                    .len()
                    && line.has_newline()
                {
                    out.push('\n');
                }
            }
            LineRole::Body { .. } | LineRole::Terminator => out.push_str(line.text),
        }
    }

    out
}

/// Blank heredoc bodies (and their terminator lines), preserving line count.
pub fn strip_heredocs(text: &str) -> String
{
    let mut out = String::with_capacity(text.len());

    for line in HeredocLines::new(text)
    {
        match line.role
        {
            LineRole::Code { .. } => out.push_str(line.text),
            LineRole::Body { .. } | LineRole::Terminator =>
            {
                if line.has_newline()
                {
                    out.push('\n');
                }
            }
        }
    }

    out
}

/// Both passes, in order: the text every call-level extractor scans.
pub fn clean(text: &str) -> String
{
    strip_heredocs(&strip_comments(text))
}
