//! PGML region location.
//!
//! Regions come from two sources, both computed on the raw (unstripped) text:
//! - `BEGIN_*`/`END_*` marker lines matched with a stack;
//! - heredocs whose terminator mentions `PGML` or whose introducer line calls
//!   into `PGML::`.
//!
//! Mismatched markers are reported as `RegionIssue`s and never paired, so two
//! regions of the same kind can not overlap.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::lexer::{HeredocLines, LineRole};

static BLOCK_MARKER_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(BEGIN|END)_(PGML(?:_SOLUTION|_HINT)?|TEXT|SOLUTION|HINT)\b").unwrap()
});

static PGML_CALL_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bPGML::").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionKind
{
    Pgml,
    PgmlHint,
    PgmlSolution,
    HeredocPgml,
}

impl RegionKind
{
    fn from_tag(tag: &str) -> Option<Self>
    {
        match tag
        {
            "PGML" => Some(Self::Pgml),
            "PGML_HINT" => Some(Self::PgmlHint),
            "PGML_SOLUTION" => Some(Self::PgmlSolution),
            _ => None,
        }
    }

    /// Regions whose blanks are student inputs (hints and solutions are not).
    pub fn is_answer_bearing(self) -> bool
    {
        matches!(self, Self::Pgml | Self::HeredocPgml)
    }
}

/// Span of embedded PGML text; `start..end` is the block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region
{
    pub start: usize,
    pub end: usize,
    pub kind: RegionKind,
    /// 1-based line of the opening marker (or first body line for heredocs)
    pub line: usize,
}

/// Structural problems found while pairing markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RegionIssue
{
    #[error("line {line}: END_{tag} without matching BEGIN")]
    UnmatchedEnd
    {
        tag: String, line: usize
    },

    #[error("line {line}: END_{tag} does not match BEGIN_{open}")]
    MismatchedEnd
    {
        tag: String,
        open: String,
        line: usize,
    },

    #[error("line {line}: BEGIN_{tag} nested inside an open BEGIN_{tag}")]
    NestedBegin
    {
        tag: String, line: usize
    },

    #[error("line {line}: BEGIN_{tag} without matching END")]
    UnterminatedBegin
    {
        tag: String, line: usize
    },

    #[error("line {line}: PGML heredoc terminator '{terminator}' not found")]
    UnterminatedHeredoc
    {
        terminator: String, line: usize
    },
}

/// Regions sorted by start offset plus any pairing issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionScan
{
    pub regions: Vec<Region>,
    pub issues: Vec<RegionIssue>,
}

impl RegionScan
{
    /// Regions whose blanks count as inputs.
    pub fn answer_bearing(&self) -> impl Iterator<Item = &Region>
    {
        self.regions
            .iter()
            .filter(|r| {
                r.kind
                    .is_answer_bearing()
            })
    }
}

struct OpenMarker<'a>
{
    tag: &'a str,
    start: usize,
    line: usize,
}

struct OpenHeredoc<'a>
{
    terminator: &'a str,
    body_start: usize,
    body_line: usize,
    is_pgml: bool,
}

/// Locate all PGML regions in `text`.
pub fn scan_regions(text: &str) -> RegionScan
{
    let mut scan = RegionScan::default();
    let mut stack: Vec<OpenMarker<'_>> = Vec::new();
    let mut heredoc: Option<OpenHeredoc<'_>> = None;

    for line in HeredocLines::new(text)
    {
        match line.role
        {
            LineRole::Code { opens: Some(terminator) } =>
            {
                heredoc = Some(OpenHeredoc {
                    terminator,
                    body_start: line.offset
                        + line
                            .text
                            .len(),
                    body_line: line.number + 1,
                    is_pgml: terminator.contains("PGML") || PGML_CALL_RX.is_match(line.text),
                });
            }
            LineRole::Terminator =>
            {
                if let Some(open) = heredoc.take()
                {
                    if open.is_pgml && open.body_start < line.offset
                    {
                        scan.regions
                            .push(Region {
                                start: open.body_start,
                                end: line.offset,
                                kind: RegionKind::HeredocPgml,
                                line: open.body_line,
                            });
                    }
                }
            }
            LineRole::Body { .. } =>
            {}
            LineRole::Code { opens: None } =>
            {
                if let Some(caps) = BLOCK_MARKER_RX.captures(line.text)
                {
                    let action = caps
                        .get(1)
                        .map_or("", |m| m.as_str());
                    let tag = caps
                        .get(2)
                        .map_or("", |m| m.as_str());
                    pair_marker(&mut scan, &mut stack, action, tag, line.offset, line.text.len(), line.number);
                }
            }
        }
    }

    for open in stack
    {
        scan.issues
            .push(RegionIssue::UnterminatedBegin {
                tag: open
                    .tag
                    .to_string(),
                line: open.line,
            });
    }

    if let Some(open) = heredoc
    {
        if open.is_pgml
        {
            scan.issues
                .push(RegionIssue::UnterminatedHeredoc {
                    terminator: open
                        .terminator
                        .to_string(),
                    line: open.body_line - 1,
                });
        }
    }

    scan.regions
        .sort_by_key(|r| (r.start, r.end));
    debug!(
        regions = scan.regions.len(),
        issues = scan.issues.len(),
        "scanned PGML regions"
    );
    scan
}

fn pair_marker<'a>(
    scan: &mut RegionScan,
    stack: &mut Vec<OpenMarker<'a>>,
    action: &str,
    tag: &'a str,
    offset: usize,
    line_len: usize,
    line_no: usize,
)
{
    if action == "BEGIN"
    {
        if stack
            .iter()
            .any(|open| open.tag == tag)
        {
            scan.issues
                .push(RegionIssue::NestedBegin {
                    tag: tag.to_string(),
                    line: line_no,
                });
            return;
        }
        stack.push(OpenMarker {
            tag,
            start: offset + line_len,
            line: line_no,
        });
        return;
    }

    let Some(top) = stack.last()
    else
    {
        scan.issues
            .push(RegionIssue::UnmatchedEnd {
                tag: tag.to_string(),
                line: line_no,
            });
        return;
    };

    if top.tag != tag
    {
        scan.issues
            .push(RegionIssue::MismatchedEnd {
                tag: tag.to_string(),
                open: top
                    .tag
                    .to_string(),
                line: line_no,
            });
        return;
    }

    let Some(open) = stack.pop()
    else
    {
        return;
    };
    if let Some(kind) = RegionKind::from_tag(tag)
    {
        if open.start < offset
        {
            scan.regions
                .push(Region {
                    start: open.start,
                    end: offset,
                    kind,
                    line: open.line,
                });
        }
    }
}
