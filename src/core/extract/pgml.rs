//! PGML blank markers and their answer specs.
//!
//! Works on the raw text, restricted to answer-bearing regions. Each blank
//! outside `[@ ... @]` inline code yields one synthetic `blank` widget; a
//! trailing `{...}` payload or `*{...}` star spec yields one evaluator.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::calls::extract_braced_payload;
use crate::core::extract::answers::SymbolTable;
use crate::core::extract::evaluators::{
    Evaluator, EvaluatorKind, EvaluatorSource, classify_expression, extract_vars, normalize_ws,
};
use crate::core::extract::widgets::{Widget, WidgetKind, WidgetOrigin};
use crate::core::regions::{Region, RegionKind};
use crate::infra::line_index::NewlineIndex;

static BLANK_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[ \t]*_+[ \t]*\]").unwrap());

static SIMPLE_VAR_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([A-Za-z_]\w*)$").unwrap());

static MATRICES_HELP_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bAnswerFormatHelp\s*\(\s*['"]matrices['"]\s*\)"#).unwrap()
});

/// Everything found in the answer-bearing PGML regions of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgmlScan
{
    /// One synthetic blank widget per marker, document order
    pub blanks: Vec<Widget>,
    /// Payload and star-spec evaluators, document order
    pub evaluators: Vec<Evaluator>,
    pub block_count: usize,
}

impl PgmlScan
{
    pub fn blank_count(&self) -> usize
    {
        self.blanks
            .len()
    }
}

/// `[start, end)` spans of `[@ ... @]` inline code within `body`.
/// An unclosed span runs to the end of the body.
fn inline_code_spans(body: &str) -> Vec<(usize, usize)>
{
    let mut spans = Vec::new();
    let mut pos = 0usize;

    while let Some(open) = body[pos..].find("[@")
    {
        let start = pos + open;
        let search_from = start + 2;
        match body[search_from..].find("@]")
        {
            Some(close) =>
            {
                let end = search_from + close + 2;
                spans.push((start, end));
                pos = end;
            }
            None =>
            {
                spans.push((start, body.len()));
                break;
            }
        }
    }

    spans
}

/// Kind of a star spec after resolving a bare `$var` against `symbols`.
pub fn resolve_star_spec(
    expr: &str,
    symbols: &SymbolTable,
) -> EvaluatorKind
{
    if let Some(var) = SIMPLE_VAR_RX
        .captures(expr)
        .and_then(|caps| caps.get(1))
    {
        return match symbols.get(var.as_str())
        {
            Some(ctor) if ctor.is_numeric() => EvaluatorKind::StarSpecIndirectNumeric,
            Some(_) => EvaluatorKind::StarSpecIndirectString,
            None => EvaluatorKind::StarSpecIndirect,
        };
    }
    if expr.contains('$')
    {
        return EvaluatorKind::StarSpecExpr;
    }
    classify_expression(expr)
}

/// Evaluator attached to the blank ending at `after`, if any.
fn answer_spec(
    body: &str,
    after: usize,
    line: usize,
    symbols: &SymbolTable,
) -> Option<Evaluator>
{
    let bytes = body.as_bytes();
    let mut i = after;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t')
    {
        i += 1;
    }

    match bytes.get(i)
    {
        Some(b'{') =>
        {
            let (payload, _) = extract_braced_payload(body, i)?;
            Some(Evaluator::from_expr(payload, EvaluatorSource::PgmlPayload, line))
        }
        Some(b'*') if bytes.get(i + 1) == Some(&b'{') =>
        {
            let (payload, _) = extract_braced_payload(body, i + 1)?;
            let expr = normalize_ws(payload);
            Some(Evaluator {
                kind: resolve_star_spec(&expr, symbols),
                vars: extract_vars(&expr),
                expr,
                source: EvaluatorSource::PgmlStarSpec,
                line,
            })
        }
        _ => None,
    }
}

/// Scan answer-bearing `regions` of `raw` for blanks and their specs.
pub fn scan_pgml(
    raw: &str,
    regions: &[Region],
    index: &NewlineIndex,
    symbols: &SymbolTable,
) -> PgmlScan
{
    let mut scan = PgmlScan::default();

    for region in regions
        .iter()
        .filter(|r| {
            r.kind
                .is_answer_bearing()
        })
    {
        scan.block_count += 1;
        let body = &raw[region.start..region.end];
        let code_spans = inline_code_spans(body);

        for m in BLANK_RX.find_iter(body)
        {
            if code_spans
                .iter()
                .any(|&(s, e)| m.start() >= s && m.start() < e)
            {
                continue;
            }

            let line = index.line_of(region.start + m.start());
            scan.blanks
                .push(Widget {
                    kind: WidgetKind::Blank,
                    name: None,
                    source: m
                        .as_str()
                        .to_string(),
                    line,
                    origin: WidgetOrigin::PgmlBlank,
                });

            if let Some(ev) = answer_spec(body, m.end(), line, symbols)
            {
                scan.evaluators
                    .push(ev);
            }
        }
    }

    scan
}

/// Subtype tags derived from `BEGIN_PGML` blocks.
pub fn subtype_tags(
    raw: &str,
    regions: &[Region],
) -> Vec<String>
{
    let mut tags = Vec::new();
    let has_matrices_help = regions
        .iter()
        .filter(|r| r.kind == RegionKind::Pgml)
        .any(|r| MATRICES_HELP_RX.is_match(&raw[r.start..r.end]));
    if has_matrices_help
    {
        tags.push("matrix_entry".to_string());
    }
    tags
}
