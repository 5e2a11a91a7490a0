//! Grading evaluators: call-style `ANS(...)` and expression classification
//! shared with PGML answer specs.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::core::calls::CallScanner;
use crate::infra::line_index::NewlineIndex;

static VAR_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$([A-Za-z_]\w*)").unwrap());

/// Kind patterns in priority order; index `i` maps to `PRIORITY[i]`.
static KIND_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"->\s*cmp\s*\(",
        r"\bnum_cmp\s*\(",
        r"\b(?:str_cmp|string_cmp)\s*\(",
        r"\bradio_cmp\s*\(",
        r"\bcheckbox_cmp\s*\(",
        r"\bpopup_cmp\s*\(",
        r"\bformula_cmp\s*\(",
        r"\bfun_cmp\s*\(",
        r"\b(?:named_ans_rule|NAMED_ANS_RULE)\s*\(",
        r"\bchecker\s*=>\s*sub\s*\{",
    ])
    .unwrap()
});

const PRIORITY: [EvaluatorKind; 10] = [
    EvaluatorKind::Cmp,
    EvaluatorKind::NumCmp,
    EvaluatorKind::StrCmp,
    EvaluatorKind::RadioCmp,
    EvaluatorKind::CheckboxCmp,
    EvaluatorKind::PopupCmp,
    EvaluatorKind::FormulaCmp,
    EvaluatorKind::FunCmp,
    EvaluatorKind::NamedRule,
    EvaluatorKind::Custom,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind
{
    Cmp,
    NumCmp,
    StrCmp,
    FormulaCmp,
    FunCmp,
    RadioCmp,
    CheckboxCmp,
    PopupCmp,
    NamedRule,
    Custom,
    StarSpecIndirect,
    StarSpecIndirectNumeric,
    StarSpecIndirectString,
    StarSpecExpr,
    Other,
}

impl EvaluatorKind
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Self::Cmp => "cmp",
            Self::NumCmp => "num_cmp",
            Self::StrCmp => "str_cmp",
            Self::FormulaCmp => "formula_cmp",
            Self::FunCmp => "fun_cmp",
            Self::RadioCmp => "radio_cmp",
            Self::CheckboxCmp => "checkbox_cmp",
            Self::PopupCmp => "popup_cmp",
            Self::NamedRule => "named_rule",
            Self::Custom => "custom",
            Self::StarSpecIndirect => "star_spec_indirect",
            Self::StarSpecIndirectNumeric => "star_spec_indirect_numeric",
            Self::StarSpecIndirectString => "star_spec_indirect_string",
            Self::StarSpecExpr => "star_spec_expr",
            Self::Other => "other",
        }
    }
}

/// Surface syntax an evaluator was detected in. Exactly one per evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorSource
{
    AnsCall,
    PgmlPayload,
    PgmlStarSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluator
{
    pub kind: EvaluatorKind,
    pub expr: String,
    /// Referenced `$variables`, first-seen order
    pub vars: IndexSet<String>,
    pub source: EvaluatorSource,
    pub line: usize,
}

impl Evaluator
{
    /// Build from raw expression text; classification runs on the
    /// normalized form.
    pub fn from_expr(
        raw: &str,
        source: EvaluatorSource,
        line: usize,
    ) -> Self
    {
        let expr = normalize_ws(raw);
        Self {
            kind: classify_expression(&expr),
            vars: extract_vars(&expr),
            expr,
            source,
            line,
        }
    }
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn normalize_ws(text: &str) -> String
{
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn extract_vars(expr: &str) -> IndexSet<String>
{
    VAR_RX
        .captures_iter(expr)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .to_string()
        })
        .collect()
}

/// First matching kind in priority order, `Other` when nothing matches.
pub fn classify_expression(expr: &str) -> EvaluatorKind
{
    KIND_SET
        .matches(expr)
        .iter()
        .next()
        .map_or(EvaluatorKind::Other, |i| PRIORITY[i])
}

/// `ANS(...)` evaluators in document order.
pub fn extract_ans_evaluators(
    scanner: &CallScanner,
    clean: &str,
    index: &NewlineIndex,
) -> Vec<Evaluator>
{
    scanner
        .iter_calls(clean, &["ANS"], index)
        .into_iter()
        .map(|call| Evaluator::from_expr(call.arg_text, EvaluatorSource::AnsCall, call.line))
        .collect()
}
