//! The per-file `AnalysisRecord` and the lightweight token signals it carries.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::core::classify::{Reason, TypeLabel};
use crate::core::extract::{
    AnswerConstructor, Evaluator, EvaluatorKind, EvaluatorSource, MacroLoads, Widget,
};
use crate::core::regions::{Region, RegionIssue};
use crate::core::triage::ReviewBucket;
use crate::core::wiring::WiringLink;

/// Bumped whenever a field changes meaning or is removed.
pub const SCHEMA_VERSION: u32 = 1;

static ANS_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bANS\s*\(").unwrap());
static CMP_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"->\s*cmp\s*\(").unwrap());
static NUM_CMP_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bnum_cmp\s*\(").unwrap());
static STR_CMP_TOKEN_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:str_cmp|string_cmp)\s*\(").unwrap());
static NAMED_ANS_RULE_TOKEN_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:NAMED_ANS_RULE|named_ans_rule)\s*\(").unwrap());
static NAMED_ANS_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bNAMED_ANS\s*\(").unwrap());
static ANS_NUM_TO_NAME_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bANS_NUM_TO_NAME\s*\(").unwrap());
static INSTALL_GRADER_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\binstall_problem_grader\b").unwrap());
static ANS_RULE_TOKEN_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:ans_rule|answerRule|ans_box)\s*\(").unwrap());
static NAMED_POPUP_LIST_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bNAMED_POP_UP_LIST\s*\(").unwrap());
static MATCHLIST_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bMatchList\s*\(").unwrap());
static CTOR_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Real|Formula|Compute|String|List|Vector|Point)\s*\(").unwrap()
});

/// Asset patterns, sorted by name so set matches come out sorted.
const ASSET_SIGNALS: [(&str, &str); 9] = [
    ("applet_token", r"\bApplet\b"),
    ("geogebra_token", r"(?i)\bGeoGebra\b"),
    ("image_call", r"(?i)\bimage\s*\("),
    ("includegraphics", r"\\includegraphics\b"),
    ("init_graph_call", r"(?i)\binit_graph\s*\("),
    ("javascript_token", r"(?i)\bjavascript\b"),
    ("js_script_tag", r"(?i)<\s*script\b"),
    ("livegraphics_token", r"\bLiveGraphics\b"),
    ("plot_functions_call", r"(?i)\bplot_functions\s*\("),
];

static ASSET_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(
        ASSET_SIGNALS
            .iter()
            .map(|(_, rx)| *rx),
    )
    .unwrap()
});

/// Token-level hints that explain why an evaluator or widget was (not) found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlags
{
    pub has_ans_token: bool,
    pub has_cmp_token: bool,
    pub has_num_cmp_token: bool,
    pub has_str_cmp_token: bool,
    pub has_named_ans_rule_token: bool,
    pub has_named_ans_token: bool,
    pub has_ans_num_to_name: bool,
    pub has_install_problem_grader: bool,
    pub has_ans_rule_token: bool,
    pub has_named_popup_list_token: bool,
    pub has_matchlist_token: bool,
    pub has_answer_ctor: bool,
}

impl SignalFlags
{
    /// Scan cleaned text; `has_answers` reports detected constructor assignments.
    pub fn detect(
        clean: &str,
        has_answers: bool,
    ) -> Self
    {
        Self {
            has_ans_token: ANS_TOKEN_RX.is_match(clean),
            has_cmp_token: CMP_TOKEN_RX.is_match(clean),
            has_num_cmp_token: NUM_CMP_TOKEN_RX.is_match(clean),
            has_str_cmp_token: STR_CMP_TOKEN_RX.is_match(clean),
            has_named_ans_rule_token: NAMED_ANS_RULE_TOKEN_RX.is_match(clean),
            has_named_ans_token: NAMED_ANS_TOKEN_RX.is_match(clean),
            has_ans_num_to_name: ANS_NUM_TO_NAME_RX.is_match(clean),
            has_install_problem_grader: INSTALL_GRADER_RX.is_match(clean),
            has_ans_rule_token: ANS_RULE_TOKEN_RX.is_match(clean),
            has_named_popup_list_token: NAMED_POPUP_LIST_RX.is_match(clean),
            has_matchlist_token: MATCHLIST_TOKEN_RX.is_match(clean),
            has_answer_ctor: has_answers || CTOR_TOKEN_RX.is_match(clean),
        }
    }
}

/// Number of `ANS(` tokens, balanced or not.
pub fn ans_token_count(clean: &str) -> usize
{
    ANS_TOKEN_RX
        .find_iter(clean)
        .count()
}

/// Sorted names of asset patterns present in `clean`.
pub fn asset_signals(clean: &str) -> Vec<String>
{
    ASSET_SET
        .matches(clean)
        .iter()
        .map(|i| ASSET_SIGNALS[i].0.to_string())
        .collect()
}

/// Hex blake3 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String
{
    blake3::hash(bytes)
        .to_hex()
        .to_string()
}

/// Hex blake3 of `bytes` with ASCII space, tab, CR and LF removed.
pub fn content_hash_ws(bytes: &[u8]) -> String
{
    let mut hasher = blake3::Hasher::new();
    for chunk in bytes.split(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
    {
        hasher.update(chunk);
    }
    hasher
        .finalize()
        .to_hex()
        .to_string()
}

/// Count and kinds of the evaluators from one surface syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary
{
    pub count: usize,
    pub kinds: Vec<EvaluatorKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorBreakdown
{
    pub ans_call: SourceSummary,
    pub pgml_payload: SourceSummary,
    pub pgml_star_spec: SourceSummary,
}

impl EvaluatorBreakdown
{
    pub fn from_evaluators(evaluators: &[Evaluator]) -> Self
    {
        let mut out = Self::default();
        for ev in evaluators
        {
            let slot = match ev.source
            {
                EvaluatorSource::AnsCall => &mut out.ans_call,
                EvaluatorSource::PgmlPayload => &mut out.pgml_payload,
                EvaluatorSource::PgmlStarSpec => &mut out.pgml_star_spec,
            };
            slot.count += 1;
            slot.kinds
                .push(ev.kind);
        }
        out
    }
}

/// Everything known about one problem file. Plain data; one JSON line each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord
{
    pub schema_version: u32,
    pub file: String,
    pub content_hash: String,
    pub content_hash_ws: String,

    pub types: IndexSet<TypeLabel>,
    pub subtype_tags: Vec<String>,
    pub confidence: f64,
    pub reasons: Vec<Reason>,

    pub macros: MacroLoads,
    /// Call widgets first, then synthetic PGML blanks
    pub widgets: Vec<Widget>,
    /// `ANS(...)` evaluators first, then PGML ones in document order
    pub evaluators: Vec<Evaluator>,
    pub answers: Vec<AnswerConstructor>,
    pub wiring: Vec<WiringLink>,
    pub regions: Vec<Region>,
    pub region_issues: Vec<RegionIssue>,

    pub input_count: usize,
    pub ans_count: usize,
    pub wiring_empty: bool,
    pub evaluator_breakdown: EvaluatorBreakdown,
    pub has_multianswer: bool,
    pub named_rule_refs: IndexSet<String>,
    pub pgml_block_count: usize,
    pub pgml_blank_marker_count: usize,
    pub ans_token_count: usize,
    pub has_randomization: bool,
    pub resource_exts: Vec<String>,
    pub asset_signals: Vec<String>,
    #[serde(flatten)]
    pub signals: SignalFlags,

    pub needs_review: bool,
    pub needs_review_bucket: Option<ReviewBucket>,
}
