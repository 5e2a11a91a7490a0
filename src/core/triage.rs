//! Needs-review triage: one actionable bucket per flagged record.

use serde::{Deserialize, Serialize};

use crate::core::classify::{ClassificationLabels, TypeLabel};
use crate::core::extract::{EvaluatorKind, MacroLoads};

/// Below this confidence a record is always flagged.
pub const REVIEW_THRESHOLD: f64 = 0.55;

/// Lower-cased fragments of macro files that imply a widget should exist.
const STRONG_WIDGET_MACROS: [&str; 5] = [
    "parserradiobuttons",
    "parserpopup",
    "parsercheckbox",
    "parsermatching",
    "parserassignment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewBucket
{
    CoverageNoSignals,
    CustomChecker,
    MultipartUnclear,
    MacroOnlyWidgetMissing,
    WidgetNoEvaluator,
    EvaluatorNoWidget,
    LowConfidenceMisc,
}

impl ReviewBucket
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Self::CoverageNoSignals => "coverage_no_signals",
            Self::CustomChecker => "custom_checker",
            Self::MultipartUnclear => "multipart_unclear",
            Self::MacroOnlyWidgetMissing => "macro_only_widget_missing",
            Self::WidgetNoEvaluator => "widget_no_evaluator",
            Self::EvaluatorNoWidget => "evaluator_no_widget",
            Self::LowConfidenceMisc => "low_confidence_misc",
        }
    }
}

/// Counts and kinds the triage rules look at.
#[derive(Debug, Clone, Copy)]
pub struct TriageInput<'a>
{
    pub labels: &'a ClassificationLabels,
    pub macros: &'a MacroLoads,
    pub widget_count: usize,
    pub input_count: usize,
    pub ans_count: usize,
    pub evaluator_kinds: &'a [EvaluatorKind],
    pub wiring_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triage
{
    pub needs_review: bool,
    pub bucket: Option<ReviewBucket>,
}

/// First matching bucket, if any.
pub fn review_bucket(input: &TriageInput<'_>) -> Option<ReviewBucket>
{
    let has_widgets = input.input_count > 0 || input.widget_count > 0;
    let has_evaluators = input.ans_count > 0 || !input.evaluator_kinds.is_empty();

    if !has_widgets && !has_evaluators
    {
        return Some(ReviewBucket::CoverageNoSignals);
    }

    if input
        .evaluator_kinds
        .contains(&EvaluatorKind::Custom)
    {
        return Some(ReviewBucket::CustomChecker);
    }

    let multipart = input
        .labels
        .types
        .contains(&TypeLabel::Multipart);
    if multipart && (input.wiring_empty || !has_evaluators || input.input_count == 0)
    {
        return Some(ReviewBucket::MultipartUnclear);
    }

    let strong_macro = STRONG_WIDGET_MACROS
        .iter()
        .any(|s| {
            input
                .macros
                .any_load_contains(s)
        });
    if strong_macro && !has_widgets
    {
        return Some(ReviewBucket::MacroOnlyWidgetMissing);
    }

    if has_widgets && !has_evaluators
    {
        return Some(ReviewBucket::WidgetNoEvaluator);
    }
    if has_evaluators && !has_widgets
    {
        return Some(ReviewBucket::EvaluatorNoWidget);
    }

    None
}

pub fn triage(input: &TriageInput<'_>) -> Triage
{
    let bucket = review_bucket(input);
    let evaluator_count = input
        .evaluator_kinds
        .len();
    let needs_review = input
        .labels
        .confidence
        < REVIEW_THRESHOLD
        || (evaluator_count >= 2 && input.wiring_empty)
        || bucket.is_some();

    Triage {
        needs_review,
        bucket: match bucket
        {
            None if needs_review => Some(ReviewBucket::LowConfidenceMisc),
            other => other,
        },
    }
}
