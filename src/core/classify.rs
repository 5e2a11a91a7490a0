//! Multi-label classification as an ordered fold of pure rules.
//!
//! Each rule looks at the file's facts plus the labels assigned so far and
//! either passes or fires with one label and its reasons. Rule order decides
//! label order and confidence bonuses, so `RULES` must not be reordered.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::extract::{
    AnswerConstructor, CtorKind, Evaluator, EvaluatorKind, MacroLoads, Widget, WidgetKind,
    WidgetOrigin,
};

const GRAPH_MACROS: [&str; 2] = ["PGgraphmacros.pl", "PCCgraphMacros.pl"];
const ESSAY_MACRO: &str = "PGessaymacros.pl";
const CHOICE_MACROS: [&str; 4] = [
    "parserRadioButtons.pl",
    "parserPopUp.pl",
    "parserCheckboxList.pl",
    "PGchoicemacros.pl",
];
const MULTIANSWER_MACRO: &str = "parserMultiAnswer.pl";

/// Confidence is accumulated in hundredths so rounding is exact.
const BASE_SCORE: u32 = 20;
const MAX_SCORE: u32 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeLabel
{
    GraphLike,
    Essay,
    MultipleChoice,
    Matching,
    Ordering,
    Multipart,
    FibWord,
    NumericEntry,
    UnknownPgmlBlank,
    Other,
}

impl TypeLabel
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Self::GraphLike => "graph_like",
            Self::Essay => "essay",
            Self::MultipleChoice => "multiple_choice",
            Self::Matching => "matching",
            Self::Ordering => "ordering",
            Self::Multipart => "multipart",
            Self::FibWord => "fib_word",
            Self::NumericEntry => "numeric_entry",
            Self::UnknownPgmlBlank => "unknown_pgml_blank",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind
{
    Macro,
    Widget,
    Evaluator,
    Count,
    Multianswer,
    EvaluatorOrCtor,
    Pgml,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason
{
    pub kind: ReasonKind,
    pub value: String,
}

impl Reason
{
    fn new(
        kind: ReasonKind,
        value: &str,
    ) -> Self
    {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationLabels
{
    /// Detection order, no duplicates
    pub types: IndexSet<TypeLabel>,
    /// In `[0, 0.95]`, two decimals
    pub confidence: f64,
    pub reasons: Vec<Reason>,
}

/// Extracted facts for one file; everything the rules may look at.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a>
{
    pub macros: &'a MacroLoads,
    /// Call widgets followed by synthetic PGML blanks
    pub widgets: &'a [Widget],
    pub evaluators: &'a [Evaluator],
    pub answers: &'a [AnswerConstructor],
    pub wiring_links: usize,
    pub pgml_blank_count: usize,
    pub has_multianswer: bool,
}

impl Facts<'_>
{
    fn has_widget(
        &self,
        kind: WidgetKind,
    ) -> bool
    {
        self.widgets
            .iter()
            .any(|w| w.kind == kind)
    }

    fn has_evaluator(
        &self,
        kind: EvaluatorKind,
    ) -> bool
    {
        self.evaluators
            .iter()
            .any(|e| e.kind == kind)
    }

    fn has_ctor(
        &self,
        ctor: CtorKind,
    ) -> bool
    {
        self.answers
            .iter()
            .any(|a| a.ctor == ctor)
    }

    /// Input-kind widgets, synthetic blanks included.
    pub fn input_count(&self) -> usize
    {
        self.widgets
            .iter()
            .filter(|w| {
                w.kind
                    .is_input()
            })
            .count()
    }

    pub fn evaluator_count(&self) -> usize
    {
        self.evaluators
            .len()
    }

    fn call_widget_count(&self) -> usize
    {
        self.widgets
            .iter()
            .filter(|w| w.origin == WidgetOrigin::Call)
            .count()
    }
}

/// Labels assigned so far.
#[derive(Debug, Clone, Default)]
struct Accumulator
{
    types: IndexSet<TypeLabel>,
    reasons: Vec<Reason>,
}

impl Accumulator
{
    fn apply(
        mut self,
        verdict: Verdict,
    ) -> Self
    {
        if let Verdict::Fire { label, reasons } = verdict
        {
            self.types
                .insert(label);
            self.reasons
                .extend(reasons);
        }
        self
    }
}

enum Verdict
{
    Pass,
    Fire
    {
        label: TypeLabel,
        reasons: Vec<Reason>,
    },
}

type Rule = fn(&Facts<'_>, &Accumulator) -> Verdict;

/// Evaluation order is part of the output contract.
const RULES: [(&str, Rule); 11] = [
    ("graph_macros", rule_graph),
    ("essay_macro", rule_essay),
    ("choice", rule_choice),
    ("matching_widget", rule_matching),
    ("ordering_widget", rule_ordering),
    ("multipart_count", rule_multipart_count),
    ("multianswer", rule_multianswer),
    ("string_answer", rule_fib_word),
    ("numeric_answer", rule_numeric),
    ("pgml_blank_only", rule_unknown_pgml_blank),
    ("fallback", rule_other),
];

fn fire(
    label: TypeLabel,
    reasons: Vec<Reason>,
) -> Verdict
{
    Verdict::Fire { label, reasons }
}

fn macro_reasons(
    facts: &Facts<'_>,
    names: &[&str],
) -> Vec<Reason>
{
    names
        .iter()
        .filter(|m| {
            facts
                .macros
                .loads(m)
        })
        .map(|m| Reason::new(ReasonKind::Macro, m))
        .collect()
}

fn rule_graph(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    let reasons = macro_reasons(facts, &GRAPH_MACROS);
    if reasons.is_empty()
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::GraphLike, reasons)
}

fn rule_essay(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    if !facts
        .macros
        .loads(ESSAY_MACRO)
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::Essay, vec![Reason::new(ReasonKind::Macro, ESSAY_MACRO)])
}

fn rule_choice(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    let mut reasons = macro_reasons(facts, &CHOICE_MACROS);
    for kind in [WidgetKind::Radio, WidgetKind::Popup, WidgetKind::Checkbox]
    {
        if facts.has_widget(kind)
        {
            reasons.push(Reason::new(ReasonKind::Widget, kind.as_str()));
        }
    }
    for kind in [
        EvaluatorKind::RadioCmp,
        EvaluatorKind::CheckboxCmp,
        EvaluatorKind::PopupCmp,
    ]
    {
        if facts.has_evaluator(kind)
        {
            reasons.push(Reason::new(ReasonKind::Evaluator, kind.as_str()));
        }
    }

    if reasons.is_empty()
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::MultipleChoice, reasons)
}

fn rule_matching(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    if !facts.has_widget(WidgetKind::Matching)
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::Matching, vec![Reason::new(ReasonKind::Widget, "matching")])
}

fn rule_ordering(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    if !facts.has_widget(WidgetKind::Ordering)
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::Ordering, vec![Reason::new(ReasonKind::Widget, "ordering")])
}

fn rule_multipart_count(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    if facts.input_count() < 2 && facts.evaluator_count() < 2
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::Multipart, vec![Reason::new(ReasonKind::Count, "multipart")])
}

fn rule_multianswer(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    let mut reasons = macro_reasons(facts, &[MULTIANSWER_MACRO]);
    if facts.has_multianswer
    {
        reasons.push(Reason::new(ReasonKind::Multianswer, "MultiAnswer"));
    }
    if reasons.is_empty()
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::Multipart, reasons)
}

fn rule_fib_word(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    if !(facts.has_evaluator(EvaluatorKind::StrCmp) || facts.has_ctor(CtorKind::String))
    {
        return Verdict::Pass;
    }
    fire(
        TypeLabel::FibWord,
        vec![Reason::new(ReasonKind::EvaluatorOrCtor, "string")],
    )
}

fn rule_numeric(
    facts: &Facts<'_>,
    _: &Accumulator,
) -> Verdict
{
    let numeric = facts.has_evaluator(EvaluatorKind::NumCmp)
        || facts.has_evaluator(EvaluatorKind::FormulaCmp)
        || [CtorKind::Real, CtorKind::Formula, CtorKind::Compute]
            .into_iter()
            .any(|c| facts.has_ctor(c));
    if !numeric
    {
        return Verdict::Pass;
    }
    fire(
        TypeLabel::NumericEntry,
        vec![Reason::new(ReasonKind::EvaluatorOrCtor, "numeric")],
    )
}

fn rule_unknown_pgml_blank(
    facts: &Facts<'_>,
    acc: &Accumulator,
) -> Verdict
{
    let blank_only = acc
        .types
        .is_empty()
        && facts.pgml_blank_count > 0
        && facts.call_widget_count() == 0
        && facts.evaluator_count() == 0;
    if !blank_only
    {
        return Verdict::Pass;
    }
    fire(
        TypeLabel::UnknownPgmlBlank,
        vec![Reason::new(ReasonKind::Pgml, "blank_markers")],
    )
}

fn rule_other(
    _: &Facts<'_>,
    acc: &Accumulator,
) -> Verdict
{
    if !acc
        .types
        .is_empty()
    {
        return Verdict::Pass;
    }
    fire(TypeLabel::Other, vec![Reason::new(ReasonKind::Other, "no_signals")])
}

/// Score in hundredths, clamped to `MAX_SCORE`.
fn score(
    facts: &Facts<'_>,
    acc: &Accumulator,
) -> u32
{
    let has_reason = |kind: ReasonKind| {
        acc.reasons
            .iter()
            .any(|r| r.kind == kind)
    };

    let mut score = BASE_SCORE;
    if has_reason(ReasonKind::Macro) && has_reason(ReasonKind::Widget)
    {
        score += 40;
    }
    if has_reason(ReasonKind::EvaluatorOrCtor)
    {
        score += 20;
    }
    if facts.wiring_links > 0
    {
        score += 10;
    }
    if facts.pgml_blank_count >= 1
    {
        score += 5;
    }
    if acc
        .types
        .len()
        >= 2
        && !acc
            .types
            .contains(&TypeLabel::Other)
    {
        score += 5;
    }

    score.min(MAX_SCORE)
}

pub fn classify(facts: &Facts<'_>) -> ClassificationLabels
{
    let acc = RULES
        .iter()
        .fold(Accumulator::default(), |acc, (name, rule)| {
            let verdict = rule(facts, &acc);
            if let Verdict::Fire { label, .. } = &verdict
            {
                trace!(rule = *name, label = label.as_str(), "rule fired");
            }
            acc.apply(verdict)
        });

    let confidence = f64::from(score(facts, &acc)) / 100.0;
    ClassificationLabels {
        types: acc.types,
        confidence,
        reasons: acc.reasons,
    }
}
