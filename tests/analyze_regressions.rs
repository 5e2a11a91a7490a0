//! End-to-end regressions for the per-file pipeline: canonical question
//! shapes, wiring policy, confidence bounds and determinism.

mod util;

use pg_analyze::core::extract::{EvaluatorKind, EvaluatorSource};
use pg_analyze::core::wiring::WiringMethod;
use pg_analyze::{ReviewBucket, TypeLabel};
use serde_json::json;
use util::{analyze, widget_kinds};

const NUMERIC: &str = "DOCUMENT();\n\
     loadMacros('PGstandard.pl', 'MathObjects.pl');\n\
     $a = Real(3);\n\
     BEGIN_TEXT\n\
     Enter 3: \\{ ans_rule(10) \\}\n\
     END_TEXT\n\
     ANS($a->cmp());\n\
     ENDDOCUMENT();\n";

#[test]
fn numeric_entry_is_wired_by_order()
{
    let rec = analyze(NUMERIC);

    assert!(rec.types.contains(&TypeLabel::NumericEntry));
    assert_eq!(rec.evaluators.len(), 1);
    assert_eq!(rec.evaluators[0].kind, EvaluatorKind::Cmp);
    assert!(rec.evaluators[0].vars.contains("a"));
    assert_eq!(rec.wiring.len(), 1);
    assert_eq!(rec.wiring[0].method, WiringMethod::Order);
    assert_eq!(rec.wiring[0].widget_index, 0);
    assert_eq!(rec.wiring[0].evaluator_index, 0);
}

#[test]
fn numeric_entry_record_shape()
{
    let rec = analyze(NUMERIC);
    let summary = json!({
        "types": rec.types,
        "confidence": rec.confidence,
        "widget_kinds": widget_kinds(&rec),
        "evaluator_kinds": rec.evaluators.iter().map(|e| e.kind.as_str()).collect::<Vec<_>>(),
        "wiring": rec.wiring,
        "needs_review_bucket": rec.needs_review_bucket,
    });

    insta::assert_yaml_snapshot!(summary, @r#"
    confidence: 0.5
    evaluator_kinds:
      - cmp
    needs_review_bucket: low_confidence_misc
    types:
      - numeric_entry
    widget_kinds:
      - blank
    wiring:
      - evaluator_index: 0
        method: order
        widget_index: 0
    "#);
}

#[test]
fn radio_buttons_are_multiple_choice()
{
    let rec = analyze("RadioButtons([\"A\",\"B\"],\"A\"); ANS($rb->cmp());\n");

    assert!(rec.types.contains(&TypeLabel::MultipleChoice));
    assert!(widget_kinds(&rec).contains(&"radio"));
    assert_eq!(rec.evaluators[0].kind, EvaluatorKind::Cmp);
}

#[test]
fn macro_and_widget_together_raise_confidence()
{
    let bare = analyze("$rb = RadioButtons([\"A\",\"B\"],\"A\");\nANS($rb->cmp());\n");
    let corroborated = analyze(
        "loadMacros('parserRadioButtons.pl');\n\
         $rb = RadioButtons([\"A\",\"B\"],\"A\");\n\
         ANS($rb->cmp());\n",
    );

    assert!(corroborated.confidence > bare.confidence);
    for rec in [&bare, &corroborated]
    {
        assert!((0.0..=0.95).contains(&rec.confidence));
    }
}

#[test]
fn equal_counts_wire_by_order()
{
    let rec = analyze(
        "BEGIN_TEXT\n\\{ ans_rule(5) \\} \\{ ans_rule(5) \\}\nEND_TEXT\n\
         ANS(num_cmp(1));\nANS(num_cmp(2));\n",
    );

    assert_eq!(rec.wiring.len(), 2);
    assert!(rec.wiring.iter().all(|l| l.method == WiringMethod::Order));
    assert_eq!(rec.wiring[1].widget_index, 1);
    assert_eq!(rec.wiring[1].evaluator_index, 1);
    assert!(!rec.wiring_empty);
}

#[test]
fn unequal_counts_leave_wiring_empty_and_flag_review()
{
    let rec = analyze(
        "BEGIN_TEXT\n\\{ ans_rule(5) \\} \\{ ans_rule(5) \\}\nEND_TEXT\n\
         ANS(num_cmp(1));\nANS(num_cmp(2));\nANS(num_cmp(3));\n",
    );

    assert!(rec.wiring.is_empty());
    assert!(rec.wiring_empty);
    assert!(rec.needs_review);
    assert_eq!(rec.input_count, 2);
    assert_eq!(rec.ans_count, 3);
    assert_eq!(rec.needs_review_bucket, Some(ReviewBucket::MultipartUnclear));
}

#[test]
fn pgml_blank_alone_is_unknown_with_low_confidence()
{
    let rec = analyze("BEGIN_PGML\n[_]\n END_PGML\n");

    assert_eq!(rec.types.iter().copied().collect::<Vec<_>>(), vec![TypeLabel::UnknownPgmlBlank]);
    assert!(rec.confidence <= 0.30);
    assert_eq!(rec.pgml_blank_marker_count, 1);
    assert_eq!(rec.pgml_block_count, 1);
    assert!(rec.evaluators.is_empty());
}

#[test]
fn pgml_payload_becomes_an_evaluator()
{
    let rec = analyze("BEGIN_PGML\nWhat is 3? [_]{Real(3)->cmp()}\nEND_PGML\n");

    assert_eq!(rec.evaluators.len(), 1);
    assert_eq!(rec.evaluators[0].kind, EvaluatorKind::Cmp);
    assert_eq!(rec.evaluators[0].source, EvaluatorSource::PgmlPayload);
    assert_eq!(rec.evaluators[0].line, 2);
    assert_eq!(rec.evaluator_breakdown.pgml_payload.count, 1);
    assert_eq!(rec.ans_count, 0);
}

#[test]
fn comments_and_heredocs_hide_calls()
{
    let rec = analyze(
        "# ANS(num_cmp(1));\n\
         $s = <<EOT;\n\
         ANS(str_cmp('x'));\n\
         EOT\n\
         $t = 'a # not a comment'; ANS(num_cmp(2));\n",
    );

    assert_eq!(rec.evaluators.len(), 1);
    assert_eq!(rec.evaluators[0].kind, EvaluatorKind::NumCmp);
    assert_eq!(rec.evaluators[0].line, 5);
}

#[test]
fn choice_is_labeled_before_multipart()
{
    let rec = analyze(
        "loadMacros('parserPopUp.pl', 'parserMultiAnswer.pl');\n\
         $p = PopUp(['a','b'], 'a');\n\
         $a = Real(1);\n\
         $m = MultiAnswer($a, Real(2));\n\
         ANS($p->cmp());\nANS($m->cmp());\n",
    );

    let order: Vec<_> = rec.types.iter().copied().collect();
    assert_eq!(
        order,
        vec![
            TypeLabel::MultipleChoice,
            TypeLabel::Multipart,
            TypeLabel::NumericEntry
        ]
    );
    assert!(rec.has_multianswer);
}

#[test]
fn analysis_is_idempotent()
{
    let text = "loadMacros('PGML.pl');\n\
                $f = Formula('x^2');\n\
                BEGIN_PGML\n\
                [_]{$f} and [__]*{$f}\n\
                END_PGML\n\
                ANS(num_cmp(2));\n";

    let first = analyze(text);
    let second = analyze(text);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[test]
fn record_serializes_to_one_flat_line()
{
    let rec = analyze(NUMERIC);
    let line = serde_json::to_string(&rec).expect("serialize");
    assert!(!line.contains('\n'));

    let v: serde_json::Value = serde_json::from_str(&line).expect("json");
    assert_eq!(v["schema_version"], 1);
    assert_eq!(v["has_ans_token"], true);
    assert_eq!(v["has_answer_ctor"], true);
}

#[test]
fn named_rule_reference_wires_by_name()
{
    let rec = analyze(
        "BEGIN_TEXT\n\\{ NAMED_ANS_RULE('p1', 10) \\}\nEND_TEXT\n\
         ANS(named_ans_rule('p1'));\n",
    );

    assert_eq!(rec.named_rule_refs.iter().collect::<Vec<_>>(), vec!["p1"]);
    assert_eq!(rec.widgets[0].name.as_deref(), Some("p1"));
    assert_eq!(rec.evaluators.len(), 1);
    assert_eq!(rec.evaluators[0].kind, EvaluatorKind::NamedRule);

    assert_eq!(rec.wiring.len(), 1);
    assert_eq!(rec.wiring[0].method, WiringMethod::Named);
    assert_eq!(rec.wiring[0].name.as_deref(), Some("p1"));
    assert_eq!(rec.wiring[0].widget_index, 0);
    assert_eq!(rec.wiring[0].evaluator_index, 0);
}
