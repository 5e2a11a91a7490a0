//! Widget ↔ evaluator pairing over per-file arenas.
//!
//! Pass 1 follows explicit `named_ans_rule('X')` references. Pass 2 pairs the
//! leftovers by position, but only when the counts match exactly.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::extract::{Evaluator, Widget};

static NAMED_REF_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:named_ans_rule|NAMED_ANS_RULE)\s*\(\s*['"]([^'"]+)['"]"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiringMethod
{
    Named,
    Order,
}

/// Link between `widgets[widget_index]` and `evaluators[evaluator_index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringLink
{
    pub widget_index: usize,
    pub evaluator_index: usize,
    pub method: WiringMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Name referenced through `named_ans_rule('X')` in an evaluator expression.
pub fn named_reference(expr: &str) -> Option<&str>
{
    NAMED_REF_RX
        .captures(expr)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn wire(
    widgets: &[Widget],
    evaluators: &[Evaluator],
) -> Vec<WiringLink>
{
    let mut links = Vec::new();

    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (i, w) in widgets
        .iter()
        .enumerate()
    {
        if let Some(name) = w
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
        {
            by_name
                .entry(name)
                .or_insert(i);
        }
    }

    let mut used_widgets = HashSet::new();
    let mut used_evaluators = HashSet::new();

    for (ei, ev) in evaluators
        .iter()
        .enumerate()
    {
        let Some(name) = named_reference(&ev.expr)
        else
        {
            continue;
        };
        let Some(&wi) = by_name.get(name)
        else
        {
            continue;
        };
        links.push(WiringLink {
            widget_index: wi,
            evaluator_index: ei,
            method: WiringMethod::Named,
            name: Some(name.to_string()),
        });
        used_widgets.insert(wi);
        used_evaluators.insert(ei);
    }

    let remaining_widgets: Vec<usize> = widgets
        .iter()
        .enumerate()
        .filter(|(i, w)| {
            w.kind
                .is_input()
                && !used_widgets.contains(i)
        })
        .map(|(i, _)| i)
        .collect();
    let remaining_evaluators: Vec<usize> = (0..evaluators.len())
        .filter(|i| !used_evaluators.contains(i))
        .collect();

    if !remaining_widgets.is_empty() && remaining_widgets.len() == remaining_evaluators.len()
    {
        links.extend(
            remaining_widgets
                .into_iter()
                .zip(remaining_evaluators)
                .map(|(wi, ei)| WiringLink {
                    widget_index: wi,
                    evaluator_index: ei,
                    method: WiringMethod::Order,
                    name: None,
                }),
        );
    }

    links
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::extract::{EvaluatorSource, WidgetKind, WidgetOrigin};

    fn widget(
        kind: WidgetKind,
        name: Option<&str>,
    ) -> Widget
    {
        Widget {
            kind,
            name: name.map(str::to_string),
            source: "test".into(),
            line: 1,
            origin: WidgetOrigin::Call,
        }
    }

    fn evaluator(expr: &str) -> Evaluator
    {
        Evaluator::from_expr(expr, EvaluatorSource::AnsCall, 1)
    }

    #[test]
    fn equal_counts_pair_by_order()
    {
        let widgets = [widget(WidgetKind::Blank, None), widget(WidgetKind::Blank, None)];
        let evs = [evaluator("$a->cmp()"), evaluator("$b->cmp()")];
        let links = wire(&widgets, &evs);
        assert_eq!(links.len(), 2);
        assert!(
            links
                .iter()
                .all(|l| l.method == WiringMethod::Order)
        );
        assert_eq!((links[1].widget_index, links[1].evaluator_index), (1, 1));
    }

    #[test]
    fn unequal_counts_make_no_guess()
    {
        let widgets = [widget(WidgetKind::Blank, None), widget(WidgetKind::Blank, None)];
        let evs = [evaluator("1"), evaluator("2"), evaluator("3")];
        assert!(wire(&widgets, &evs).is_empty());
        assert!(wire(&[], &[]).is_empty());
    }

    #[test]
    fn named_pass_runs_first_and_uses_first_seen_name()
    {
        let widgets = [
            widget(WidgetKind::Blank, Some("b")),
            widget(WidgetKind::Blank, Some("a")),
            widget(WidgetKind::Blank, Some("a")),
        ];
        let evs = [
            evaluator("num_cmp(1)"),
            evaluator("named_ans_rule('a'), num_cmp(2)"),
            evaluator("num_cmp(3)"),
        ];
        let links = wire(&widgets, &evs);

        assert_eq!(links[0].method, WiringMethod::Named);
        assert_eq!(links[0].widget_index, 1);
        assert_eq!(links[0].evaluator_index, 1);
        assert_eq!(links[0].name.as_deref(), Some("a"));

        // Widgets 0 and 2 remain against evaluators 0 and 2
        let order: Vec<_> = links[1..]
            .iter()
            .map(|l| (l.widget_index, l.evaluator_index, l.method))
            .collect();
        assert_eq!(
            order,
            vec![(0, 0, WiringMethod::Order), (2, 2, WiringMethod::Order)]
        );
    }

    #[test]
    fn non_input_widgets_are_not_order_paired()
    {
        let widgets = [widget(WidgetKind::Other, None)];
        assert!(wire(&widgets, &[evaluator("1")]).is_empty());
    }

    #[test]
    fn unknown_name_is_not_linked()
    {
        let widgets = [widget(WidgetKind::Blank, Some("x"))];
        let evs = [evaluator("NAMED_ANS_RULE(\"y\")")];
        let links = wire(&widgets, &evs);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].method, WiringMethod::Order);
    }
}
