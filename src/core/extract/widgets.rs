//! Input widgets built by calls, normalized to a canonical kind.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::calls::{Call, CallScanner};
use crate::infra::line_index::NewlineIndex;

static QUOTED_NAME_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

static ASSIGNED_NAME_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_]\w*)\s*=\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind
{
    Blank,
    Radio,
    Popup,
    Checkbox,
    Matching,
    Ordering,
    Other,
}

impl WidgetKind
{
    /// Kinds that produce a student input (everything but `Other`).
    pub fn is_input(self) -> bool
    {
        !matches!(self, Self::Other)
    }

    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Self::Blank => "blank",
            Self::Radio => "radio",
            Self::Popup => "popup",
            Self::Checkbox => "checkbox",
            Self::Matching => "matching",
            Self::Ordering => "ordering",
            Self::Other => "other",
        }
    }

    /// Canonical kind for a widget-constructing call name.
    pub fn from_call(name: &str) -> Self
    {
        WIDGET_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map_or(Self::Other, |(_, kind)| *kind)
    }
}

/// Where a widget was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetOrigin
{
    Call,
    PgmlBlank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget
{
    pub kind: WidgetKind,
    pub name: Option<String>,
    /// Call name, or the blank marker text for PGML blanks
    pub source: String,
    pub line: usize,
    pub origin: WidgetOrigin,
}

/// Historical aliases of every widget constructor.
const WIDGET_ALIASES: &[(&str, WidgetKind)] = &[
    ("ans_rule", WidgetKind::Blank),
    ("ans_box", WidgetKind::Blank),
    ("ans_array", WidgetKind::Blank),
    ("answerRule", WidgetKind::Blank),
    ("NAMED_ANS_RULE", WidgetKind::Blank),
    ("named_ans_rule", WidgetKind::Blank),
    ("RadioButtons", WidgetKind::Radio),
    ("parserRadioButtons", WidgetKind::Radio),
    ("new_multiple_choice", WidgetKind::Radio),
    ("PopUp", WidgetKind::Popup),
    ("parserPopUp", WidgetKind::Popup),
    ("new_select_list", WidgetKind::Popup),
    ("new_pop_up_select_list", WidgetKind::Popup),
    ("pop_up_list", WidgetKind::Popup),
    ("CheckboxList", WidgetKind::Checkbox),
    ("parserCheckboxList", WidgetKind::Checkbox),
    ("new_checkbox_multiple_choice", WidgetKind::Checkbox),
    ("Match", WidgetKind::Matching),
    ("match_list", WidgetKind::Matching),
    ("matching", WidgetKind::Matching),
    ("new_match_list", WidgetKind::Matching),
    ("Sort", WidgetKind::Ordering),
    ("sortable", WidgetKind::Ordering),
    ("draggableProof", WidgetKind::Ordering),
    ("parserAssignment", WidgetKind::Ordering),
];

static WIDGET_CALL_NAMES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    WIDGET_ALIASES
        .iter()
        .map(|(alias, _)| *alias)
        .collect()
});

fn is_named_rule(name: &str) -> bool
{
    name == "NAMED_ANS_RULE" || name == "named_ans_rule"
}

/// Quoted literal for named rules, else `$var =` just before the call on the
/// same line.
fn resolve_name(
    clean: &str,
    call: &Call<'_>,
) -> Option<String>
{
    if is_named_rule(call.name)
    {
        if let Some(caps) = QUOTED_NAME_RX.captures(call.arg_text)
        {
            return caps
                .get(1)
                .map(|m| {
                    m.as_str()
                        .to_string()
                });
        }
    }

    let line_start = clean[..call.start]
        .rfind('\n')
        .map_or(0, |i| i + 1);
    let prefix = &clean[line_start..call.start];
    ASSIGNED_NAME_RX
        .captures(prefix)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .to_string()
        })
}

/// Widgets constructed by calls in `clean`, in document order.
pub fn extract_widgets(
    scanner: &CallScanner,
    clean: &str,
    index: &NewlineIndex,
) -> Vec<Widget>
{
    scanner
        .iter_calls(clean, &WIDGET_CALL_NAMES, index)
        .into_iter()
        .map(|call| Widget {
            kind: WidgetKind::from_call(call.name),
            name: resolve_name(clean, &call),
            source: call
                .name
                .to_string(),
            line: call.line,
            origin: WidgetOrigin::Call,
        })
        .collect()
}
