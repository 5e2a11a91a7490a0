//! Answer-object constructors (`$var = Real(...)` and friends).

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::calls::find_balanced;
use crate::core::extract::evaluators::normalize_ws;
use crate::infra::line_index::NewlineIndex;

static ASSIGN_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_]\w*)\s*=\s*(Real|Formula|Compute|String|List|Vector|Point)\s*\(").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CtorKind
{
    Real,
    Formula,
    Compute,
    String,
    List,
    Vector,
    Point,
}

impl CtorKind
{
    fn parse(name: &str) -> Option<Self>
    {
        Some(match name
        {
            "Real" => Self::Real,
            "Formula" => Self::Formula,
            "Compute" => Self::Compute,
            "String" => Self::String,
            "List" => Self::List,
            "Vector" => Self::Vector,
            "Point" => Self::Point,
            _ => return None,
        })
    }

    /// Graded numerically when used through an indirect star spec.
    pub fn is_numeric(self) -> bool
    {
        !matches!(self, Self::String)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerConstructor
{
    pub var: String,
    pub ctor: CtorKind,
    /// `Ctor(...)`, whitespace-normalized
    pub expr: String,
    pub line: usize,
}

/// `var -> ctor`; a later assignment replaces an earlier one.
pub type SymbolTable = IndexMap<String, CtorKind>;

/// Constructor assignments in document order. Unbalanced ones are dropped.
pub fn extract_answers(
    clean: &str,
    index: &NewlineIndex,
) -> Vec<AnswerConstructor>
{
    let mut out = Vec::new();

    for caps in ASSIGN_RX.captures_iter(clean)
    {
        let (Some(whole), Some(var), Some(ctor)) = (caps.get(0), caps.get(1), caps.get(2))
        else
        {
            continue;
        };
        let Some(kind) = CtorKind::parse(ctor.as_str())
        else
        {
            continue;
        };
        // The match ends on the opening paren
        let Some(close) = find_balanced(clean, whole.end() - 1, b'(', b')')
        else
        {
            continue;
        };

        out.push(AnswerConstructor {
            var: var
                .as_str()
                .to_string(),
            ctor: kind,
            expr: normalize_ws(&clean[ctor.start()..=close]),
            line: index.line_of(ctor.start()),
        });
    }

    out
}

pub fn build_symbol_table(answers: &[AnswerConstructor]) -> SymbolTable
{
    let mut table = SymbolTable::new();
    for a in answers
    {
        table.insert(a.var.clone(), a.ctor);
    }
    table
}
