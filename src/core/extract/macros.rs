//! Macro library loads: `loadMacros(...)` and `includePGproblem(...)`.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::calls::CallScanner;
use crate::infra::line_index::NewlineIndex;

static FILENAME_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]+\.(?:pl|pg))['"]"#).unwrap());

const MACRO_CALL_NAMES: &[&str] = &["loadMacros", "includePGproblem"];

/// Quoted file arguments, first-seen order, deduplicated per call name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroLoads
{
    #[serde(rename = "loadMacros")]
    pub load_macros: IndexSet<String>,
    #[serde(rename = "includePGproblem")]
    pub include_pg_problem: IndexSet<String>,
}

impl MacroLoads
{
    pub fn loads(
        &self,
        file: &str,
    ) -> bool
    {
        self.load_macros
            .contains(file)
    }

    /// Case-insensitive substring test over loaded macro files.
    pub fn any_load_contains(
        &self,
        needle_lower: &str,
    ) -> bool
    {
        self.load_macros
            .iter()
            .any(|m| {
                m.to_ascii_lowercase()
                    .contains(needle_lower)
            })
    }
}

pub fn extract_macros(
    scanner: &CallScanner,
    clean: &str,
    index: &NewlineIndex,
) -> MacroLoads
{
    let mut loads = MacroLoads::default();

    for call in scanner.iter_calls(clean, MACRO_CALL_NAMES, index)
    {
        let target = match call.name
        {
            "loadMacros" => &mut loads.load_macros,
            _ => &mut loads.include_pg_problem,
        };
        for caps in FILENAME_RX.captures_iter(call.arg_text)
        {
            if let Some(m) = caps.get(1)
            {
                target.insert(
                    m.as_str()
                        .to_string(),
                );
            }
        }
    }

    loads
}
