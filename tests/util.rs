//! Shared test utilities for integration tests
//!
//! Provides common fixture creation and helper functions
//! used across multiple test files.

#![allow(dead_code)]

use std::path::Path;

use assert_fs::prelude::*;
use pg_analyze::{AnalysisRecord, Analyzer};

/// Run the full pipeline over an in-memory problem.
pub fn analyze(text: &str) -> AnalysisRecord
{
    Analyzer::new().analyze_bytes(Path::new("fixture.pg"), text.as_bytes())
}

/// Kinds of all widgets, in arena order, as their wire names.
pub fn widget_kinds(rec: &AnalysisRecord) -> Vec<&'static str>
{
    rec.widgets
        .iter()
        .map(|w| w.kind.as_str())
        .collect()
}

/// A small problem library: one file per common question shape, plus
/// a non-problem file and an ignored directory the walker must skip.
pub fn make_library() -> assert_fs::TempDir
{
    // Initialize the temporary library root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("Algebra/linear.pg")
        .write_str(
            "DOCUMENT();\n\
             loadMacros('PGstandard.pl', 'MathObjects.pl');\n\
             $a = Real(3);\n\
             BEGIN_TEXT\n\
             Enter 3: \\{ ans_rule(10) \\}\n\
             END_TEXT\n\
             ANS($a->cmp());\n\
             ENDDOCUMENT();\n",
        )
        .expect("write linear.pg");

    tmp.child("Choice/radio.pg")
        .write_str(
            "loadMacros('parserRadioButtons.pl');\n\
             $rb = RadioButtons([\"A\", \"B\"], \"A\");\n\
             BEGIN_TEXT\n\
             \\{ $rb->buttons() \\}\n\
             END_TEXT\n\
             ANS($rb->cmp());\n",
        )
        .expect("write radio.pg");

    tmp.child("Pgml/blank_only.pg")
        .write_str("BEGIN_PGML\n[_]\nEND_PGML\n")
        .expect("write blank_only.pg");

    tmp.child("README.md")
        .write_str("# Library\n\nNot a problem file.\n")
        .expect("write readme");

    tmp.child("node_modules/vendor.pg")
        .write_str("ANS(num_cmp(1));\n")
        .expect("write vendor.pg");

    // Return the prepared directory to the caller
    tmp
}
