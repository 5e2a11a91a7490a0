//! Semantic extractors. Call-level extractors scan the cleaned text; the PGML
//! extractor scans raw text inside located regions.

pub mod answers;
pub mod evaluators;
pub mod macros;
pub mod pgml;
pub mod widgets;

pub use answers::{AnswerConstructor, CtorKind, SymbolTable, build_symbol_table, extract_answers};
pub use evaluators::{
    Evaluator, EvaluatorKind, EvaluatorSource, classify_expression, extract_ans_evaluators,
};
pub use macros::{MacroLoads, extract_macros};
pub use pgml::{PgmlScan, scan_pgml, subtype_tags};
pub use widgets::{Widget, WidgetKind, WidgetOrigin, extract_widgets};
