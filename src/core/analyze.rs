//! Per-file pipeline: bytes → clean text → extractors → wiring → labels.
//!
//! `Analyzer` holds no per-file state, so one instance is shared by reference
//! across worker threads.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::core::calls::CallScanner;
use crate::core::classify::{Facts, classify};
use crate::core::extract::{
    build_symbol_table, extract_answers, extract_ans_evaluators, extract_macros,
    extract_widgets, scan_pgml, subtype_tags,
};
use crate::core::lexer;
use crate::core::record::{
    AnalysisRecord, EvaluatorBreakdown, SCHEMA_VERSION, SignalFlags, ans_token_count,
    asset_signals, content_hash, content_hash_ws,
};
use crate::core::regions::scan_regions;
use crate::core::triage::{TriageInput, triage};
use crate::core::wiring::{named_reference, wire};
use crate::infra::io::{decode_latin1, read_source};
use crate::infra::line_index::NewlineIndex;

static MULTIANSWER_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bMultiAnswer\s*\(").unwrap());
static RANDOMIZATION_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:random|list_random)\s*\(").unwrap());
static QUOTED_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

#[derive(Debug, Error)]
pub enum AnalyzeError
{
    #[error("failed to read {}", path.display())]
    Read
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Shared, thread-safe entry point for analyzing problem files.
#[derive(Clone, Default)]
pub struct Analyzer
{
    scanner: CallScanner,
}

impl Analyzer
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Read and analyze one file. Only I/O can fail.
    pub fn analyze_file(
        &self,
        path: &Path,
    ) -> Result<AnalysisRecord, AnalyzeError>
    {
        let bytes = read_source(path).map_err(|source| AnalyzeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.analyze_bytes(path, bytes.as_ref()))
    }

    /// Analyze raw file content. Never fails; malformed input degrades to a
    /// low-confidence record.
    #[instrument(level = "debug", skip_all, fields(path = %path.display(), len = bytes.len()))]
    pub fn analyze_bytes(
        &self,
        path: &Path,
        bytes: &[u8],
    ) -> AnalysisRecord
    {
        let raw = decode_latin1(bytes);
        self.analyze_decoded(path, bytes, &raw)
    }

    /// Analyze already-decoded text; hashes are taken over its UTF-8 bytes.
    pub fn analyze_text(
        &self,
        path: &Path,
        text: &str,
    ) -> AnalysisRecord
    {
        self.analyze_decoded(path, text.as_bytes(), text)
    }

    fn analyze_decoded(
        &self,
        path: &Path,
        bytes: &[u8],
        raw: &str,
    ) -> AnalysisRecord
    {
        let clean = lexer::clean(raw);
        let index = NewlineIndex::build(&clean);
        let raw_index = NewlineIndex::build(raw);

        let macros = extract_macros(&self.scanner, &clean, &index);
        let mut widgets = extract_widgets(&self.scanner, &clean, &index);
        let answers = extract_answers(&clean, &index);
        let symbols = build_symbol_table(&answers);
        let mut evaluators = extract_ans_evaluators(&self.scanner, &clean, &index);
        let ans_count = evaluators.len();

        let region_scan = scan_regions(raw);
        for issue in &region_scan.issues
        {
            debug!(%issue, "region issue");
        }
        let pgml = scan_pgml(raw, &region_scan.regions, &raw_index, &symbols);
        let pgml_blank_count = pgml.blank_count();
        let pgml_block_count = pgml.block_count;
        widgets.extend(pgml.blanks);
        evaluators.extend(pgml.evaluators);

        let wiring = wire(&widgets, &evaluators);
        let has_multianswer = MULTIANSWER_RX.is_match(&clean);

        debug!(
            macros = macros.load_macros.len(),
            widgets = widgets.len(),
            evaluators = evaluators.len(),
            answers = answers.len(),
            links = wiring.len(),
            "extracted"
        );

        let facts = Facts {
            macros: &macros,
            widgets: &widgets,
            evaluators: &evaluators,
            answers: &answers,
            wiring_links: wiring.len(),
            pgml_blank_count,
            has_multianswer,
        };
        let labels = classify(&facts);
        let input_count = facts.input_count();

        let evaluator_kinds: Vec<_> = evaluators
            .iter()
            .map(|e| e.kind)
            .collect();
        let verdict = triage(&TriageInput {
            labels: &labels,
            macros: &macros,
            widget_count: widgets.len(),
            input_count,
            ans_count,
            evaluator_kinds: &evaluator_kinds,
            wiring_empty: wiring.is_empty(),
        });

        let named_rule_refs = evaluators
            .iter()
            .filter_map(|e| named_reference(&e.expr))
            .map(str::to_string)
            .collect();

        AnalysisRecord {
            schema_version: SCHEMA_VERSION,
            file: path
                .display()
                .to_string(),
            content_hash: content_hash(bytes),
            content_hash_ws: content_hash_ws(bytes),
            types: labels.types,
            subtype_tags: subtype_tags(raw, &region_scan.regions),
            confidence: labels.confidence,
            reasons: labels.reasons,
            signals: SignalFlags::detect(&clean, !answers.is_empty()),
            evaluator_breakdown: EvaluatorBreakdown::from_evaluators(&evaluators),
            has_randomization: RANDOMIZATION_RX.is_match(&clean),
            resource_exts: self.resource_exts(&clean, &index),
            asset_signals: asset_signals(&clean),
            ans_token_count: ans_token_count(&clean),
            input_count,
            ans_count,
            wiring_empty: wiring.is_empty(),
            has_multianswer,
            named_rule_refs,
            pgml_block_count,
            pgml_blank_marker_count: pgml_blank_count,
            macros,
            widgets,
            evaluators,
            answers,
            wiring,
            regions: region_scan.regions,
            region_issues: region_scan.issues,
            needs_review: verdict.needs_review,
            needs_review_bucket: verdict.bucket,
        }
    }

    /// Sorted, unique, lower-case extensions of quoted `Resources(...)` args.
    fn resource_exts(
        &self,
        clean: &str,
        index: &NewlineIndex,
    ) -> Vec<String>
    {
        let mut exts: Vec<String> = self
            .scanner
            .iter_calls(clean, &["Resources"], index)
            .iter()
            .flat_map(|call| {
                QUOTED_RX
                    .captures_iter(call.arg_text)
                    .filter_map(|caps| caps.get(1))
                    .filter_map(|m| {
                        Path::new(m.as_str().trim())
                            .extension()
                            .and_then(|e| e.to_str())
                            .map(str::to_ascii_lowercase)
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|e| !e.is_empty())
            .collect();
        exts.sort();
        exts.dedup();
        exts
    }
}
