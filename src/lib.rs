//! **pg-analyze** - Fast, tolerant classifier for PG/PGML problem files
//!
//! Finds input widgets, answer evaluators and answer constructors, wires them
//! together and labels each file with question types, a confidence and a
//! needs-review bucket. Analysis never fails on malformed source.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core analysis pipeline
pub mod core {
    /// Comment and heredoc stripping with line-count preservation
    pub mod lexer;

    /// Balanced-paren call finding with a cached name-pattern regex
    pub mod calls;
    pub use calls::{Call, CallScanner, NamePatternCache};

    /// BEGIN/END and PGML heredoc region pairing
    pub mod regions;
    pub use regions::{Region, RegionIssue, RegionKind, scan_regions};

    /// Macro, widget, evaluator, answer and PGML extractors
    pub mod extract;

    /// Widget to evaluator links (named, then order-based)
    pub mod wiring;
    pub use wiring::{WiringLink, WiringMethod, wire};

    /// Ordered classification rules and confidence scoring
    pub mod classify;
    pub use classify::{ClassificationLabels, Facts, TypeLabel, classify};

    /// Needs-review buckets
    pub mod triage;
    pub use triage::{ReviewBucket, Triage, triage};

    /// The serialized per-file record
    pub mod record;
    pub use record::{AnalysisRecord, SCHEMA_VERSION};

    /// Per-file pipeline
    pub mod analyze;
    pub use analyze::{AnalyzeError, Analyzer};

    /// Parallel batch runs and JSONL output
    pub mod batch;
    pub use batch::{classify as classify_run, run as analyze_run};
}

/// Infrastructure - Configuration, I/O, and utilities
pub mod infra {
    /// Layered configuration (file + environment)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped file I/O for large files (>1MB threshold)
    pub mod io;
    pub use io::{SourceBytes, decode_latin1, read_source};

    /// O(log n) newline-offset index for byte→line mapping
    pub mod line_index;
    pub use line_index::NewlineIndex;

    /// Gitignore-aware discovery of problem files
    pub mod walk;
    pub use walk::FileWalker;
}

// Strategic re-exports for clean CLI interface
pub use crate::cli::{AppContext, Cli, Commands};
pub use crate::core::{analyze_run, classify_run};
pub use crate::infra::{Config, FileWalker, load_config};

// Core types for external consumers
pub use crate::core::{AnalysisRecord, AnalyzeError, Analyzer, ReviewBucket, TypeLabel};
