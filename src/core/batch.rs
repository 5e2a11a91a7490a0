//! Batch driver: walk roots, analyze in parallel, write JSONL, summarize.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cli::{AnalyzeArgs, AppContext, ClassifyArgs};
use crate::core::analyze::Analyzer;
use crate::core::record::AnalysisRecord;
use crate::core::triage::ReviewBucket;
use crate::infra::config::{Config, load_config};
use crate::infra::walk::FileWalker;

/// Effective batch settings after CLI flags are laid over the config.
#[derive(Debug, Clone)]
pub struct BatchOptions
{
    pub roots: Vec<PathBuf>,
    pub output: PathBuf,
    pub extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub threads: usize,
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub sample_limit: usize,
}

impl BatchOptions
{
    pub fn resolve(
        args: AnalyzeArgs,
        config: &Config,
    ) -> Self
    {
        let extensions = if args
            .extensions
            .is_empty()
        {
            config
                .extensions
                .clone()
        }
        else
        {
            args.extensions
        };

        let mut ignore_patterns = config
            .ignore_patterns
            .clone();
        ignore_patterns.extend(args.ignore);

        Self {
            roots: args.roots,
            output: args
                .output
                .unwrap_or_else(|| config.default_output()),
            extensions,
            ignore_patterns,
            threads: args
                .threads
                .unwrap_or(config.analyze.threads),
            follow_symlinks: args.follow_symlinks || config.analyze.follow_symlinks,
            max_depth: args.depth,
            sample_limit: args
                .sample_limit
                .unwrap_or(config.review.sample_limit),
        }
    }
}

/// Aggregate view of one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary
{
    pub analyzed: usize,
    pub failed: usize,
    pub needs_review: usize,
    /// Flagged files per bucket, capped at the sample limit, bucket order
    pub samples: Vec<(ReviewBucket, usize, Vec<String>)>,
}

impl BatchSummary
{
    pub fn from_records(
        records: &[AnalysisRecord],
        failed: usize,
        sample_limit: usize,
    ) -> Self
    {
        let grouped = records
            .iter()
            .filter_map(|r| {
                r.needs_review_bucket
                    .map(|b| (b, r.file.as_str()))
            })
            .into_group_map();

        let samples = grouped
            .into_iter()
            .sorted_by_key(|(bucket, _)| *bucket)
            .map(|(bucket, files)| {
                let total = files.len();
                let picked = files
                    .into_iter()
                    .take(sample_limit)
                    .map(str::to_string)
                    .collect();
                (bucket, total, picked)
            })
            .collect();

        Self {
            analyzed: records.len(),
            failed,
            needs_review: records
                .iter()
                .filter(|r| r.needs_review)
                .count(),
            samples,
        }
    }
}

/// `pga analyze`
pub fn run(
    args: AnalyzeArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = load_config()?;
    let opts = BatchOptions::resolve(args, &config);

    let walker = FileWalker::new(&opts.ignore_patterns)
        .context("Invalid ignore pattern")?
        .with_extensions(&opts.extensions)
        .with_follow_symlinks(opts.follow_symlinks)
        .with_max_depth(opts.max_depth);
    let files = walker.walk_roots(&opts.roots);
    info!(files = files.len(), "discovered problem files");

    let analyzer = Analyzer::new();
    let (records, failed) = if opts.threads > 0
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.threads)
            .build()
            .context("Failed to build worker pool")?;
        pool.install(|| analyze_all(&analyzer, &files, ctx))
    }
    else
    {
        analyze_all(&analyzer, &files, ctx)
    };

    write_jsonl(&opts.output, &records)?;

    let summary = BatchSummary::from_records(&records, failed, opts.sample_limit);
    if !ctx.quiet
    {
        print_summary(&summary, &opts.output, ctx);
    }
    Ok(())
}

/// Analyze `files` on the current rayon pool; records come back sorted by path.
pub fn analyze_all(
    analyzer: &Analyzer,
    files: &[PathBuf],
    ctx: &AppContext,
) -> (Vec<AnalysisRecord>, usize)
{
    let pb = if ctx.quiet
    {
        ProgressBar::hidden()
    }
    else
    {
        let pb = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    };

    let results: Vec<_> = files
        .par_iter()
        .map(|path| {
            let res = analyzer.analyze_file(path);
            pb.inc(1);
            res
        })
        .collect();
    pb.finish_and_clear();

    let mut failed = 0;
    let mut records = Vec::with_capacity(results.len());
    for res in results
    {
        match res
        {
            Ok(rec) => records.push(rec),
            Err(err) =>
            {
                warn!(error = %err, "skipping unreadable file");
                failed += 1;
            }
        }
    }

    records.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
    });
    (records, failed)
}

/// One compact JSON object per line, parent directories created as needed.
pub fn write_jsonl(
    path: &Path,
    records: &[AnalysisRecord],
) -> Result<()>
{
    if let Some(parent) = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for rec in records
    {
        serde_json::to_writer(&mut out, rec).context("Failed to serialize record")?;
        out.write_all(b"\n")?;
    }
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_summary(
    summary: &BatchSummary,
    output: &Path,
    ctx: &AppContext,
)
{
    let head = format!(
        "Analyzed {} files ({} failed), {} need review",
        summary.analyzed, summary.failed, summary.needs_review
    );
    if ctx.no_color
    {
        println!("{}", head);
    }
    else if summary.needs_review > 0
    {
        println!("{}", head.yellow().bold());
    }
    else
    {
        println!("{}", head.green().bold());
    }

    for (bucket, total, files) in &summary.samples
    {
        let label = format!("{} ({})", bucket.as_str(), total);
        if ctx.no_color
        {
            println!("  {}", label);
        }
        else
        {
            println!("  {}", label.cyan());
        }
        for file in files
        {
            println!("    {}", file);
        }
    }
    println!("Wrote {}", output.display());
}

/// `pga classify`
pub fn classify(
    args: ClassifyArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let record = Analyzer::new()
        .analyze_file(&args.file)
        .with_context(|| format!("Failed to analyze {}", args.file.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.pretty
    {
        serde_json::to_writer_pretty(&mut out, &record)?;
    }
    else
    {
        serde_json::to_writer(&mut out, &record)?;
    }
    writeln!(out)?;
    Ok(())
}
