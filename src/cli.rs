use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
}

#[derive(Parser)]
#[command(name = "pga")]
#[command(
    about = "Classify PG/PGML problem files: widgets, evaluators, wiring and review triage"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); PG_ANALYZE_LOG wins when set
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze every problem file under the given roots into JSONL
    Analyze(AnalyzeArgs),

    /// Analyze one file and print its record as JSON
    Classify(ClassifyArgs),

    /// Initialize a pg-analyze.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub roots: Vec<PathBuf>,

    /// Output JSONL path (defaults to the configured output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File extensions to include (repeatable; overrides config)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Additional glob patterns to ignore
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Worker threads (0 = all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Maximum directory depth
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Flagged files listed per review bucket in the summary
    #[arg(long)]
    pub sample_limit: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Problem file to analyze
    pub file: PathBuf,

    /// Pretty-print the JSON record
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
