use anyhow::Result;
use clap::Parser;
use pg_analyze::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Env var holding a tracing filter; takes precedence over `-v`.
const LOG_ENV: &str = "PG_ANALYZE_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Analyze(args) => pg_analyze::analyze_run(args, &ctx),
        Commands::Classify(args) => pg_analyze::classify_run(args, &ctx),
        Commands::Init(args) => pg_analyze::infra::config::init(args, &ctx),
        Commands::Completions(args) => pg_analyze::completion::run(args, &ctx),
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
