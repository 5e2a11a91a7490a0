use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

/// File names probed in order; the first one present wins.
pub const CONFIG_FILES: [&str; 4] = [
    "pg-analyze.toml",
    "pg-analyze.yaml",
    "pg-analyze.json",
    ".pg-analyze.toml",
];

/// Environment prefix, e.g. `PG_ANALYZE_ANALYZE__THREADS=4`.
pub const ENV_PREFIX: &str = "PG_ANALYZE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Extra ignore globs (in addition to .gitignore)
    pub ignore_patterns: Vec<String>,

    /// Problem file extensions to analyze
    pub extensions: Vec<String>,

    /// Directory that relative output files are written to
    pub output_dir: Option<PathBuf>,

    /// Batch analysis settings
    pub analyze: AnalyzeConfig,

    /// Needs-review summary settings
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig
{
    pub jsonl_file: String,
    /// Worker threads; 0 lets rayon decide
    pub threads: usize,
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig
{
    /// Flagged files listed per bucket in the summary
    pub sample_limit: usize,
}

impl Default for AnalyzeConfig
{
    fn default() -> Self
    {
        Self {
            jsonl_file: "pg_analyze.jsonl".to_string(),
            threads: 0,
            follow_symlinks: false,
        }
    }
}

impl Default for ReviewConfig
{
    fn default() -> Self
    {
        Self { sample_limit: 5 }
    }
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec![
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/.DS_Store".to_string(),
            ],
            extensions: vec!["pg".to_string()],
            output_dir: None,
            analyze: AnalyzeConfig::default(),
            review: ReviewConfig::default(),
        }
    }
}

impl Config
{
    /// Where the JSONL output goes when no `-o` is given.
    pub fn default_output(&self) -> PathBuf
    {
        match &self.output_dir
        {
            Some(dir) => dir.join(&self.analyze.jsonl_file),
            None => PathBuf::from(&self.analyze.jsonl_file),
        }
    }
}

/// Load config from the current directory plus environment.
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Defaults, then the first config file found in `dir`, then `PG_ANALYZE_*`.
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let defaults =
        config::Config::try_from(&Config::default()).context("Failed to build default config")?;
    let mut builder = config::Config::builder().add_source(defaults);

    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
