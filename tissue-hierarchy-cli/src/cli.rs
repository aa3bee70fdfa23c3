use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tissue_hierarchy::TierMode;

#[derive(Parser)]
#[command(
    name = "tissue-hier",
    about = "Assign detections and regions to their enclosing tissue regions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve parent/child assignments and print a summary
    Assign {
        /// Object records: JSON array or newline-delimited JSON ("-" for stdin)
        input: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Write the relation and summary as JSON to this file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Summary format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },

    /// Load objects and check the configuration against them without resolving
    Validate {
        /// Object records: JSON array or newline-delimited JSON ("-" for stdin)
        input: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Print preset configurations as TOML
    Presets {
        /// Preset name (prints all presets if omitted)
        name: Option<String>,
    },
}

/// Where the label priority configuration comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Configuration file (TOML)
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset: annotations-only or annotations-detections
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the partition mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Warn instead of failing when a configured label is absent from the data
    #[arg(long)]
    pub allow_missing_labels: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Structural regions are parents; everything else is a child
    TwoTier,
    /// Every labelled region is a parent; detections are children
    ThreeTier,
}

impl From<ModeArg> for TierMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::TwoTier => TierMode::TwoTier,
            ModeArg::ThreeTier => TierMode::ThreeTier,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryFormat {
    Table,
    Json,
}
