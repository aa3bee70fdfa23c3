use colored::Colorize;
use std::fmt;
use std::process;
use tissue_hierarchy::HierarchyError;

/// Exit codes for the CLI.
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Error from the hierarchy engine.
    Hierarchy(HierarchyError),
    /// Label configuration is missing, unreadable or inconsistent.
    Config(String),
    /// Bad file path, unreadable input, parse failure.
    Input(String),
    /// Output file could not be written.
    Output(String),
    /// Argument / usage errors.
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Hierarchy(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::Config(msg) => write!(
                f,
                "{} {msg}\n  {} run 'tissue-hier presets' to see a valid configuration",
                "error:".red().bold(),
                "help:".cyan().bold(),
            ),
            CliError::Input(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Output(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Usage(msg) => write!(f, "{} {msg}", "error:".red().bold()),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<HierarchyError> for CliError {
    fn from(e: HierarchyError) -> Self {
        match e {
            HierarchyError::Config(msg) => CliError::Config(msg),
            other => CliError::Hierarchy(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(format!("JSON parse error: {e}"))
    }
}

/// Print error and exit with the appropriate code.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("{err}");
    let code = match &err {
        CliError::Usage(_) | CliError::Config(_) => EXIT_USAGE,
        _ => EXIT_ERROR,
    };
    process::exit(code)
}

pub type CliResult<T> = std::result::Result<T, CliError>;
