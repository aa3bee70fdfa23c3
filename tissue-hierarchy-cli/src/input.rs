use crate::error::{CliError, CliResult};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tissue_hierarchy::ObjectRecord;

/// Where the object records come from.
pub enum InputSource {
    /// From a file on disk.
    File(PathBuf),
    /// From stdin (`-`).
    Stdin,
}

impl InputSource {
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            InputSource::Stdin
        } else {
            InputSource::File(path.to_path_buf())
        }
    }
}

/// Read content from the input source.
pub fn read_input(source: &InputSource) -> CliResult<String> {
    match source {
        InputSource::File(path) => std::fs::read_to_string(path)
            .map_err(|e| CliError::Input(format!("failed to read {}: {e}", path.display()))),
        InputSource::Stdin => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parse object records.
///
/// A JSON array if the first non-whitespace character is `[`, otherwise one
/// JSON record per line. Blank lines are ignored.
pub fn parse_records(text: &str) -> CliResult<Vec<ObjectRecord>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }

    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| CliError::Input(format!("line {}: {e}", i + 1)))?;
        records.push(record);
    }
    Ok(records)
}

/// Read and parse the records named by a positional argument.
pub fn load_records(path: &Path) -> CliResult<Vec<ObjectRecord>> {
    let records = parse_records(&read_input(&InputSource::from_arg(path))?)?;
    tracing::debug!(records = records.len(), "Input records read");
    Ok(records)
}
