//! Resolve the run configuration from `--config`, `--preset` and overrides.

use crate::cli::PolicyArgs;
use crate::error::{CliError, CliResult};
use std::path::Path;
use tissue_hierarchy::HierarchyConfig;

const DEFAULT_PRESET: &str = "annotations-detections";

/// Look up a preset, turning an unknown name into a usage error.
pub fn preset(name: &str) -> CliResult<HierarchyConfig> {
    HierarchyConfig::preset(name).ok_or_else(|| {
        CliError::Usage(format!(
            "unknown preset '{name}' (expected one of: {})",
            HierarchyConfig::PRESETS.join(", ")
        ))
    })
}

/// Read a TOML configuration file.
pub fn read_config_file(path: &Path) -> CliResult<HierarchyConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    Ok(HierarchyConfig::from_toml_str(&text)?)
}

/// Build the configuration for a run.
///
/// Precedence: `--config` file, else `--preset`, else the
/// annotations-detections preset. `--mode` and `--allow-missing-labels`
/// apply on top of either source.
pub fn resolve(args: &PolicyArgs) -> CliResult<HierarchyConfig> {
    let mut config = match (&args.config, &args.preset) {
        (Some(path), _) => read_config_file(path)?,
        (None, Some(name)) => preset(name)?,
        (None, None) => preset(DEFAULT_PRESET)?,
    };

    if let Some(mode) = args.mode {
        config = config.with_mode(mode.into());
    }
    if args.allow_missing_labels {
        config = config.with_allow_missing_labels(true);
    }

    config.validate()?;
    tracing::debug!(
        mode = config.mode.as_str(),
        structural = ?config.structural_labels,
        lowest = ?config.lowest_priority_label,
        "Configuration resolved"
    );
    Ok(config)
}
