//! Settings schema types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete CLI settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub common: CommonSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub topology: TopologySettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommonSettings {
    #[serde(default = "default_config_version")]
    pub config_version: String,
    #[serde(default)]
    pub verbose: bool,
}

fn default_config_version() -> String {
    "1.0".to_string()
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            verbose: false,
        }
    }
}

/// Defaults for `flowforge generate`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Route metric when `--metric` is not given
    #[serde(default = "default_metric")]
    pub default_metric: u32,
    #[serde(default)]
    pub bidirectional: bool,
}

fn default_metric() -> u32 {
    flowforge_core::topology::DEFAULT_METRIC
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            default_metric: default_metric(),
            bidirectional: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TopologySettings {
    /// Topology file used when `--topology` is not given
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    /// Directory generated artifacts are written to
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
