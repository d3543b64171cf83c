use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::grid::grid::GridConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "bento",
    version,
    about = "Compile dashboard descriptors into wired, laid-out app contexts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: bento.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a descriptor into a context for the renderer
    Compile {
        /// Descriptor file (.yaml, .yml or .json)
        #[arg(short, long)]
        descriptor: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Append compile events as JSON lines to this file
        #[arg(long)]
        trace: Option<String>,

        /// Fail on repeated widget ids
        #[arg(long)]
        strict: bool,
    },

    /// Validate and normalize a descriptor without building it
    Validate {
        /// Descriptor file (.yaml, .yml or .json)
        #[arg(short, long)]
        descriptor: String,
    },

    /// List the registered bank types
    Banks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `bento.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub compile: CompileConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileConfig {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    pub path: Option<String>,
}

// ============================================================================
// Config File Loading
// ============================================================================

pub const DEFAULT_CONFIG: &str = "bento.yaml";

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}
