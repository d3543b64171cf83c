use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::ordered::OrderedMap;
use crate::error::CompileError;

/// Free-form factory/loader arguments, kept in declaration order.
pub type Args = Map<String, Value>;

/// The declarative input: pages, data sources, banks, layout and connections.
///
/// Deserialized from YAML or JSON. Everything except `pages` is optional;
/// defaults are filled in by the normalizer, and structural checks (ids,
/// required `banks`) are done by validation so that all violations are
/// reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Application name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Named theme (one or more words)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Title bar shown above every page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appbar: Option<AppBar>,

    /// Whether the rendered app shows its help overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_help: Option<bool>,

    /// Data source id -> how to load it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OrderedMap<String, DataSourceSpec>>,

    /// Page id -> page
    #[serde(default)]
    pub pages: OrderedMap<String, Page>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppBar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Where a dataset comes from: a loader module, the call on it, and arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataSourceSpec {
    pub module: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

/// One page of the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Introductory text shown above the grid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,

    /// Default data source for banks on this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataid: Option<String>,

    /// Bank name -> bank spec. Required; `None` is a validation error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banks: Option<OrderedMap<String, BankSpec>>,

    /// Row-major matrix of bank names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Vec<Vec<String>>>,

    /// Bank names shown in the sidebar; a leading `_` marks one collapsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<Vec<String>>,

    /// Source bank name -> sink bank name patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<OrderedMap<String, Vec<String>>>,
}

/// A single bank: which factory builds it and with what arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BankSpec {
    /// Factory key
    #[serde(rename = "type")]
    pub bank_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataid: Option<String>,

    /// Explicit width in grid columns, overriding the factory's sizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Explicit height in grid rows, overriding the factory's sizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Explicit `[row, column]` position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[u32; 2]>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Args,
}

impl BankSpec {
    pub fn new(bank_type: &str) -> Self {
        Self {
            bank_type: bank_type.to_string(),
            dataid: None,
            width: None,
            height: None,
            position: None,
            args: Args::new(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Descriptor {
    pub fn from_yaml_str(text: &str) -> Result<Self, CompileError> {
        serde_yaml::from_str(text).map_err(|e| CompileError::Parse {
            context: "descriptor YAML".to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, CompileError> {
        serde_json::from_str(text).map_err(|e| CompileError::Parse {
            context: "descriptor JSON".to_string(),
            message: e.to_string(),
        })
    }

    /// Read a descriptor file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }
}
