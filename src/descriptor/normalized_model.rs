use serde::Serialize;

use crate::descriptor::descriptor_model::{AppBar, Args};
use crate::descriptor::ids::BankId;
use crate::descriptor::ordered::OrderedMap;

pub const DEFAULT_NAME: &str = "unspecified_name";
pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_CALL: &str = "load";

/// Leading marker on a sidebar entry meaning "collapsed by default".
pub const COLLAPSED_MARKER: char = '_';

/// Canonical, fully-namespaced form of a `Descriptor`.
///
/// Defaults are filled, dangling bank references are pruned, and every bank
/// is keyed by its `{page}__{bank}` id. Produced once per compile pass and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedDescriptor {
    pub name: String,
    pub theme: String,
    pub appbar: AppBar,
    pub show_help: bool,
    pub data: OrderedMap<String, DataSource>,
    pub pages: OrderedMap<String, NormalizedPage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataSource {
    pub module: String,
    pub call: String,
    pub args: Args,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedPage {
    pub pageid: String,
    pub title: String,
    pub subtitle: String,
    pub intro: Option<String>,
    pub dataid: Option<String>,

    /// Bank id (`{page}__{bank}`) -> bank, in declaration order
    pub banks: OrderedMap<String, NormalizedBank>,

    /// Row-major placement stubs. Rows emptied by pruning are kept.
    pub layout: Vec<Vec<LayoutSlot>>,

    pub sidebar: Vec<SidebarEntry>,
    pub connections: Vec<Connection>,
}

impl NormalizedPage {
    pub fn has_sidebar(&self) -> bool {
        !self.sidebar.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedBank {
    /// `{pageid, bankid}` identity handed to the bank factory
    pub uid: BankId,
    pub bank_type: String,
    pub dataid: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub position: Option<[u32; 2]>,
    pub args: Args,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LayoutSlot {
    pub bankid: BankId,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SidebarEntry {
    pub bankid: BankId,
    pub title: String,
    pub open: bool,
}

/// A source bank feeding every callback whose id matches one of `sinks`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Connection {
    pub source: BankId,

    /// Sink patterns rewritten to `{page}/{pattern}`, declaration order,
    /// deduplicated
    pub sinks: Vec<String>,
}
