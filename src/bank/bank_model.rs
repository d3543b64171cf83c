use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::descriptor::descriptor_model::Args;
use crate::descriptor::ids::{Port, WidgetId};
use crate::descriptor::ordered::OrderedMap;

/// An atomic UI element definition, owned by the bank that created it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub id: WidgetId,

    /// UI library the component lives in (`dcc`, `html`, `dash_table`)
    pub lib: String,

    /// Component name inside that library (`Dropdown`, `Graph`, ...)
    pub component: String,

    /// Constructor that built it (`dropdown`, `selection_list`, ...)
    pub kind: String,

    pub label: Option<String>,

    /// Constructor arguments, `id` first
    pub args: Args,

    /// Property holding the widget's current value, if it has one
    #[serde(skip)]
    pub output: Option<String>,
}

/// Opaque body of a callback. The compiler never looks inside; the renderer
/// picks the implementation by `handler` and feeds it `params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackBody {
    pub handler: String,
    pub params: Value,
}

impl CallbackBody {
    pub fn new(handler: &str, params: Value) -> Self {
        Self {
            handler: handler.to_string(),
            params,
        }
    }
}

/// A named unit of reactive computation, keyed by the widget it targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Callback {
    pub name: String,

    /// Properties it produces, in the order the body returns them
    pub provides: Vec<String>,

    /// Data source the body reads, if any
    pub dataid: Option<String>,

    pub body: CallbackBody,
}

/// Binds a callback to the inputs that trigger it and the outputs it sets.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Connector {
    pub inputs: BTreeSet<Port>,
    pub outputs: Vec<Port>,
}

impl Connector {
    /// Empty-input connector whose outputs mirror `provides` on `target`.
    pub fn for_callback(target: &WidgetId, callback: &Callback) -> Self {
        Self {
            inputs: BTreeSet::new(),
            outputs: callback
                .provides
                .iter()
                .map(|prop| Port::new(target.clone(), prop))
                .collect(),
        }
    }

    /// Whether `outputs` is exactly `provides` on `target`, in order.
    pub fn matches(&self, target: &WidgetId, callback: &Callback) -> bool {
        self.outputs.len() == callback.provides.len()
            && self
                .outputs
                .iter()
                .zip(&callback.provides)
                .all(|(port, prop)| port.widget == *target && port.property == *prop)
    }
}

/// `[rows, columns]` a bank would like, and the least it tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sizing {
    pub ideal: [u32; 2],
    pub min: [u32; 2],
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            ideal: [2, 2],
            min: [1, 1],
        }
    }
}

/// Everything one bank factory call produces.
#[derive(Debug, Clone, Default)]
pub struct BankOutput {
    pub widgets: Vec<Widget>,

    /// Widget ids arranged as the bank's internal matrix
    pub layout: Vec<Vec<WidgetId>>,

    /// Widget id -> property exposed for reactive wiring
    pub outputs: OrderedMap<WidgetId, String>,

    /// Target widget id -> callback
    pub callbacks: OrderedMap<WidgetId, Callback>,

    /// Target widget id -> pre-declared connector
    pub connectors: OrderedMap<WidgetId, Connector>,

    pub sizing: Sizing,
}
