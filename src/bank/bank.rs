use serde_json::Value;
use tracing::debug;

use crate::bank::bank_model::{BankOutput, Callback, CallbackBody, Connector, Sizing, Widget};
use crate::bank::components::extract_path;
use crate::data::data_model::Dataset;
use crate::descriptor::descriptor_model::Args;
use crate::descriptor::ids::{BankId, ComponentId, Port, WidgetId};
use crate::descriptor::ordered::OrderedMap;
use crate::error::BankError;

/// Size of one block of widgets; `align` multiplies the stacked dimension by
/// the block count.
#[derive(Debug, Clone, Copy)]
pub struct BlockSize {
    pub ideal: [f32; 2],
    pub min: [f32; 2],
}

impl BlockSize {
    pub const fn new(ideal: [f32; 2], min: [f32; 2]) -> Self {
        Self { ideal, min }
    }
}

/// One block: a small matrix of widget ids, stacked with its siblings.
pub type Block = Vec<Vec<WidgetId>>;

// ============================================================================
// BankBuilder: bookkeeping shared by every bank factory
// ============================================================================

/// Collects what a bank factory creates: widgets, their exposed outputs,
/// callbacks, internal connectors and the block arrangement.
pub struct BankBuilder<'a> {
    uid: BankId,
    dataid: String,
    data: &'a Dataset,
    args: &'a Args,
    vertical: bool,

    blocks: Vec<Block>,
    layout: Vec<Vec<WidgetId>>,
    sizing: Sizing,

    widgets: Vec<Widget>,
    outputs: OrderedMap<WidgetId, String>,
    callbacks: OrderedMap<WidgetId, Callback>,
    connectors: OrderedMap<WidgetId, Connector>,
}

impl<'a> BankBuilder<'a> {
    pub fn new(uid: BankId, dataid: &str, data: &'a Dataset, args: &'a Args) -> Self {
        let vertical = args.get("vertical").and_then(Value::as_bool).unwrap_or(false);
        Self {
            uid,
            dataid: dataid.to_string(),
            data,
            args,
            vertical,
            blocks: Vec::new(),
            layout: Vec::new(),
            sizing: Sizing::default(),
            widgets: Vec::new(),
            outputs: OrderedMap::new(),
            callbacks: OrderedMap::new(),
            connectors: OrderedMap::new(),
        }
    }

    pub fn uid(&self) -> &BankId {
        &self.uid
    }

    pub fn dataid(&self) -> &str {
        &self.dataid
    }

    pub fn data(&self) -> &'a Dataset {
        self.data
    }

    pub fn args(&self) -> &'a Args {
        self.args
    }

    /// Id for a widget named `name` in this bank.
    pub fn id(&self, name: &str) -> ComponentId {
        self.uid.component(name)
    }

    /// Banks that stack vertically unless told otherwise.
    pub fn default_vertical(&mut self, vertical: bool) {
        self.vertical = self
            .args
            .get("vertical")
            .and_then(Value::as_bool)
            .unwrap_or(vertical);
    }

    // ---- Arguments ----

    pub fn arg(&self, key: &str) -> Option<&'a Value> {
        self.args.get(key)
    }

    pub fn arg_str(&self, key: &str) -> Option<&'a str> {
        self.args.get(key).and_then(Value::as_str)
    }

    pub fn arg_bool(&self, key: &str, default: bool) -> bool {
        self.args.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// A list of strings, or `None` if the key is absent.
    pub fn arg_strings(&self, key: &str) -> Result<Option<Vec<String>>, BankError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| BankError::new(format!("'{}' must list strings", key)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(BankError::new(format!(
                "'{}' must be a string list, got {}",
                key, other
            ))),
        }
    }

    /// A list of objects, required.
    pub fn arg_objects(&self, key: &str) -> Result<Vec<&'a Args>, BankError> {
        match self.args.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| BankError::new(format!("'{}' must list objects", key)))
                })
                .collect(),
            Some(other) => Err(BankError::new(format!(
                "'{}' must be a list of objects, got {}",
                key, other
            ))),
            None => Err(BankError::new(format!("missing required argument '{}'", key))),
        }
    }

    /// User overrides for the options of a widget: `{prefix}.options`,
    /// `{prefix}.default`, ...
    pub fn option_args(&self, prefix: &str) -> Args {
        extract_path(&format!("{}.", prefix), self.args)
    }

    // ---- Widgets and outputs ----

    /// Record a widget without placing it in a block.
    pub fn add_widget(&mut self, widget: Widget) -> WidgetId {
        let id = widget.id.clone();
        if let Some(prop) = &widget.output {
            self.outputs.insert(id.clone(), prop.clone());
        }
        debug!("  {}: {} {}", self.uid, widget.component, id);
        self.widgets.push(widget);
        id
    }

    /// Record a widget and give it a block of its own.
    pub fn create_component(&mut self, widget: Widget) -> WidgetId {
        let id = self.add_widget(widget);
        self.blocks.push(vec![vec![id.clone()]]);
        id
    }

    /// Replace the default one-block-per-widget arrangement.
    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }

    // ---- Callbacks ----

    /// `{page}_{bank}__update_{component}`
    pub fn name_callback(&self, target: &WidgetId) -> String {
        format!(
            "{}_{}__update_{}",
            self.uid.pageid,
            self.uid.bankid,
            target.local_name()
        )
    }

    /// Callback updating `provides` on `target`, wired later by connections.
    pub fn add_callback(&mut self, target: &WidgetId, provides: &[&str], handler: &str, params: Value) {
        let callback = Callback {
            name: self.name_callback(target),
            provides: provides.iter().map(|p| p.to_string()).collect(),
            dataid: Some(self.dataid.clone()),
            body: CallbackBody::new(handler, params),
        };
        self.callbacks.insert(target.clone(), callback);
    }

    /// Callback whose inputs are known inside the bank; its connector is
    /// declared up front.
    pub fn add_internal_callback(
        &mut self,
        target: &WidgetId,
        inputs: Vec<Port>,
        provides: &[&str],
        handler: &str,
        params: Value,
    ) {
        self.add_callback(target, provides, handler, params);
        let connector = Connector {
            inputs: inputs.into_iter().collect(),
            outputs: provides
                .iter()
                .map(|prop| Port::new(target.clone(), prop))
                .collect(),
        };
        self.connectors.insert(target.clone(), connector);
    }

    // ---- Arrangement ----

    /// Stack the blocks (vertically or side by side) into the bank's widget
    /// matrix and scale `block` into the bank's sizing.
    pub fn align(&mut self, block: BlockSize) {
        let count = self.blocks.len() as f32;
        if self.vertical {
            self.layout = self.blocks.iter().flatten().cloned().collect();
            self.sizing = Sizing {
                ideal: [(count * block.ideal[0]) as u32, block.ideal[1] as u32],
                min: [(count * block.min[0]) as u32, block.min[1] as u32],
            };
        } else {
            let rows = self.blocks.iter().map(Vec::len).max().unwrap_or(0);
            self.layout = (0..rows)
                .map(|r| {
                    self.blocks
                        .iter()
                        .filter_map(|b| b.get(r))
                        .flatten()
                        .cloned()
                        .collect()
                })
                .collect();
            self.sizing = Sizing {
                ideal: [block.ideal[0] as u32, (count * block.ideal[1]) as u32],
                min: [block.min[0] as u32, (count * block.min[1]) as u32],
            };
        }
    }

    pub fn finish(self) -> BankOutput {
        BankOutput {
            widgets: self.widgets,
            layout: self.layout,
            outputs: self.outputs,
            callbacks: self.callbacks,
            connectors: self.connectors,
            sizing: self.sizing,
        }
    }
}
