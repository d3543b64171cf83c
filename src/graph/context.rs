use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::bank::bank_model::{BankOutput, Callback, CallbackBody, Connector, Sizing, Widget};
use crate::descriptor::descriptor_model::AppBar;
use crate::descriptor::ids::{BankId, Port, WidgetId};
use crate::descriptor::normalized_model::{Connection, DataSource, SidebarEntry};
use crate::descriptor::ordered::OrderedMap;
use crate::error::{CompileError, ValidationError};
use crate::graph::matching::{SinkPattern, source_outputs};
use crate::grid::grid::GridPlacement;
use crate::trace::trace::{CompileEvent, EventKind};

/// App-shell widget holding the current URL.
pub const LOCATION: &str = "location";

/// App-shell widget the router renders the current page into.
pub const PAGE: &str = "page";

/// The "page has loaded" trigger: `(location, pathname)`.
pub fn page_load_trigger() -> Port {
    Port::new(WidgetId::app(LOCATION), "pathname")
}

// ============================================================================
// CompiledContext: what the renderer consumes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageContext {
    pub title: String,
    pub subtitle: String,
    pub intro: Option<String>,
    pub sidebar: Vec<SidebarEntry>,

    /// Grid placements, one row per layout row
    pub layout: Vec<Vec<GridPlacement>>,

    /// Grid placements in row-major order
    pub banks: Vec<GridPlacement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledContext {
    pub name: String,
    pub theme: String,
    pub appbar: AppBar,
    pub show_help: bool,
    pub data: OrderedMap<String, DataSource>,
    pub pages: OrderedMap<String, PageContext>,

    /// Bank id -> the bank's widget matrix
    pub banks: OrderedMap<String, Vec<Vec<WidgetId>>>,

    pub widgets: OrderedMap<WidgetId, Widget>,
    pub outputs: OrderedMap<WidgetId, String>,
    pub connectors: OrderedMap<WidgetId, Connector>,
    pub callbacks: OrderedMap<WidgetId, Callback>,
}

// ============================================================================
// BuildContext: registries threaded through one assembly pass
// ============================================================================

/// Registries filled while banks are instantiated and connections resolved.
///
/// Later banks override same-id entries of earlier ones; every override is
/// recorded as an event. In strict mode a repeated widget id is an error.
pub struct BuildContext {
    strict: bool,
    widgets: OrderedMap<WidgetId, Widget>,
    outputs: OrderedMap<WidgetId, String>,
    callbacks: OrderedMap<WidgetId, Callback>,
    connectors: OrderedMap<WidgetId, Connector>,
    banks: OrderedMap<String, Vec<Vec<WidgetId>>>,
    events: Vec<CompileEvent>,
}

/// Registries of a finished pass, checked for consistency.
#[derive(Debug, Clone, Default)]
pub struct Assembled {
    pub banks: OrderedMap<String, Vec<Vec<WidgetId>>>,
    pub widgets: OrderedMap<WidgetId, Widget>,
    pub outputs: OrderedMap<WidgetId, String>,
    pub connectors: OrderedMap<WidgetId, Connector>,
    pub callbacks: OrderedMap<WidgetId, Callback>,
    pub events: Vec<CompileEvent>,
}

impl BuildContext {
    /// Empty registries seeded with the page router.
    pub fn new(strict: bool) -> Self {
        let page = WidgetId::app(PAGE);
        let router = Callback {
            name: "update_page".to_string(),
            provides: vec!["children".to_string()],
            dataid: None,
            body: CallbackBody::new("router", json!({})),
        };
        let mut connectors = OrderedMap::new();
        connectors.insert(
            page.clone(),
            Connector {
                inputs: [page_load_trigger()].into_iter().collect(),
                outputs: vec![Port::new(page.clone(), "children")],
            },
        );
        let mut callbacks = OrderedMap::new();
        callbacks.insert(page, router);

        Self {
            strict,
            widgets: OrderedMap::new(),
            outputs: OrderedMap::new(),
            callbacks,
            connectors,
            banks: OrderedMap::new(),
            events: Vec::new(),
        }
    }

    pub fn outputs(&self) -> &OrderedMap<WidgetId, String> {
        &self.outputs
    }

    pub fn callbacks(&self) -> &OrderedMap<WidgetId, Callback> {
        &self.callbacks
    }

    pub fn connectors(&self) -> &OrderedMap<WidgetId, Connector> {
        &self.connectors
    }

    pub fn events(&self) -> &[CompileEvent] {
        &self.events
    }

    pub fn record_all(&mut self, events: impl IntoIterator<Item = CompileEvent>) {
        self.events.extend(events);
    }

    /// Merge one bank's widgets, outputs, callbacks and connectors into the
    /// app registries. Returns the bank's sizing hint.
    pub fn register_bank(&mut self, uid: &BankId, output: BankOutput) -> Result<Sizing, CompileError> {
        let BankOutput {
            widgets,
            layout,
            outputs,
            callbacks,
            connectors,
            sizing,
        } = output;

        for widget in widgets {
            let id = widget.id.clone();
            if self.widgets.insert(id.clone(), widget).is_some() {
                if self.strict {
                    return Err(CompileError::DuplicateWidget {
                        widget: id,
                        bank: uid.clone(),
                    });
                }
                self.overridden(EventKind::WidgetOverridden, &id, uid);
            }
        }
        for (id, prop) in outputs {
            if let Some(old) = self.outputs.insert(id.clone(), prop.clone()) {
                if old != prop {
                    self.overridden(EventKind::OutputOverridden, &id, uid);
                }
            }
        }
        for (id, callback) in callbacks {
            if self.callbacks.insert(id.clone(), callback).is_some() {
                self.overridden(EventKind::CallbackOverridden, &id, uid);
            }
        }
        for (id, connector) in connectors {
            if self.connectors.insert(id.clone(), connector).is_some() {
                self.overridden(EventKind::ConnectorOverridden, &id, uid);
            }
        }

        self.banks.insert(uid.to_string(), layout);
        Ok(sizing)
    }

    fn overridden(&mut self, kind: EventKind, id: &WidgetId, uid: &BankId) {
        warn!("bank {} overrides {:?} entry for {}", uid, kind, id);
        self.events
            .push(CompileEvent::now(kind, id).with_detail(format!("overridden by bank {}", uid)));
    }

    /// Wire every output of `connection.source` into every callback matched
    /// by its sink patterns. Callbacks without a connector get one whose
    /// outputs mirror their `provides`.
    pub fn connect(&mut self, connection: &Connection) -> Result<(), CompileError> {
        let inputs = source_outputs(&connection.source, &self.outputs);

        for sink in &connection.sinks {
            let pattern = SinkPattern::new(sink).map_err(|e| {
                let mut err = ValidationError::default();
                err.push(
                    format!("pages.{}.connections.{}", connection.source.pageid, connection.source.bankid),
                    format!("invalid sink pattern '{}': {}", sink, e),
                );
                CompileError::Validation(err)
            })?;

            let targets = pattern.matching_callbacks(&self.callbacks);
            if targets.is_empty() {
                warn!("sink '{}' of {} matches no callback", sink, connection.source);
                self.events.push(
                    CompileEvent::now(EventKind::SinkUnmatched, &connection.source)
                        .with_detail(sink),
                );
                continue;
            }

            for target in targets {
                debug!("  {} -> {} ({} inputs)", connection.source, target, inputs.len());
                let connector = self.connector_for(&target);
                connector.inputs.extend(inputs.iter().cloned());
            }
        }
        Ok(())
    }

    fn connector_for(&mut self, target: &WidgetId) -> &mut Connector {
        let callbacks = &self.callbacks;
        self.connectors
            .get_or_insert_with(target.clone(), || match callbacks.get(target) {
                Some(callback) => Connector::for_callback(target, callback),
                None => Connector::default(),
            })
    }

    /// Give every callback that still has no connector, and provides at
    /// least one property, a connector fired by the page-load trigger.
    pub fn fallback(&mut self) {
        for (target, callback) in self.callbacks.iter() {
            if callback.provides.is_empty() || self.connectors.contains_key(target) {
                continue;
            }
            debug!("  {} <- page load", target);
            let mut connector = Connector::for_callback(target, callback);
            connector.inputs.insert(page_load_trigger());
            self.connectors.insert(target.clone(), connector);
        }
    }

    /// Check the finished registries and hand them over.
    ///
    /// No widget property may be produced by two connectors, and every
    /// connector of a callback must produce exactly that callback's
    /// `provides`, in order.
    pub fn finish(self) -> Result<Assembled, CompileError> {
        let mut producers: BTreeMap<&Port, &WidgetId> = BTreeMap::new();
        for (target, connector) in self.connectors.iter() {
            for port in &connector.outputs {
                if let Some(first) = producers.insert(port, target) {
                    return Err(CompileError::ConflictingOutput {
                        port: port.clone(),
                        first: first.clone(),
                        second: target.clone(),
                    });
                }
            }
        }

        for (target, connector) in self.connectors.iter() {
            if let Some(callback) = self.callbacks.get(target) {
                if !connector.matches(target, callback) {
                    return Err(CompileError::ConnectorMismatch {
                        callback: target.clone(),
                    });
                }
            }
        }

        Ok(Assembled {
            banks: self.banks,
            widgets: self.widgets,
            outputs: self.outputs,
            connectors: self.connectors,
            callbacks: self.callbacks,
            events: self.events,
        })
    }
}
