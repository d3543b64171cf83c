use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::graph::assembler::Compilation;

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// What kind of tolerated anomaly a compile pass ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A data source could not be loaded and was omitted
    DataSourceDropped,

    /// A later bank re-declared an output for an existing widget id
    OutputOverridden,

    /// A later bank re-declared a widget id
    WidgetOverridden,

    /// A later bank re-declared a callback for an existing target
    CallbackOverridden,

    /// A later bank re-declared a connector for an existing target
    ConnectorOverridden,

    /// A connection's sink pattern matched no callback
    SinkUnmatched,

    /// A grid row could not be shrunk to fit its width
    RowOverflow,
}

/// One recorded event. Written as a trace line by `EventLogger`.
#[derive(Debug, Clone, Serialize)]
pub struct CompileEvent {
    pub timestamp_ms: u128,
    pub kind: EventKind,

    /// The bank, widget, data source or row the event is about
    pub subject: String,

    pub detail: Option<String>,
}

impl CompileEvent {
    pub fn now(kind: EventKind, subject: impl ToString) -> Self {
        Self {
            timestamp_ms: now_ms(),
            kind,
            subject: subject.to_string(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

// ============================================================================
// Trace records
// ============================================================================

/// Header written once per compile pass, ahead of that pass's events.
#[derive(Debug, Clone, Serialize)]
pub struct CompileSummary {
    pub timestamp_ms: u128,

    /// Descriptor path, or a caller-chosen label for in-memory descriptors
    pub descriptor: String,

    pub name: String,
    pub pages: usize,
    pub banks: usize,
    pub widgets: usize,
    pub callbacks: usize,
    pub events: usize,
}

impl CompileSummary {
    pub fn of(descriptor: impl ToString, compilation: &Compilation) -> Self {
        let ctx = &compilation.context;
        Self {
            timestamp_ms: now_ms(),
            descriptor: descriptor.to_string(),
            name: ctx.name.clone(),
            pages: ctx.pages.len(),
            banks: ctx.banks.len(),
            widgets: ctx.widgets.len(),
            callbacks: ctx.callbacks.len(),
            events: compilation.events.len(),
        }
    }
}

/// One line of the trace file.
#[derive(Debug, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum TraceRecord<'a> {
    Compile(&'a CompileSummary),
    Event(&'a CompileEvent),
}
