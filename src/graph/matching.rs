use regex::Regex;

use crate::bank::bank_model::Callback;
use crate::descriptor::ids::{BankId, Port, WidgetId};
use crate::descriptor::ordered::OrderedMap;

/// A connection sink pattern, matched against the string view of callback
/// target ids (`{page}/{bank}|{component}`).
///
/// Matching is a regex *search*, not a full match: `main/graph` matches the
/// callbacks of `main/graph` and also those of `main/graph_2`. Sink patterns
/// are written relative to their page, so the `{page}/` prefix is part of the
/// pattern. The prefix only binds the first alternative: `main/trend|graph`
/// also matches `graph` widgets of any page whose callbacks are already
/// registered.
#[derive(Debug, Clone)]
pub struct SinkPattern {
    regex: Regex,
}

impl SinkPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, target: &WidgetId) -> bool {
        self.regex.is_match(&target.to_string())
    }

    /// Targets of every callback this pattern matches, in registry order.
    pub fn matching_callbacks(&self, callbacks: &OrderedMap<WidgetId, Callback>) -> Vec<WidgetId> {
        callbacks
            .keys()
            .filter(|target| self.matches(target))
            .cloned()
            .collect()
    }
}

/// Every output exposed by a widget of `source`, as `(widget, property)`.
///
/// A bank contributes all of its outputs, not just one.
pub fn source_outputs(source: &BankId, outputs: &OrderedMap<WidgetId, String>) -> Vec<Port> {
    outputs
        .iter()
        .filter(|(widget, _)| widget.belongs_to(source))
        .map(|(widget, prop)| Port::new(widget.clone(), prop))
        .collect()
}
