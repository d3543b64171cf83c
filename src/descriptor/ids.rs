use std::fmt;

use serde::{Serialize, Serializer};

/// Delimiter between page and bank in a bank id: `{page}__{bank}`.
pub const BANK_DELIM: &str = "__";

/// Delimiter between page and bank when a bank is referenced inside a
/// widget id or a sink pattern: `{page}/{bank}`.
pub const SINK_DELIM: &str = "/";

/// Delimiter between the bank part and the local widget name.
pub const COMPONENT_DELIM: &str = "|";

// ============================================================================
// BankId
// ============================================================================

/// Globally unique identity of a bank: the page it lives on plus its local
/// name. Rendered as `{page}__{bank}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BankId {
    pub pageid: String,
    pub bankid: String,
}

impl BankId {
    pub fn new(pageid: &str, bankid: &str) -> Self {
        Self {
            pageid: pageid.to_string(),
            bankid: bankid.to_string(),
        }
    }

    /// Identity of a widget named `name` inside this bank.
    pub fn component(&self, name: &str) -> ComponentId {
        ComponentId {
            pageid: self.pageid.clone(),
            bankid: self.bankid.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pageid, BANK_DELIM, self.bankid)
    }
}

impl Serialize for BankId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PartialEq<str> for BankId {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

// ============================================================================
// ComponentId / WidgetId
// ============================================================================

/// Structured key of a widget created by a bank. The string view
/// `{page}/{bank}|{name}` is what sink patterns are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    pub pageid: String,
    pub bankid: String,
    pub name: String,
}

impl ComponentId {
    pub fn belongs_to(&self, bank: &BankId) -> bool {
        self.pageid == bank.pageid && self.bankid == bank.bankid
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.pageid, SINK_DELIM, self.bankid, COMPONENT_DELIM, self.name
        )
    }
}

/// Any widget the compiled app refers to: either one created by a bank, or
/// one of the fixed application-shell widgets (`location`, `page`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetId {
    App(String),
    Bank(ComponentId),
}

impl WidgetId {
    pub fn app(name: &str) -> Self {
        WidgetId::App(name.to_string())
    }

    pub fn component(&self) -> Option<&ComponentId> {
        match self {
            WidgetId::Bank(cid) => Some(cid),
            WidgetId::App(_) => None,
        }
    }

    /// Local widget name: the part after `|`, or the shell name.
    pub fn local_name(&self) -> &str {
        match self {
            WidgetId::App(name) => name,
            WidgetId::Bank(cid) => &cid.name,
        }
    }

    pub fn belongs_to(&self, bank: &BankId) -> bool {
        self.component().is_some_and(|cid| cid.belongs_to(bank))
    }
}

impl From<ComponentId> for WidgetId {
    fn from(cid: ComponentId) -> Self {
        WidgetId::Bank(cid)
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetId::App(name) => f.write_str(name),
            WidgetId::Bank(cid) => cid.fmt(f),
        }
    }
}

impl Serialize for WidgetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Port: one property of one widget
// ============================================================================

/// A `(widget id, property)` pair, the unit connectors are built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Port {
    pub widget: WidgetId,
    pub property: String,
}

impl Port {
    pub fn new(widget: impl Into<WidgetId>, property: &str) -> Self {
        Self {
            widget: widget.into(),
            property: property.to_string(),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.widget, self.property)
    }
}

/// Underscores to spaces, each word title-cased.
pub fn titlize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(if c == '_' { ' ' } else { c });
            at_word_start = true;
        }
    }
    out
}
