use serde_json::{Value, json};
use tracing::warn;

use crate::bank::bank_model::Widget;
use crate::descriptor::descriptor_model::Args;
use crate::descriptor::ids::{ComponentId, titlize};
use crate::error::BankError;

/// Option lists longer than this are flagged; with an `overflow` source they
/// are replaced by it.
pub const MAX_OPTIONS: usize = 100;

// ============================================================================
// Argument helpers
// ============================================================================

/// Keys of `args` starting with `prefix`, with the prefix stripped.
///
/// `{"Dropdown.clearable": false}` with prefix `Dropdown.` yields
/// `{"clearable": false}`.
pub fn extract_path(prefix: &str, args: &Args) -> Args {
    args.iter()
        .filter_map(|(k, v)| {
            k.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest.to_string(), v.clone()))
        })
        .collect()
}

/// `{"options": [{label, value}...], "value": default}` from either a bare
/// list (first entry is the default) or a `{options, default}` object. An
/// object that already carries `value` is taken as-is.
pub fn gen_options(input: &Value, multi: bool) -> Result<Args, BankError> {
    let (items, default) = match input {
        Value::Array(items) => (items.clone(), items.first().cloned()),
        Value::Object(map) if map.contains_key("value") => return Ok(map.clone()),
        Value::Object(map) => {
            let items = match map.get("options") {
                Some(Value::Array(items)) => items.clone(),
                _ => return Err(BankError::new("option object needs an 'options' list")),
            };
            let default = map.get("default").cloned().or_else(|| items.first().cloned());
            (items, default)
        }
        other => {
            return Err(BankError::new(format!(
                "options must be a list or an object, got {}",
                other
            )));
        }
    };

    let options: Vec<Value> = items
        .iter()
        .map(|item| match item {
            Value::Object(_) => item.clone(),
            _ => json!({"label": option_label(item), "value": item}),
        })
        .collect();

    let value = match (default, multi) {
        (Some(Value::Array(values)), _) => Value::Array(values),
        (Some(v), true) => Value::Array(vec![v]),
        (Some(v), false) => v,
        (None, true) => Value::Array(Vec::new()),
        (None, false) => Value::Null,
    };

    let mut out = Args::new();
    out.insert("options".to_string(), Value::Array(options));
    out.insert("value".to_string(), value);
    Ok(out)
}

fn option_label(item: &Value) -> String {
    match item {
        Value::String(s) => titlize(s),
        other => other.to_string(),
    }
}

/// Tick labels for a slider: every `ceil(n / 10)`th value, keyed by its
/// text form.
pub fn gen_marks(values: &[Value]) -> Value {
    let spacing = values.len().div_ceil(10).max(1);
    let marks: Args = values
        .iter()
        .step_by(spacing)
        .map(|v| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (text.clone(), Value::String(text))
        })
        .collect();
    Value::Object(marks)
}

// ============================================================================
// Component constructors
// ============================================================================

struct Definition<'a> {
    kind: &'a str,
    lib: &'a str,
    component: &'a str,
    output: Option<&'a str>,
}

fn create(
    def: Definition<'_>,
    id: ComponentId,
    internal: Args,
    label: Option<&str>,
    user: &Args,
) -> Widget {
    let mut args = Args::new();
    args.insert("id".to_string(), Value::String(id.to_string()));
    args.extend(internal);
    args.extend(extract_path(&format!("{}.", def.component), user));

    Widget {
        id: id.into(),
        lib: def.lib.to_string(),
        component: def.component.to_string(),
        kind: def.kind.to_string(),
        label: label.map(str::to_string),
        args,
        output: def.output.map(str::to_string),
    }
}

pub fn dropdown(
    id: ComponentId,
    options: &Value,
    multi: bool,
    label: Option<&str>,
    user: &Args,
) -> Result<Widget, BankError> {
    let mut args = gen_options(options, multi)?;
    if multi {
        args.insert("multi".to_string(), Value::Bool(true));
    }

    let count = args
        .get("options")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if count > MAX_OPTIONS {
        match options.get("overflow") {
            Some(overflow) => {
                warn!("replacing {} option list with its overflow source", id);
                args.remove("options");
                args.remove("value");
                args.insert("overflow".to_string(), overflow.clone());
            }
            None => warn!(
                "dropdown {} has {} options and might render slowly",
                id, count
            ),
        }
    }

    let def = Definition {
        kind: "dropdown",
        lib: "dcc",
        component: "Dropdown",
        output: Some("value"),
    };
    Ok(create(def, id, args, label, user))
}

/// Checklist when `multi`, radio items otherwise.
pub fn selection_list(
    id: ComponentId,
    options: &Value,
    multi: bool,
    label: Option<&str>,
    user: &Args,
) -> Result<Widget, BankError> {
    let args = gen_options(options, multi)?;
    let def = Definition {
        kind: "selection_list",
        lib: "dcc",
        component: if multi { "Checklist" } else { "RadioItems" },
        output: Some("value"),
    };
    Ok(create(def, id, args, label, user))
}

/// Slider over `values` (already distinct and sorted). A range slider starts
/// at the full extent.
pub fn slider(
    id: ComponentId,
    values: &[Value],
    range: bool,
    marks: bool,
    label: Option<&str>,
    user: &Args,
) -> Result<Widget, BankError> {
    let (min, max) = match (values.first(), values.last()) {
        (Some(min), Some(max)) => (min.clone(), max.clone()),
        _ => return Err(BankError::new(format!("slider {} has no values", id))),
    };

    let mut args = Args::new();
    let value = if range {
        Value::Array(vec![min.clone(), max.clone()])
    } else {
        user.get("value").cloned().unwrap_or_else(|| min.clone())
    };
    args.insert("value".to_string(), value);
    args.insert("min".to_string(), min);
    args.insert("max".to_string(), max);
    if marks {
        args.insert("marks".to_string(), gen_marks(values));
        args.insert("step".to_string(), Value::Null);
    }

    let def = Definition {
        kind: "slider",
        lib: "dcc",
        component: if range { "RangeSlider" } else { "Slider" },
        output: Some("value"),
    };
    Ok(create(def, id, args, label, user))
}

/// Date picker bounded by the first and last of `values`.
pub fn date_picker(
    id: ComponentId,
    values: &[Value],
    range: bool,
    label: Option<&str>,
    user: &Args,
) -> Result<Widget, BankError> {
    let (min, max) = match (values.first(), values.last()) {
        (Some(min), Some(max)) => (min.clone(), max.clone()),
        _ => return Err(BankError::new(format!("date picker {} has no dates", id))),
    };

    let mut args = Args::new();
    args.insert("min_date_allowed".to_string(), min.clone());
    args.insert("max_date_allowed".to_string(), max.clone());
    args.insert("initial_visible_month".to_string(), max.clone());
    let (component, output) = if range {
        args.insert("start_date".to_string(), min);
        args.insert("end_date".to_string(), max);
        ("DatePickerRange", None)
    } else {
        args.insert("date".to_string(), max);
        ("DatePickerSingle", Some("date"))
    };

    let def = Definition {
        kind: "date_picker",
        lib: "dcc",
        component,
        output,
    };
    Ok(create(def, id, args, label, user))
}

/// Graph hidden until its first figure arrives.
pub fn graph(id: ComponentId, user: &Args) -> Widget {
    let mut style = json!({"visibility": "hidden"});
    if let Some(height) = user.get("height") {
        style["height"] = height.clone();
    }
    let mut args = Args::new();
    args.insert("style".to_string(), style);

    let def = Definition {
        kind: "graph",
        lib: "dcc",
        component: "Graph",
        output: None,
    };
    create(def, id, args, None, user)
}

pub fn table(id: ComponentId, label: Option<&str>, user: &Args) -> Widget {
    let args = json!({
        "page_action": "none",
        "filter_action": "native",
        "sort_action": "native",
        "style_table": {"overflowX": "auto", "overflowY": "auto", "height": "300px"},
        "css": [{"selector": ".row-1", "rule": "margin-right: 0px; margin-left: 0px"}],
    });
    let def = Definition {
        kind: "table",
        lib: "dash_table",
        component: "DataTable",
        output: None,
    };
    create(def, id, into_args(args), label, user)
}

pub fn indicator(id: ComponentId, label: Option<&str>, user: &Args) -> Widget {
    let args = json!({"children": "<Indicator>", "className": "h3"});
    let def = Definition {
        kind: "indicator",
        lib: "html",
        component: "H3",
        output: None,
    };
    create(def, id, into_args(args), label, user)
}

pub fn div(id: ComponentId, children: Value, label: Option<&str>, user: &Args) -> Widget {
    let mut args = Args::new();
    args.insert("children".to_string(), children);
    let def = Definition {
        kind: "div",
        lib: "html",
        component: "Div",
        output: None,
    };
    create(def, id, args, label, user)
}

fn into_args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => Args::new(),
    }
}

