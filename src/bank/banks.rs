use std::cmp::Ordering;

use serde_json::{Value, json};

use crate::bank::bank::{BankBuilder, BlockSize};
use crate::bank::components;
use crate::data::data_model::Dataset;
use crate::descriptor::descriptor_model::Args;
use crate::descriptor::ids::{Port, titlize};
use crate::error::BankError;

// ============================================================================
// Built-in bank library
//
// Every bank takes its arguments from the descriptor's bank spec, creates
// its widgets through the builder, and ends with `align`.
// ============================================================================

/// Figure for the bank's data, redrawn by whatever is connected to it.
pub fn graph(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let category = b.arg_str("category").unwrap_or("normal");
    let variant = b.arg_str("variant").unwrap_or("scatter");
    let dep_var = if category == "map" { "z" } else { "y" };

    let id = b.create_component(components::graph(b.id("graph"), b.args()));
    b.add_callback(
        &id,
        &["figure", "style"],
        "graph",
        json!({
            "category": category,
            "variant": variant,
            "dep_var": dep_var,
            "args": b.args(),
        }),
    );

    b.align(BlockSize::new([8.0, 12.0], [4.0, 4.0]));
    Ok(())
}

/// One multi-select dropdown per key column (or per `columns`).
pub fn selector(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let data = b.data();
    let columns = b.arg_strings("columns")?.unwrap_or_else(|| data.keys.clone());

    for col in &columns {
        require_column(data, col)?;
        let base = json!({
            "options": data.unique(col),
            "default": [],
            "overflow": {"dataid": b.dataid(), "column": col},
        });
        let options = merged(base, b.option_args(col));
        let label = titlize(&format!("Select {}", col));
        let widget = components::dropdown(
            b.id(&format!("{}_filter", col)),
            &options,
            true,
            Some(&label),
            b.args(),
        )?;
        b.create_component(widget);
    }

    b.align(BlockSize::new([2.0, 3.0], [1.0, 2.0]));
    Ok(())
}

/// A column picker per axis, optionally with a linear/log scale toggle
/// whose options follow the picked column's type.
pub fn axis_controls(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let axes = match b.arg_strings("axes")? {
        Some(axes) => axes,
        None => b.arg_strings("use")?.unwrap_or_else(|| vec!["y".to_string()]),
    };
    let multi = b.arg_strings("multi")?.unwrap_or_default();
    let scale = b.arg_bool("scale", false);

    let columns = b.data().columns();
    if columns.is_empty() {
        return Err(BankError::new(format!(
            "data source '{}' has no value columns",
            b.dataid()
        )));
    }

    let mut user = Args::new();
    user.insert("Dropdown.clearable".to_string(), Value::Bool(false));
    user.extend(b.args().clone());

    let mut blocks = Vec::new();
    for (axis_idx, axis) in axes.iter().enumerate() {
        let default_idx = axis_idx.min(columns.len() - 1);
        let base = json!({"options": columns, "default": columns[default_idx]});
        let options = merged(base, b.option_args(axis));
        let label = titlize(&format!("{}-Axis Data", axis));
        let dropdown = components::dropdown(
            b.id(&format!("{}_column", axis)),
            &options,
            multi.contains(axis),
            Some(&label),
            &user,
        )?;

        if !scale {
            b.create_component(dropdown);
            continue;
        }

        let drop_id = b.add_widget(dropdown);
        let radio = components::selection_list(
            b.id(&format!("{}_scale", axis)),
            &json!(["linear", "log"]),
            false,
            None,
            &Args::new(),
        )?;
        let radio_id = b.add_widget(radio);
        b.add_internal_callback(
            &radio_id,
            vec![Port::new(drop_id.clone(), "value")],
            &["options", "value"],
            "axis_scale",
            json!({"axis": axis}),
        );
        blocks.push(vec![vec![drop_id], vec![radio_id]]);
    }

    if scale {
        b.set_blocks(blocks);
    }
    b.align(BlockSize::new([1.0, 2.0], [1.0, 1.0]));
    Ok(())
}

/// Column chooser feeding a data table.
pub fn data_table(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let data = b.data();
    let rows = b.arg("rows").and_then(Value::as_u64).unwrap_or(1000);

    let columns = data.columns();
    let mut choices: Vec<Value> = columns.iter().map(|c| json!(c)).collect();
    choices.extend(data.keys.iter().map(|k| json!(k)));
    let defaults: Vec<&String> = columns.iter().take(3).collect();

    let mut overrides = Args::new();
    for key in ["options", "default"] {
        if let Some(value) = b.arg(key) {
            overrides.insert(key.to_string(), value.clone());
        }
    }
    let options = merged(json!({"options": choices, "default": defaults}), overrides);

    let label = format!("{}: Choose Columns To Show", b.dataid().to_uppercase());
    let dropdown =
        components::dropdown(b.id("columns"), &options, true, Some(&label), &Args::new())?;
    let drop_id = b.add_widget(dropdown);
    let table_id = b.add_widget(components::table(b.id("table"), None, b.args()));

    b.add_internal_callback(
        &table_id,
        vec![Port::new(drop_id.clone(), "value")],
        &["columns", "data"],
        "data_table",
        json!({"rows": rows}),
    );

    b.set_blocks(vec![vec![vec![drop_id], vec![table_id]]]);
    b.align(BlockSize::new([8.0, 12.0], [4.0, 6.0]));
    Ok(())
}

/// Slider over a date column, optionally driven by a date picker.
pub fn date_control(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let range = match b.arg_str("variant").unwrap_or("single") {
        "single" => false,
        "range" => true,
        other => return Err(BankError::new(format!("unknown date_control variant '{}'", other))),
    };
    let data = b.data();
    let column = match b.arg_str("column").filter(|c| !c.is_empty()) {
        Some(column) => column.to_string(),
        None => default_date_column(data)
            .ok_or_else(|| BankError::new("no date column to control"))?,
    };
    require_column(data, &column)?;
    let values = data.sorted_unique(&column);

    let label = format!("Select {}:", column);
    let slider = components::slider(
        b.id(&format!("{}_filter", column)),
        &values,
        range,
        false,
        Some(&label),
        &Args::new(),
    )?;
    let slider_id = b.create_component(slider);

    if !b.arg_bool("picker", false) {
        b.align(BlockSize::new([2.0, 3.0], [1.0, 2.0]));
        return Ok(());
    }

    let picker = components::date_picker(
        b.id(&format!("{}_picker", column)),
        &values,
        range,
        None,
        &Args::new(),
    )?;
    let picker_id = b.add_widget(picker);
    let inputs = if range {
        vec![
            Port::new(picker_id.clone(), "start_date"),
            Port::new(picker_id.clone(), "end_date"),
        ]
    } else {
        vec![Port::new(picker_id.clone(), "date")]
    };
    b.add_internal_callback(
        &slider_id,
        inputs,
        &["value"],
        "date_sync",
        json!({"range": range}),
    );

    b.set_blocks(vec![vec![vec![picker_id], vec![slider_id]]]);
    b.align(BlockSize::new([2.0, 4.0], [1.0, 3.0]));
    Ok(())
}

/// One headline number per entry of `components`.
pub fn indicators(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    for comp in b.arg_objects("components")? {
        let calc = comp.get("args").cloned().unwrap_or_else(|| json!({}));
        let name = comp
            .get("name")
            .and_then(Value::as_str)
            .or_else(|| calc.get("y_column").and_then(Value::as_str))
            .ok_or_else(|| BankError::new("indicator needs a 'name' or 'args.y_column'"))?
            .to_string();
        let label = comp
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| titlize(&name));
        let unit = comp.get("unit").and_then(Value::as_str).unwrap_or("");

        let widget = components::indicator(
            b.id(&format!("{}_indicator", name)),
            Some(&label),
            b.args(),
        );
        let id = b.create_component(widget);
        b.add_callback(
            &id,
            &["children"],
            "indicator",
            json!({"args": calc, "unit": unit}),
        );
    }

    b.align(BlockSize::new([2.0, 1.5], [1.0, 1.0]));
    Ok(())
}

/// Ranked list of the top items under the current filters.
pub fn ranking(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    b.default_vertical(true);
    let nformat = b.arg_str("nformat").unwrap_or("0.7g");

    let mut rank_args = Args::new();
    for key in ["key", "text_key", "column"] {
        if let Some(value) = b.arg(key) {
            rank_args.insert(key.to_string(), value.clone());
        }
    }

    let mut user = Args::new();
    user.insert("Div.style".to_string(), json!({"textAlign": "left"}));
    user.extend(b.args().clone());

    let div = components::div(b.id("ranking"), json!("<Div>"), None, &user);
    let id = b.create_component(div);
    b.add_callback(
        &id,
        &["children"],
        "ranking",
        json!({"nformat": nformat, "args": rank_args}),
    );

    b.align(BlockSize::new([4.0, 2.0], [1.0, 1.0]));
    Ok(())
}

/// Static text, or text picked from a map by a connected field.
pub fn text_box(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let text = b.arg("text").cloned().unwrap_or_else(|| json!("<info>"));
    let field = b.arg_str("cb_field").unwrap_or("column");

    let mut user = Args::new();
    user.insert(
        "Div.style".to_string(),
        json!({"textAlign": "left", "lineHeight": 1.2, "fontStyle": "italic"}),
    );
    user.extend(b.args().clone());

    match &text {
        Value::String(_) => {
            b.create_component(components::div(b.id("text"), text.clone(), None, &user));
        }
        Value::Object(choices) => {
            let default = choices
                .get("default")
                .cloned()
                .unwrap_or_else(|| json!("<default>"));
            let div = components::div(b.id("text"), default.clone(), None, &user);
            let id = b.create_component(div);
            b.add_callback(
                &id,
                &["children"],
                "text_box",
                json!({"field": field, "text": choices, "default": default}),
            );
        }
        other => {
            return Err(BankError::new(format!(
                "'text' must be a string or a map, got {}",
                other
            )));
        }
    }

    b.align(BlockSize::new([2.0, 4.0], [1.0, 1.0]));
    Ok(())
}

/// Transform pickers read by graphs: averaging window, normalization and
/// sums/rates.
pub fn analytics_set(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    if b.arg_bool("window", true) {
        let windows = [(1, "Day"), (7, "Week"), (30, "Month"), (365, "Year")];
        let options = json!({
            "options": windows
                .iter()
                .map(|(value, label)| json!({"value": value, "label": label}))
                .collect::<Vec<_>>(),
            "value": 1,
        });
        let mut user = Args::new();
        user.insert("Dropdown.clearable".to_string(), Value::Bool(false));
        let widget = components::dropdown(
            b.id("window_transform"),
            &options,
            false,
            Some("Averaging Window"),
            &user,
        )?;
        b.create_component(widget);
    }

    if b.arg_bool("normalize", true) {
        let options = json!({"options": ["None", "Max"], "default": "None"});
        let widget = components::dropdown(
            b.id("norm_transform"),
            &options,
            false,
            Some("Normalize By:"),
            &Args::new(),
        )?;
        b.create_component(widget);
    }

    if b.arg_bool("calculus", true) {
        let options = json!({
            "options": ["Acceleration", "Rate", "None", "Cumulative"],
            "default": "None",
        });
        let widget = components::dropdown(
            b.id("calc_transform"),
            &options,
            false,
            Some("Sums And Rates"),
            &Args::new(),
        )?;
        b.create_component(widget);
    }

    b.align(BlockSize::new([2.0, 2.0], [1.0, 2.0]));
    Ok(())
}

/// Free-form option widgets. Up to three options become a selection list,
/// numeric options a slider, anything else a dropdown.
pub fn option_set(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    b.default_vertical(true);

    let mut user = Args::new();
    user.insert("Dropdown.clearable".to_string(), Value::Bool(false));
    user.insert("RadioItems.labelStyle".to_string(), json!({"display": "block"}));
    user.insert("Checklist.labelStyle".to_string(), json!({"display": "block"}));

    for comp in b.arg_objects("components")? {
        let name = comp
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| BankError::new("option component needs a 'name'"))?;
        let label = comp.get("label").and_then(Value::as_str);
        let multi = comp.get("multi").and_then(Value::as_bool).unwrap_or(false);
        let options = match comp.get("options") {
            Some(Value::Array(options)) if !options.is_empty() => options,
            _ => {
                return Err(BankError::new(format!(
                    "option component '{}' needs a non-empty 'options' list",
                    name
                )));
            }
        };

        let id = b.id(name);
        let widget = if options.len() <= 3 {
            components::selection_list(id, &Value::Array(options.clone()), multi, label, &user)?
        } else if options[0].is_number() {
            let mut values = options.clone();
            values.sort_by(|x, y| {
                x.as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal)
            });
            components::slider(id, &values, false, true, label, &user)?
        } else {
            components::dropdown(id, &Value::Array(options.clone()), multi, label, &user)?
        };
        b.create_component(widget);
    }

    b.align(BlockSize::new([3.0, 2.0], [1.0, 1.0]));
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// `date` if the dataset has it, otherwise its first value column.
pub fn default_date_column(data: &Dataset) -> Option<String> {
    if data.has_column("date") {
        Some("date".to_string())
    } else {
        data.columns().into_iter().next()
    }
}

fn require_column(data: &Dataset, column: &str) -> Result<(), BankError> {
    if data.has_column(column) {
        Ok(())
    } else {
        Err(BankError::new(format!("dataset has no column '{}'", column)))
    }
}

/// `base` with every key of `overrides` written over it.
fn merged(base: Value, overrides: Args) -> Value {
    match base {
        Value::Object(mut map) => {
            map.extend(overrides);
            Value::Object(map)
        }
        other => other,
    }
}
