use bento::bank::bank::{BankBuilder, BlockSize};
use bento::bank::bank_model::{BankOutput, Sizing};
use bento::bank::components::{self, extract_path, gen_marks, gen_options};
use bento::bank::factory::BankRegistry;
use bento::descriptor::descriptor_model::Args;
use bento::descriptor::ids::{BankId, Port, WidgetId};
use bento::error::{BankError, CompileError};
use serde_json::{Value, json};

mod common;
use crate::common::utils::sales_dataset;

fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn build(bank_type: &str, name: &str, bank_args: Value) -> BankOutput {
    try_build(bank_type, name, bank_args).unwrap()
}

fn try_build(bank_type: &str, name: &str, bank_args: Value) -> Result<BankOutput, CompileError> {
    let registry = BankRegistry::with_builtins();
    let data = sales_dataset();
    registry.create(bank_type, &BankId::new("main", name), "sales", &data, &args(bank_args))
}

fn wid(bank: &str, name: &str) -> WidgetId {
    BankId::new("main", bank).component(name).into()
}

fn widget_ids(out: &BankOutput) -> Vec<String> {
    out.widgets.iter().map(|w| w.id.to_string()).collect()
}

// ============================================================================
// Helpers
// ============================================================================

#[test]
fn extract_path_strips_prefix() {
    let user = args(json!({
        "Dropdown.clearable": false,
        "Dropdown.": 1,
        "Slider.step": 2,
        "vertical": true
    }));
    let out = extract_path("Dropdown.", &user);
    assert_eq!(Value::Object(out), json!({"clearable": false}));
}

#[test]
fn gen_options_from_list_and_object() {
    let out = gen_options(&json!(["north_east", 3]), false).unwrap();
    assert_eq!(
        Value::Object(out),
        json!({
            "options": [
                {"label": "North East", "value": "north_east"},
                {"label": "3", "value": 3}
            ],
            "value": "north_east"
        })
    );

    let out = gen_options(&json!({"options": ["a", "b"], "default": "b"}), true).unwrap();
    assert_eq!(out.get("value"), Some(&json!(["b"])));

    let out = gen_options(&json!({"options": ["a"], "default": []}), true).unwrap();
    assert_eq!(out.get("value"), Some(&json!([])));

    let ready = json!({"options": [], "value": 4});
    assert_eq!(Value::Object(gen_options(&ready, false).unwrap()), ready);

    assert!(gen_options(&json!("nope"), false).is_err());
    assert!(gen_options(&json!({"default": 1}), false).is_err());
}

#[test]
fn gen_marks_thins_long_ranges() {
    let values: Vec<Value> = (0..25).map(|i| json!(i)).collect();
    let marks = gen_marks(&values);
    let keys: Vec<&String> = marks.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["0", "3", "6", "9", "12", "15", "18", "21", "24"]);

    let few = gen_marks(&[json!("a"), json!("b")]);
    assert_eq!(few, json!({"a": "a", "b": "b"}));
}

#[test]
fn component_args_put_id_first_and_apply_user_overrides() {
    let id = BankId::new("main", "filters").component("region_filter");
    let user = args(json!({"Dropdown.clearable": false, "Slider.step": 5}));
    let widget = components::dropdown(id, &json!(["east", "west"]), false, Some("Region"), &user)
        .unwrap();

    let keys: Vec<&String> = widget.args.keys().collect();
    assert_eq!(keys, ["id", "options", "value", "clearable"]);
    assert_eq!(widget.args.get("id"), Some(&json!("main/filters|region_filter")));
    assert_eq!(widget.output.as_deref(), Some("value"));
    assert_eq!(widget.label.as_deref(), Some("Region"));
}

#[test]
fn oversized_dropdown_falls_back_to_overflow_source() {
    let id = BankId::new("main", "filters").component("big");
    let options: Vec<Value> = (0..150).map(|i| json!(i)).collect();
    let spec = json!({"options": options, "overflow": {"dataid": "sales", "column": "big"}});
    let widget = components::dropdown(id, &spec, true, None, &Args::new()).unwrap();

    assert!(widget.args.get("options").is_none());
    assert_eq!(widget.args.get("overflow"), Some(&json!({"dataid": "sales", "column": "big"})));
}

#[test]
fn display_widgets_expose_nothing() {
    let bank = BankId::new("main", "view");
    assert_eq!(components::graph(bank.component("graph"), &Args::new()).output, None);
    assert_eq!(components::table(bank.component("table"), None, &Args::new()).output, None);
    assert_eq!(components::indicator(bank.component("kpi"), None, &Args::new()).output, None);
    assert_eq!(components::div(bank.component("text"), json!("hi"), None, &Args::new()).output, None);

    let dates = [json!("2024-01-01"), json!("2024-02-01")];
    let single = components::date_picker(bank.component("pick"), &dates, false, None, &Args::new())
        .unwrap();
    assert_eq!(single.output.as_deref(), Some("date"));
    let range = components::date_picker(bank.component("pick"), &dates, true, None, &Args::new())
        .unwrap();
    assert_eq!(range.output, None);
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn callback_names_join_page_bank_and_component() {
    let data = sales_dataset();
    let bank_args = Args::new();
    let builder = BankBuilder::new(BankId::new("main", "trend"), "sales", &data, &bank_args);
    assert_eq!(builder.name_callback(&wid("trend", "graph")), "main_trend__update_graph");
}

#[test]
fn align_scales_block_size_by_block_count() {
    let data = sales_dataset();
    let horizontal = Args::new();
    let mut b = BankBuilder::new(BankId::new("main", "bank"), "sales", &data, &horizontal);
    for name in ["aa", "bb", "cc"] {
        b.create_component(components::div(b.id(name), json!(""), None, &Args::new()));
    }
    b.align(BlockSize::new([2.0, 1.5], [1.0, 1.0]));
    let out = b.finish();
    assert_eq!(out.sizing, Sizing { ideal: [2, 4], min: [1, 3] });
    assert_eq!(out.layout.len(), 1);
    assert_eq!(out.layout[0].len(), 3);

    let vertical = args(json!({"vertical": true}));
    let mut b = BankBuilder::new(BankId::new("main", "bank"), "sales", &data, &vertical);
    for name in ["aa", "bb"] {
        b.create_component(components::div(b.id(name), json!(""), None, &Args::new()));
    }
    b.align(BlockSize::new([2.0, 1.5], [1.0, 1.0]));
    let out = b.finish();
    assert_eq!(out.sizing, Sizing { ideal: [4, 1], min: [2, 1] });
    assert_eq!(out.layout.len(), 2);
}

// ============================================================================
// Built-in banks
// ============================================================================

#[test]
fn selector_exposes_one_filter_per_key() {
    let out = build("selector", "filters", json!({}));

    assert_eq!(
        widget_ids(&out),
        vec!["main/filters|region_filter", "main/filters|product_filter"]
    );
    let outputs: Vec<(String, &String)> =
        out.outputs.iter().map(|(k, v)| (k.to_string(), v)).collect();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|(_, prop)| *prop == "value"));
    assert!(out.callbacks.is_empty());
    assert_eq!(out.sizing, Sizing { ideal: [2, 6], min: [1, 4] });

    let region = &out.widgets[0];
    assert_eq!(region.label.as_deref(), Some("Select Region"));
    assert_eq!(region.args.get("value"), Some(&json!([])));
    assert_eq!(region.args.get("multi"), Some(&json!(true)));
    assert_eq!(
        region.args.get("options"),
        Some(&json!([
            {"label": "East", "value": "east"},
            {"label": "West", "value": "west"}
        ]))
    );
}

#[test]
fn selector_rejects_unknown_columns() {
    let err = try_build("selector", "filters", json!({"columns": ["profit"]})).unwrap_err();
    match err {
        CompileError::BankArguments { bank, message } => {
            assert_eq!(bank.to_string(), "main__filters");
            assert!(message.contains("profit"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn graph_bank_declares_figure_callback() {
    let out = build("graph", "trend", json!({"category": "map"}));
    let target = wid("trend", "graph");

    let callback = out.callbacks.get(&target).unwrap();
    assert_eq!(callback.name, "main_trend__update_graph");
    assert_eq!(callback.provides, vec!["figure", "style"]);
    assert_eq!(callback.dataid.as_deref(), Some("sales"));
    assert_eq!(callback.body.handler, "graph");
    assert_eq!(callback.body.params["dep_var"], json!("z"));
    assert!(out.outputs.is_empty());
    assert!(out.connectors.is_empty(), "Wired by connections or the fallback");
    assert_eq!(out.sizing, Sizing { ideal: [8, 12], min: [4, 4] });
}

#[test]
fn axis_controls_with_scale_wire_internally() {
    let out = build("axis_controls", "axes", json!({"axes": ["x", "y"], "scale": true}));

    assert_eq!(
        widget_ids(&out),
        vec![
            "main/axes|x_column",
            "main/axes|x_scale",
            "main/axes|y_column",
            "main/axes|y_scale"
        ]
    );
    let drop = &out.widgets[0];
    assert_eq!(drop.args.get("value"), Some(&json!("date")));
    assert_eq!(drop.args.get("clearable"), Some(&json!(false)));
    assert_eq!(out.widgets[2].args.get("value"), Some(&json!("revenue")));

    let radio = wid("axes", "x_scale");
    let connector = out.connectors.get(&radio).unwrap();
    assert_eq!(
        connector.inputs.iter().cloned().collect::<Vec<_>>(),
        vec![Port::new(wid("axes", "x_column"), "value")]
    );
    assert_eq!(
        connector.outputs,
        vec![Port::new(radio.clone(), "options"), Port::new(radio.clone(), "value")]
    );
    assert_eq!(out.layout.len(), 2, "Dropdown row above scale row");
    assert_eq!(out.sizing, Sizing { ideal: [1, 4], min: [1, 2] });
}

#[test]
fn data_table_feeds_table_from_column_picker() {
    let out = build("data_table", "table", json!({"rows": 50}));

    let picker = &out.widgets[0];
    assert_eq!(picker.label.as_deref(), Some("SALES: Choose Columns To Show"));
    assert_eq!(picker.args.get("value"), Some(&json!(["date", "revenue", "units"])));
    let options = picker.args.get("options").and_then(Value::as_array).unwrap();
    assert_eq!(options.len(), 5);

    let table = wid("table", "table");
    let callback = out.callbacks.get(&table).unwrap();
    assert_eq!(callback.provides, vec!["columns", "data"]);
    assert_eq!(callback.body.params, json!({"rows": 50}));
    let connector = out.connectors.get(&table).unwrap();
    assert!(connector.inputs.contains(&Port::new(wid("table", "columns"), "value")));
    assert_eq!(out.sizing, Sizing { ideal: [8, 12], min: [4, 6] });
}

#[test]
fn date_control_with_picker_syncs_slider() {
    let out = build("date_control", "dates", json!({"picker": true, "variant": "range"}));

    let slider = wid("dates", "date_filter");
    let picker = wid("dates", "date_picker");
    assert_eq!(out.widgets[0].component, "RangeSlider");
    assert_eq!(out.widgets[0].args.get("value"), Some(&json!([1, 3])));
    assert_eq!(out.outputs.get(&slider).map(String::as_str), Some("value"));
    assert!(out.outputs.get(&picker).is_none(), "Range picker exposes nothing");

    let connector = out.connectors.get(&slider).unwrap();
    assert!(connector.inputs.contains(&Port::new(picker.clone(), "start_date")));
    assert!(connector.inputs.contains(&Port::new(picker.clone(), "end_date")));
    assert_eq!(connector.outputs, vec![Port::new(slider.clone(), "value")]);
    assert_eq!(out.sizing, Sizing { ideal: [2, 4], min: [1, 3] });
}

#[test]
fn date_control_rejects_unknown_variant() {
    assert!(matches!(
        try_build("date_control", "dates", json!({"variant": "weekly"})),
        Err(CompileError::BankArguments { .. })
    ));
}

#[test]
fn indicators_name_widgets_after_their_metric() {
    let out = build(
        "indicators",
        "kpis",
        json!({"components": [
            {"args": {"y_column": "revenue"}, "unit": "$"},
            {"name": "units_sold", "label": "Units"}
        ]}),
    );

    assert_eq!(
        widget_ids(&out),
        vec!["main/kpis|revenue_indicator", "main/kpis|units_sold_indicator"]
    );
    assert_eq!(out.widgets[0].label.as_deref(), Some("Revenue"));
    assert_eq!(out.widgets[1].label.as_deref(), Some("Units"));
    let callback = out.callbacks.get(&wid("kpis", "revenue_indicator")).unwrap();
    assert_eq!(callback.body.params["unit"], json!("$"));
    assert_eq!(out.sizing, Sizing { ideal: [2, 3], min: [1, 2] });

    assert!(try_build("indicators", "kpis", json!({})).is_err());
}

#[test]
fn text_box_with_choices_gets_a_callback() {
    let fixed = build("text_box", "notes", json!({"text": "Hello"}));
    assert!(fixed.callbacks.is_empty());
    assert_eq!(fixed.widgets[0].args.get("children"), Some(&json!("Hello")));

    let dynamic = build(
        "text_box",
        "notes",
        json!({"text": {"revenue": "Money in"}, "cb_field": "column"}),
    );
    let target = wid("notes", "text");
    assert_eq!(dynamic.widgets[0].args.get("children"), Some(&json!("<default>")));
    assert_eq!(dynamic.callbacks.get(&target).unwrap().provides, vec!["children"]);

    assert!(try_build("text_box", "notes", json!({"text": 3})).is_err());
}

#[test]
fn ranking_stacks_vertically_by_default() {
    let out = build("ranking", "top", json!({"column": "revenue"}));
    assert_eq!(out.sizing, Sizing { ideal: [4, 2], min: [1, 1] });
    let callback = out.callbacks.get(&wid("top", "ranking")).unwrap();
    assert_eq!(callback.body.params["args"], json!({"column": "revenue"}));
    assert_eq!(callback.body.params["nformat"], json!("0.7g"));
}

#[test]
fn analytics_set_toggles_its_pickers() {
    let all = build("analytics_set", "analytics", json!({}));
    assert_eq!(all.widgets.len(), 3);
    assert_eq!(all.sizing, Sizing { ideal: [2, 6], min: [1, 6] });
    assert_eq!(all.widgets[0].args.get("value"), Some(&json!(1)));

    let some = build("analytics_set", "analytics", json!({"calculus": false, "window": false}));
    assert_eq!(widget_ids(&some), vec!["main/analytics|norm_transform"]);
}

#[test]
fn option_set_picks_widget_by_option_shape() {
    let out = build(
        "option_set",
        "options",
        json!({"components": [
            {"name": "mode", "options": ["fast", "slow"]},
            {"name": "level", "options": [5, 1, 3, 2]},
            {"name": "flavor", "options": ["a", "b", "c", "d"], "multi": true}
        ]}),
    );

    let components: Vec<&str> = out.widgets.iter().map(|w| w.component.as_str()).collect();
    assert_eq!(components, vec!["RadioItems", "Slider", "Dropdown"]);
    assert_eq!(out.widgets[1].args.get("min"), Some(&json!(1)));
    assert_eq!(out.widgets[1].args.get("max"), Some(&json!(5)));
    assert_eq!(out.widgets[0].args.get("labelStyle"), Some(&json!({"display": "block"})));
    assert_eq!(out.sizing, Sizing { ideal: [9, 2], min: [3, 1] });

    let err = try_build("option_set", "options", json!({"components": [{"name": "x1", "options": []}]}));
    assert!(err.is_err());
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn registry_lists_builtin_types_in_order() {
    let registry = BankRegistry::default();
    assert_eq!(
        registry.types(),
        vec![
            "graph",
            "selector",
            "axis_controls",
            "data_table",
            "date_control",
            "indicators",
            "ranking",
            "text_box",
            "analytics_set",
            "option_set"
        ]
    );
}

#[test]
fn unknown_type_is_reported_with_its_bank() {
    let err = try_build("sparkline", "spark", json!({})).unwrap_err();
    match err {
        CompileError::UnknownBankType { bank, bank_type } => {
            assert_eq!(bank, BankId::new("main", "spark"));
            assert_eq!(bank_type, "sparkline");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

fn banner(b: &mut BankBuilder<'_>) -> Result<(), BankError> {
    let text = b.arg_str("text").unwrap_or("hi").to_string();
    b.create_component(components::div(b.id("banner"), json!(text), None, &Args::new()));
    b.align(BlockSize::new([1.0, 12.0], [1.0, 6.0]));
    Ok(())
}

#[test]
fn custom_factories_register_by_name() {
    let mut registry = BankRegistry::new();
    registry.register("banner", banner);
    assert!(registry.contains("banner"));
    assert!(!registry.contains("graph"));

    let data = sales_dataset();
    let out = registry
        .create("banner", &BankId::new("main", "top"), "sales", &data, &args(json!({"text": "Q3"})))
        .unwrap();
    assert_eq!(out.widgets[0].args.get("children"), Some(&json!("Q3")));
    assert_eq!(out.sizing, Sizing { ideal: [1, 12], min: [1, 6] });
}
