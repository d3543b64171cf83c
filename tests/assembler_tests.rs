use std::collections::BTreeSet;

use bento::bank::bank_model::{BankOutput, Callback, CallbackBody, Connector};
use bento::bank::factory::BankRegistry;
use bento::data::loader::{LoaderRegistry, load_all};
use bento::descriptor::descriptor_model::Descriptor;
use bento::descriptor::ids::{BankId, Port, WidgetId};
use bento::descriptor::normalize::normalize;
use bento::descriptor::normalized_model::Connection;
use bento::error::CompileError;
use bento::graph::assembler::{Compilation, assemble};
use bento::graph::context::{BuildContext, LOCATION, PAGE, page_load_trigger};
use bento::graph::matching::{SinkPattern, source_outputs};
use bento::grid::grid::GridConfig;
use bento::trace::trace::EventKind;
use serde_json::json;

mod common;
use crate::common::utils::dashboard;

fn assemble_desc(desc: &Descriptor) -> Result<Compilation, CompileError> {
    let norm = normalize(desc)?;
    let (data, _) = load_all(&norm.data, &LoaderRegistry::default());
    assemble(&norm, &data, &BankRegistry::default(), &GridConfig::default(), false)
}

fn wid(bank: &str, name: &str) -> WidgetId {
    BankId::new("main", bank).component(name).into()
}

fn port(bank: &str, name: &str, property: &str) -> Port {
    Port::new(wid(bank, name), property)
}

fn callback(provides: &[&str]) -> Callback {
    Callback {
        name: "cb".to_string(),
        provides: provides.iter().map(|p| p.to_string()).collect(),
        dataid: None,
        body: CallbackBody::new("noop", json!(null)),
    }
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn sink_patterns_search_rather_than_full_match() {
    let pattern = SinkPattern::new("main/trend").unwrap();
    assert!(pattern.matches(&wid("trend", "graph")));
    assert!(pattern.matches(&wid("trend_2", "graph")));
    assert!(!pattern.matches(&wid("other", "graph")));
    assert!(!pattern.matches(&WidgetId::app(PAGE)));
    assert_eq!(pattern.as_str(), "main/trend");

    let anchored = SinkPattern::new(r"main/trend\|").unwrap();
    assert!(!anchored.matches(&wid("trend_2", "graph")));
}

#[test]
fn source_outputs_take_every_output_of_the_bank() {
    let mut ctx = BuildContext::new(false);
    let mut out = BankOutput::default();
    out.outputs.insert(wid("filters", "a_filter"), "value".to_string());
    out.outputs.insert(wid("filters", "b_filter"), "value".to_string());
    ctx.register_bank(&BankId::new("main", "filters"), out).unwrap();
    let mut other = BankOutput::default();
    other.outputs.insert(wid("filters_2", "c_filter"), "value".to_string());
    ctx.register_bank(&BankId::new("main", "filters_2"), other).unwrap();

    let ports = source_outputs(&BankId::new("main", "filters"), ctx.outputs());
    assert_eq!(
        ports,
        vec![port("filters", "a_filter", "value"), port("filters", "b_filter", "value")]
    );
}

// ============================================================================
// End-to-end wiring
// ============================================================================

#[test]
fn connection_feeds_source_outputs_into_sink_callback() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      filters: {type: selector}
      trend: {type: graph}
    connections:
      filters: [trend]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;

    let target = wid("trend", "graph");
    let connector = ctx.connectors.get(&target).unwrap();
    let expected: BTreeSet<Port> = [
        port("filters", "region_filter", "value"),
        port("filters", "product_filter", "value"),
    ]
    .into_iter()
    .collect();
    assert_eq!(connector.inputs, expected);
    assert_eq!(
        connector.outputs,
        vec![Port::new(target.clone(), "figure"), Port::new(target.clone(), "style")]
    );
}

#[test]
fn pruned_source_leaves_no_trace() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      trend: {type: graph}
    connections:
      ghost: [trend]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;

    for connector in ctx.connectors.values() {
        assert!(connector.inputs.iter().all(|p| !p.widget.to_string().contains("ghost")));
    }
    let connector = ctx.connectors.get(&wid("trend", "graph")).unwrap();
    assert_eq!(connector.inputs, [page_load_trigger()].into_iter().collect());
}

#[test]
fn unconnected_callbacks_fire_on_page_load() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      kpis:
        type: indicators
        args:
          components: [{name: revenue}]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;

    let connector = ctx.connectors.get(&wid("kpis", "revenue_indicator")).unwrap();
    assert!(connector.inputs.contains(&Port::new(WidgetId::app(LOCATION), "pathname")));
    assert_eq!(connector.outputs, vec![port("kpis", "revenue_indicator", "children")]);
}

#[test]
fn sink_pattern_also_reaches_prefixed_banks() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      filters: {type: selector, args: {columns: [region]}}
      trend: {type: graph}
      trend_2: {type: graph}
    connections:
      filters: [trend]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;

    let input = port("filters", "region_filter", "value");
    for bank in ["trend", "trend_2"] {
        let connector = ctx.connectors.get(&wid(bank, "graph")).unwrap();
        assert!(connector.inputs.contains(&input), "{} not wired", bank);
        assert!(!connector.inputs.contains(&page_load_trigger()));
    }
}

#[test]
fn internal_connectors_keep_their_inputs_and_gain_connections() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      dates: {type: date_control, args: {picker: true}}
      table: {type: data_table}
    connections:
      dates: [table]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;

    let connector = ctx.connectors.get(&wid("table", "table")).unwrap();
    assert!(connector.inputs.contains(&port("table", "columns", "value")));
    assert!(connector.inputs.contains(&port("dates", "date_filter", "value")));
    assert!(connector.inputs.contains(&port("dates", "date_picker", "date")));
    assert!(!connector.inputs.contains(&page_load_trigger()));
}

#[test]
fn every_producing_callback_has_a_matching_connector() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      filters: {type: selector}
      axes: {type: axis_controls, args: {scale: true}}
      trend: {type: graph}
      table: {type: data_table}
      notes: {type: text_box, args: {text: {revenue: Money}}}
      top: {type: ranking}
    connections:
      filters: [trend, table, top]
      axes: [trend]
  detail:
    banks:
      dates: {type: date_control, args: {picker: true, variant: range}}
      trend: {type: graph}
    connections:
      dates: [trend]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;

    for (target, callback) in ctx.callbacks.iter() {
        if callback.provides.is_empty() {
            continue;
        }
        let connector = ctx
            .connectors
            .get(target)
            .unwrap_or_else(|| panic!("no connector for {}", target));
        let outputs: Vec<&str> = connector.outputs.iter().map(|p| p.property.as_str()).collect();
        assert_eq!(outputs, callback.provides, "order for {}", target);
        assert!(connector.outputs.iter().all(|p| p.widget == *target));
    }
    assert_eq!(ctx.connectors.len(), ctx.callbacks.len());
}

#[test]
fn router_is_always_present() {
    let desc = dashboard("pages:\n  main:\n    banks:\n      notes: {type: text_box}\n");
    let ctx = assemble_desc(&desc).unwrap().context;

    let page = WidgetId::app(PAGE);
    let router = ctx.callbacks.get(&page).unwrap();
    assert_eq!(router.name, "update_page");
    assert_eq!(router.provides, vec!["children"]);
    let connector = ctx.connectors.get(&page).unwrap();
    assert_eq!(connector.inputs, [page_load_trigger()].into_iter().collect());
    assert_eq!(connector.outputs, vec![Port::new(page, "children")]);
}

#[test]
fn pages_do_not_wire_into_each_other() {
    let desc = dashboard(
        r#"
pages:
  main:
    banks:
      trend: {type: graph}
  other:
    banks:
      filters: {type: selector}
    connections:
      filters: [trend]
"#,
    );
    let compilation = assemble_desc(&desc).unwrap();
    let connector = compilation.context.connectors.get(&wid("trend", "graph")).unwrap();
    assert_eq!(connector.inputs, [page_load_trigger()].into_iter().collect());
    assert!(
        compilation
            .events
            .iter()
            .any(|e| e.kind == EventKind::SinkUnmatched && e.subject == "other__filters")
    );
}

#[test]
fn alternation_sinks_escape_the_page_prefix() {
    let desc = dashboard(
        r#"
pages:
  early:
    banks:
      trend: {type: graph}
  main:
    banks:
      filters: {type: selector, args: {columns: [region]}}
      trend: {type: graph}
    connections:
      filters: ["trend|graph"]
"#,
    );
    let ctx = assemble_desc(&desc).unwrap().context;
    let input = port("filters", "region_filter", "value");

    let own = ctx.connectors.get(&wid("trend", "graph")).unwrap();
    assert!(own.inputs.contains(&input));

    // `main/trend|graph` is `main/trend` or any id containing `graph`
    let early: WidgetId = BankId::new("early", "trend").component("graph").into();
    let foreign = ctx.connectors.get(&early).unwrap();
    assert!(foreign.inputs.contains(&input));
    assert!(foreign.inputs.contains(&page_load_trigger()), "Fallback ran first");
}

// ============================================================================
// BuildContext checks
// ============================================================================

#[test]
fn connect_records_unmatched_sinks() {
    let mut ctx = BuildContext::new(false);
    let connection = Connection {
        source: BankId::new("main", "filters"),
        sinks: vec!["main/nothing".to_string()],
    };
    ctx.connect(&connection).unwrap();

    assert_eq!(ctx.events().len(), 1);
    assert_eq!(ctx.events()[0].kind, EventKind::SinkUnmatched);
    assert_eq!(ctx.events()[0].detail.as_deref(), Some("main/nothing"));
}

#[test]
fn connect_rejects_malformed_patterns() {
    let mut ctx = BuildContext::new(false);
    let connection = Connection {
        source: BankId::new("main", "filters"),
        sinks: vec!["main/(".to_string()],
    };
    let err = ctx.connect(&connection).unwrap_err();
    match err {
        CompileError::Validation(v) => assert!(v.has_path("pages.main.connections.filters")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn one_property_two_producers_is_an_error() {
    let mut ctx = BuildContext::new(false);
    let shared = port("panel", "text", "children");
    let mut out = BankOutput::default();
    for name in ["left", "right"] {
        let target = wid("panel", name);
        out.callbacks.insert(target.clone(), callback(&["children"]));
        out.connectors.insert(
            target,
            Connector {
                inputs: BTreeSet::new(),
                outputs: vec![shared.clone()],
            },
        );
    }
    ctx.register_bank(&BankId::new("main", "panel"), out).unwrap();

    match ctx.finish().unwrap_err() {
        CompileError::ConflictingOutput { port, first, second } => {
            assert_eq!(port, shared);
            assert_eq!(first, wid("panel", "left"));
            assert_eq!(second, wid("panel", "right"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn connector_outputs_must_follow_provides() {
    let mut ctx = BuildContext::new(false);
    let target = wid("panel", "text");
    let mut out = BankOutput::default();
    out.callbacks.insert(target.clone(), callback(&["children", "style"]));
    out.connectors.insert(
        target.clone(),
        Connector {
            inputs: BTreeSet::new(),
            outputs: vec![
                Port::new(target.clone(), "style"),
                Port::new(target.clone(), "children"),
            ],
        },
    );
    ctx.register_bank(&BankId::new("main", "panel"), out).unwrap();

    assert!(matches!(
        ctx.finish(),
        Err(CompileError::ConnectorMismatch { callback }) if callback == target
    ));
}

#[test]
fn later_banks_override_and_are_reported() {
    let mut ctx = BuildContext::new(false);
    let target = wid("panel", "text");
    for bank in ["first", "second"] {
        let mut out = BankOutput::default();
        out.outputs.insert(target.clone(), format!("{}_value", bank));
        out.callbacks.insert(target.clone(), callback(&["children"]));
        ctx.register_bank(&BankId::new("main", bank), out).unwrap();
    }

    let kinds: Vec<EventKind> = ctx.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::OutputOverridden, EventKind::CallbackOverridden]);
    assert_eq!(ctx.outputs().get(&target).map(String::as_str), Some("second_value"));
}

#[test]
fn fallback_skips_callbacks_that_provide_nothing() {
    let mut ctx = BuildContext::new(false);
    let mut out = BankOutput::default();
    out.callbacks.insert(wid("panel", "silent"), callback(&[]));
    out.callbacks.insert(wid("panel", "loud"), callback(&["children"]));
    ctx.register_bank(&BankId::new("main", "panel"), out).unwrap();
    ctx.fallback();

    assert!(ctx.connectors().get(&wid("panel", "silent")).is_none());
    let loud = ctx.connectors().get(&wid("panel", "loud")).unwrap();
    assert!(loud.inputs.contains(&page_load_trigger()));
}
