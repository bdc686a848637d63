//! Executor-level tests that need no browser: configuration, step
//! classification, pagination arithmetic, table walking, and the response
//! envelope shape.

use talon::flow::limits::{self, Ceilings, Limits};
use talon::flow::step::{classify, StepAction};
use talon::flow::{FlowConfig, LoopIndices, ResultContent, RunResult, TableStep};
use talon::selectors;
use talon::util::absolutize;

// ── Flow configuration ──────────────────────────────────────────────────

#[test]
fn yaml_flow_classifies_into_the_expected_action_sequence() {
    let yaml = r#"
name: Search and extract
engine: http://127.0.0.1:3000
first_page: https://example.test/search
flow:
  - wrapper: ".results"
  - element:
      selector: "input[name=q]"
      write: "rust"
  - element:
      selector: "input[name=q]"
      action: Enter
  - wait_for:
      selector: ".result"
  - delay: 2
  - scroll: 3
  - take:
      name: first_link
      selector: ".result a"
      parse: anchor
      use_for_navigate: true
  - navigate: true
  - take:
      name: detail
      selector: "h1"
      parse: text
  - back_to_previous: true
  - capture:
      name: overview
  - table:
      selector: "table.prices"
      name: prices
"#;
    let config = FlowConfig::parse(yaml).expect("flow parses");
    let actions: Vec<StepAction> = config.flow.iter().map(classify).collect();

    assert_eq!(
        actions,
        vec![
            StepAction::Nothing, // wrapper only
            StepAction::Write,
            StepAction::Enter,
            StepAction::WaitFor,
            StepAction::Delay,
            StepAction::Scroll,
            StepAction::Take,
            StepAction::Navigate,
            StepAction::Take,
            StepAction::BackToPrevious,
            StepAction::Capture,
            StepAction::Table,
        ]
    );
}

#[test]
fn one_step_resolves_to_exactly_one_action() {
    // A step carrying every field family still picks one action.
    let yaml = r#"
flow:
  - delay: 1
    scroll: 5
    navigate: true
    element:
      selector: "a"
      action: Click
    take:
      name: x
      selector: "a"
      parse: html
    table:
      selector: "table"
      name: t
"#;
    let config = FlowConfig::parse(yaml).expect("parses");
    assert_eq!(classify(&config.flow[0]), StepAction::Delay);
}

// ── Pagination arithmetic ───────────────────────────────────────────────

#[test]
fn items_times_pages_bounds_the_run_and_clicks_between_pages() {
    // items_on_page=N, paginate_limit=K: N*K iterations, K-1 advances.
    let (n, k) = (4u32, 5u32);
    let mut request = FlowConfig::default();
    request.paginate = true;
    request.paginate_limit = k;
    request.items_on_page = n;

    let mut errors = Vec::new();
    let bounds = limits::compute(&request, Ceilings::default(), &mut errors);
    assert_eq!(bounds.effective(), n * k);

    let advances: Vec<u32> = (0..bounds.effective())
        .filter(|index| bounds.advance_at(*index))
        .collect();
    assert_eq!(advances.len(), (k - 1) as usize);
    assert!(advances.iter().all(|index| index % n == 0 && *index > 0));
}

#[test]
fn env_ceiling_clamps_pagination_with_the_documented_message() {
    let mut request = FlowConfig::default();
    request.paginate = true;
    request.paginate_limit = 5;

    let ceilings = Ceilings {
        max_paginate_limit: Some(2),
        max_items_on_page: None,
    };
    let mut errors = Vec::new();
    let bounds = limits::compute(&request, ceilings, &mut errors);

    assert_eq!(bounds.effective(), 2);
    assert_eq!(
        errors,
        vec!["Maximum pagination only 2 times, but requested 5 times".to_string()]
    );
}

#[test]
fn infinite_scroll_advances_before_every_page_after_the_first() {
    let mut request = FlowConfig::default();
    request.infinite = true;
    request.infinite_scroll = 3;
    request.items_on_page = 1;

    let mut errors = Vec::new();
    let bounds = limits::compute(&request, Ceilings::default(), &mut errors);

    assert_eq!(bounds.effective(), 3);
    let advances: Vec<u32> = (0..bounds.effective())
        .filter(|index| bounds.advance_at(*index))
        .collect();
    assert_eq!(advances, vec![1, 2]);
}

#[test]
fn result_pages_would_number_contiguously_from_one() {
    let bounds = Limits {
        paginate_limit: 3,
        items_on_page: 2,
    };
    let pages: Vec<u32> = (0..bounds.effective()).map(|index| index + 1).collect();
    assert_eq!(pages, vec![1, 2, 3, 4, 5, 6]);
}

// ── Selector composition across a window ────────────────────────────────

#[test]
fn item_tokens_cycle_within_the_window_while_loop_tokens_advance() {
    let selector = ".row:nth-child($item_number)";
    let rendered: Vec<String> = (0..6)
        .map(|paginate_index| {
            selectors::substitute(
                selector,
                LoopIndices {
                    paginate_index,
                    items_on_page: 3,
                },
            )
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            ".row:nth-child(1)",
            ".row:nth-child(2)",
            ".row:nth-child(3)",
            ".row:nth-child(1)",
            ".row:nth-child(2)",
            ".row:nth-child(3)",
        ]
    );
}

// ── Absolutization invariant ────────────────────────────────────────────

#[test]
fn absolutized_urls_carry_exactly_one_scheme_delimiter() {
    let origin = "https://example.test";
    for href in ["/a", "a/b", "//a//b", "/a//b/", "detail?page=2"] {
        let out = absolutize(origin, href);
        assert_eq!(out.matches("://").count(), 1, "href {:?} gave {}", href, out);
        assert!(out.starts_with("https://example.test/"));
    }
}

// ── Table walking (full payload) ────────────────────────────────────────

#[test]
fn two_by_two_table_produces_the_documented_payload() {
    let html = "<table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2</td></tr></table>";
    let step = TableStep {
        selector: "table".to_string(),
        name: "t".to_string(),
        fields: Vec::new(),
    };
    let table = talon::extract::table::walk(html, &step, "https://example.test");
    let json = serde_json::to_value(&table).expect("serializes");

    assert_eq!(json["column"], 2);
    assert_eq!(json["row"], 1);
    assert_eq!(
        json["header"],
        serde_json::json!([
            { "index": 1, "length": 1, "content": "a" },
            { "index": 2, "length": 1, "content": "b" },
        ])
    );
    assert_eq!(json["data"][0][0]["index"], 1);
    assert_eq!(json["data"][0][0]["name"], "a");
    assert_eq!(json["data"][0][0]["content"], "1");
    assert_eq!(json["data"][0][1]["index"], 2);
    assert_eq!(json["data"][0][1]["name"], "b");
    assert_eq!(json["data"][0][1]["content"], "2");
}

// ── Envelope shape ──────────────────────────────────────────────────────

#[test]
fn envelope_wire_format_matches_the_driver_contract() {
    let envelope = RunResult {
        id: "abcdef123456".to_string(),
        code: 200,
        name: "Example".to_string(),
        slug: "example-abcdef123456".to_string(),
        message: "The flow is running successfully".to_string(),
        duration: 1234,
        first_page: "https://example.test".to_string(),
        result: vec![talon::flow::ResultPage {
            title: "Example".to_string(),
            url: "https://example.test".to_string(),
            page: 1,
            duration: 1200,
            content: vec![ResultContent::new("text", "title", "Hello".to_string())],
        }],
        ..Default::default()
    };

    let json = serde_json::to_value(&envelope).expect("serializes");
    assert_eq!(json["code"], 200);
    assert_eq!(json["result"][0]["page"], 1);
    assert_eq!(json["result"][0]["content"][0]["type"], "text");
    assert_eq!(json["result"][0]["content"][0]["length"], 5);
    assert_eq!(json["errors"], serde_json::json!([]));

    // And it round-trips through the driver's decode path.
    let decoded: RunResult = serde_json::from_value(json).expect("decodes");
    assert_eq!(decoded.result.len(), 1);
    assert_eq!(decoded.result[0].content[0].content, "Hello");
}
