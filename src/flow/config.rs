use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error raised while loading a flow configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read flow file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Cannot parse flow file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// One scrape job: identity, entry point, pagination plan and the ordered
/// list of steps to run on every visited page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub name: String,
    pub engine: String,
    pub first_page: String,
    pub items_on_page: u32,
    pub paginate: bool,
    pub paginate_button: String,
    pub paginate_limit: u32,
    pub infinite: bool,
    pub infinite_scroll: u32,
    pub record: bool,
    pub flow: Vec<Step>,
}

impl FlowConfig {
    /// Load a flow from a YAML file; errors carry the file name and the
    /// parser's position information.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_text = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path_text.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path_text,
            source,
        })
    }

    /// Parse a flow from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// One unit of browser action or extraction. Which fields are non-empty
/// decides what the step does; at most one action resolves per step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub element: ElementStep,
    pub take: TakeStep,
    pub capture: CaptureStep,
    pub table: TableStep,
    pub wait_for: WaitForStep,
    pub delay: f64,
    pub scroll: i64,
    pub navigate: bool,
    pub back_to_previous: bool,
    pub wrapper: String,
}

/// Interaction target: write/value/select/multiple populate a field, while
/// `action` clicks it or presses Enter on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStep {
    pub selector: String,
    pub contains: ContainsSelector,
    pub write: String,
    pub value: String,
    pub select: String,
    pub multiple: Vec<String>,
    pub action: Option<ElementAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementAction {
    Click,
    Enter,
}

/// CSS selector narrowed by a visible-text pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainsSelector {
    pub selector: String,
    pub identifier: String,
}

/// Content extraction directive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeStep {
    pub name: String,
    pub selector: String,
    pub contains: ContainsSelector,
    pub next_to_selector: String,
    pub next_to_contains: ContainsSelector,
    pub parse: Option<TakeParse>,
    pub use_for_navigate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakeParse {
    Html,
    Text,
    Image,
    Anchor,
}

impl TakeParse {
    pub fn as_str(&self) -> &'static str {
        match self {
            TakeParse::Html => "html",
            TakeParse::Text => "text",
            TakeParse::Image => "image",
            TakeParse::Anchor => "anchor",
        }
    }
}

/// Screenshot directive; an empty selector captures the full page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureStep {
    pub name: String,
    pub selector: String,
    pub clip: CaptureClip,
}

/// Capture rectangle. Existing flow files rely on `top` being the
/// horizontal offset of the clip and `left` the vertical one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureClip {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl CaptureClip {
    /// A clip participates in the capture only when some dimension is set.
    pub fn is_set(&self) -> bool {
        self.top != 0.0 || self.left != 0.0 || self.width != 0.0 || self.height != 0.0
    }
}

/// Table extraction directive; `fields` filters columns by header text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStep {
    pub selector: String,
    pub name: String,
    pub fields: Vec<String>,
}

/// Poll for a selector before continuing; `delay` is the timeout in seconds
/// (default 10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitForStep {
    pub selector: String,
    pub delay: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_flow() {
        let yaml = r#"
name: Example search
engine: http://127.0.0.1:3000
first_page: https://example.test/search
items_on_page: 5
paginate: true
paginate_button: ".next"
paginate_limit: 3
record: true
flow:
  - element:
      selector: "input[name=q]"
      write: "rust"
  - element:
      selector: "input[name=q]"
      action: Enter
  - wait_for:
      selector: ".results"
      delay: 5
  - take:
      name: title
      selector: ".result:nth-child($item_number) h3"
      parse: text
"#;
        let config = FlowConfig::parse(yaml).expect("flow should parse");
        assert_eq!(config.name, "Example search");
        assert_eq!(config.items_on_page, 5);
        assert!(config.paginate);
        assert_eq!(config.paginate_limit, 3);
        assert_eq!(config.flow.len(), 4);
        assert_eq!(config.flow[0].element.write, "rust");
        assert_eq!(config.flow[1].element.action, Some(ElementAction::Enter));
        assert_eq!(config.flow[2].wait_for.delay, 5.0);
        assert_eq!(config.flow[3].take.parse, Some(TakeParse::Text));
    }

    #[test]
    fn defaults_leave_everything_empty() {
        let config = FlowConfig::parse("name: bare").expect("parses");
        assert_eq!(config.name, "bare");
        assert!(!config.paginate);
        assert_eq!(config.paginate_limit, 0);
        assert!(config.flow.is_empty());
    }

    #[test]
    fn parse_modes_are_lowercase() {
        let yaml = r#"
flow:
  - take:
      name: link
      selector: a
      parse: anchor
      use_for_navigate: true
"#;
        let config = FlowConfig::parse(yaml).expect("parses");
        assert_eq!(config.flow[0].take.parse, Some(TakeParse::Anchor));
        assert!(config.flow[0].take.use_for_navigate);
    }

    #[test]
    fn clip_is_set_when_any_dimension_given() {
        let clip = CaptureClip {
            width: 100.0,
            ..Default::default()
        };
        assert!(clip.is_set());
        assert!(!CaptureClip::default().is_set());
    }

    #[test]
    fn json_round_trips_with_snake_case_keys() {
        let json = r#"{"name":"x","first_page":"https://example.test","items_on_page":2,
            "paginate":true,"paginate_limit":4,
            "flow":[{"table":{"selector":"table","name":"t","fields":["a"]}}]}"#;
        let config: FlowConfig = serde_json::from_str(json).expect("decodes");
        assert_eq!(config.items_on_page, 2);
        assert_eq!(config.flow[0].table.fields, vec!["a"]);
    }
}
