use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::time::Duration;

use crate::extract;
use crate::flow::{ElementAction, LoopIndices, ResultContent, RunState, Step};
use crate::interaction::navigate::NavigateFailure;
use crate::interaction::{click, input, navigate, scroll, wait};
use crate::selectors::{self, Resolution};

/// The single action a step performs. Earlier variants win when a step sets
/// several field families at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Delay,
    WaitFor,
    Scroll,
    Navigate,
    BackToPrevious,
    Click,
    Enter,
    Write,
    Value,
    Select,
    Multiple,
    Capture,
    Take,
    Table,
    Nothing,
}

/// Pick the one action a step resolves to, in fixed precedence.
pub fn classify(step: &Step) -> StepAction {
    if step.delay > 0.0 {
        StepAction::Delay
    } else if !step.wait_for.selector.is_empty() {
        StepAction::WaitFor
    } else if step.scroll > 0 {
        StepAction::Scroll
    } else if step.navigate {
        StepAction::Navigate
    } else if step.back_to_previous {
        StepAction::BackToPrevious
    } else if step.element.action == Some(ElementAction::Click) {
        StepAction::Click
    } else if step.element.action == Some(ElementAction::Enter) {
        StepAction::Enter
    } else if !step.element.write.is_empty() {
        StepAction::Write
    } else if !step.element.value.is_empty() {
        StepAction::Value
    } else if !step.element.select.is_empty() {
        StepAction::Select
    } else if !step.element.multiple.is_empty() {
        StepAction::Multiple
    } else if !step.capture.name.is_empty() {
        StepAction::Capture
    } else if step.take.parse.is_some() {
        StepAction::Take
    } else if !step.table.name.is_empty() {
        StepAction::Table
    } else {
        StepAction::Nothing
    }
}

/// Whether the action operates on a resolved element.
pub fn needs_element(action: StepAction) -> bool {
    matches!(
        action,
        StepAction::Click
            | StepAction::Enter
            | StepAction::Write
            | StepAction::Value
            | StepAction::Select
            | StepAction::Multiple
            | StepAction::Capture
            | StepAction::Take
            | StepAction::Table
    )
}

/// Execute one step against the page. At most one content item comes back;
/// items with empty content are dropped. Every failure here is recoverable:
/// it lands in the run's error list and the flow continues.
pub async fn execute(
    page: &Page,
    step: &Step,
    state: &mut RunState,
    indices: LoopIndices,
) -> Option<ResultContent> {
    if !step.wrapper.is_empty() {
        state.wrapper_selector = step.wrapper.clone();
    }

    let action = classify(step);
    let composed = selectors::compose(step, &state.wrapper_selector, indices);

    let element = if needs_element(action) {
        match selectors::resolve(page, &composed).await {
            Resolution::Found(element) => Some(element),
            Resolution::NotFound => {
                state.record_error(format!(
                    "Failed to find selector {} for {}",
                    composed.display(),
                    composed.field
                ));
                None
            }
            Resolution::DriverError(cause) => {
                tracing::debug!("selector resolution failed: {}", cause);
                state.record_error(format!(
                    "Failed to find selector {} for {}",
                    composed.display(),
                    composed.field
                ));
                None
            }
        }
    } else {
        None
    };

    let content = match action {
        StepAction::Delay => {
            tokio::time::sleep(Duration::from_secs_f64(step.delay)).await;
            None
        }
        StepAction::WaitFor => {
            let timeout = if step.wait_for.delay > 0.0 {
                Duration::from_secs_f64(step.wait_for.delay)
            } else {
                wait::WAIT_FOR_TIMEOUT
            };
            if !wait::wait_for_selector(page, &composed.selector, timeout).await {
                state.record_error(format!(
                    "Failed to wait for selector {}",
                    selectors::sanitize(&composed.selector)
                ));
            }
            None
        }
        StepAction::Scroll => {
            if let Err(e) = scroll::scroll_ticks(page, step.scroll).await {
                tracing::debug!("scroll failed: {}", e);
            }
            None
        }
        StepAction::Navigate => {
            if let Some(url) = state.pending_navigate_url.take() {
                state.wrapper_selector.clear();
                tracing::info!("navigating to extracted url {}", url);
                match navigate::goto_settled(page, &url).await {
                    Ok(()) => {}
                    Err(NavigateFailure::DeadlineExceeded) => state.record_error(format!(
                        "Failed to navigate to {}, due to context deadline exceeded",
                        url
                    )),
                    Err(NavigateFailure::PageError(cause)) => {
                        tracing::debug!("navigation failed: {}", cause);
                        state.record_error(format!(
                            "Failed to navigate to {}, due to error on requested page",
                            url
                        ));
                    }
                }
            }
            None
        }
        StepAction::BackToPrevious => {
            state.wrapper_selector.clear();
            if let Err(e) = navigate::back_settled(page).await {
                tracing::debug!("history back failed: {}", e);
            }
            None
        }
        StepAction::Click => {
            if let Some(element) = &element {
                if let Err(e) = click::click_element(page, element).await {
                    tracing::debug!("click failed on {}: {}", composed.selector, e);
                }
            }
            None
        }
        StepAction::Enter => {
            if let Some(element) = &element {
                if let Err(e) = click::press_enter(page, element).await {
                    tracing::debug!("enter failed on {}: {}", composed.selector, e);
                }
            }
            None
        }
        StepAction::Write => {
            if let Some(element) = &element {
                let text = resolve_write_text(&step.element.write);
                if let Err(e) = input::write_text(element, &text).await {
                    tracing::debug!("write failed on {}: {}", composed.selector, e);
                }
            }
            None
        }
        StepAction::Value => {
            if let Some(element) = &element {
                if let Err(e) = input::set_value(element, &step.element.value).await {
                    tracing::debug!("value assignment failed on {}: {}", composed.selector, e);
                }
            }
            None
        }
        StepAction::Select => {
            if let Some(element) = &element {
                if let Err(e) = input::select_option(element, &step.element.select).await {
                    state.record_error(format!(
                        "Failed to select {} on {}",
                        step.element.select,
                        composed.display()
                    ));
                    tracing::debug!("select failed: {}", e);
                }
            }
            None
        }
        StepAction::Multiple => {
            if let Some(element) = &element {
                if let Err(e) = input::select_multiple(element, &step.element.multiple).await {
                    tracing::debug!("multi-select failed on {}: {}", composed.selector, e);
                }
            }
            None
        }
        StepAction::Capture => {
            extract::capture::capture(
                page,
                element.as_ref(),
                &step.capture,
                &composed.selector,
                indices.paginate_index,
                state,
            )
            .await
        }
        StepAction::Take => take_content(element.as_ref(), step, state).await,
        StepAction::Table => table_content(element.as_ref(), step, state).await,
        StepAction::Nothing => None,
    };

    content.filter(|item| !item.content.is_empty())
}

async fn take_content(
    element: Option<&Element>,
    step: &Step,
    state: &mut RunState,
) -> Option<ResultContent> {
    let element = element?;
    let parse = step.take.parse?;
    match extract::take::take(element, &step.take, parse, state).await {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::debug!("take failed for {}: {}", step.take.name, e);
            None
        }
    }
}

async fn table_content(
    element: Option<&Element>,
    step: &Step,
    state: &RunState,
) -> Option<ResultContent> {
    let element = element?;
    match extract::table::extract(element, &step.table, &state.domain_origin).await {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::debug!("table extraction failed for {}: {}", step.table.name, e);
            None
        }
    }
}

/// Literal text, or the value of env var `NAME` when written as `$NAME`.
fn resolve_write_text(write: &str) -> String {
    match write.strip_prefix('$') {
        Some(name) => std::env::var(name).unwrap_or_default(),
        None => write.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{ElementAction, Step, TakeParse};

    #[test]
    fn delay_beats_every_other_field() {
        let mut step = Step::default();
        step.delay = 1.5;
        step.take.parse = Some(TakeParse::Text);
        step.element.action = Some(ElementAction::Click);
        assert_eq!(classify(&step), StepAction::Delay);
    }

    #[test]
    fn wait_for_beats_scroll_and_navigation() {
        let mut step = Step::default();
        step.wait_for.selector = ".spinner".to_string();
        step.scroll = 3;
        step.navigate = true;
        assert_eq!(classify(&step), StepAction::WaitFor);
    }

    #[test]
    fn click_beats_write_and_take() {
        let mut step = Step::default();
        step.element.action = Some(ElementAction::Click);
        step.element.write = "text".to_string();
        step.take.parse = Some(TakeParse::Html);
        assert_eq!(classify(&step), StepAction::Click);
    }

    #[test]
    fn write_beats_value_and_select() {
        let mut step = Step::default();
        step.element.write = "query".to_string();
        step.element.value = "v".to_string();
        step.element.select = "s".to_string();
        assert_eq!(classify(&step), StepAction::Write);
    }

    #[test]
    fn capture_beats_take_and_table() {
        let mut step = Step::default();
        step.capture.name = "shot".to_string();
        step.take.parse = Some(TakeParse::Text);
        step.table.name = "t".to_string();
        assert_eq!(classify(&step), StepAction::Capture);
    }

    #[test]
    fn take_beats_table() {
        let mut step = Step::default();
        step.take.parse = Some(TakeParse::Anchor);
        step.table.name = "t".to_string();
        assert_eq!(classify(&step), StepAction::Take);
    }

    #[test]
    fn empty_step_does_nothing() {
        assert_eq!(classify(&Step::default()), StepAction::Nothing);
    }

    #[test]
    fn wrapper_only_steps_do_nothing_but_are_not_element_actions() {
        let mut step = Step::default();
        step.wrapper = ".list".to_string();
        assert_eq!(classify(&step), StepAction::Nothing);
        assert!(!needs_element(StepAction::Nothing));
    }

    #[test]
    fn element_actions_require_resolution() {
        for action in [
            StepAction::Click,
            StepAction::Enter,
            StepAction::Write,
            StepAction::Value,
            StepAction::Select,
            StepAction::Multiple,
            StepAction::Capture,
            StepAction::Take,
            StepAction::Table,
        ] {
            assert!(needs_element(action));
        }
        for action in [
            StepAction::Delay,
            StepAction::WaitFor,
            StepAction::Scroll,
            StepAction::Navigate,
            StepAction::BackToPrevious,
            StepAction::Nothing,
        ] {
            assert!(!needs_element(action));
        }
    }

    #[test]
    fn write_text_reads_env_var_when_dollar_prefixed() {
        std::env::set_var("TALON_TEST_WRITE", "secret");
        assert_eq!(resolve_write_text("$TALON_TEST_WRITE"), "secret");
        assert_eq!(resolve_write_text("plain text"), "plain text");
        assert_eq!(resolve_write_text("$TALON_TEST_MISSING"), "");
    }
}
