use anyhow::Result;
use chromiumoxide::element::Element;

use crate::flow::{ResultContent, RunState, TakeParse, TakeStep};
use crate::util::absolutize;

/// Extract one value from a resolved element per the step's parse mode.
/// Anchor extractions may arm the navigate hand-off.
pub async fn take(
    element: &Element,
    step: &TakeStep,
    parse: TakeParse,
    state: &mut RunState,
) -> Result<ResultContent> {
    let content = match parse {
        TakeParse::Html => element.outer_html().await?.unwrap_or_default(),
        TakeParse::Text => element.inner_text().await?.unwrap_or_default(),
        TakeParse::Image => element.attribute("src").await?.unwrap_or_default(),
        TakeParse::Anchor => {
            let href = element.attribute("href").await?.unwrap_or_default();
            let href = if href.is_empty() {
                href
            } else {
                absolutize(&state.domain_origin, &href)
            };

            if step.use_for_navigate && !href.is_empty() {
                state.pending_navigate_url = Some(href.clone());
            }

            href
        }
    };

    Ok(ResultContent::new(parse.as_str(), &step.name, content))
}
