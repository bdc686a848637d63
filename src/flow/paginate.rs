use chromiumoxide::page::Page;
use std::time::{Duration, Instant};

use crate::flow::limits::Limits;
use crate::flow::{step, FlowConfig, LoopIndices, ResultPage, RunState};
use crate::interaction::navigate::{self, NavigateFailure};
use crate::interaction::scroll;
use crate::selectors::{self, Resolution};

/// Pause after a page advance so the next page can render.
const ADVANCE_SETTLE: Duration = Duration::from_secs(3);

/// Drive the outer loop: enter on the first iteration, advance the page at
/// item-window boundaries, run every step of the flow once per iteration,
/// and assemble one `ResultPage` per iteration. Nothing here aborts the run;
/// failures accumulate in the run state.
pub async fn run(
    page: &Page,
    config: &FlowConfig,
    limits: Limits,
    state: &mut RunState,
) -> Vec<ResultPage> {
    let effective = limits.effective();
    let mut pages = Vec::with_capacity(effective as usize);

    for paginate_index in 0..effective {
        let page_start = Instant::now();

        if paginate_index == 0 {
            enter_first_page(page, config, state).await;
        }

        if limits.advance_at(paginate_index) {
            advance(page, config, state).await;
        }

        let indices = LoopIndices {
            paginate_index,
            items_on_page: limits.items_on_page,
        };

        let mut content = Vec::with_capacity(config.flow.len());
        for flow_step in &config.flow {
            if let Some(item) = step::execute(page, flow_step, state, indices).await {
                content.push(item);
            }
        }

        let (title, url) = navigate::page_identity(page).await;
        pages.push(ResultPage {
            title,
            url,
            page: paginate_index + 1,
            duration: page_start.elapsed().as_millis() as u64,
            content,
        });
    }

    pages
}

async fn enter_first_page(page: &Page, config: &FlowConfig, state: &mut RunState) {
    tracing::info!("entering {}", config.first_page);

    match navigate::goto_settled(page, &config.first_page).await {
        Ok(()) => {}
        Err(NavigateFailure::DeadlineExceeded) => state.record_error(format!(
            "Failed to navigate to {}, due to context deadline exceeded",
            config.first_page
        )),
        Err(NavigateFailure::PageError(cause)) => {
            tracing::debug!("entry navigation failed: {}", cause);
            state.record_error(format!(
                "Failed to navigate to {}, due to error on requested page",
                config.first_page
            ));
        }
    }
}

/// Move to the next page at an item-window boundary: click the paginate
/// button when one is configured, and/or scroll four viewport heights while
/// infinite advances remain, then let the page settle.
async fn advance(page: &Page, config: &FlowConfig, state: &mut RunState) {
    if !config.paginate_button.is_empty() {
        match selectors::css::resolve(page, &config.paginate_button, selectors::RESOLVE_TIMEOUT)
            .await
        {
            Resolution::Found(button) => {
                if let Err(e) = button.click().await {
                    tracing::debug!("paginate button click failed: {}", e);
                }
            }
            Resolution::NotFound | Resolution::DriverError(_) => {
                state.record_error(format!(
                    "Failed to find selector {} for paginate_button",
                    selectors::sanitize(&config.paginate_button)
                ));
            }
        }
    }

    if config.infinite && state.infinite_scroll_count < config.infinite_scroll {
        if let Err(e) = scroll::infinite_advance(page).await {
            tracing::debug!("infinite scroll failed: {}", e);
        }
        state.infinite_scroll_count += 1;
    }

    navigate::wait_for_load(page).await;
    tokio::time::sleep(ADVANCE_SETTLE).await;
}
