use anyhow::{anyhow, Context, Result};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::page::Page;
use std::time::Duration;

/// Current viewport height in CSS pixels.
pub async fn viewport_height(page: &Page) -> Result<f64> {
    let height: f64 = page
        .evaluate("window.innerHeight")
        .await
        .context("Failed to read viewport height")?
        .into_value()
        .context("Failed to parse viewport height")?;
    Ok(height)
}

/// Dispatch `ticks` mouse-wheel events of `delta_y` pixels each.
pub async fn wheel(page: &Page, ticks: i64, delta_y: f64) -> Result<()> {
    for _ in 0..ticks.max(0) {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(0.0)
            .y(0.0)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(|e| anyhow!(e))?;

        page.execute(params)
            .await
            .context("Failed to dispatch wheel event")?;

        // Let the page react between ticks.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    Ok(())
}

/// Wheel one viewport height per tick (the `scroll` step).
pub async fn scroll_ticks(page: &Page, ticks: i64) -> Result<()> {
    let height = viewport_height(page).await?;
    wheel(page, ticks, height).await
}

/// Wheel four viewport heights in two ticks (the infinite-scroll advance).
pub async fn infinite_advance(page: &Page) -> Result<()> {
    let height = viewport_height(page).await?;
    wheel(page, 2, height * 2.0).await
}
