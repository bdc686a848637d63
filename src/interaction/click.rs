use anyhow::Result;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use super::navigate::wait_for_load;

/// Click an element, falling back to a synthesised in-page click when the
/// native event fails (covered, zero-sized, detached mid-flight), then wait
/// for any load the click may have triggered.
pub async fn click_element(page: &Page, element: &Element) -> Result<()> {
    if let Err(native) = element.click().await {
        tracing::debug!("native click failed ({}), forcing via script", native);
        element
            .call_js_fn("function() { this.click(); }", false)
            .await?;
    }

    wait_for_load(page).await;
    Ok(())
}

/// Press Enter on an element (submit idiom for search boxes).
pub async fn press_enter(page: &Page, element: &Element) -> Result<()> {
    element.press_key("Enter").await?;
    wait_for_load(page).await;
    Ok(())
}
