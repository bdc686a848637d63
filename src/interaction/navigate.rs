use anyhow::{Context, Result};
use chromiumoxide::page::Page;
use std::time::Duration;

/// Deadline for explicit navigations.
pub const NAVIGATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Cap on post-action load waits; a click that navigates nowhere must not
/// stall the flow.
const LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// Settle time after the load event, for post-load JS rendering.
const SETTLE: Duration = Duration::from_millis(300);

/// Why a navigation did not complete.
#[derive(Debug)]
pub enum NavigateFailure {
    /// The deadline expired before the page settled.
    DeadlineExceeded,
    /// The driver reported an error for the requested page.
    PageError(String),
}

/// Navigate and wait for the page to settle, bounded by the navigation
/// deadline.
pub async fn goto_settled(page: &Page, url: &str) -> std::result::Result<(), NavigateFailure> {
    let navigation = async {
        page.goto(url).await?;
        page.wait_for_navigation().await?;
        Ok::<(), chromiumoxide::error::CdpError>(())
    };

    match tokio::time::timeout(NAVIGATE_TIMEOUT, navigation).await {
        Ok(Ok(())) => {
            tokio::time::sleep(SETTLE).await;
            Ok(())
        }
        Ok(Err(e)) => Err(NavigateFailure::PageError(e.to_string())),
        Err(_) => Err(NavigateFailure::DeadlineExceeded),
    }
}

/// History-back, then wait for the page to settle.
pub async fn back_settled(page: &Page) -> Result<()> {
    page.evaluate("window.history.back()")
        .await
        .context("Failed to go back")?;
    wait_for_load(page).await;
    Ok(())
}

/// Wait for any in-flight load to finish, bounded so that actions which
/// trigger no navigation return promptly.
pub async fn wait_for_load(page: &Page) {
    let _ = tokio::time::timeout(LOAD_TIMEOUT, page.wait_for_navigation()).await;
    tokio::time::sleep(SETTLE).await;
}

/// Current page title and URL, empty when the driver cannot report them.
pub async fn page_identity(page: &Page) -> (String, String) {
    let title = page
        .get_title()
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    let url = page.url().await.ok().flatten().unwrap_or_default();
    (title, url)
}
