use chromiumoxide::page::Page;
use std::time::{Duration, Instant};

/// Default `wait_for` timeout when the step does not set one.
pub const WAIT_FOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll until a selector resolves to an element. Returns false on timeout.
pub async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    let start = Instant::now();

    loop {
        if page.find_element(selector).await.is_ok() {
            return true;
        }

        if start.elapsed() >= timeout {
            return false;
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
