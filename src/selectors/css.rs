use chromiumoxide::page::Page;
use std::time::{Duration, Instant};

use super::{Resolution, POLL_INTERVAL};

/// Resolve the first CSS match, polling until the deadline. Absence is a
/// `NotFound` outcome, never an error.
pub async fn resolve(page: &Page, selector: &str, deadline: Duration) -> Resolution {
    let start = Instant::now();

    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Resolution::Found(element);
        }

        if start.elapsed() >= deadline {
            return Resolution::NotFound;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
