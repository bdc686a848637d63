use chromiumoxide::page::Page;
use std::time::{Duration, Instant};

use super::contains::{fetch_marked, mark_first_match, mark_js};
use super::{Resolution, POLL_INTERVAL};

/// Resolve the element immediately following a base element. The base is
/// located by CSS, narrowed by a visible-text pattern when one is given.
pub async fn resolve(
    page: &Page,
    selector: &str,
    identifier: Option<&str>,
    deadline: Duration,
) -> Resolution {
    if let Err(e) = super::contains::validate_pattern(identifier.unwrap_or("")) {
        return Resolution::DriverError(e);
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    let js = match mark_js(selector, identifier.unwrap_or(""), &token, true) {
        Ok(js) => js,
        Err(message) => return Resolution::DriverError(message),
    };

    let start = Instant::now();

    loop {
        match mark_first_match(page, &js).await {
            Ok(true) => return fetch_marked(page, &token).await,
            Ok(false) => {}
            Err(message) => return Resolution::DriverError(message),
        }

        if start.elapsed() >= deadline {
            return Resolution::NotFound;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
