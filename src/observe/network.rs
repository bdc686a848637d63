use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-request bandwidth accounting, fed by the CDP response event stream.
#[derive(Debug)]
pub struct BandwidthTally {
    usage: Arc<Mutex<HashMap<String, f64>>>,
    task: tokio::task::JoinHandle<()>,
}

impl BandwidthTally {
    /// Current per-resource-type byte totals.
    pub async fn snapshot(&self) -> HashMap<String, f64> {
        self.usage.lock().await.clone()
    }

    pub fn detach(&self) {
        self.task.abort();
    }
}

impl Drop for BandwidthTally {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Enable the network domain on the page and start accumulating each
/// response's encoded length under its lowercased resource type.
pub async fn attach(page: &Page) -> Result<BandwidthTally> {
    page.execute(EnableParams::default())
        .await
        .context("Failed to enable network events")?;

    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("Failed to listen for network responses")?;

    let usage: Arc<Mutex<HashMap<String, f64>>> = Arc::new(Mutex::new(HashMap::new()));
    let tally = usage.clone();

    let task = tokio::spawn(async move {
        while let Some(event) = responses.next().await {
            let kind = resource_kind(&event.r#type);
            let mut usage = tally.lock().await;
            *usage.entry(kind).or_insert(0.0) += event.response.encoded_data_length;
        }
    });

    Ok(BandwidthTally { usage, task })
}

/// Lowercased wire name of a CDP resource type ("document", "xhr", ...).
fn resource_kind(resource_type: &ResourceType) -> String {
    serde_json::to_value(resource_type)
        .ok()
        .and_then(|value| value.as_str().map(|name| name.to_lowercase()))
        .unwrap_or_else(|| "other".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_kinds_are_lowercased_wire_names() {
        assert_eq!(resource_kind(&ResourceType::Document), "document");
        assert_eq!(resource_kind(&ResourceType::Stylesheet), "stylesheet");
        assert_eq!(resource_kind(&ResourceType::Xhr), "xhr");
    }
}
