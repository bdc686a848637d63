use std::collections::HashMap;
use std::path::PathBuf;

/// Mutable state for one request. Created when the request enters the
/// orchestrator, threaded through the controller and every step, serialized
/// into the response, then discarded. Nothing in here outlives the request.
#[derive(Debug)]
pub struct RunState {
    /// `scheme://host` of `first_page`; absolutizes relative hrefs.
    pub domain_origin: String,
    /// Selector prefix carried across steps until a navigation clears it.
    pub wrapper_selector: String,
    /// One-shot hand-off from an anchor take to the next `navigate` step.
    pub pending_navigate_url: Option<String>,
    /// How many infinite-scroll advances have been applied so far.
    pub infinite_scroll_count: u32,
    /// Ordered, human-readable recoverable failures.
    pub errors: Vec<String>,
    /// Bytes written per artifact kind ("images", "videos").
    pub disk_usage: HashMap<String, u64>,
    /// Short request id (last 12 chars of a UUID).
    pub page_id: String,
    /// `slug(name)-page_id`, used in artifact file names.
    pub slug: String,
    /// Where capture JPEGs land.
    pub images_dir: PathBuf,
    /// Public URL prefix for recorded artifact paths.
    pub proxy_url: String,
}

impl RunState {
    pub fn new(first_page: &str, name: &str, page_id: &str) -> Self {
        Self {
            domain_origin: crate::util::domain_origin(first_page),
            wrapper_selector: String::new(),
            pending_navigate_url: None,
            infinite_scroll_count: 0,
            errors: Vec::new(),
            disk_usage: HashMap::new(),
            page_id: page_id.to_string(),
            slug: format!("{}-{}", crate::util::slugify(name), page_id),
            images_dir: PathBuf::new(),
            proxy_url: String::new(),
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.errors.push(message);
    }

    pub fn add_disk_usage(&mut self, kind: &str, bytes: u64) {
        *self.disk_usage.entry(kind.to_string()).or_insert(0) += bytes;
    }
}

/// Loop position handed to each step for `$loop_*` / `$item_*` substitution.
#[derive(Debug, Clone, Copy)]
pub struct LoopIndices {
    /// Zero-based outer pagination index.
    pub paginate_index: u32,
    /// Size of the item window; 0 means no inner window.
    pub items_on_page: u32,
}

impl LoopIndices {
    /// Position inside the current item window. With no window the item
    /// index tracks the loop index.
    pub fn item_index(&self) -> u32 {
        if self.items_on_page == 0 {
            self.paginate_index
        } else {
            self.paginate_index % self.items_on_page
        }
    }
}
