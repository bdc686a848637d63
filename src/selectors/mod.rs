pub mod contains;
pub mod css;
pub mod sibling;

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::time::Duration;

use crate::flow::{LoopIndices, Step};

/// Bound on every element lookup. Expiry is a normal outcome, not a failure.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);

/// How often lookup loops re-check the DOM.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one element lookup.
#[derive(Debug)]
pub enum Resolution {
    Found(Element),
    /// Nothing matched before the deadline.
    NotFound,
    /// The driver itself failed (bad pattern, lost page).
    DriverError(String),
}

/// How the composed selector locates its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// First CSS match.
    Css,
    /// First CSS match whose visible text matches the pattern.
    Contains { identifier: String },
    /// Immediately following sibling of the base element.
    NextTo { identifier: Option<String> },
}

/// A selector composed from a step, ready to resolve.
#[derive(Debug, Clone)]
pub struct Composed {
    pub selector: String,
    /// Field name for error messages (take/capture/table name).
    pub field: String,
    pub mode: ResolveMode,
}

impl Composed {
    /// The selector as shown in error messages: contains identifiers are
    /// appended in backticks, then the whole string is sanitised.
    pub fn display(&self) -> String {
        let text = match &self.mode {
            ResolveMode::Contains { identifier } => {
                format!("{} `{}`", self.selector, identifier)
            }
            ResolveMode::NextTo {
                identifier: Some(identifier),
            } => format!("{} `{}`", self.selector, identifier),
            _ => self.selector.clone(),
        };
        sanitize(&text)
    }
}

/// Compose the raw selector for a step: first non-empty source wins, the
/// carried wrapper is prefixed, and loop tokens are substituted.
pub fn compose(step: &Step, wrapper: &str, indices: LoopIndices) -> Composed {
    let mut selector = String::new();
    let mut field = String::new();
    let mut mode = ResolveMode::Css;

    if !step.element.selector.is_empty() {
        selector = step.element.selector.clone();
    } else if !step.element.contains.selector.is_empty() {
        selector = step.element.contains.selector.clone();
        mode = ResolveMode::Contains {
            identifier: step.element.contains.identifier.clone(),
        };
    } else if !step.capture.name.is_empty() {
        selector = if step.capture.selector.is_empty() {
            "body".to_string()
        } else {
            step.capture.selector.clone()
        };
        field = step.capture.name.clone();
    } else if !step.take.selector.is_empty() {
        selector = step.take.selector.clone();
        field = step.take.name.clone();
    } else if !step.take.contains.selector.is_empty() {
        selector = step.take.contains.selector.clone();
        field = step.take.name.clone();
        mode = ResolveMode::Contains {
            identifier: step.take.contains.identifier.clone(),
        };
    } else if !step.take.next_to_selector.is_empty() {
        selector = step.take.next_to_selector.clone();
        field = step.take.name.clone();
        mode = ResolveMode::NextTo { identifier: None };
    } else if !step.take.next_to_contains.selector.is_empty() {
        selector = step.take.next_to_contains.selector.clone();
        field = step.take.name.clone();
        mode = ResolveMode::NextTo {
            identifier: Some(step.take.next_to_contains.identifier.clone()),
        };
    } else if !step.table.selector.is_empty() {
        selector = step.table.selector.clone();
        field = step.table.name.clone();
    } else if !step.wait_for.selector.is_empty() {
        selector = step.wait_for.selector.clone();
    }

    if !wrapper.is_empty() && !selector.is_empty() {
        selector = format!("{} {}", wrapper, selector);
    }

    Composed {
        selector: substitute(&selector, indices),
        field,
        mode,
    }
}

/// Replace the loop-position tokens with decimal integers.
pub fn substitute(selector: &str, indices: LoopIndices) -> String {
    if !selector.contains('$') {
        return selector.to_string();
    }

    let item = indices.item_index();
    selector
        .replace("$loop_index", &indices.paginate_index.to_string())
        .replace("$loop_number", &(indices.paginate_index + 1).to_string())
        .replace("$item_index", &item.to_string())
        .replace("$item_number", &(item + 1).to_string())
}

/// Make a selector safe for the user-visible error list: quotes become
/// apostrophes, brackets are dropped.
pub fn sanitize(selector: &str) -> String {
    selector.replace('"', "'").replace(['[', ']'], "")
}

/// Locate the element for a composed selector, bounded by the default
/// resolution deadline.
pub async fn resolve(page: &Page, composed: &Composed) -> Resolution {
    if composed.selector.is_empty() {
        return Resolution::NotFound;
    }

    match &composed.mode {
        ResolveMode::Css => css::resolve(page, &composed.selector, RESOLVE_TIMEOUT).await,
        ResolveMode::Contains { identifier } => {
            contains::resolve(page, &composed.selector, identifier, RESOLVE_TIMEOUT).await
        }
        ResolveMode::NextTo { identifier } => {
            sibling::resolve(
                page,
                &composed.selector,
                identifier.as_deref(),
                RESOLVE_TIMEOUT,
            )
            .await
        }
    }
}
