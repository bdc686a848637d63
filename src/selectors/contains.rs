use chromiumoxide::page::Page;
use std::time::{Duration, Instant};

use super::{Resolution, POLL_INTERVAL};

/// Attribute used to hand a JS-located node back to the CDP element lookup.
pub(crate) const PICK_ATTRIBUTE: &str = "data-talon-pick";

/// Resolve the first CSS match whose visible text matches `identifier` as a
/// regular expression. The matched node is tagged with a one-shot attribute
/// and fetched as a proper element handle.
pub async fn resolve(
    page: &Page,
    selector: &str,
    identifier: &str,
    deadline: Duration,
) -> Resolution {
    if let Err(e) = validate_pattern(identifier) {
        return Resolution::DriverError(e);
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    let js = match mark_js(selector, identifier, &token, false) {
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

/// Reject a broken text pattern before it reaches the page.
pub(crate) fn validate_pattern(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Ok(());
    }
    regex::Regex::new(identifier)
        .map(|_| ())
        .map_err(|e| format!("invalid pattern {}: {}", identifier, e))
}

/// Build the in-page function that tags the first matching node. With
/// `sibling` set the tag lands on the match's next element sibling instead.
pub(crate) fn mark_js(
    selector: &str,
    identifier: &str,
    token: &str,
    sibling: bool,
) -> Result<String, String> {
    let selector_js =
        serde_json::to_string(selector).map_err(|e| format!("selector encoding: {}", e))?;
    let identifier_js =
        serde_json::to_string(identifier).map_err(|e| format!("pattern encoding: {}", e))?;
    let token_js = serde_json::to_string(token).map_err(|e| format!("token encoding: {}", e))?;

    Ok(format!(
        r#"(() => {{
            let pattern;
            try {{
                pattern = {identifier_js} === "" ? null : new RegExp({identifier_js});
            }} catch (e) {{
                return {{ error: 'invalid pattern: ' + e.message }};
            }}
            const nodes = document.querySelectorAll({selector_js});
            for (const el of nodes) {{
                const text = (el.innerText || el.textContent || '').trim();
                if (pattern === null || pattern.test(text)) {{
                    const target = {sibling} ? el.nextElementSibling : el;
                    if (!target) return {{ found: false }};
                    target.setAttribute('{attr}', {token_js});
                    return {{ found: true }};
                }}
            }}
            return {{ found: false }};
        }})()"#,
        identifier_js = identifier_js,
        selector_js = selector_js,
        token_js = token_js,
        sibling = sibling,
        attr = PICK_ATTRIBUTE,
    ))
}

/// Run the tagging function once. `Ok(true)` means a node is now tagged.
pub(crate) async fn mark_first_match(page: &Page, js: &str) -> Result<bool, String> {
    let value: serde_json::Value = page
        .evaluate(js)
        .await
        .map_err(|e| e.to_string())?
        .into_value()
        .map_err(|e| e.to_string())?;

    if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
        return Err(error.to_string());
    }

    Ok(value
        .get("found")
        .and_then(|f| f.as_bool())
        .unwrap_or(false))
}

/// Fetch the tagged node as an element handle and drop the tag.
pub(crate) async fn fetch_marked(page: &Page, token: &str) -> Resolution {
    let lookup = format!("[{}=\"{}\"]", PICK_ATTRIBUTE, token);

    match page.find_element(lookup).await {
        Ok(element) => {
            let cleanup = format!(
                "function() {{ this.removeAttribute('{}'); }}",
                PICK_ATTRIBUTE
            );
            if let Err(e) = element.call_js_fn(cleanup, false).await {
                tracing::debug!("pick attribute cleanup failed: {}", e);
            }
            Resolution::Found(element)
        }
        Err(e) => Resolution::DriverError(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_patterns_pass_and_broken_ones_report() {
        assert!(validate_pattern("").is_ok());
        assert!(validate_pattern(r"\d+ USD").is_ok());
        let error = validate_pattern("[unclosed").expect_err("broken pattern");
        assert!(error.starts_with("invalid pattern"));
    }

    #[test]
    fn mark_js_escapes_its_inputs() {
        let js = mark_js(r#"a[data-x="1"]"#, "Buy \"now\"", "tok123", false).expect("builds");
        assert!(js.contains(r#""a[data-x=\"1\"]""#));
        assert!(js.contains("tok123"));
        assert!(js.contains(PICK_ATTRIBUTE));
        assert!(js.contains("false ? el.nextElementSibling : el"));
    }

    #[test]
    fn mark_js_sibling_mode_targets_the_next_element() {
        let js = mark_js("dt", "", "tok", true).expect("builds");
        assert!(js.contains("true ? el.nextElementSibling : el"));
    }
}
