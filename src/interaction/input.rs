use anyhow::{bail, Context, Result};
use chromiumoxide::element::Element;

/// Focus an element and type text into it as keystrokes.
pub async fn write_text(element: &Element, text: &str) -> Result<()> {
    element.focus().await.context("Failed to focus element")?;
    element
        .type_str(text)
        .await
        .context("Failed to type into element")?;
    Ok(())
}

/// Assign the element's `value` property directly and notify listeners.
pub async fn set_value(element: &Element, value: &str) -> Result<()> {
    let value_js = serde_json::to_string(value)?;
    let js = format!(
        r#"function() {{
            this.value = {value_js};
            this.dispatchEvent(new Event('input', {{ bubbles: true }}));
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
        }}"#,
    );
    element.call_js_fn(js, false).await?;
    Ok(())
}

/// Choose one option of a `<select>` by value or visible text.
pub async fn select_option(element: &Element, option: &str) -> Result<()> {
    let option_js = serde_json::to_string(option)?;
    let js = format!(
        r#"function() {{
            const wanted = {option_js};
            const match = Array.from(this.options || [])
                .find(o => o.value === wanted || o.text === wanted);
            if (!match) return false;
            this.value = match.value;
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }}"#,
    );

    let outcome = element.call_js_fn(js, false).await?;
    if outcome.result.value != Some(serde_json::Value::Bool(true)) {
        bail!("option {} not present", option);
    }
    Ok(())
}

/// Mark every listed option of a multi-select as selected, in order.
pub async fn select_multiple(element: &Element, options: &[String]) -> Result<()> {
    let options_js = serde_json::to_string(options)?;
    let js = format!(
        r#"function() {{
            const wanted = {options_js};
            let matched = 0;
            for (const option of Array.from(this.options || [])) {{
                if (wanted.includes(option.value) || wanted.includes(option.text)) {{
                    option.selected = true;
                    matched++;
                }}
            }}
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return matched;
        }}"#,
    );
    element.call_js_fn(js, false).await?;
    Ok(())
}
