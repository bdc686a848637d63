use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, Viewport,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use crate::flow::{CaptureStep, ResultContent, RunState};

/// Take the step's screenshot and record it on disk.
///
/// A non-zero clip captures that rectangle of the page at scale 1; the
/// synthetic `"body"` selector captures the full page; anything else
/// captures the resolved element. Failures are recoverable: they land in
/// the run's error list and the step yields no content.
pub async fn capture(
    page: &Page,
    element: Option<&Element>,
    step: &CaptureStep,
    resolved_selector: &str,
    paginate_index: u32,
    state: &mut RunState,
) -> Option<ResultContent> {
    let file_name = format!("{}-{}-{}.jpeg", state.slug, paginate_index, step.name);
    let path = state.images_dir.join(&file_name);

    let shot = if step.clip.is_set() {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(100)
            .clip(Viewport {
                x: step.clip.top,
                y: step.clip.left,
                width: step.clip.width,
                height: step.clip.height,
                scale: 1.0,
            })
            .from_surface(true)
            .build();
        page.screenshot(params).await.map_err(|e| e.to_string())
    } else if resolved_selector == "body" {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(100)
            .capture_beyond_viewport(true)
            .from_surface(true)
            .build();
        page.screenshot(params).await.map_err(|e| e.to_string())
    } else if let Some(element) = element {
        element
            .screenshot(CaptureScreenshotFormat::Jpeg)
            .await
            .map_err(|e| e.to_string())
    } else {
        Err("element unavailable".to_string())
    };

    let bytes = match shot {
        Ok(image) => {
            if let Err(e) = tokio::fs::write(&path, &image).await {
                state.record_error(format!(
                    "Failed to write capture {} for {}: {}",
                    file_name, step.name, e
                ));
                0
            } else {
                image.len() as u64
            }
        }
        Err(cause) => {
            tracing::debug!("capture failed for {}: {}", step.name, cause);
            state.record_error(format!(
                "Failed to capture missing selector {} for {}",
                crate::selectors::sanitize(&step.selector),
                step.name
            ));
            0
        }
    };

    state.add_disk_usage("images", bytes);

    let content = if bytes > 0 {
        format!("{}/resources/images/{}", state.proxy_url, file_name)
    } else {
        String::new()
    };

    Some(ResultContent {
        kind: "image".to_string(),
        name: step.name.clone(),
        length: bytes as usize,
        content,
    })
}
