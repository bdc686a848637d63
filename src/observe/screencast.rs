use anyhow::{Context, Result};
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::{
    EventScreencastFrame, ScreencastFrameAckParams, StartScreencastFormat, StartScreencastParams,
    StopScreencastParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};

/// Frame-writing task for one request. Frames arrive only while a
/// screencast is running; the observer itself is always safe to attach.
#[derive(Debug)]
pub struct FrameRecorder {
    task: tokio::task::JoinHandle<()>,
}

impl FrameRecorder {
    pub fn detach(&self) {
        self.task.abort();
    }
}

impl Drop for FrameRecorder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Zero-padded frame file name. Six digits keep the glob+lexicographic sort
/// chronological far past the frame counts a recording produces.
pub fn frame_file_name(page_id: &str, sequence: u64) -> String {
    format!("{}-{:06}-frame.jpeg", page_id, sequence)
}

/// Subscribe to screencast frames: write each JPEG payload under the videos
/// directory and ack it so the browser keeps streaming.
pub async fn attach(page: &Page, videos_dir: &Path, page_id: &str) -> Result<FrameRecorder> {
    let mut frames = page
        .event_listener::<EventScreencastFrame>()
        .await
        .context("Failed to listen for screencast frames")?;

    let ack_page = page.clone();
    let dir: PathBuf = videos_dir.to_path_buf();
    let id = page_id.to_string();

    let task = tokio::spawn(async move {
        let mut sequence: u64 = 0;
        while let Some(frame) = frames.next().await {
            let path = dir.join(frame_file_name(&id, sequence));

            match base64::engine::general_purpose::STANDARD.decode(AsRef::<str>::as_ref(&frame.data).as_bytes()) {
                Ok(bytes) => {
                    if let Err(e) = tokio::fs::write(&path, bytes).await {
                        tracing::debug!("frame write failed: {}", e);
                    }
                }
                Err(e) => tracing::debug!("frame payload decode failed: {}", e),
            }

            let ack = ScreencastFrameAckParams::new(frame.session_id);
            if let Err(e) = ack_page.execute(ack).await {
                tracing::debug!("frame ack failed: {}", e);
            }

            sequence += 1;
        }
    });

    Ok(FrameRecorder { task })
}

/// Start streaming JPEG frames at full quality, every frame.
pub async fn start(page: &Page) -> Result<()> {
    let params = StartScreencastParams::builder()
        .format(StartScreencastFormat::Jpeg)
        .quality(100)
        .every_nth_frame(1)
        .build();

    page.execute(params)
        .await
        .context("Failed to start screencast")?;
    Ok(())
}

pub async fn stop(page: &Page) {
    if let Err(e) = page.execute(StopScreencastParams::default()).await {
        tracing::debug!("screencast stop failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_names_zero_pad_to_six_digits() {
        assert_eq!(frame_file_name("abc123", 0), "abc123-000000-frame.jpeg");
        assert_eq!(frame_file_name("abc123", 99), "abc123-000099-frame.jpeg");
        assert_eq!(frame_file_name("abc123", 100), "abc123-000100-frame.jpeg");
    }

    #[test]
    fn lexicographic_order_matches_capture_order() {
        let mut names: Vec<String> = [120, 3, 99, 100, 0]
            .iter()
            .map(|n| frame_file_name("id", *n))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                frame_file_name("id", 0),
                frame_file_name("id", 3),
                frame_file_name("id", 99),
                frame_file_name("id", 100),
                frame_file_name("id", 120),
            ]
        );
    }
}
