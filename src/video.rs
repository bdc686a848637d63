use std::path::{Path, PathBuf};

use crate::util::slugify;

/// Output frame rate; matches the screencast's effective cadence.
const FRAME_RATE: u32 = 6;

/// Output dimensions of the rendered recording.
const FRAME_SIZE: &str = "1440x900";

/// Assemble the request's screencast frames into an H.264 MP4 via an
/// external `ffmpeg` process, then remove the intermediate frames.
///
/// Every failure is recoverable: the errors come back as strings and the
/// path is `None` when no video was produced.
pub async fn render(
    name: &str,
    page_id: &str,
    videos_dir: &Path,
) -> (Option<PathBuf>, Vec<String>) {
    let mut errors = Vec::new();

    let frames = match collect_frames(videos_dir, page_id) {
        Ok(frames) => frames,
        Err(e) => {
            errors.push(format!("Failed to read video frames: {}", e));
            return (None, errors);
        }
    };

    if frames.is_empty() {
        errors.push("Failed to render video, no frames were recorded".to_string());
        return (None, errors);
    }

    let ffmpeg = match which::which("ffmpeg") {
        Ok(path) => path,
        Err(_) => {
            errors.push("Failed to render video, ffmpeg is not installed".to_string());
            return (None, errors);
        }
    };

    let output = videos_dir.join(format!("{}-{}.mp4", slugify(name), page_id));
    let list_path = videos_dir.join(format!("{}-frames.txt", page_id));
    let list = concat_list(&frames);

    if let Err(e) = tokio::fs::write(&list_path, list).await {
        errors.push(format!("Failed to prepare video frame list: {}", e));
        return (None, errors);
    }

    let status = tokio::process::Command::new(ffmpeg)
        .arg("-y")
        .arg("-f")
        .arg("concat")
        .arg("-safe")
        .arg("0")
        .arg("-i")
        .arg(&list_path)
        .arg("-r")
        .arg(FRAME_RATE.to_string())
        .arg("-s")
        .arg(FRAME_SIZE)
        .arg("-c:v")
        .arg("libx264")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(&output)
        .output()
        .await;

    let rendered = match status {
        Ok(result) if result.status.success() => true,
        Ok(result) => {
            tracing::debug!("ffmpeg stderr: {}", String::from_utf8_lossy(&result.stderr));
            errors.push(format!(
                "Failed to render video, encoder exited with {}",
                result.status
            ));
            false
        }
        Err(e) => {
            errors.push(format!("Failed to render video: {}", e));
            false
        }
    };

    // Intermediate artifacts go regardless of the encode outcome.
    let _ = tokio::fs::remove_file(&list_path).await;
    for frame in &frames {
        let _ = tokio::fs::remove_file(frame).await;
    }

    if rendered {
        (Some(output), errors)
    } else {
        (None, errors)
    }
}

/// The request's frame files in chronological (lexicographic) order.
fn collect_frames(videos_dir: &Path, page_id: &str) -> std::io::Result<Vec<PathBuf>> {
    let prefix = format!("{}-", page_id);
    let mut frames: Vec<PathBuf> = std::fs::read_dir(videos_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&prefix) && name.ends_with("-frame.jpeg"))
                .unwrap_or(false)
        })
        .collect();
    frames.sort();
    Ok(frames)
}

/// ffmpeg concat-demuxer input: one line per frame at the output cadence.
fn concat_list(frames: &[PathBuf]) -> String {
    let frame_duration = 1.0 / FRAME_RATE as f64;
    let mut list = String::new();
    for frame in frames {
        list.push_str(&format!("file '{}'\n", frame.display()));
        list.push_str(&format!("duration {:.6}\n", frame_duration));
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_frames_filters_and_sorts_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "req1-000002-frame.jpeg",
            "req1-000000-frame.jpeg",
            "req2-000001-frame.jpeg",
            "req1-000001-frame.jpeg",
            "req1-notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }

        let frames = collect_frames(dir.path(), "req1").expect("collect");
        let names: Vec<String> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "req1-000000-frame.jpeg",
                "req1-000001-frame.jpeg",
                "req1-000002-frame.jpeg",
            ]
        );
    }

    #[test]
    fn concat_list_paces_frames_at_the_output_rate() {
        let frames = vec![PathBuf::from("/tmp/a.jpeg"), PathBuf::from("/tmp/b.jpeg")];
        let list = concat_list(&frames);
        assert!(list.contains("file '/tmp/a.jpeg'"));
        assert!(list.contains("duration 0.166667"));
        assert_eq!(list.matches("file ").count(), 2);
    }
}
