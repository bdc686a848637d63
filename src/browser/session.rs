use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;

/// The shared CDP browser. One instance hosts every request's page; all
/// per-request state lives with the page, never here.
pub struct BrowserSession {
    browser: Browser,
    _handler_task: tokio::task::JoinHandle<()>,
    headless: bool,
    /// Unique temp dir for this Chrome instance — cleaned up on drop.
    _user_data_dir: tempfile::TempDir,
}

impl BrowserSession {
    /// Launch the browser and establish the CDP connection. `proxy` is a
    /// plain (non-authenticated) proxy URL for traffic redirection.
    pub async fn launch(headless: bool, proxy: &str) -> Result<Self> {
        let user_data_dir = tempfile::tempdir().context("Failed to create temp dir for Chrome")?;

        let mut builder = BrowserConfig::builder().user_data_dir(user_data_dir.path());

        match chrome_binary() {
            Some(chrome) => {
                tracing::info!("Using Chrome at {}", chrome.display());
                builder = builder.chrome_executable(chrome);
            }
            None => tracing::debug!("No Chrome located, deferring to the driver's own lookup"),
        }

        if headless {
            builder = builder.arg("--headless=new");
        }

        if !proxy.is_empty() {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--no-sandbox")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-client-side-phishing-detection")
            .arg("--disable-default-apps")
            .arg("--disable-extensions")
            .arg("--disable-hang-monitor")
            .arg("--disable-popup-blocking")
            .arg("--disable-prompt-on-repost")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--disable-infobars")
            .arg("--metrics-recording-only")
            .window_size(1440, 900);

        let config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome")?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Drive the CDP connection
            }
        });

        // Warm the browser with a blank page so the first request does not
        // pay the renderer start-up cost.
        browser
            .new_page("about:blank")
            .await
            .context("Failed to create initial page")?;

        tracing::info!("Browser session started (headless: {})", headless);

        Ok(Self {
            browser,
            _handler_task: handler_task,
            headless,
            _user_data_dir: user_data_dir,
        })
    }

    /// Open a fresh page for one request.
    pub async fn new_page(&self) -> Result<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }
}

/// Pick the Chrome binary the engine runs: a `TALON_CHROME` override wins,
/// then a PATH lookup, then the usual install locations. `None` leaves the
/// choice to chromiumoxide's built-in detection.
fn chrome_binary() -> Option<PathBuf> {
    if let Ok(configured) = std::env::var("TALON_CHROME") {
        let configured = PathBuf::from(configured);
        if configured.exists() {
            return Some(configured);
        }
        tracing::warn!(
            "TALON_CHROME points at {}, which does not exist",
            configured.display()
        );
    }

    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(found) = which::which(name) {
            return Some(found);
        }
    }

    #[cfg(target_os = "linux")]
    let installs = ["/usr/bin/google-chrome", "/snap/bin/chromium"];
    #[cfg(target_os = "macos")]
    let installs = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    let installs: [&str; 0] = [];

    installs.into_iter().map(PathBuf::from).find(|p| p.exists())
}
