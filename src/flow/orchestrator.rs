use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCacheParams, ClearBrowserCookiesParams,
};
use chromiumoxide::cdp::browser_protocol::page::CloseParams;
use chromiumoxide::cdp::browser_protocol::storage::{
    ClearCookiesParams, ClearDataForOriginParams, ClearTrustTokensParams,
};
use chromiumoxide::page::Page;
use std::path::PathBuf;
use std::time::Instant;

use crate::browser::BrowserSession;
use crate::flow::limits::{self, Ceilings};
use crate::flow::{paginate, FlowConfig, ResultUsage, RunResult, RunState};
use crate::observe::{network, screencast};
use crate::video;

/// Filesystem layout shared by every request.
#[derive(Debug, Clone)]
pub struct Directories {
    pub root: PathBuf,
    pub resources: PathBuf,
    pub images: PathBuf,
    pub videos: PathBuf,
}

impl Directories {
    /// Lay out (and create) the artifact directories under `root`.
    pub fn prepare(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        let resources = root.join("resources");
        let images = resources.join("images");
        let videos = resources.join("videos");
        std::fs::create_dir_all(&images)?;
        std::fs::create_dir_all(&videos)?;
        Ok(Self {
            root,
            resources,
            images,
            videos,
        })
    }
}

/// Engine-wide request context: directories plus the public URL prefix for
/// recorded artifacts and the upstream proxy reported in the envelope.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub dirs: Directories,
    pub proxy_url: String,
    pub upstream_proxy: String,
}

/// Run one flow end-to-end: allocate a page, attach the screencast and
/// network observers, drive the pagination controller, tear everything
/// down, render the recording, and assemble the response envelope.
pub async fn run_flow(
    session: &BrowserSession,
    context: &EngineContext,
    request: FlowConfig,
) -> RunResult {
    let started = Instant::now();
    let unique = uuid::Uuid::new_v4().to_string();
    let page_id = unique[unique.len() - 12..].to_string();

    tracing::info!("flow {} ({}) started", page_id, request.name);

    if request.flow.is_empty() {
        return RunResult {
            code: 404,
            message: format!("Flow not found for {}", page_id),
            ..Default::default()
        };
    }

    let mut state = RunState::new(&request.first_page, &request.name, &page_id);
    state.images_dir = context.dirs.images.clone();
    state.proxy_url = context.proxy_url.clone();

    let limits = limits::compute(&request, Ceilings::from_env(), &mut state.errors);

    let page = match session.new_page().await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("page allocation failed: {}", e);
            state.record_error("Something went wrong on our server".to_string());
            return envelope(
                500,
                "Failed to run Flow due some error on our Engine",
                &request,
                limits.items_on_page,
                state,
                ResultUsage::default(),
                Vec::new(),
                String::new(),
                started,
                context,
            );
        }
    };

    let recorder = match screencast::attach(&page, &context.dirs.videos, &page_id).await {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            tracing::debug!("screencast observer unavailable: {}", e);
            None
        }
    };

    let bandwidth = match network::attach(&page).await {
        Ok(tally) => Some(tally),
        Err(e) => {
            tracing::debug!("network observer unavailable: {}", e);
            None
        }
    };

    if request.record {
        if let Err(e) = screencast::start(&page).await {
            state.record_error(format!("Failed to start recording: {}", e));
        }
    }

    let pages = paginate::run(&page, &request, limits, &mut state).await;

    if request.record {
        screencast::stop(&page).await;
    }

    let mut usage = ResultUsage::default();
    if let Some(tally) = &bandwidth {
        usage.bandwidth = tally.snapshot().await;
        tally.detach();
    }
    if let Some(recorder) = &recorder {
        recorder.detach();
    }

    clear_browsing_data(&page, &state.domain_origin).await;
    if let Err(e) = page.execute(CloseParams::default()).await {
        tracing::debug!("page close failed: {}", e);
    }

    let mut recording = String::new();
    if request.record {
        let (rendered, render_errors) =
            video::render(&request.name, &page_id, &context.dirs.videos).await;
        state.errors.extend(render_errors);

        if let Some(path) = rendered {
            match tokio::fs::metadata(&path).await {
                Ok(meta) => state.add_disk_usage("videos", meta.len()),
                Err(_) => state.record_error("Failed to read recorded video size".to_string()),
            }
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                recording = format!("{}/resources/videos/{}", context.proxy_url, file_name);
            }
        }
    }

    tracing::info!(
        "flow {} finished: {} pages, {} errors",
        page_id,
        pages.len(),
        state.errors.len()
    );

    envelope(
        200,
        "The flow is running successfully",
        &request,
        limits.items_on_page,
        state,
        usage,
        pages,
        recording,
        started,
        context,
    )
}

/// Drop everything the run left in the browser for this origin: cache,
/// cookies, per-origin storage, trust tokens.
async fn clear_browsing_data(page: &Page, origin: &str) {
    if let Err(e) = page.execute(ClearBrowserCacheParams::default()).await {
        tracing::debug!("cache clear failed: {}", e);
    }
    if let Err(e) = page.execute(ClearBrowserCookiesParams::default()).await {
        tracing::debug!("cookie clear failed: {}", e);
    }
    if let Err(e) = page.execute(ClearCookiesParams::default()).await {
        tracing::debug!("storage cookie clear failed: {}", e);
    }
    if !origin.is_empty() {
        let data = ClearDataForOriginParams::new(origin, "all");
        if let Err(e) = page.execute(data).await {
            tracing::debug!("origin storage clear failed: {}", e);
        }
        if let Err(e) = page.execute(ClearTrustTokensParams::new(origin)).await {
            tracing::debug!("trust token clear failed: {}", e);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn envelope(
    code: u16,
    message: &str,
    request: &FlowConfig,
    items_on_page: u32,
    mut state: RunState,
    mut usage: ResultUsage,
    pages: Vec<crate::flow::ResultPage>,
    recording: String,
    started: Instant,
    context: &EngineContext,
) -> RunResult {
    usage.disk = std::mem::take(&mut state.disk_usage);

    RunResult {
        id: state.page_id.clone(),
        code,
        name: request.name.clone(),
        slug: state.slug.clone(),
        proxy: context.upstream_proxy.clone(),
        message: message.to_string(),
        duration: started.elapsed().as_millis() as u64,
        engine: request.engine.clone(),
        first_page: request.first_page.clone(),
        items_on_page,
        infinite: request.infinite,
        infinite_scroll: request.infinite_scroll,
        paginate: request.paginate,
        paginate_limit: request.paginate_limit,
        record: request.record,
        recording,
        result: pages,
        usage,
        errors: state.errors,
    }
}
