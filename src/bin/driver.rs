use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use talon::flow::{FlowConfig, RunResult};
use talon::util::slugify;

/// talon-driver: submit every flow under ./flows/ to its engine
#[derive(Parser)]
#[command(name = "talon-driver", version, about)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let _cli = Cli::parse();

    let working_dir = std::env::current_dir()?;
    let flows = collect_flow_files(&working_dir.join("flows"))?;

    if flows.is_empty() {
        tracing::info!("No flow files found under ./flows/");
        return Ok(());
    }

    let output_dir = working_dir.join("resources").join("json");
    std::fs::create_dir_all(&output_dir).context("Cannot create ./resources/json")?;

    let client = reqwest::Client::new();

    for path in flows {
        let config = FlowConfig::load(&path)?;

        if config.engine.is_empty() {
            bail!(
                "Flow {} does not specify an engine server URL",
                path.display()
            );
        }

        tracing::info!("Sending {} to {}", path.display(), config.engine);

        let response = client
            .post(&config.engine)
            .json(&config)
            .send()
            .await
            .with_context(|| format!("Engine server {} is not reachable", config.engine))?;

        let result: RunResult = response
            .json()
            .await
            .with_context(|| format!("Engine returned an unreadable result for {}", config.name))?;

        let slug = if result.slug.is_empty() {
            slugify(&config.name)
        } else {
            result.slug.clone()
        };
        let output = output_dir.join(format!("{}.json", slug));
        let body = serde_json::to_string_pretty(&result)?;
        std::fs::write(&output, body)
            .with_context(|| format!("Cannot write {}", output.display()))?;

        tracing::info!(
            "Saved result for {} ({} pages, {} errors) to {}",
            config.name,
            result.result.len(),
            result.errors.len(),
            output.display()
        );
    }

    tracing::info!("All flows submitted");
    Ok(())
}

/// Every `*.yml` directly under the flows directory, in name order.
fn collect_flow_files(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut flows = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(flows),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("yml") {
            flows.push(path);
        }
    }

    flows.sort();
    Ok(flows)
}
