//! Run orchestration
//!
//! One invocation is one run: load catalog and exclusions, select the next
//! identifier, render its asset, persist the queue remainder, fan out to the
//! destinations, and report. The queue remainder is persisted even when the
//! render fails, so one permanently broken asset cannot wedge the cycle; the
//! item simply comes around again next cycle.
//!
//! Dry-run mode stops after rendering: the artifact goes to a local file and
//! the persisted queue state is left untouched.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Result, RotacastError};
use crate::exclusions::ExclusionSet;
use crate::publisher::{create_platforms, FanoutPublisher};
use crate::render::{ImageRenderer, Render};
use crate::rotation::RotationQueue;
use crate::types::RunReport;

/// What to do with the rendered artifact.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Persist the queue remainder and fan out to the destinations.
    Publish,
    /// Write the artifact to `output`, skip publishing, mutate nothing.
    DryRun { output: PathBuf },
}

impl RunMode {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunMode::DryRun { .. })
    }
}

/// Execute one run against already-constructed collaborators.
///
/// Separated from [`run_from_config`] so tests can inject an in-memory queue
/// store, a canned renderer, and mock destinations.
pub async fn execute_run(
    catalog: &Catalog,
    exclusions: &ExclusionSet,
    queue: &RotationQueue,
    renderer: &dyn Render,
    publisher: &FanoutPublisher,
    mode: RunMode,
) -> Result<RunReport> {
    let selection = queue.next(catalog.len(), exclusions)?;
    let item = catalog.get(selection.selected).ok_or_else(|| {
        RotacastError::InvalidInput(format!(
            "selected identifier {} is outside the catalog",
            selection.selected
        ))
    })?;
    let caption = item.caption();

    info!(
        selected = selection.selected,
        pending = selection.remaining.len(),
        caption = %caption,
        "Selected item"
    );

    let render_result = renderer.render(&item.image_url).await;

    match mode {
        RunMode::DryRun { output } => {
            let artifact = render_result?;
            std::fs::write(&output, &artifact.bytes)?;
            info!(
                output = %output.display(),
                bytes = artifact.len(),
                "Dry run: artifact written locally, queue state untouched"
            );

            Ok(RunReport {
                selected: selection.selected,
                caption,
                image_url: item.image_url.clone(),
                dry_run: true,
                remaining: selection.remaining.len(),
                outcomes: Vec::new(),
                finished_at: chrono::Utc::now().timestamp(),
            })
        }
        RunMode::Publish => {
            // The selection is consumed once the remainder is durable, and it
            // is consumed whether or not the render succeeded: a dead asset
            // URL must not pin the head of the queue forever.
            let artifact = match render_result {
                Ok(artifact) => {
                    queue.commit(&selection.remaining)?;
                    artifact
                }
                Err(e) => {
                    warn!(
                        selected = selection.selected,
                        "Render failed; consuming the identifier anyway"
                    );
                    queue.commit(&selection.remaining)?;
                    return Err(e);
                }
            };

            let outcomes = publisher.publish(&artifact, &caption).await;

            let failed = outcomes.iter().filter(|o| !o.success).count();
            if failed > 0 {
                warn!(
                    failed,
                    total = outcomes.len(),
                    "Some destinations did not accept the post"
                );
            }

            Ok(RunReport {
                selected: selection.selected,
                caption,
                image_url: item.image_url.clone(),
                dry_run: false,
                remaining: selection.remaining.len(),
                outcomes,
                finished_at: chrono::Utc::now().timestamp(),
            })
        }
    }
}

/// Wire the real components from configuration and execute one run.
pub async fn run_from_config(config: &Config, dry_run: bool) -> Result<RunReport> {
    let catalog = Catalog::load(&config.catalog.path)?;
    let exclusions = match &config.queue.exclusions {
        Some(path) => ExclusionSet::load(path)?,
        None => ExclusionSet::default(),
    };
    info!(
        items = catalog.len(),
        excluded = exclusions.len(),
        "Loaded catalog and exclusions"
    );

    let queue = RotationQueue::open(&config.queue.path);
    let renderer = ImageRenderer::new(&config.render)?;
    let publish_timeout = std::time::Duration::from_secs(config.publish.timeout_secs);

    if dry_run {
        let publisher = FanoutPublisher::new(Vec::new(), publish_timeout);
        let mode = RunMode::DryRun {
            output: PathBuf::from(&config.dry_run.output),
        };
        return execute_run(&catalog, &exclusions, &queue, &renderer, &publisher, mode).await;
    }

    let (platforms, setup_failures) = create_platforms(config).await;
    let publisher = FanoutPublisher::new(platforms, publish_timeout);

    let mut report = execute_run(
        &catalog,
        &exclusions,
        &queue,
        &renderer,
        &publisher,
        RunMode::Publish,
    )
    .await?;

    // Destinations that never got as far as the fan-out (bad credentials,
    // failed session setup) still owe the operator an outcome line.
    report.outcomes.extend(setup_failures);

    Ok(report)
}
