use crate::App;
use starfield_graphics::{GraphicsBackend, NullGraphics};
use starfield_project::{ProjectConfig, RuntimeConfig, StarsConfig};
use starfield_runtime::Runtime;
use starfield_stars::{
    FileTemplateSource, RecordError, StarRecord, StarStyle, StarsError, StarsManager,
    StarsOptions, parse_star_feed,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("feed {path} rejected: {source}")]
    Records {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
}

/// What a headless session did, reported once it has torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub updates_applied: u64,
    pub feed_failures: u64,
    pub peak_live: usize,
    pub disposed_on_detach: usize,
    pub rejected_draws: u64,
    pub meshes_released: u64,
    pub materials_released: u64,
}

pub fn star_style(config: &StarsConfig) -> StarStyle {
    StarStyle {
        size: config.size,
        spin_step: config.spin_step,
        highlight_intensity: config.highlight_intensity,
        ambient_intensity: config.ambient_intensity,
        ..StarStyle::default()
    }
}

pub fn create_headless_app() -> App<NullGraphics> {
    App::new(Runtime::new(), NullGraphics::new())
}

/// Builds the manager for `config` on the app's scene and frame loop. `local_root` is
/// where `local://` paths point.
pub fn create_stars_manager<B: GraphicsBackend>(
    app: &mut App<B>,
    config: &ProjectConfig,
    local_root: &Path,
) -> StarsManager {
    let source = Arc::new(FileTemplateSource::new(config.template_path(local_root)));
    let options = StarsOptions {
        highlight_ids: config.stars.highlight_ids.clone(),
        style: star_style(&config.stars),
    };
    StarsManager::initialize(
        Arc::clone(&app.runtime.scene),
        &mut app.runtime.frames,
        source,
        options,
    )
}

pub async fn read_feed(path: &Path) -> Result<Vec<StarRecord>, FeedError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_star_feed(&json).map_err(|source| FeedError::Records {
        path: path.to_path_buf(),
        source,
    })
}

/// Polls the feed and drives frames at `runtime.frame_rate`. Runs `runtime.frames`
/// frames, or forever when that is 0. A feed that fails to load leaves the current stars
/// in place.
pub async fn run_frames<B: GraphicsBackend>(
    app: &mut App<B>,
    manager: &StarsManager,
    feed: &Path,
    runtime: &RuntimeConfig,
    summary: &mut RunSummary,
) {
    let delta = runtime.frame_delta();
    let mut ticker = tokio::time::interval(Duration::from_secs_f32(delta));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut frame: u64 = 0;
    while runtime.frames == 0 || frame < runtime.frames {
        let reload = if runtime.reload_every == 0 {
            frame == 0
        } else {
            frame % runtime.reload_every == 0
        };
        if reload {
            poll_feed(manager, feed, summary).await;
        }
        ticker.tick().await;
        app.frame(delta);
        frame += 1;
        summary.frames = frame;
    }
}

async fn poll_feed(manager: &StarsManager, feed: &Path, summary: &mut RunSummary) {
    let records = match read_feed(feed).await {
        Ok(records) => records,
        Err(err) => {
            log::error!("{err}");
            summary.feed_failures += 1;
            return;
        }
    };
    match manager.update(&records).await {
        Ok(report) if !report.superseded => {
            summary.updates_applied += 1;
            summary.peak_live = summary.peak_live.max(manager.len());
        }
        Ok(_) => {}
        Err(StarsError::Detached) => log::warn!("feed arrived after detach"),
        Err(err) => {
            log::error!("star update failed: {err}");
            summary.feed_failures += 1;
        }
    }
}

/// Detaches the manager and presents one last frame so the backend sees every release.
pub fn shutdown(
    app: &mut App<NullGraphics>,
    manager: &StarsManager,
    summary: &mut RunSummary,
) {
    summary.disposed_on_detach = manager.detach();
    app.present();
    summary.rejected_draws = app.runtime.rejected_draws();
    summary.meshes_released = app.graphics.resources().released_mesh_count();
    summary.materials_released = app.graphics.resources().released_material_count();
}
