use anyhow::Context;
use starfield_app::entry::{self, RunSummary};
use starfield_project::load_project_toml;
use std::{env, path::PathBuf};

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

fn current_dir_fallback() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let path = parse_flag_value(&args, "--path")
        .map(PathBuf::from)
        .unwrap_or_else(current_dir_fallback);

    let (config, root) = load_project_toml(&path)
        .with_context(|| format!("loading project config from {}", path.display()))?;
    log::info!(
        "starting {} (template {}, feed {})",
        config.name,
        config.template,
        config.feed
    );

    let mut app = entry::create_headless_app();
    let manager = entry::create_stars_manager(&mut app, &config, &root);
    let feed = config.feed_path(&root);
    let mut summary = RunSummary::default();

    tokio::select! {
        _ = entry::run_frames(&mut app, &manager, &feed, &config.runtime, &mut summary) => {}
        _ = tokio::signal::ctrl_c() => log::info!("interrupted"),
    }

    entry::shutdown(&mut app, &manager, &mut summary);
    log::info!(
        "{} frames, {} updates, {} feed failures, peak {} stars, {} disposed on detach",
        summary.frames,
        summary.updates_applied,
        summary.feed_failures,
        summary.peak_live,
        summary.disposed_on_detach
    );
    log::info!(
        "released {} meshes and {} materials, {} rejected draws",
        summary.meshes_released,
        summary.materials_released,
        summary.rejected_draws
    );
    Ok(())
}
