use crate::config::LandscapeConfig;
use crate::scene_builder;
use anyhow::{Context, Result};
use landscape_render::{FrameStats, RecordingDevice};
use landscape_testkit::{FrameRecord, JsonlSink, MeshMetricSink};
use std::path::PathBuf;

pub struct HeadlessConfig {
    pub frames: u64,
    pub command_log: Option<PathBuf>,
    pub mesh_metrics: Option<PathBuf>,
}

/// Build the scene on a recording device and render `frames` frames without a window.
pub fn run(config: &LandscapeConfig, cfg: HeadlessConfig) -> Result<Vec<FrameStats>> {
    let mut gpu = RecordingDevice::new(config.window.width, config.window.height);
    let mut built = scene_builder::build(&mut gpu, config)?;

    let setup = gpu.take_commands();
    tracing::debug!(commands = setup.len(), "scene setup recorded");

    let mut command_log = match &cfg.command_log {
        Some(path) => Some(
            JsonlSink::create(path)
                .with_context(|| format!("failed to create command log {}", path.display()))?,
        ),
        None => None,
    };

    let mut stats = Vec::with_capacity(cfg.frames as usize);
    for _ in 0..cfg.frames {
        let frame = built
            .driver
            .render(&mut gpu, &built.scene)
            .context("headless frame failed")?;
        let commands = gpu.take_commands();
        if let Some(sink) = command_log.as_mut() {
            for (seq, command) in commands.iter().enumerate() {
                sink.write(&FrameRecord {
                    frame: frame.frame,
                    seq,
                    payload: command,
                })?;
            }
        }
        tracing::info!(
            frame = frame.frame,
            depth_draws = frame.depth_draws,
            object_draws = frame.object_draws,
            commands = commands.len(),
            "headless frame"
        );
        stats.push(frame);
    }

    if let Some(mut sink) = command_log {
        sink.flush()?;
        tracing::info!(lines = sink.lines(), "command log written");
    }

    if let Some(path) = &cfg.mesh_metrics {
        MeshMetricSink::create(path)
            .and_then(|mut sink| sink.write(std::slice::from_ref(&built.terrain)))
            .with_context(|| format!("failed to write mesh metrics {}", path.display()))?;
        tracing::info!(path = %path.display(), hash = %built.terrain.hash, "mesh metrics written");
    }

    Ok(stats)
}
