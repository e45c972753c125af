//! landscape - procedural voxel terrain rendered with shadow mapping
//!
//! Windowed viewer plus a headless capture mode

mod app;
mod config;
mod headless;
mod input;
mod scene_builder;

use anyhow::Result;
use config::{LandscapeConfig, DEFAULT_CONFIG_PATH};
use std::{env, path::PathBuf};
use tracing::info;

const DEFAULT_HEADLESS_FRAMES: u64 = 3;

fn main() -> Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting landscape v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    let mut config = match &cli.config {
        Some(path) => LandscapeConfig::load_from_path(path),
        None => LandscapeConfig::load(),
    };
    cli.apply(&mut config);

    if let Some(path) = &cli.write_config {
        config.save_to_path(path)?;
        info!(path = %path.display(), "wrote resolved config");
        return Ok(());
    }

    if cli.headless {
        let stats = headless::run(
            &config,
            headless::HeadlessConfig {
                frames: cli.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES),
                command_log: cli.command_log.clone(),
                mesh_metrics: cli.mesh_metrics.clone(),
            },
        )?;
        info!(frames = stats.len(), "headless run complete");
        return Ok(());
    }

    if cli.frames.is_some() || cli.command_log.is_some() || cli.mesh_metrics.is_some() {
        tracing::warn!("--frames/--command-log/--mesh-metrics have no effect without --headless");
    }

    app::run(config)
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    headless: bool,
    frames: Option<u64>,
    command_log: Option<PathBuf>,
    mesh_metrics: Option<PathBuf>,
    resolution: Option<(u32, u32)>,
    seed: Option<u32>,
    write_config: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => opts.headless = true,
                "--config" => {
                    if let Some(path) = args.next() {
                        opts.config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!(
                            "--config requires a file path (default {DEFAULT_CONFIG_PATH})"
                        );
                    }
                }
                "--frames" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.frames = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--frames must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--frames requires an integer");
                    }
                }
                "--command-log" => {
                    if let Some(path) = args.next() {
                        opts.command_log = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--command-log requires a file path");
                    }
                }
                "--mesh-metrics" => {
                    if let Some(path) = args.next() {
                        opts.mesh_metrics = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--mesh-metrics requires a file path");
                    }
                }
                "--write-config" => {
                    if let Some(path) = args.next() {
                        opts.write_config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--write-config requires a file path");
                    }
                }
                "--resolution" => {
                    if let Some(raw) = args.next() {
                        match raw.split_once('x') {
                            Some((w, h)) => match (w.parse::<u32>(), h.parse::<u32>()) {
                                (Ok(width), Ok(height)) if width > 0 && height > 0 => {
                                    opts.resolution = Some((width, height));
                                }
                                _ => {
                                    tracing::error!(value = %raw, "--resolution must be like 1280x720");
                                }
                            },
                            None => {
                                tracing::error!(value = %raw, "--resolution must be like 1280x720");
                            }
                        }
                    } else {
                        tracing::error!("--resolution requires a value like 1280x720");
                    }
                }
                "--seed" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u32>() {
                            Ok(value) => opts.seed = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--seed must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--seed requires an integer");
                    }
                }
                other => tracing::warn!(arg = other, "ignoring unknown argument"),
            }
        }

        opts
    }

    /// Overlay command-line overrides on the loaded config.
    fn apply(&self, config: &mut LandscapeConfig) {
        if let Some((width, height)) = self.resolution {
            config.window.width = width;
            config.window.height = height;
        }
        if let Some(seed) = self.seed {
            config.terrain.seeds = vec![seed];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_headless_capture_flags() {
        let cli = parse(&[
            "--headless",
            "--frames",
            "5",
            "--command-log",
            "out/commands.jsonl",
            "--mesh-metrics",
            "out/mesh.json",
        ]);
        assert!(cli.headless);
        assert_eq!(cli.frames, Some(5));
        assert_eq!(cli.command_log, Some(PathBuf::from("out/commands.jsonl")));
        assert_eq!(cli.mesh_metrics, Some(PathBuf::from("out/mesh.json")));
    }

    #[test]
    fn malformed_values_are_ignored() {
        let cli = parse(&["--resolution", "wide", "--frames", "many", "--seed", "-1"]);
        assert_eq!(cli.resolution, None);
        assert_eq!(cli.frames, None);
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn overrides_apply_to_config() {
        let cli = parse(&["--resolution", "1280x720", "--seed", "42"]);
        let mut config = LandscapeConfig::default();
        cli.apply(&mut config);
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert_eq!(config.terrain.seeds, vec![42]);
    }
}
