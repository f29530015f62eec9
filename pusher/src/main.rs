mod app;
mod script;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::{LevelFilter, info, warn};
use sim::{Scene, SimConfig};

use crate::app::App;
use crate::script::EventScript;

const DEFAULT_FRAMES: u64 = 600;

const USAGE: &str = "usage: pusher [--config <file.json>] [--script <events.txt>] [--frames <n>]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    frames: Option<u64>,
    help: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = args.next().context("--config needs a file")?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--script" | "-s" => {
                let value = args.next().context("--script needs a file")?;
                parsed.script = Some(PathBuf::from(value));
            }
            "--frames" | "-n" => {
                let value = args.next().context("--frames needs a count")?;
                let frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count `{value}`"))?;
                parsed.frames = Some(frames);
            }
            "--help" | "-h" => parsed.help = true,
            other => bail!("unexpected argument `{other}`\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .format_timestamp_millis()
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    init_logging();

    let config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => SimConfig::default(),
    };

    let script = match &args.script {
        Some(path) => EventScript::load(path)?,
        None => EventScript::default(),
    };

    let scene = Scene::assemble(&config).context("assembling scene")?;
    info!(
        "scene: {} pieces, inertia {:?}, stepping {:?}",
        scene.pieces().len(),
        config.inertia_model(),
        config.actuator.stepping
    );

    let frames = args.frames.unwrap_or(DEFAULT_FRAMES);
    if script.is_empty() {
        info!("no scripted input, the pusher stays idle");
    } else if let Some(last) = script.last_frame()
        && last >= frames
    {
        warn!("script has events up to frame {last} but only {frames} frames run");
    }

    let mut app = App::new(scene, script);
    app.run(frames);

    let scene = app.scene();
    if let Some(motion) = scene.world().motion_state(scene.pusher()) {
        let t = motion.translation();
        info!("final pusher position ({} | {} | {})", t.x, t.y, t.z);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_all_options() {
        let parsed = args(&["--config", "c.json", "-s", "e.txt", "--frames", "42"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("c.json")));
        assert_eq!(parsed.script, Some(PathBuf::from("e.txt")));
        assert_eq!(parsed.frames, Some(42));
        assert!(!parsed.help);
    }

    #[test]
    fn no_arguments_means_defaults() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn rejects_missing_values_and_unknown_flags() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--frames", "many"]).is_err());
        assert!(args(&["--fast"]).is_err());
    }
}
