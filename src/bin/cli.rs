//! tetrackt CLI: render a pattern to WAV or play it live.
//!
//! Usage:
//!   tt-cli render --out song.wav --track "C-4 --- E-4 ---" --track "--- G-3 --- ---"
//!   tt-cli play --track "C-4 E-4 G-4 C-5" --loop-end 3 --seconds 8
//!   tt-cli presets

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tetrackt::build_pattern;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tt_ir::{find_preset, MixerConfig, OscillatorKind, ENVELOPE_PRESETS};
use tt_master::{Controller, EngineConfig};

#[derive(Parser)]
#[command(name = "tt-cli", version, about = "Step-sequencer synth: render or play tracker patterns")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the pattern to a 16-bit stereo WAV file
    Render {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
        /// Ticks to render (default: one pass over the pattern or loop)
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Play the pattern on the default audio device
    Play {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Stop after this many seconds (default: one pass, forever when looping)
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// List the built-in envelope presets
    Presets,
}

#[derive(Args)]
struct PatternArgs {
    /// Engine settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// One track per flag: whitespace-separated cells such as "C-4 --- E-4"
    #[arg(long = "track", short = 't')]
    tracks: Vec<String>,
    /// Pattern length in rows (default: longest track)
    #[arg(long)]
    rows: Option<u16>,
    /// Loop rows 0..=ROW instead of playing the whole pattern
    #[arg(long)]
    loop_end: Option<u16>,
    /// Waveform for oscillator A of every track
    #[arg(long, default_value = "sine", value_parser = parse_wave)]
    wave: OscillatorKind,
    /// Waveform for oscillator B of every track
    #[arg(long, default_value = "silent", value_parser = parse_wave)]
    wave_b: OscillatorKind,
    /// Balance between oscillators A (0.0) and B (1.0)
    #[arg(long, default_value_t = 0.0)]
    balance: f64,
    /// Envelope preset name for both oscillators
    #[arg(long)]
    envelope: Option<String>,
    /// Global volume in [0, 1] (overrides the config file)
    #[arg(long)]
    volume: Option<f64>,
}

fn parse_wave(name: &str) -> Result<OscillatorKind, String> {
    OscillatorKind::SELECTABLE
        .into_iter()
        .chain([OscillatorKind::Silent])
        .find(|k| k.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            let names: Vec<_> = OscillatorKind::SELECTABLE.iter().map(|k| k.name()).collect();
            format!("unknown waveform {name:?}, expected one of {} or silent", names.join(", "))
        })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Render { pattern, out, ticks } => render(&pattern, &out, ticks),
        Command::Play { pattern, seconds } => play(&pattern, seconds),
        Command::Presets => {
            for preset in &ENVELOPE_PRESETS {
                let env = preset.envelope;
                println!(
                    "{:<18} {:<11} A {:.2}  D {:.2}  S {:.2}  R {:.2}",
                    preset.name, preset.category, env.attack, env.decay, env.sustain, env.release
                );
            }
            Ok(())
        }
    }
}

/// Build a controller holding the pattern described by `args`.
fn controller(args: &PatternArgs) -> Result<Controller> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(volume) = args.volume {
        config.global_volume = volume;
    }
    let config = config.validated()?;

    let mut pattern = build_pattern(&args.tracks, args.rows, config.tracks, config.rows)?;
    let envelope = match &args.envelope {
        Some(name) => match find_preset(name) {
            Some(preset) => Some(preset.envelope),
            None => bail!("unknown envelope preset {name:?} (see `tt-cli presets`)"),
        },
        None => None,
    };
    for index in 0..pattern.track_count() {
        if let Some(track) = pattern.track_mut(index) {
            let inst = &mut track.instrument;
            inst.osc_a.kind = args.wave;
            inst.osc_b.kind = args.wave_b;
            inst.mixer = MixerConfig::new(args.balance.clamp(0.0, 1.0));
            if let Some(envelope) = envelope {
                inst.env_a = envelope;
                inst.env_b = envelope;
            }
        }
    }
    if let Some(end) = args.loop_end {
        pattern.cursor_row = end.min(pattern.rows().saturating_sub(1));
    }

    debug!(
        tracks = pattern.track_count(),
        rows = pattern.rows(),
        loop_end = ?args.loop_end,
        "pattern ready"
    );
    let ctrl = Controller::new(config);
    ctrl.set_pattern(pattern);
    Ok(ctrl)
}

/// Rows in one pass: the whole pattern, or up to the loop end.
fn pass_ticks(ctrl: &Controller, looping: bool) -> usize {
    ctrl.with_pattern(|pattern| {
        if looping {
            pattern.cursor_row as usize + 1
        } else {
            pattern.rows() as usize
        }
    })
}

/// How long `play` runs: `--seconds` when given, else one pass of
/// `pass_ticks` rows, else forever when looping.
fn play_limit(seconds: Option<f64>, looping: bool, pass_ticks: usize, tick_ms: u32) -> Result<Option<Duration>> {
    match seconds {
        Some(s) if s > 0.0 => match Duration::try_from_secs_f64(s) {
            Ok(limit) => Ok(Some(limit)),
            Err(_) => bail!("--seconds is out of range, got {s}"),
        },
        Some(s) => bail!("--seconds must be positive, got {s}"),
        None if looping => Ok(None),
        None => {
            let ms = (pass_ticks as u64).saturating_mul(u64::from(tick_ms));
            Ok(Some(Duration::from_millis(ms)))
        }
    }
}

fn render(args: &PatternArgs, out: &Path, ticks: Option<usize>) -> Result<()> {
    let ctrl = controller(args)?;
    let looping = args.loop_end.is_some();
    let ticks = ticks.unwrap_or_else(|| pass_ticks(&ctrl, looping));

    println!(
        "Rendering {} ticks to {} at {} Hz...",
        ticks,
        out.display(),
        ctrl.config().sample_rate
    );
    let frames = ctrl
        .render_to_wav(out, ticks, looping)
        .with_context(|| format!("failed to render {}", out.display()))?;
    println!("Wrote {} frames.", frames);
    Ok(())
}

fn play(args: &PatternArgs, seconds: Option<f64>) -> Result<()> {
    let mut ctrl = controller(args)?;
    let looping = args.loop_end.is_some();
    let limit = play_limit(seconds, looping, pass_ticks(&ctrl, false), ctrl.config().tick_ms)?;

    ctrl.play(looping).context("failed to start playback")?;
    println!("Playing...");
    println!();

    let started = Instant::now();
    while ctrl.is_playing() && limit.map_or(true, |l| started.elapsed() < l) {
        if let Some(row) = ctrl.playback_row() {
            print!("\rRow: {:02}", row);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    ctrl.stop();

    // Let the last row's notes finish in the device callback.
    std::thread::sleep(Duration::from_millis(ctrl.config().row_note_ms as u64));
    println!("\rDone.          ");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_limit_uses_seconds() {
        let limit = play_limit(Some(1.5), false, 4, 250).unwrap();
        assert_eq!(limit, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn play_limit_defaults_to_one_pass() {
        assert_eq!(play_limit(None, false, 4, 250).unwrap(), Some(Duration::from_secs(1)));
        assert_eq!(play_limit(None, true, 4, 250).unwrap(), None);
    }

    #[test]
    fn play_limit_rejects_bad_seconds() {
        for s in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e300, f64::MAX] {
            assert!(play_limit(Some(s), false, 4, 250).is_err(), "{s}");
        }
    }

    #[test]
    fn play_limit_saturates_long_passes() {
        let limit = play_limit(None, false, usize::MAX, u32::MAX).unwrap();
        assert_eq!(limit, Some(Duration::from_millis(u64::MAX)));
    }
}
