//! Headless controller for tetrackt.
//!
//! Owns the pattern and the sequencer behind mutexes, drives the sequencer
//! from a tick thread for live playback, previews single notes, and renders
//! patterns offline to frames or WAV files. Both the CLI and any front end
//! share this API.

mod config;
mod offline;
mod wav;

use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use tt_audio::{voice_channel, AudioError, AudioOutput, CpalOutput, VoiceSender};
use tt_engine::{Gain, GainSetting, Sequencer, Synth, Voice, VoiceSink};

// Re-export common types so callers don't need tt-ir/tt-engine directly.
pub use config::{ConfigError, EngineConfig};
pub use offline::OfflineSink;
pub use tt_engine::{Frame, PlayState};
pub use tt_ir::{Instrument, Note, Pattern};
pub use wav::{frames_to_wav, write_wav};

/// Step used by [`Controller::nudge_global_volume`] callers.
pub const VOLUME_STEP: f64 = 0.05;

/// Upper bound on frames reserved up front by [`Controller::render_ticks`].
const MAX_PREALLOC_FRAMES: usize = 1 << 22;

/// Errors surfaced by the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("wav export failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Headless tracker controller: owns a pattern and manages playback.
pub struct Controller {
    config: EngineConfig,
    pattern: Arc<Mutex<Pattern>>,
    sequencer: Arc<Mutex<Sequencer>>,
    audio: Option<AudioHandle>,
    playback: Option<PlaybackHandle>,
}

struct AudioHandle {
    output: CpalOutput,
    sender: Arc<Mutex<VoiceSender>>,
    synth: Synth,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(config: EngineConfig) -> Self {
        let pattern = Pattern::new(config.tracks, config.rows);
        let mut sequencer = Sequencer::new(config::ms_to_frames(config.row_note_ms, config.sample_rate));
        sequencer.set_global_volume(config.global_volume);
        Self {
            config,
            pattern: Arc::new(Mutex::new(pattern)),
            sequencer: Arc::new(Mutex::new(sequencer)),
            audio: None,
            playback: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Pattern editing ---

    /// Lock the pattern for reading or editing.
    ///
    /// The tick thread takes the same lock, so edits never race a row read.
    /// The lock is not reentrant: drop the guard before calling any other
    /// controller method, or use [`Controller::with_pattern`].
    pub fn pattern(&self) -> MutexGuard<'_, Pattern> {
        self.pattern.lock()
    }

    /// Run `f` with the pattern locked, releasing the lock before returning.
    pub fn with_pattern<R>(&self, f: impl FnOnce(&mut Pattern) -> R) -> R {
        f(&mut self.pattern.lock())
    }

    pub fn set_pattern(&self, pattern: Pattern) {
        *self.pattern.lock() = pattern;
    }

    // --- Global volume ---

    pub fn global_volume(&self) -> f64 {
        self.sequencer.lock().global_volume()
    }

    pub fn set_global_volume(&self, volume: f64) {
        self.sequencer.lock().set_global_volume(volume);
    }

    /// Move the global volume by `delta`, rounded to hundredths and clamped.
    pub fn nudge_global_volume(&self, delta: f64) -> f64 {
        let mut seq = self.sequencer.lock();
        let volume = ((seq.global_volume() + delta) * 100.0).round() / 100.0;
        seq.set_global_volume(volume);
        seq.global_volume()
    }

    // --- Real-time playback ---

    /// Open the default output device if it is not open yet.
    pub fn open_audio(&mut self) -> Result<(), ControllerError> {
        if self.audio.is_some() {
            return Ok(());
        }
        let mut output = CpalOutput::new()?;
        let (sender, mixer) = voice_channel();
        output.build_stream(mixer)?;

        let sample_rate = output.sample_rate();
        if sample_rate != self.config.sample_rate {
            info!(device = sample_rate, config = self.config.sample_rate, "using device sample rate for playback");
        }
        self.sequencer
            .lock()
            .set_row_frames(config::ms_to_frames(self.config.row_note_ms, sample_rate));

        self.audio = Some(AudioHandle {
            output,
            sender: Arc::new(Mutex::new(sender)),
            synth: Synth::new(sample_rate),
        });
        Ok(())
    }

    /// Start playback from row 0 on a tick thread.
    ///
    /// With `looping`, rows wrap after the edit cursor's current row.
    pub fn play(&mut self, looping: bool) -> Result<(), ControllerError> {
        self.stop();
        self.open_audio()?;
        let Some(audio) = self.audio.as_mut() else {
            return Ok(());
        };
        audio.output.start()?;

        {
            let pattern = self.pattern.lock();
            self.sequencer.lock().start(&pattern, looping);
        }

        let stop_signal = Arc::new(AtomicBool::new(false));
        let ticker = Ticker {
            pattern: self.pattern.clone(),
            sequencer: self.sequencer.clone(),
            sender: audio.sender.clone(),
            synth: audio.synth,
            interval: Duration::from_millis(self.config.tick_ms as u64),
            stop_signal: stop_signal.clone(),
        };
        let thread = thread::Builder::new()
            .name("tt-tick".into())
            .spawn(move || ticker.run())
            .map_err(|e| AudioError::Playback(e.to_string()))?;

        self.playback = Some(PlaybackHandle {
            stop_signal,
            thread: Some(thread),
        });
        Ok(())
    }

    /// Halt the tick thread. Notes already sent keep sounding to their end.
    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                handle.thread().unpark();
                let _ = handle.join();
            }
        }
        self.sequencer.lock().stop();
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.lock().is_playing()
    }

    /// Row the next tick will play.
    pub fn playback_row(&self) -> Option<u16> {
        self.sequencer.lock().playback_row()
    }

    /// Voice for previewing `note` with a track's instrument, scaled by the
    /// global volume. `None` for off notes or unknown tracks.
    pub fn preview_voice(&self, synth: &Synth, track: usize, note: Note) -> Option<Gain<Voice>> {
        let instrument = self.pattern.lock().track(track)?.instrument;
        let frames = synth.frames_for_ms(self.config.preview_note_ms);
        let voice = synth.voice(note, frames, &instrument)?;
        Some(Gain::new(voice, GainSetting::from_linear(self.global_volume())))
    }

    /// Sound `note` once on the output device, independent of playback.
    /// Returns whether a voice was sent.
    pub fn preview_note(&mut self, track: usize, note: Note) -> Result<bool, ControllerError> {
        self.open_audio()?;
        let Some(audio) = self.audio.as_ref() else {
            return Ok(false);
        };
        let Some(voice) = self.preview_voice(&audio.synth, track, note) else {
            return Ok(false);
        };
        debug!(track, %note, "preview");
        audio.sender.lock().play(Box::new(voice));
        Ok(true)
    }

    // --- Offline rendering ---

    /// Synth at the configured offline sample rate.
    pub fn offline_synth(&self) -> Synth {
        Synth::new(self.config.sample_rate)
    }

    /// Render `ticks` rows from row 0 with a fresh sequencer.
    ///
    /// Each tick advances exactly [`EngineConfig::tick_frames`] frames; notes
    /// still sounding after the last tick are rendered to their end.
    pub fn render_ticks(&self, ticks: usize, looping: bool) -> Vec<Frame> {
        let synth = self.offline_synth();
        let pattern = self.pattern.lock().clone();
        let mut seq = Sequencer::new(synth.frames_for_ms(self.config.row_note_ms));
        seq.set_global_volume(self.global_volume());
        seq.start(&pattern, looping);

        let tick_frames = self.config.tick_frames();
        let mut sink = OfflineSink::new();
        let mut frames = Vec::with_capacity(render_capacity(ticks, tick_frames));
        for _ in 0..ticks {
            seq.tick(&pattern, &synth, &mut sink);
            sink.render(tick_frames, &mut frames);
        }
        sink.drain(&mut frames);
        frames
    }

    /// Render `ticks` rows and write them to a 16-bit stereo WAV file.
    /// Returns the number of frames written.
    pub fn render_to_wav(
        &self,
        path: impl AsRef<Path>,
        ticks: usize,
        looping: bool,
    ) -> Result<usize, ControllerError> {
        let frames = self.render_ticks(ticks, looping);
        write_wav(path.as_ref(), &frames, self.config.sample_rate)?;
        info!(path = %path.as_ref().display(), frames = frames.len(), "rendered wav");
        Ok(frames.len())
    }
}

/// Frames to reserve for `ticks` ticks; the tail and any overflow grow on demand.
fn render_capacity(ticks: usize, tick_frames: usize) -> usize {
    ticks.saturating_mul(tick_frames).min(MAX_PREALLOC_FRAMES)
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State moved onto the tick thread.
struct Ticker {
    pattern: Arc<Mutex<Pattern>>,
    sequencer: Arc<Mutex<Sequencer>>,
    sender: Arc<Mutex<VoiceSender>>,
    synth: Synth,
    interval: Duration,
    stop_signal: Arc<AtomicBool>,
}

impl Ticker {
    fn run(self) {
        let mut deadline = Instant::now();
        while !self.stop_signal.load(Ordering::Relaxed) {
            {
                // Lock order: pattern, sequencer, sender.
                let pattern = self.pattern.lock();
                let mut seq = self.sequencer.lock();
                let mut sender = self.sender.lock();
                if seq.tick(&pattern, &self.synth, &mut *sender).is_none() {
                    break;
                }
            }

            deadline += self.interval;
            let now = Instant::now();
            if now > deadline {
                warn!(late_ms = (now - deadline).as_millis() as u64, "tick overran");
                deadline = now;
                continue;
            }
            // Deadline-based so sleep error does not accumulate.
            while !self.stop_signal.load(Ordering::Relaxed) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::park_timeout(deadline - now);
            }
        }
        debug!("tick thread exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_engine::render_to_vec;
    use tt_ir::{OscillatorKind, PitchClass};

    fn small_config() -> EngineConfig {
        EngineConfig {
            sample_rate: 8000,
            tick_ms: 100,
            row_note_ms: 50,
            tracks: 2,
            rows: 4,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn new_controller_uses_config_grid() {
        let ctrl = Controller::new(small_config());
        assert_eq!(ctrl.pattern().track_count(), 2);
        assert_eq!(ctrl.pattern().rows(), 4);
        assert!(!ctrl.is_playing());
        assert_eq!(ctrl.playback_row(), None);
    }

    #[test]
    fn default_controller_is_8_by_64() {
        let ctrl = Controller::default();
        assert_eq!(ctrl.pattern().track_count(), 8);
        assert_eq!(ctrl.pattern().rows(), 64);
    }

    #[test]
    fn render_ticks_advances_tick_frames_per_row() {
        let ctrl = Controller::new(small_config());
        ctrl.pattern().cell_mut(0, 0).unwrap().note = Note::new(PitchClass::A, 4);
        let frames = ctrl.render_ticks(4, false);
        // 4 ticks of 800 frames, no tail since notes are shorter than a tick
        assert_eq!(frames.len(), 3200);
        assert!(frames[..400].iter().any(|f| f.left != 0.0));
        assert!(frames[400..].iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn render_capacity_saturates_and_caps() {
        assert_eq!(render_capacity(4, 800), 3200);
        assert_eq!(render_capacity(0, 800), 0);
        assert_eq!(render_capacity(usize::MAX, 800), MAX_PREALLOC_FRAMES);
        assert_eq!(render_capacity(usize::MAX / 2, usize::MAX), MAX_PREALLOC_FRAMES);
    }

    #[test]
    fn with_pattern_releases_lock_for_controller_calls() {
        let ctrl = Controller::new(small_config());
        let rows = ctrl.with_pattern(|p| {
            p.cell_mut(0, 0).unwrap().note = Note::new(PitchClass::A, 4);
            p.rows()
        });
        assert_eq!(rows, 4);

        let synth = ctrl.offline_synth();
        assert!(ctrl.preview_voice(&synth, 0, Note::new(PitchClass::A, 4)).is_some());
        let frames = ctrl.render_ticks(1, false);
        assert!(frames.iter().any(|f| f.left != 0.0));
    }

    #[test]
    fn render_ticks_repeats_pattern() {
        let ctrl = Controller::new(small_config());
        ctrl.pattern().cell_mut(1, 2).unwrap().note = Note::new(PitchClass::C, 5);
        let frames = ctrl.render_ticks(8, false);
        // Row 2 sounds on ticks 2 and 6
        assert_eq!(&frames[1600..2000], &frames[4800..5200]);
        assert!(frames[1600..2000].iter().any(|f| f.left != 0.0));
    }

    #[test]
    fn looped_render_stays_in_loop() {
        let ctrl = Controller::new(small_config());
        ctrl.with_pattern(|pattern| {
            pattern.cell_mut(0, 3).unwrap().note = Note::new(PitchClass::E, 4);
            pattern.cursor_row = 1;
        });
        // Rows 0-1 only: row 3 never plays
        let frames = ctrl.render_ticks(10, true);
        assert!(frames.iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn long_notes_render_tail() {
        let config = EngineConfig { row_note_ms: 250, ..small_config() };
        let ctrl = Controller::new(config);
        ctrl.pattern().cell_mut(0, 1).unwrap().note = Note::new(PitchClass::G, 4);
        let frames = ctrl.render_ticks(2, false);
        // Note starts at tick 1 (frame 800) and lasts 2000 frames
        assert_eq!(frames.len(), 2800);
    }

    #[test]
    fn global_volume_nudges_in_steps_and_clamps() {
        let ctrl = Controller::default();
        assert_eq!(ctrl.nudge_global_volume(-VOLUME_STEP), 0.95);
        assert_eq!(ctrl.nudge_global_volume(VOLUME_STEP), 1.0);
        assert_eq!(ctrl.nudge_global_volume(VOLUME_STEP), 1.0);
        for _ in 0..30 {
            ctrl.nudge_global_volume(-VOLUME_STEP);
        }
        assert_eq!(ctrl.global_volume(), 0.0);
    }

    #[test]
    fn muted_render_is_silent() {
        let ctrl = Controller::new(small_config());
        ctrl.set_global_volume(0.0);
        ctrl.pattern().cell_mut(0, 0).unwrap().note = Note::new(PitchClass::A, 4);
        assert!(ctrl.render_ticks(1, false).iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn preview_voice_uses_track_instrument() {
        let ctrl = Controller::new(small_config());
        ctrl.pattern().track_mut(1).unwrap().instrument = Instrument::single(OscillatorKind::Square);
        let synth = ctrl.offline_synth();

        let mut voice = ctrl.preview_voice(&synth, 1, Note::new(PitchClass::C, 2)).unwrap();
        let frames = render_to_vec(&mut voice, 10_000);
        assert_eq!(frames.len(), 2000);
        assert_eq!(frames[0].left, 1.0);

        assert!(ctrl.preview_voice(&synth, 1, Note::Off).is_none());
        assert!(ctrl.preview_voice(&synth, 9, Note::new(PitchClass::C, 2)).is_none());
    }

    #[test]
    fn render_to_wav_writes_file() {
        let ctrl = Controller::new(small_config());
        ctrl.pattern().cell_mut(0, 0).unwrap().note = Note::new(PitchClass::D, 4);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pattern.wav");
        let written = ctrl.render_to_wav(&path, 4, false).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration() as usize, written);
        assert_eq!(reader.spec().sample_rate, 8000);
    }
}
