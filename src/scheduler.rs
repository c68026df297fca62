//! EventScheduler — lookahead beat sequencer plus the background drone.
//!
//! Two clocks: the host wakes us roughly every 25 ms (jittery), and each wake
//! schedules every beat whose start falls inside `now + lookahead` at its
//! exact audio time. Beat times are derived from an integer beat count, so a
//! long session never drifts off the grid.

use std::collections::VecDeque;

use crate::dsp::engine::{AudioOutput, VoiceId};
use crate::dsp::instrument::Instrument;
use crate::dsp::synth::ensure_running;
use crate::error::{CoreError, CoreResult};

/// Tolerance when snapping a start time onto the beat grid.
const GRID_EPSILON: f64 = 1e-9;

/// Beat times kept for introspection.
const HISTORY: usize = 256;

// ── Configuration ───────────────────────────────────────────

/// Tempo and timing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub bpm: f64,
    /// How far ahead of the audio clock beats are scheduled (seconds).
    pub lookahead: f64,
    /// Expected host wake-up interval (seconds).
    pub wake_interval: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            bpm: 100.0,
            lookahead: 0.1,
            wake_interval: 0.025,
        }
    }
}

impl SchedulerConfig {
    /// Seconds per beat.
    pub fn beat_period(&self) -> f64 {
        60.0 / self.bpm
    }

    /// The lookahead must cover at least one wake-up, or beats fall into
    /// the gap between two ticks.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(CoreError::InvalidConfig(format!("bpm must be positive, got {}", self.bpm)));
        }
        if !(self.wake_interval.is_finite() && self.wake_interval > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "wake interval must be positive, got {}",
                self.wake_interval
            )));
        }
        if !(self.lookahead > self.wake_interval) {
            return Err(CoreError::InvalidConfig(format!(
                "lookahead {}s must exceed the wake interval {}s",
                self.lookahead, self.wake_interval
            )));
        }
        Ok(())
    }
}

// ── Beat clock ──────────────────────────────────────────────

/// Next-beat cursor plus the lookahead window.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatClock {
    origin: f64,
    period: f64,
    lookahead: f64,
    /// Grid index of the first beat.
    first_index: u64,
    /// Beats emitted since `origin`.
    emitted: u64,
}

impl BeatClock {
    pub fn new(origin: f64, period: f64, lookahead: f64) -> Self {
        let first_index = (origin / period + GRID_EPSILON).floor().max(0.0) as u64;
        BeatClock {
            origin,
            period,
            lookahead,
            first_index,
            emitted: 0,
        }
    }

    /// Audio time of the next beat.
    pub fn cursor(&self) -> f64 {
        self.origin + self.emitted as f64 * self.period
    }

    /// Pattern step (0..4) of the next beat.
    pub fn step(&self) -> usize {
        ((self.first_index + self.emitted) % 4) as usize
    }

    /// Is the next beat inside the window ending at `now + lookahead`?
    pub fn is_due(&self, now: f64) -> bool {
        self.cursor() < now + self.lookahead
    }

    pub fn advance(&mut self) {
        self.emitted += 1;
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

// ── Scheduler ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum State {
    Stopped,
    Running { clock: BeatClock, drone: VoiceId },
}

/// The music state machine: `Stopped` ⇄ `Running`.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    config: SchedulerConfig,
    state: State,
    /// Every voice this scheduler started that may still be sounding.
    voices: Vec<VoiceId>,
    /// Recent beat start times of the current run.
    beat_times: VecDeque<f64>,
    beats: u64,
    hi_hats: u64,
}

impl EventScheduler {
    pub fn new(config: SchedulerConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(EventScheduler {
            config,
            state: State::Stopped,
            voices: Vec::new(),
            beat_times: VecDeque::new(),
            beats: 0,
            hi_hats: 0,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Start the music at the output's current time. Starting while running
    /// restarts, so there is never more than one drone.
    pub fn start<O: AudioOutput + ?Sized>(&mut self, out: &mut O) {
        if self.is_running() {
            self.stop(out);
        }
        ensure_running(out);
        let origin = out.current_time();
        let drone = out.start_voice(Instrument::Drone, origin);
        self.voices.push(drone);
        self.beat_times.clear();
        self.beats = 0;
        self.hi_hats = 0;
        self.state = State::Running {
            clock: BeatClock::new(origin, self.config.beat_period(), self.config.lookahead),
            drone,
        };
        log::info!("music started at {origin:.3}s ({} bpm)", self.config.bpm);
        self.tick(out);
    }

    /// Stop the music and every voice it started, drone included. Idempotent.
    pub fn stop<O: AudioOutput + ?Sized>(&mut self, out: &mut O) {
        for id in self.voices.drain(..) {
            out.stop_voice(id);
        }
        if let State::Running { clock, .. } = std::mem::replace(&mut self.state, State::Stopped) {
            log::info!("music stopped after {} beats", clock.emitted());
        }
    }

    /// One host wake-up: schedule every beat inside the lookahead window.
    /// Returns the number of beats scheduled.
    pub fn tick<O: AudioOutput + ?Sized>(&mut self, out: &mut O) -> usize {
        let State::Running { clock, .. } = &mut self.state else {
            return 0;
        };
        ensure_running(out);
        self.voices.retain(|&id| out.is_sounding(id));

        let now = out.current_time();
        let period = self.config.beat_period();
        let mut scheduled = 0;
        while clock.is_due(now) {
            let time = clock.cursor();
            let step = clock.step();
            Self::emit_beat(out, &mut self.voices, time, step, period);
            if self.beat_times.len() == HISTORY {
                self.beat_times.pop_front();
            }
            self.beat_times.push_back(time);
            self.beats += 1;
            self.hi_hats += 4;
            clock.advance();
            scheduled += 1;
        }
        if scheduled > 0 {
            log::trace!("scheduled {scheduled} beat(s) at {now:.3}s");
        }
        scheduled
    }

    fn emit_beat<O: AudioOutput + ?Sized>(
        out: &mut O,
        voices: &mut Vec<VoiceId>,
        time: f64,
        step: usize,
        period: f64,
    ) {
        let mut play = |instrument: Instrument, at: f64| voices.push(out.start_voice(instrument, at));
        match step {
            0 => {
                play(Instrument::Kick, time);
                play(Instrument::Clang, time);
            }
            1 => play(Instrument::Snare, time),
            2 => {
                play(Instrument::Kick, time);
                play(Instrument::Kick, time + period * 0.5);
            }
            _ => {
                play(Instrument::Snare, time);
                play(Instrument::Sweep, time);
            }
        }
        for i in 0..4 {
            play(Instrument::HiHat, time + i as f64 * period / 4.0);
        }
    }

    /// Beats emitted in the current (or last) run.
    pub fn emitted_beats(&self) -> u64 {
        self.beats
    }

    /// Hi-hats emitted in the current (or last) run.
    pub fn emitted_hi_hats(&self) -> u64 {
        self.hi_hats
    }

    /// Start times of recent beats, oldest first.
    pub fn beat_times(&self) -> Vec<f64> {
        self.beat_times.iter().copied().collect()
    }

    /// The drone voice of the current run.
    pub fn drone(&self) -> Option<VoiceId> {
        match &self.state {
            State::Running { drone, .. } => Some(*drone),
            State::Stopped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::engine::{AudioEngine, AudioState};

    const SR: f64 = 8000.0;

    fn scheduler() -> EventScheduler {
        EventScheduler::new(SchedulerConfig::default()).expect("default config is valid")
    }

    #[test]
    fn default_config_is_100_bpm() {
        let c = SchedulerConfig::default();
        assert!((c.beat_period() - 0.6).abs() < 1e-12);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn lookahead_must_cover_a_tick() {
        let bad = SchedulerConfig {
            lookahead: 0.02,
            ..SchedulerConfig::default()
        };
        assert!(matches!(bad.validate(), Err(CoreError::InvalidConfig(_))));
        assert!(EventScheduler::new(bad).is_err());
        let zero = SchedulerConfig {
            bpm: 0.0,
            ..SchedulerConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn clock_does_not_drift() {
        let mut c = BeatClock::new(0.0, 0.6, 0.1);
        for _ in 0..10_000 {
            c.advance();
        }
        assert!((c.cursor() - 6000.0).abs() < 1e-9);
        assert_eq!(c.step(), 0);
    }

    #[test]
    fn step_follows_absolute_grid() {
        let c = BeatClock::new(1.2, 0.6, 0.1);
        assert_eq!(c.step(), 2);
        let c = BeatClock::new(1.8, 0.6, 0.1);
        assert_eq!(c.step(), 3);
    }

    #[test]
    fn start_and_stop_at_1_25s_schedules_two_beats() {
        // Host ticks with jitter at 0.0 (start), 0.5 and 1.0, then stops at 1.25.
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.start(&mut out);
        out.render_seconds(0.5);
        s.tick(&mut out);
        out.render_seconds(0.5);
        s.tick(&mut out);
        out.render_seconds(0.25);
        s.stop(&mut out);

        assert_eq!(s.beat_times(), vec![0.0, 0.6]);
        assert_eq!(s.emitted_hi_hats(), 8);
        assert_eq!(out.active_count(Instrument::Drone), 0);
        assert_eq!(out.voice_count(), 0);
    }

    #[test]
    fn regular_ticks_emit_one_beat_per_period() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.start(&mut out);
        let ticks = 400; // 10 s at 25 ms
        for _ in 0..ticks {
            out.render_seconds(0.025);
            s.tick(&mut out);
        }
        let l = out.current_time();
        // +1 for the downbeat emitted by start() at t = 0.
        let expected = (l / 0.6).floor() as i64 + 1;
        let got = s.emitted_beats() as i64;
        assert!((got - expected).abs() <= 1, "{got} beats over {l}s");
        assert_eq!(s.emitted_hi_hats(), 4 * s.emitted_beats());
    }

    #[test]
    fn counters_survive_beyond_history() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.start(&mut out);
        for _ in 0..800 {
            out.render_seconds(0.25);
            s.tick(&mut out);
        }
        let running = s.emitted_beats();
        assert!(running > HISTORY as u64, "{running} beats");
        s.stop(&mut out);
        assert_eq!(s.emitted_beats(), running);
        assert_eq!(s.emitted_hi_hats(), 4 * s.emitted_beats());
        assert_eq!(s.beat_times().len(), HISTORY);
    }

    #[test]
    fn beats_land_on_exact_grid_times() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.start(&mut out);
        for _ in 0..40 {
            out.render_seconds(0.025);
            s.tick(&mut out);
        }
        for (n, t) in s.beat_times().into_iter().enumerate() {
            assert!((t - n as f64 * 0.6).abs() < 1e-9);
        }
    }

    #[test]
    fn step_zero_voices_are_scheduled_ahead() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.start(&mut out);
        // First beat: kick + clang at 0, hi-hats at 0, .15, .3, .45.
        assert_eq!(out.start_times(Instrument::Kick), vec![0.0]);
        assert_eq!(out.start_times(Instrument::Clang), vec![0.0]);
        let hats = out.start_times(Instrument::HiHat);
        assert_eq!(hats.len(), 4);
        for (i, t) in hats.iter().enumerate() {
            assert!((t - i as f64 * 0.15).abs() < 1e-3);
        }
    }

    #[test]
    fn restart_leaves_one_drone() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.start(&mut out);
        s.stop(&mut out);
        s.start(&mut out);
        assert_eq!(out.active_count(Instrument::Drone), 1);
        s.start(&mut out);
        assert_eq!(out.active_count(Instrument::Drone), 1);
    }

    #[test]
    fn stop_is_idempotent_and_ticks_are_inert_when_stopped() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        let mut s = scheduler();
        s.stop(&mut out);
        assert_eq!(s.tick(&mut out), 0);
        s.start(&mut out);
        s.stop(&mut out);
        s.stop(&mut out);
        assert!(!s.is_running());
        assert_eq!(s.tick(&mut out), 0);
        assert_eq!(out.voice_count(), 0);
    }

    #[test]
    fn keeps_scheduling_when_resume_fails() {
        let mut out = AudioEngine::new(SR).expect("valid sample rate");
        out.detach_device();
        let mut s = scheduler();
        s.start(&mut out);
        assert_eq!(out.state(), AudioState::Suspended);
        assert_eq!(s.emitted_beats(), 1);
        assert!(out.is_sounding(s.drone().expect("running")));
        // The clock is frozen, so further ticks add nothing new.
        assert_eq!(s.tick(&mut out), 0);
    }
}
