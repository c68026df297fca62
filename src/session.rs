//! Session — one page's worth of wiring between the components.
//!
//! The host forwards its events here: clicks become `fire`, element deaths
//! become `destroy`, pointer moves become `hover`, and its two timers drive
//! `timer` (~25 ms, music) and `frame` (display refresh, particles).
//! Settings are passed in on every call; the session keeps no copy.

use glam::Vec2;

use crate::dsp::engine::AudioOutput;
use crate::dsp::instrument::Instrument;
use crate::dsp::synth::VoiceSynthesizer;
use crate::error::CoreResult;
use crate::geometry::Rect;
use crate::particles::{EffectKind, ParticleSimulator};
use crate::scene::SceneRenderer;
use crate::scheduler::{EventScheduler, SchedulerConfig};
use crate::settings::Settings;
use crate::store::{ImpactDescriptor, ImpactStore, SaveDebouncer};
use crate::surface::Surface;

pub struct Session {
    store: ImpactStore,
    scene: SceneRenderer,
    particles: ParticleSimulator,
    scheduler: EventScheduler,
    synth: VoiceSynthesizer,
    saves: SaveDebouncer,
}

impl Session {
    pub fn new(store: ImpactStore, seed: u64) -> CoreResult<Self> {
        Self::with_config(store, SchedulerConfig::default(), seed)
    }

    pub fn with_config(store: ImpactStore, config: SchedulerConfig, seed: u64) -> CoreResult<Self> {
        Ok(Session {
            store,
            scene: SceneRenderer::new(),
            particles: ParticleSimulator::new(seed),
            scheduler: EventScheduler::new(config)?,
            synth: VoiceSynthesizer::new(),
            saves: SaveDebouncer::default(),
        })
    }

    pub fn store(&self) -> &ImpactStore {
        &self.store
    }

    pub fn scene(&self) -> &SceneRenderer {
        &self.scene
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    pub fn particles(&self) -> &ParticleSimulator {
        &self.particles
    }

    /// Bring music and highlight in line with `settings`.
    pub fn apply_settings<O, S>(&mut self, settings: &Settings, out: &mut O, surface: &mut S)
    where
        O: AudioOutput + ?Sized,
        S: Surface + ?Sized,
    {
        out.set_master_volume(settings.master_volume as f64);
        self.set_music(settings.violence_enabled, out);
        if !settings.highlight_active() && self.scene.highlight().is_some() {
            self.scene.set_highlight(None, &self.store, surface);
        }
    }

    /// Shoot the selected weapon at `position`: play its sound, record the
    /// impact and repaint. Does nothing while violence is disabled.
    pub fn fire<O, S>(&mut self, position: Vec2, settings: &Settings, out: &mut O, surface: &mut S) -> Option<&ImpactDescriptor>
    where
        O: AudioOutput + ?Sized,
        S: Surface + ?Sized,
    {
        if !settings.violence_enabled {
            return None;
        }
        let weapon = settings.weapon;
        let now = out.current_time();
        self.synth.play_at(Instrument::for_category(weapon), now, out);

        let timestamp = self
            .store
            .record_category(position, weapon, weapon.stats().size_hint)
            .timestamp;
        self.saves.request(timestamp);
        self.scene.redraw(&self.store, surface);
        self.store.all().last()
    }

    /// Start a destruction animation over a destroyed element.
    pub fn destroy(&mut self, rect: Rect) -> Option<EffectKind> {
        self.particles.trigger(rect, &self.store)
    }

    /// Move (or remove) the targeting highlight.
    pub fn hover<S: Surface + ?Sized>(&mut self, rect: Option<Rect>, settings: &Settings, surface: &mut S) {
        let rect = rect.filter(|_| settings.highlight_active());
        if rect != self.scene.highlight() {
            self.scene.set_highlight(rect, &self.store, surface);
        }
    }

    /// Turn the music loop on or off.
    pub fn set_music<O: AudioOutput + ?Sized>(&mut self, on: bool, out: &mut O) {
        match (on, self.scheduler.is_running()) {
            (true, false) => self.scheduler.start(out),
            (false, true) => self.scheduler.stop(out),
            _ => {}
        }
    }

    /// Wipe the page: forget every impact, abandon running animations,
    /// drop the highlight and repaint the now-empty overlay.
    pub fn reset<S: Surface + ?Sized>(&mut self, now_ms: f64, surface: &mut S) {
        self.store.clear();
        self.particles.cancel();
        self.scene.set_highlight(None, &self.store, surface);
        self.saves.request(now_ms);
        log::info!("session reset");
    }

    /// Repaint after the surface was resized.
    pub fn redraw<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.scene.redraw(&self.store, surface);
    }

    /// Display-frame callback. Returns whether an animation is running.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        self.particles.tick(&self.store, &self.scene, surface)
    }

    /// Scheduler wake-up. Returns the number of beats scheduled.
    pub fn timer<O: AudioOutput + ?Sized>(&mut self, out: &mut O) -> usize {
        self.scheduler.tick(out)
    }

    /// The snapshot to persist, once the store has been quiet long enough.
    pub fn save_due(&mut self, now_ms: f64) -> CoreResult<Option<String>> {
        if !self.saves.poll(now_ms) {
            return Ok(None);
        }
        self.store.snapshot_json().map(Some)
    }

    /// Tear down audio. Idempotent.
    pub fn shutdown<O: AudioOutput + ?Sized>(&mut self, out: &mut O) {
        self.scheduler.stop(out);
        self.particles.cancel();
    }
}
