//! ParticleSimulator — short destruction animations over the scene.
//!
//! Particles live only here. Each frame repaints the persistent scene as
//! the base layer and draws the particles on top; nothing is ever written
//! back to the store. An effect is abandoned unpainted as soon as the store
//! is wiped underneath it.

use std::f32::consts::TAU;

use glam::{Affine2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::geometry::Rect;
use crate::paint::{Color, Fill, Gradient, Painter};
use crate::scene::SceneRenderer;
use crate::store::ImpactStore;
use crate::surface::Surface;

const SHATTER_FRAMES: u32 = 40;
const SHATTER_GRAVITY: f32 = 0.15;
const SHOCKWAVE_FRAMES: u32 = 35;
const SHOCKWAVE_GRAVITY: f32 = 0.2;
const SHOCKWAVE_DEBRIS: usize = 15;
const DISINTEGRATION_FRAMES: u32 = 50;
const DISINTEGRATION_DRAG: f32 = 0.98;

const DEBRIS_COLOR: Color = Color::rgb(0x33, 0x33, 0x33);

/// The three destruction animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Coloured shards burst outward and fall.
    Shatter,
    /// Expanding ring plus dark debris.
    Shockwave,
    /// The element crumbles into glowing embers that drift up.
    Disintegration,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::Shatter, EffectKind::Shockwave, EffectKind::Disintegration];

    /// Frame budget.
    pub fn max_frames(&self) -> u32 {
        match self {
            EffectKind::Shatter => SHATTER_FRAMES,
            EffectKind::Shockwave => SHOCKWAVE_FRAMES,
            EffectKind::Disintegration => DISINTEGRATION_FRAMES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// 1 at the first frame, falling towards 0.
    pub life: f32,
    /// Shatter shard colour; hue source for embers.
    color: Color,
    hue: f32,
}

impl Particle {
    fn at(position: Vec2, velocity: Vec2, size: f32) -> Self {
        Particle {
            position,
            velocity,
            size,
            rotation: 0.0,
            rotation_speed: 0.0,
            life: 1.0,
            color: DEBRIS_COLOR,
            hue: 0.0,
        }
    }
}

/// Shockwave ring state.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ring {
    centre: Vec2,
    radius: f32,
    max_radius: f32,
}

/// One running animation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEffect {
    kind: EffectKind,
    particles: Vec<Particle>,
    ring: Option<Ring>,
    frame: u32,
    /// Store generation the effect was started against.
    generation: u64,
}

impl ParticleEffect {
    fn spawn(kind: EffectKind, rect: Rect, generation: u64, rng: &mut Pcg32) -> Self {
        let centre = rect.center();
        let (particles, ring) = match kind {
            EffectKind::Shatter => {
                let n = 20 + rng.random_range(0..15);
                let shards = (0..n)
                    .map(|i| {
                        let angle = TAU * i as f32 / n as f32 + (rng.random::<f32>() - 0.5) * 0.5;
                        let speed = 2.0 + rng.random::<f32>() * 4.0;
                        let size = 3.0 + rng.random::<f32>() * 8.0;
                        let mut p = Particle::at(centre, Vec2::from_angle(angle) * speed, size);
                        p.rotation = rng.random::<f32>() * TAU;
                        p.rotation_speed = (rng.random::<f32>() - 0.5) * 0.3;
                        let hue = rng.random::<f32>() * 60.0;
                        p.color = Color::hsla(hue, 0.7, 0.3 + rng.random::<f32>() * 0.4, 1.0);
                        p
                    })
                    .collect();
                (shards, None)
            }
            EffectKind::Shockwave => {
                let debris = (0..SHOCKWAVE_DEBRIS)
                    .map(|i| {
                        let angle = TAU * i as f32 / SHOCKWAVE_DEBRIS as f32 + (rng.random::<f32>() - 0.5);
                        let speed = 3.0 + rng.random::<f32>() * 5.0;
                        // Slight upward bias.
                        let velocity = Vec2::from_angle(angle) * speed - Vec2::Y;
                        Particle::at(centre, velocity, 2.0 + rng.random::<f32>() * 4.0)
                    })
                    .collect();
                let ring = Ring {
                    centre,
                    radius: 0.0,
                    max_radius: rect.width.max(rect.height) * 1.5,
                };
                (debris, Some(ring))
            }
            EffectKind::Disintegration => {
                let n = 30 + rng.random_range(0..20);
                let embers = (0..n)
                    .map(|_| {
                        let position = Vec2::new(
                            rect.left + rng.random::<f32>() * rect.width,
                            rect.top + rng.random::<f32>() * rect.height,
                        );
                        let velocity = Vec2::new((rng.random::<f32>() - 0.5) * 2.0, -1.0 - rng.random::<f32>() * 2.0);
                        let mut p = Particle::at(position, velocity, 2.0 + rng.random::<f32>() * 5.0);
                        p.hue = rng.random::<f32>() * 30.0;
                        p
                    })
                    .collect();
                (embers, None)
            }
        };
        ParticleEffect {
            kind,
            particles,
            ring,
            frame: 0,
            generation,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.kind.max_frames()
    }

    /// Advance one frame: integrate, age, and paint if there is a surface.
    fn step(&mut self, mut painter: Option<&mut Painter<'_>>) {
        let max_frames = self.kind.max_frames();
        let life = 1.0 - self.frame as f32 / max_frames as f32;

        if let Some(ring) = &mut self.ring {
            ring.radius += ring.max_radius / max_frames as f32 * 2.0;
            if let Some(p) = painter.as_deref_mut() {
                paint_ring(p, *ring);
            }
        }

        for particle in &mut self.particles {
            particle.position += particle.velocity;
            match self.kind {
                EffectKind::Shatter => {
                    particle.velocity.y += SHATTER_GRAVITY;
                    particle.rotation += particle.rotation_speed;
                }
                EffectKind::Shockwave => particle.velocity.y += SHOCKWAVE_GRAVITY,
                EffectKind::Disintegration => particle.velocity.x *= DISINTEGRATION_DRAG,
            }
            particle.life = life;

            let Some(p) = painter.as_deref_mut() else {
                continue;
            };
            p.global_alpha = life;
            match self.kind {
                EffectKind::Shatter => {
                    let half = Vec2::splat(particle.size / 2.0);
                    let transform =
                        Affine2::from_translation(particle.position) * Affine2::from_angle(particle.rotation);
                    p.fill_quad(transform, -half, half, particle.color);
                }
                EffectKind::Shockwave => p.disc(particle.position, particle.size, DEBRIS_COLOR),
                EffectKind::Disintegration => {
                    let ember = Gradient::new(&[
                        (0.0, Color::hsla(particle.hue, 0.8, 0.6, life)),
                        (1.0, Color::hsla(particle.hue, 0.8, 0.3, 0.0)),
                    ]);
                    p.fill_circle(Affine2::IDENTITY, particle.position, particle.size, Fill::Radial(&ember));
                }
            }
        }
        if let Some(p) = painter {
            p.global_alpha = 1.0;
        }
        self.frame += 1;
    }
}

fn paint_ring(p: &mut Painter<'_>, ring: Ring) {
    if ring.radius >= ring.max_radius {
        return;
    }
    let alpha = 1.0 - ring.radius / ring.max_radius;
    p.global_alpha = 1.0;
    p.ring(ring.centre, ring.radius, 3.0, Color::rgba(255, 150, 50, alpha * 0.8));
    let glow = Gradient::new(&[
        (0.0, Color::rgba(255, 200, 100, alpha * 0.3)),
        (1.0, Color::rgba(255, 100, 0, 0.0)),
    ]);
    p.fill_circle(Affine2::IDENTITY, ring.centre, ring.radius * 0.6, Fill::Radial(&glow));
}

/// Runs every active destruction effect.
#[derive(Debug, Clone)]
pub struct ParticleSimulator {
    effects: Vec<ParticleEffect>,
    rng: Pcg32,
}

impl ParticleSimulator {
    pub fn new(seed: u64) -> Self {
        ParticleSimulator {
            effects: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Start a randomly chosen effect over `rect`. Empty rects are ignored.
    pub fn trigger(&mut self, rect: Rect, store: &ImpactStore) -> Option<EffectKind> {
        if rect.is_empty() {
            return None;
        }
        let kind = EffectKind::ALL[self.rng.random_range(0..EffectKind::ALL.len())];
        self.trigger_variant(kind, rect, store).then_some(kind)
    }

    /// Start a specific effect. Returns false for empty rects.
    pub fn trigger_variant(&mut self, kind: EffectKind, rect: Rect, store: &ImpactStore) -> bool {
        if rect.is_empty() {
            return false;
        }
        let effect = ParticleEffect::spawn(kind, rect, store.generation(), &mut self.rng);
        log::debug!("{kind:?} effect with {} particles", effect.particles.len());
        self.effects.push(effect);
        true
    }

    /// Advance every effect by one display frame.
    ///
    /// Returns whether anything is still animating. Every effect shows all of
    /// its frames; the tick after the last one repaints the scene without
    /// particles and returns `false`.
    pub fn tick<S: Surface + ?Sized>(&mut self, store: &ImpactStore, scene: &SceneRenderer, surface: &mut S) -> bool {
        if self.effects.is_empty() {
            return false;
        }
        let generation = store.generation();
        let before = self.effects.len();
        self.effects.retain(|e| e.generation == generation);
        if self.effects.len() < before {
            log::debug!("abandoned {} stale effect(s)", before - self.effects.len());
        }
        if self.effects.is_empty() {
            return false;
        }

        self.effects.retain(|e| !e.is_finished());
        scene.redraw(store, surface);
        if self.effects.is_empty() {
            return false;
        }

        let size = surface.size();
        let mut painter = Painter::new(surface.frame_mut(), size);
        for effect in &mut self.effects {
            effect.step(painter.as_mut());
        }
        true
    }

    /// Drop every effect without painting again. Idempotent.
    pub fn cancel(&mut self) {
        self.effects.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.effects.is_empty()
    }

    pub fn effects(&self) -> &[ParticleEffect] {
        &self.effects
    }
}
