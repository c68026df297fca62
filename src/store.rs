//! ImpactStore — the append-only log of every hit on the page.
//!
//! Every random visual parameter of an impact is drawn once, at record time,
//! and frozen into its [`ImpactDescriptor`]. Redraws replay the log, so a
//! scene looks the same after any number of resizes or overlay changes.

use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{CoreError, CoreResult};

/// Current persistence format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Quiet period before a requested save is flushed.
pub const SAVE_DEBOUNCE_MS: f64 = 1000.0;

// ── Clock ───────────────────────────────────────────────────

/// Source of impact timestamps, in milliseconds.
pub trait Clock: std::fmt::Debug {
    fn now_ms(&self) -> f64;
}

/// Wall-clock milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// A clock the host (or a test) moves by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

// ── Descriptor ──────────────────────────────────────────────

/// One radial crack of a bullet hole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crack {
    pub angle: f32,
    pub length: f32,
    pub wobble: f32,
}

/// One soot dot, offset normalised to the scorch radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Soot {
    pub offset_x: f32,
    pub offset_y: f32,
    pub size: f32,
}

/// One debris streak of an explosion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Debris {
    pub angle: f32,
    pub length: f32,
}

/// An immutable record of one hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactDescriptor {
    pub position: Vec2,
    pub category: Category,
    pub size: f32,
    /// Creation time, ms.
    pub timestamp: f64,
    pub rotation: f32,
    pub scale: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    #[serde(default)]
    pub cracks: Vec<Crack>,
    #[serde(default)]
    pub soot: Vec<Soot>,
    #[serde(default)]
    pub debris: Vec<Debris>,
}

impl ImpactDescriptor {
    /// Draw every random field for a new impact.
    fn generate(position: Vec2, category: Category, size: f32, timestamp: f64, rng: &mut Pcg32) -> Self {
        let rotation = rng.random::<f32>() * TAU;
        let scale = 0.8 + rng.random::<f32>() * 0.4;
        let scale_x = 1.0 + rng.random::<f32>() * 0.2;
        let scale_y = 1.0 + rng.random::<f32>() * 0.2;

        let cracks = if category.is_piercing() {
            let count = 3 + rng.random_range(0..4);
            (0..count)
                .map(|_| Crack {
                    angle: rng.random::<f32>() * TAU,
                    length: size * 1.5 + rng.random::<f32>() * size,
                    wobble: rng.random::<f32>() * 0.5,
                })
                .collect()
        } else {
            Vec::new()
        };

        let soot = if category.is_incendiary() {
            (0..10)
                .map(|_| Soot {
                    offset_x: rng.random::<f32>() - 0.5,
                    offset_y: rng.random::<f32>() - 0.5,
                    size: 1.0 + rng.random::<f32>() * 2.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        let debris = if category.is_explosive() {
            (0..20)
                .map(|_| Debris {
                    angle: rng.random::<f32>() * TAU,
                    length: 30.0 + rng.random::<f32>() * 50.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        ImpactDescriptor {
            position,
            category,
            size,
            timestamp,
            rotation,
            scale,
            scale_x,
            scale_y,
            cracks,
            soot,
            debris,
        }
    }
}

// ── Snapshot ────────────────────────────────────────────────

/// Versioned persistence envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub impacts: Vec<ImpactDescriptor>,
}

// ── Store ───────────────────────────────────────────────────

/// Ordered, append-only impact log.
#[derive(Debug)]
pub struct ImpactStore {
    impacts: Vec<ImpactDescriptor>,
    generation: u64,
    rng: Pcg32,
    clock: Box<dyn Clock>,
}

impl ImpactStore {
    /// A store whose random fields come from `seed` and whose timestamps
    /// come from the wall clock.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(seed: u64) -> Self {
        Self::with_clock(seed, SystemClock)
    }

    pub fn with_clock(seed: u64, clock: impl Clock + 'static) -> Self {
        ImpactStore {
            impacts: Vec::new(),
            generation: 0,
            rng: Pcg32::seed_from_u64(seed),
            clock: Box::new(clock),
        }
    }

    /// Append a new impact. Unknown category keys are rejected without
    /// touching the log.
    pub fn record(&mut self, position: Vec2, category_key: &str, size: f32) -> CoreResult<&ImpactDescriptor> {
        let category = Category::from_key(category_key)?;
        Ok(self.record_category(position, category, size))
    }

    pub fn record_category(&mut self, position: Vec2, category: Category, size: f32) -> &ImpactDescriptor {
        let timestamp = self.clock.now_ms();
        let impact = ImpactDescriptor::generate(position, category, size, timestamp, &mut self.rng);
        log::debug!("recorded {category} impact at ({:.0}, {:.0})", position.x, position.y);
        self.impacts.push(impact);
        &self.impacts[self.impacts.len() - 1]
    }

    /// Forget every impact.
    pub fn clear(&mut self) {
        self.impacts.clear();
        self.generation += 1;
        log::debug!("impact store cleared (generation {})", self.generation);
    }

    /// Every impact, in insertion order.
    pub fn all(&self) -> std::slice::Iter<'_, ImpactDescriptor> {
        self.impacts.iter()
    }

    pub fn len(&self) -> usize {
        self.impacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
    }

    /// Bumped whenever the log is wiped or replaced wholesale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Persistence ─────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            impacts: self.impacts.clone(),
        }
    }

    pub fn snapshot_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Replace the whole log (e.g. restoring a saved page).
    pub fn replace_all(&mut self, impacts: Vec<ImpactDescriptor>) {
        self.impacts = impacts;
        self.generation += 1;
    }

    /// Restore from a JSON snapshot. On error the store is unchanged.
    pub fn load_json(&mut self, json: &str) -> CoreResult<()> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CoreError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        log::debug!("restored {} impacts from snapshot", snapshot.impacts.len());
        self.replace_all(snapshot.impacts);
        Ok(())
    }
}

// ── Save debouncing ─────────────────────────────────────────

/// Coalesces bursts of save requests into one save after a quiet period.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDebouncer {
    quiet_ms: f64,
    last_request: Option<f64>,
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(SAVE_DEBOUNCE_MS)
    }
}

impl SaveDebouncer {
    pub fn new(quiet_ms: f64) -> Self {
        SaveDebouncer {
            quiet_ms,
            last_request: None,
        }
    }

    /// Note that the store changed at `now_ms`; restarts the quiet period.
    pub fn request(&mut self, now_ms: f64) {
        self.last_request = Some(now_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.last_request.is_some()
    }

    /// True exactly once per burst, when the quiet period has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.last_request {
            Some(t) if now_ms - t >= self.quiet_ms => {
                self.last_request = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.last_request = None;
    }
}
