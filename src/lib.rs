pub mod category;
pub mod dsp;
pub mod error;
pub mod geometry;
pub mod paint;
pub mod particles;
pub mod scene;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod store;
pub mod surface;

pub use category::{Category, WeaponStats};
pub use dsp::{AudioEngine, AudioOutput, AudioState, Instrument, VoiceId, VoiceSynthesizer};
pub use error::{CoreError, CoreResult};
pub use geometry::Rect;
pub use particles::{EffectKind, ParticleSimulator};
pub use scene::SceneRenderer;
pub use scheduler::{BeatClock, EventScheduler, SchedulerConfig};
pub use session::Session;
pub use settings::Settings;
pub use store::{ImpactDescriptor, ImpactStore, SaveDebouncer, Snapshot};
pub use surface::{RgbaBufferSurface, Surface, SurfaceSize};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the mayhem-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn to_js(e: CoreError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed: render one instrument (weapon key or instrument name) to
/// a 16-bit stereo WAV byte array.
#[wasm_bindgen]
pub fn render_instrument_wav(key: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let instrument = Instrument::from_key(key).map_err(to_js)?;
    dsp::renderer::render_wav(instrument, sample_rate).map_err(to_js)
}

/// WASM-exposed: render one instrument to mono f32 samples for direct
/// playback through an AudioBuffer.
#[wasm_bindgen]
pub fn render_instrument_samples(key: &str, sample_rate: u32, seed: u64) -> Result<Vec<f32>, JsValue> {
    let instrument = Instrument::from_key(key).map_err(to_js)?;
    dsp::engine::check_sample_rate(sample_rate as f64).map_err(to_js)?;
    let samples = dsp::render_instrument(instrument, sample_rate as f64, seed);
    Ok(samples.iter().map(|&s| s as f32).collect())
}

/// WASM-exposed: the weapon table entry for a category key, as JSON.
#[wasm_bindgen]
pub fn weapon_stats_json(key: &str) -> Result<String, JsValue> {
    let category = Category::from_key(key).map_err(to_js)?;
    serde_json::to_string(&category.stats()).map_err(|e| JsValue::from_str(&e.to_string()))
}
