//! Replay properties of the persistent scene.

use glam::Vec2;
use mayhem_core::store::ManualClock;
use mayhem_core::{
    Category, EffectKind, ImpactStore, ParticleSimulator, Rect, RgbaBufferSurface, SceneRenderer, Surface,
    SurfaceSize,
};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn shots() -> impl Strategy<Value = Vec<(usize, f32, f32)>> {
    prop::collection::vec((0..Category::ALL.len(), 0.0f32..96.0, 0.0f32..72.0), 0..12)
}

fn build_store(seed: u64, shots: &[(usize, f32, f32)]) -> ImpactStore {
    let clock = ManualClock::new(1_000.0);
    let mut store = ImpactStore::with_clock(seed, clock.clone());
    for &(cat, x, y) in shots {
        let category = Category::ALL[cat];
        store
            .record(Vec2::new(x, y), category.as_str(), category.stats().size_hint)
            .expect("library category");
        clock.advance(37.0);
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn redraw_twice_is_byte_identical(seed in any::<u64>(), shots in shots()) {
        init_logging();
        let store = build_store(seed, &shots);
        let scene = SceneRenderer::new();
        let mut surface = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
        scene.redraw(&store, &mut surface);
        let first = surface.frame().to_vec();
        scene.redraw(&store, &mut surface);
        prop_assert_eq!(surface.frame(), &first[..]);
    }

    #[test]
    fn resize_reconstructs_the_same_scene(
        seed in any::<u64>(),
        shots in shots(),
        w in 1u32..64,
        h in 1u32..64,
    ) {
        let store = build_store(seed, &shots);
        let scene = SceneRenderer::new();
        let mut surface = RgbaBufferSurface::new(SurfaceSize::new(w, h));
        scene.redraw(&store, &mut surface);
        surface.resize(SurfaceSize::new(96, 72)).expect("infallible");
        scene.redraw(&store, &mut surface);

        let mut fresh = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
        scene.redraw(&store, &mut fresh);
        prop_assert_eq!(surface.frame(), fresh.frame());
    }

    #[test]
    fn clear_then_redraw_is_transparent(seed in any::<u64>(), shots in shots()) {
        let mut store = build_store(seed, &shots);
        let scene = SceneRenderer::new();
        let mut surface = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
        scene.redraw(&store, &mut surface);
        store.clear();
        scene.redraw(&store, &mut surface);
        prop_assert!(surface.is_clear());
    }
}

#[test]
fn snapshot_restore_paints_identically() {
    init_logging();
    let shots = [(0, 10.0, 10.0), (4, 48.0, 36.0), (1, 80.0, 60.0), (2, 30.0, 50.0)];
    let original = build_store(99, &shots);
    let json = original.snapshot_json().expect("serialisable");

    let mut restored = ImpactStore::with_clock(0, ManualClock::new(0.0));
    restored.load_json(&json).expect("valid snapshot");

    let scene = SceneRenderer::new();
    let mut a = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
    let mut b = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
    scene.redraw(&original, &mut a);
    scene.redraw(&restored, &mut b);
    assert_eq!(a.frame(), b.frame());
}

#[test]
fn every_effect_ends_on_a_clean_base_layer() {
    init_logging();
    let store = build_store(5, &[(0, 20.0, 20.0), (4, 60.0, 40.0)]);
    let scene = SceneRenderer::new();
    let mut plain = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
    scene.redraw(&store, &mut plain);

    for kind in EffectKind::ALL {
        let mut surface = RgbaBufferSurface::new(SurfaceSize::new(96, 72));
        let mut sim = ParticleSimulator::new(17);
        assert!(sim.trigger_variant(kind, Rect::new(30.0, 20.0, 30.0, 20.0), &store));
        let mut frames = 0;
        while sim.tick(&store, &scene, &mut surface) {
            frames += 1;
        }
        assert_eq!(frames, kind.max_frames());
        assert_eq!(surface.frame(), plain.frame(), "{kind:?}");
        assert_eq!(store.len(), 2);
    }
}
