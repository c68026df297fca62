//! SceneRenderer — repaints the whole overlay from the impact log.
//!
//! `redraw` is the only way persistent pixels reach the surface: it clears,
//! replays every impact in insertion order, and paints the highlight last.
//! It reads the store and writes the surface, nothing else, so the particle
//! loop can call it every frame as its base layer.

use glam::{Affine2, Vec2};

use crate::category::Category;
use crate::geometry::Rect;
use crate::paint::{Color, Fill, Gradient, Painter};
use crate::store::{Crack, ImpactDescriptor, ImpactStore};
use crate::surface::Surface;

const HOLE_RING: Color = Color::rgba(50, 50, 50, 0.8);
const CRACK: Color = Color::rgba(100, 100, 100, 0.6);
const SOOT: Color = Color::rgba(0, 0, 0, 0.8);
const DEBRIS: Color = Color::rgba(30, 30, 30, 0.9);
const CRATER: Color = Color::rgba(10, 10, 10, 0.95);

const SCATTER_HOLES: usize = 5;
const SCATTER_SPREAD: f64 = 15.0;
const SCATTER_RADIUS: f32 = 3.0;
const SCORCH_RADIUS: f32 = 30.0;
const CRATER_RADIUS: f32 = 15.0;

const HIGHLIGHT_STROKE: Color = Color::rgb(0x00, 0xaa, 0xff);
const HIGHLIGHT_FILL: Color = Color::rgba(0, 170, 255, 0.1);
const HIGHLIGHT_GLOW: Color = Color::rgba(255, 255, 255, 0.8);
const HIGHLIGHT_RADIUS: f32 = 4.0;
const HIGHLIGHT_WIDTH: f32 = 2.0;
const HIGHLIGHT_BLUR: f32 = 10.0;

/// Paints the persistent scene plus the targeting highlight.
#[derive(Debug, Clone, Default)]
pub struct SceneRenderer {
    highlight: Option<Rect>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlight(&self) -> Option<Rect> {
        self.highlight
    }

    /// Clear the surface and repaint every impact, then the highlight.
    /// A zero-area surface is left alone.
    pub fn redraw<S: Surface + ?Sized>(&self, store: &ImpactStore, surface: &mut S) {
        let size = surface.size();
        let Some(mut painter) = Painter::new(surface.frame_mut(), size) else {
            return;
        };
        painter.clear();
        for impact in store.all() {
            paint_impact(&mut painter, impact);
        }
        if let Some(rect) = self.highlight.filter(|r| !r.is_empty()) {
            paint_highlight(&mut painter, rect);
        }
    }

    /// Replace (or remove) the highlight and redraw.
    pub fn set_highlight<S: Surface + ?Sized>(&mut self, rect: Option<Rect>, store: &ImpactStore, surface: &mut S) {
        self.highlight = rect;
        self.redraw(store, surface);
    }
}

// ── Impact recipes ──────────────────────────────────────────

fn paint_impact(p: &mut Painter<'_>, impact: &ImpactDescriptor) {
    let at = impact.position;
    match impact.category {
        Category::Pistol | Category::Rifle => bullet_hole(p, at, impact.size, &impact.cracks),
        Category::Shotgun => {
            bullet_hole(p, at, impact.size, &impact.cracks);
            for offset in scatter_offsets(impact.timestamp) {
                bullet_hole(p, at + offset, SCATTER_RADIUS, &[]);
            }
        }
        Category::Flamethrower => scorch(p, impact),
        Category::Rpg => explosion(p, impact),
        Category::Laser => laser_burn(p, at),
    }
}

/// Pellet offsets around a shotgun hit. A pure function of the timestamp,
/// so they survive every redraw without being stored.
pub fn scatter_offsets(timestamp: f64) -> [Vec2; SCATTER_HOLES] {
    std::array::from_fn(|i| {
        let i = i as f64;
        Vec2::new(
            ((timestamp + i).sin() * SCATTER_SPREAD) as f32,
            ((timestamp + 2.0 * i).cos() * SCATTER_SPREAD) as f32,
        )
    })
}

fn bullet_hole(p: &mut Painter<'_>, at: Vec2, size: f32, cracks: &[Crack]) {
    p.disc(at, size, HOLE_RING);
    p.disc(at, size * 0.5, Color::BLACK);
    for crack in cracks {
        let dir = Vec2::from_angle(crack.angle);
        let end = at + dir * crack.length;
        // Wobble kinks the crack sideways at its midpoint.
        let kink = at + dir * (crack.length * 0.5) + dir.perp() * (crack.wobble * crack.length * 0.25);
        p.line(at, kink, 1.0, CRACK);
        p.line(kink, end, 1.0, CRACK);
    }
}

fn scorch(p: &mut Painter<'_>, impact: &ImpactDescriptor) {
    let radius = SCORCH_RADIUS * impact.scale;
    let transform = Affine2::from_translation(impact.position)
        * Affine2::from_scale(Vec2::new(impact.scale_x, impact.scale_y))
        * Affine2::from_angle(impact.rotation);
    let burn = Gradient::new(&[
        (0.0, Color::rgba(20, 10, 10, 0.9)),
        (0.4, Color::rgba(40, 20, 10, 0.7)),
        (0.8, Color::rgba(0, 0, 0, 0.4)),
        (1.0, Color::rgba(0, 0, 0, 0.0)),
    ]);
    p.fill_circle(transform, Vec2::ZERO, radius, Fill::Radial(&burn));
    for dot in &impact.soot {
        let centre = Vec2::new(dot.offset_x, dot.offset_y) * radius;
        p.fill_circle(transform, centre, dot.size, Fill::Solid(SOOT));
    }
}

fn explosion(p: &mut Painter<'_>, impact: &ImpactDescriptor) {
    scorch(p, impact);
    let at = impact.position;
    for d in &impact.debris {
        p.line(at, at + Vec2::from_angle(d.angle) * d.length, 2.0, DEBRIS);
    }
    p.disc(at, CRATER_RADIUS, CRATER);
}

fn laser_burn(p: &mut Painter<'_>, at: Vec2) {
    let halo = Gradient::new(&[
        (0.0, Color::rgba(255, 51, 51, 0.6)),
        (1.0, Color::rgba(255, 51, 51, 0.0)),
    ]);
    p.fill_circle(Affine2::IDENTITY, at, 6.0 + 7.5, Fill::Radial(&halo));
    p.disc(at, 6.0, Color::rgba(255, 50, 50, 0.8));
    p.disc(at, 3.0, Color::WHITE);
    p.ring(at, 8.0, 1.0, Color::rgba(0, 0, 0, 0.5));
}

fn paint_highlight(p: &mut Painter<'_>, rect: Rect) {
    p.glow_round_rect(rect, HIGHLIGHT_RADIUS, HIGHLIGHT_BLUR, HIGHLIGHT_GLOW);
    p.stroke_round_rect(rect, HIGHLIGHT_RADIUS, HIGHLIGHT_WIDTH, HIGHLIGHT_STROKE);
    p.fill_round_rect(rect, HIGHLIGHT_RADIUS, HIGHLIGHT_FILL);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;
    use crate::surface::{RgbaBufferSurface, SurfaceSize};

    fn store_with(keys: &[(&str, f32, f32)]) -> ImpactStore {
        let mut s = ImpactStore::with_clock(11, ManualClock::new(1_700_000_000_000.0));
        for &(key, x, y) in keys {
            let size = crate::category::Category::from_key(key).expect("known").stats().size_hint;
            s.record(Vec2::new(x, y), key, size).expect("known");
        }
        s
    }

    fn surface(w: u32, h: u32) -> RgbaBufferSurface {
        RgbaBufferSurface::new(SurfaceSize::new(w, h))
    }

    #[test]
    fn redraw_is_idempotent() {
        let store = store_with(&[("pistol", 20.0, 20.0), ("rpg", 80.0, 60.0), ("shotgun", 40.0, 90.0)]);
        let scene = SceneRenderer::new();
        let mut s = surface(160, 120);
        scene.redraw(&store, &mut s);
        let first = s.frame().to_vec();
        scene.redraw(&store, &mut s);
        assert_eq!(s.frame(), &first[..]);
        assert!(s.painted_pixels() > 0);
    }

    #[test]
    fn resize_then_redraw_matches_fresh_surface() {
        let store = store_with(&[("flamethrower", 30.0, 30.0), ("laser", 70.0, 40.0)]);
        let scene = SceneRenderer::new();
        let mut s = surface(50, 50);
        scene.redraw(&store, &mut s);
        s.resize(SurfaceSize::new(120, 90)).expect("infallible");
        scene.redraw(&store, &mut s);

        let mut fresh = surface(120, 90);
        scene.redraw(&store, &mut fresh);
        assert_eq!(s.frame(), fresh.frame());
    }

    #[test]
    fn empty_store_leaves_surface_transparent() {
        let mut store = store_with(&[("pistol", 10.0, 10.0)]);
        store.clear();
        let mut s = surface(40, 40);
        SceneRenderer::new().redraw(&store, &mut s);
        assert!(s.is_clear());
    }

    #[test]
    fn zero_area_surface_is_a_no_op() {
        let store = store_with(&[("rpg", 10.0, 10.0)]);
        let mut s = surface(0, 100);
        SceneRenderer::new().redraw(&store, &mut s);
        assert!(s.frame().is_empty());
    }

    #[test]
    fn bullet_hole_has_black_core() {
        let store = store_with(&[("pistol", 20.5, 20.5)]);
        let mut s = surface(40, 40);
        SceneRenderer::new().redraw(&store, &mut s);
        // Cracks start at the centre, so the core is black or dark grey.
        let [r, g, b, a] = s.pixel(20, 20).expect("inside");
        assert!(r == g && g == b && r <= 100, "got {:?}", [r, g, b]);
        assert_eq!(a, 255);
    }

    #[test]
    fn explosion_crater_is_nearly_opaque() {
        let store = store_with(&[("rpg", 100.5, 100.5)]);
        let mut s = surface(200, 200);
        SceneRenderer::new().redraw(&store, &mut s);
        let [_, _, _, a] = s.pixel(100, 100).expect("inside");
        assert!(a > 245, "alpha {a}");
    }

    #[test]
    fn laser_core_is_white() {
        let store = store_with(&[("laser", 30.5, 30.5)]);
        let mut s = surface(60, 60);
        SceneRenderer::new().redraw(&store, &mut s);
        assert_eq!(s.pixel(30, 30), Some([255, 255, 255, 255]));
    }

    #[test]
    fn scatter_is_a_function_of_timestamp() {
        assert_eq!(scatter_offsets(1234.0), scatter_offsets(1234.0));
        assert_ne!(scatter_offsets(1234.0), scatter_offsets(1235.0));
        for o in scatter_offsets(99.0) {
            assert!(o.x.abs() <= 15.0 && o.y.abs() <= 15.0);
        }
    }

    #[test]
    fn highlight_is_painted_on_top_and_removable() {
        let store = store_with(&[]);
        let mut scene = SceneRenderer::new();
        let mut s = surface(100, 100);
        let rect = Rect::new(20.0, 20.0, 60.0, 40.0);
        scene.set_highlight(Some(rect), &store, &mut s);
        assert_eq!(scene.highlight(), Some(rect));
        // Top edge centre sits on the stroke.
        let [r, g, b, a] = s.pixel(50, 20).expect("inside");
        assert!(b > r && g > r && a > 200, "got {:?}", [r, g, b, a]);
        // Interior gets only the faint tint.
        let [_, _, _, inner] = s.pixel(50, 40).expect("inside");
        assert!(inner > 0 && inner < 60);

        scene.set_highlight(None, &store, &mut s);
        assert!(s.is_clear());
    }

    #[test]
    fn impacts_paint_in_insertion_order() {
        // A laser then a pistol on the same spot: the pistol's opaque core
        // hides the laser's red entirely.
        let store = store_with(&[("laser", 20.5, 20.5), ("pistol", 20.5, 20.5)]);
        let mut s = surface(40, 40);
        SceneRenderer::new().redraw(&store, &mut s);
        let [r, g, b, _] = s.pixel(20, 20).expect("inside");
        assert!(r == g && g == b, "got {:?}", [r, g, b]);
    }
}
