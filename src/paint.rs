//! Painter — software rasteriser for the overlay.
//!
//! Every primitive is point-sampled at pixel centres and composited with
//! source-over onto straight-alpha RGBA8. There is no anti-aliasing, so a
//! given scene always produces the same bytes.

use glam::{Affine2, Vec2};

use crate::geometry::Rect;
use crate::surface::SurfaceSize;

// ── Colour ──────────────────────────────────────────────────

/// Straight-alpha colour, every channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 1.0);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 1.0);

    /// CSS-style `rgba(r, g, b, a)`.
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a,
        }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// CSS-style `hsla(h, s%, l%, a)` with `s` and `l` in [0, 1].
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Color {
            r: hue_to_rgb(p, q, h + 1.0 / 3.0),
            g: hue_to_rgb(p, q, h),
            b: hue_to_rgb(p, q, h - 1.0 / 3.0),
            a: alpha,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Color { a, ..self }
    }

    fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Radial gradient colour stops, offsets in [0, 1] ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f32, Color)>,
}

impl Gradient {
    pub fn new(stops: &[(f32, Color)]) -> Self {
        Gradient {
            stops: stops.to_vec(),
        }
    }

    /// Colour at offset `t`, clamped to the end stops.
    pub fn at(&self, t: f32) -> Color {
        let Some(&(first_t, first)) = self.stops.first() else {
            return Color::TRANSPARENT;
        };
        if t <= first_t {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                let f = if span > 0.0 { (t - t0) / span } else { 1.0 };
                return c0.lerp(c1, f);
            }
        }
        self.stops.last().map(|&(_, c)| c).unwrap_or(Color::TRANSPARENT)
    }
}

/// How a circle is filled.
#[derive(Debug, Clone, Copy)]
pub enum Fill<'g> {
    Solid(Color),
    /// Gradient from the centre (offset 0) to the rim (offset 1).
    Radial(&'g Gradient),
}

// ── Painter ─────────────────────────────────────────────────

/// Draws into a borrowed RGBA frame.
pub struct Painter<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
    /// Multiplies every painted alpha (canvas `globalAlpha`).
    pub global_alpha: f32,
}

impl<'a> Painter<'a> {
    /// Returns `None` when the frame is empty or does not match `size`.
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Option<Self> {
        if size.is_empty() || frame.len() < size.rgba_len() {
            return None;
        }
        Some(Painter {
            frame,
            size,
            global_alpha: 1.0,
        })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.frame.fill(0);
    }

    fn blend(&mut self, x: u32, y: u32, c: Color) {
        let sa = (c.a * self.global_alpha).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let Some(px) = self.frame.get_mut(i..i + 4) else {
            return;
        };
        let da = px[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let channel = |src: f32, dst: u8| {
            let d = dst as f32 / 255.0;
            let v = (src * sa + d * da * (1.0 - sa)) / out_a;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        px[0] = channel(c.r, px[0]);
        px[1] = channel(c.g, px[1]);
        px[2] = channel(c.b, px[2]);
        px[3] = (out_a * 255.0).round() as u8;
    }

    /// Visit every pixel whose centre lies in the box `[min, max]`, painting
    /// whatever `shade` returns for that centre.
    pub fn shade_box(&mut self, min: Vec2, max: Vec2, mut shade: impl FnMut(Vec2) -> Option<Color>) {
        let w = self.size.width as f32;
        let h = self.size.height as f32;
        if !(min.x < w && min.y < h && max.x >= 0.0 && max.y >= 0.0) {
            return;
        }
        let x0 = (min.x - 0.5).ceil().max(0.0) as u32;
        let y0 = (min.y - 0.5).ceil().max(0.0) as u32;
        let x1 = ((max.x - 0.5).floor().min(w - 1.0)).max(-1.0);
        let y1 = ((max.y - 0.5).floor().min(h - 1.0)).max(-1.0);
        if x1 < 0.0 || y1 < 0.0 {
            return;
        }
        let (x1, y1) = (x1 as u32, y1 as u32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if let Some(c) = shade(p) {
                    self.blend(x, y, c);
                }
            }
        }
    }

    // ── Circles ─────────────────────────────────────────────

    pub fn disc(&mut self, centre: Vec2, radius: f32, color: Color) {
        self.fill_circle(Affine2::IDENTITY, centre, radius, Fill::Solid(color));
    }

    /// Fill a circle given in the local space of `transform`.
    pub fn fill_circle(&mut self, transform: Affine2, centre: Vec2, radius: f32, fill: Fill<'_>) {
        if !(radius > 0.0) {
            return;
        }
        let inverse = transform.inverse();
        let (min, max) = transformed_bounds(transform, centre - Vec2::splat(radius), centre + Vec2::splat(radius));
        self.shade_box(min, max, |p| {
            let d = inverse.transform_point2(p).distance(centre);
            if d > radius {
                return None;
            }
            Some(match fill {
                Fill::Solid(c) => c,
                Fill::Radial(g) => g.at(d / radius),
            })
        });
    }

    /// Stroke a circle outline `width` pixels wide.
    pub fn ring(&mut self, centre: Vec2, radius: f32, width: f32, color: Color) {
        let half = width / 2.0;
        let outer = radius + half;
        self.shade_box(centre - Vec2::splat(outer), centre + Vec2::splat(outer), |p| {
            ((p.distance(centre) - radius).abs() <= half).then_some(color)
        });
    }

    // ── Lines and rectangles ────────────────────────────────

    /// Stroke a straight segment with butt caps.
    pub fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let half = width / 2.0;
        let seg = to - from;
        let len_sq = seg.length_squared();
        let min = from.min(to) - Vec2::splat(half);
        let max = from.max(to) + Vec2::splat(half);
        self.shade_box(min, max, |p| {
            if len_sq == 0.0 {
                return None;
            }
            let t = (p - from).dot(seg) / len_sq;
            if !(0.0..=1.0).contains(&t) {
                return None;
            }
            let closest = from + seg * t;
            (p.distance(closest) <= half).then_some(color)
        });
    }

    /// Fill the local-space rectangle `[min, max]` under `transform`.
    pub fn fill_quad(&mut self, transform: Affine2, min: Vec2, max: Vec2, color: Color) {
        let inverse = transform.inverse();
        let (bmin, bmax) = transformed_bounds(transform, min, max);
        self.shade_box(bmin, bmax, |p| {
            let q = inverse.transform_point2(p);
            (q.x >= min.x && q.x <= max.x && q.y >= min.y && q.y <= max.y).then_some(color)
        });
    }

    // ── Rounded rectangles ──────────────────────────────────

    pub fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        self.shade_box(
            Vec2::new(rect.left, rect.top),
            Vec2::new(rect.right(), rect.bottom()),
            |p| (round_rect_distance(rect, radius, p) <= 0.0).then_some(color),
        );
    }

    pub fn stroke_round_rect(&mut self, rect: Rect, radius: f32, width: f32, color: Color) {
        let half = width / 2.0;
        self.shade_box(
            Vec2::new(rect.left, rect.top) - Vec2::splat(half),
            Vec2::new(rect.right(), rect.bottom()) + Vec2::splat(half),
            |p| (round_rect_distance(rect, radius, p).abs() <= half).then_some(color),
        );
    }

    /// Soft halo around a rounded-rect outline, fading to nothing `blur`
    /// pixels away from it.
    pub fn glow_round_rect(&mut self, rect: Rect, radius: f32, blur: f32, color: Color) {
        if !(blur > 0.0) {
            return;
        }
        self.shade_box(
            Vec2::new(rect.left, rect.top) - Vec2::splat(blur),
            Vec2::new(rect.right(), rect.bottom()) + Vec2::splat(blur),
            |p| {
                let d = round_rect_distance(rect, radius, p).abs();
                let falloff = 1.0 - d / blur;
                (falloff > 0.0).then(|| color.with_alpha(color.a * falloff * falloff))
            },
        );
    }
}

/// Signed distance from `p` to the outline of a rounded rect (negative inside).
fn round_rect_distance(rect: Rect, radius: f32, p: Vec2) -> f32 {
    let half = rect.size() / 2.0;
    let r = radius.min(half.x).min(half.y).max(0.0);
    let q = (p - rect.center()).abs() - half + Vec2::splat(r);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - r
}

/// Axis-aligned bounds of a transformed local-space box.
fn transformed_bounds(transform: Affine2, min: Vec2, max: Vec2) -> (Vec2, Vec2) {
    let corners = [
        Vec2::new(min.x, min.y),
        Vec2::new(max.x, min.y),
        Vec2::new(min.x, max.y),
        Vec2::new(max.x, max.y),
    ]
    .map(|c| transform.transform_point2(c));
    let lo = corners.iter().fold(Vec2::splat(f32::INFINITY), |a, &c| a.min(c));
    let hi = corners.iter().fold(Vec2::splat(f32::NEG_INFINITY), |a, &c| a.max(c));
    (lo, hi)
}
