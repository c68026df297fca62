//! Drawing surfaces: the transparent overlay every effect is painted on.

use std::convert::Infallible;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// A resizable RGBA8 (straight alpha) surface.
///
/// The renderer only writes pixels into `frame_mut()`; showing them (a
/// browser canvas, a window, a PNG in a test) is the implementor's business.
pub trait Surface {
    type Error;

    fn size(&self) -> SurfaceSize;
    fn frame_mut(&mut self) -> &mut [u8];

    /// Change dimensions. Contents are unspecified afterwards until the
    /// next full redraw.
    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error>;
}

/// In-memory RGBA surface for headless use and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaBufferSurface {
    size: SurfaceSize,
    buf: Vec<u8>,
}

impl RgbaBufferSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
        }
    }

    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    /// RGBA at `(x, y)`; `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let px = self.buf.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True when every pixel is fully transparent.
    pub fn is_clear(&self) -> bool {
        self.buf.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.buf.chunks_exact(4).filter(|px| px[3] != 0).count()
    }
}

impl Surface for RgbaBufferSurface {
    type Error = Infallible;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error> {
        self.size = size;
        self.buf.resize(size.rgba_len(), 0u8);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_is_transparent() {
        let s = RgbaBufferSurface::new(SurfaceSize::new(4, 3));
        assert_eq!(s.frame().len(), 48);
        assert!(s.is_clear());
        assert_eq!(s.pixel(3, 2), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(4, 0), None);
    }

    #[test]
    fn resize_changes_buffer_length() {
        let mut s = RgbaBufferSurface::new(SurfaceSize::new(2, 2));
        s.resize(SurfaceSize::new(8, 8)).expect("infallible");
        assert_eq!(s.frame().len(), 256);
        s.resize(SurfaceSize::new(0, 8)).expect("infallible");
        assert!(s.size().is_empty());
        assert!(s.frame().is_empty());
    }
}
