//! Viewport sizing: the host container's size, the capped device pixel
//! ratio, and the derived drawable resolution.

/// Logical (CSS) size of the host container, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
}

impl ViewportSize {
    /// Create a size from raw dimensions (zero is allowed here; clamping
    /// happens in [`Viewport::new`]).
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Source of the current viewport size.
///
/// Implemented by each host: the winit window in the native viewer, the
/// container element in the browser. The pipeline queries it on every
/// resize; no size payload is pushed with the resize notification itself.
pub trait ViewportSizer {
    /// Read the container's current rendered box.
    fn current_size(&self) -> ViewportSize;

    /// Device pixel ratio of the display the container lives on.
    fn pixel_ratio(&self) -> f64 {
        1.0
    }
}

/// Resolved viewport state: clamped logical size plus capped pixel ratio.
///
/// Both dimensions are at least 1, so [`aspect`](Self::aspect) is always
/// finite and positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f64,
}

impl Viewport {
    /// Resolve a raw host size. Zero dimensions (a hidden container) are
    /// clamped to 1; the pixel ratio is capped at `max_pixel_ratio` and
    /// falls back to 1.0 when the host reports a non-finite or non-positive
    /// value.
    #[must_use]
    pub fn new(size: ViewportSize, pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let cap = if max_pixel_ratio.is_finite() && max_pixel_ratio > 0.0 {
            max_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: size.width.max(1),
            height: size.height.max(1),
            pixel_ratio: ratio.min(cap),
        }
    }

    /// Read a sizer and resolve its size.
    #[must_use]
    pub fn from_sizer(sizer: &dyn ViewportSizer, max_pixel_ratio: f64) -> Self {
        Self::new(sizer.current_size(), sizer.pixel_ratio(), max_pixel_ratio)
    }

    /// Clamped logical width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Clamped logical height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Effective (capped) device pixel ratio.
    #[must_use]
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Camera aspect ratio: exactly `width / height` of the clamped logical
    /// size.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Drawable resolution in device pixels (surface and chain buffers).
    #[must_use]
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((f64::from(v) * self.pixel_ratio).floor() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_exact_ratio() {
        for &(w, h) in &[(800, 600), (1, 1), (1920, 1080), (333, 7), (7, 333)] {
            let vp = Viewport::new(ViewportSize::new(w, h), 1.0, 2.0);
            assert_eq!(vp.aspect(), w as f32 / h as f32);
        }
    }

    #[test]
    fn zero_dimensions_are_clamped() {
        let vp = Viewport::new(ViewportSize::new(0, 480), 1.0, 2.0);
        assert_eq!(vp.width(), 1);
        assert!(vp.aspect().is_finite());
        assert_eq!(vp.aspect(), 1.0 / 480.0);

        let vp = Viewport::new(ViewportSize::new(640, 0), 1.0, 2.0);
        assert_eq!(vp.height(), 1);
        assert_eq!(vp.aspect(), 640.0);

        let vp = Viewport::new(ViewportSize::default(), 1.0, 2.0);
        assert_eq!(vp.physical_size(), (1, 1));
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let vp = Viewport::new(ViewportSize::new(800, 600), 3.0, 2.0);
        assert_eq!(vp.pixel_ratio(), 2.0);
        assert_eq!(vp.physical_size(), (1600, 1200));

        let vp = Viewport::new(ViewportSize::new(800, 600), 1.5, 2.0);
        assert_eq!(vp.physical_size(), (1200, 900));
    }

    #[test]
    fn bogus_pixel_ratio_falls_back_to_one() {
        let vp = Viewport::new(ViewportSize::new(10, 10), f64::NAN, 2.0);
        assert_eq!(vp.pixel_ratio(), 1.0);
        let vp = Viewport::new(ViewportSize::new(10, 10), 0.0, 2.0);
        assert_eq!(vp.pixel_ratio(), 1.0);
    }

    #[test]
    fn physical_size_floors() {
        let vp = Viewport::new(ViewportSize::new(101, 51), 1.25, 2.0);
        assert_eq!(vp.physical_size(), (126, 63));
    }
}
