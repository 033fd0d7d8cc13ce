//! Contains the FramePlane struct, which describes the relationship
//! between the square integral plane of one frame (pixels, with an
//! origin at 0,0) and the window of the complex plane that frame
//! looks at.
use num::Complex;

/// Describes the column, row of a pixel in a frame.  Same order as
/// x, y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps the pixels of one square frame onto the complex plane.  The
/// window is centered on a fixed point and is `2 * delta` wide; the
/// mapping negates the window corner, so the image is the view
/// mirrored through the origin.
#[derive(Copy, Clone, Debug)]
pub struct FramePlane {
    /// Pixels per side.
    pub width: usize,
    /// The lower corner of the window, before negation.
    pub min: Complex<f64>,
    /// Distance on the complex plane between neighbouring pixels.
    pub step: f64,
}

impl FramePlane {
    /// Build the plane for a window of half-width `delta` around
    /// `center`, sampled by `width` pixels per side.
    pub fn new(center: Complex<f64>, delta: f64, width: usize) -> FramePlane {
        FramePlane {
            width,
            min: Complex::new(center.re - delta, center.im - delta),
            step: 2.0 * delta / width as f64,
        }
    }

    /// The number of pixels in the frame.
    pub fn len(&self) -> usize {
        self.width * self.width
    }

    /// Describes that the frame has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// Given a pixel, return the point on the complex plane the
    /// kernel should start from.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            -self.min.re - pixel.0 as f64 * self.step,
            -self.min.im - pixel.1 as f64 * self.step,
        )
    }

    /// Row-major offset of a pixel inside the frame.
    pub fn pixel_to_offset(&self, pixel: &Pixel) -> usize {
        pixel.1 * self.width + pixel.0
    }
}
