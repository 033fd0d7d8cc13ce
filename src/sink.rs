// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writes the gathered frames out as 8-bit grayscale images, one file
//! per frame, where each pixel's value is its depth.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, ImageEncoder};

use crate::buffer::FrameBuffer;
use crate::error::FractalError;
use crate::partition::FractalJob;

/// Frames wider than this are not written.
pub const MAX_OUTPUT_WIDTH: usize = 400;

/// Jobs with more frames than this are not written.
pub const MAX_OUTPUT_FRAMES: usize = 30;

/// Added to the frame index in the file name, so names sort.
pub const NAME_OFFSET: usize = 1000;

/// The encoders we know how to drive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageKind {
    /// Windows bitmap.
    Bmp,
    /// Binary portable graymap.
    Pgm,
}

impl ImageKind {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Bmp => "bmp",
            ImageKind::Pgm => "pgm",
        }
    }

    /// Parse an extension-style name.
    pub fn from_name(name: &str) -> Option<ImageKind> {
        match name.to_ascii_lowercase().as_str() {
            "bmp" => Some(ImageKind::Bmp),
            "pgm" | "pnm" => Some(ImageKind::Pgm),
            _ => None,
        }
    }
}

/// Only small jobs are written to disk.
pub fn within_output_limits(job: &FractalJob) -> bool {
    job.frame_width() <= MAX_OUTPUT_WIDTH && job.frame_count() <= MAX_OUTPUT_FRAMES
}

/// The file a frame is written to.
pub fn frame_path(dir: &Path, frame: usize, kind: ImageKind) -> PathBuf {
    dir.join(format!("fractal{}.{}", frame + NAME_OFFSET, kind.extension()))
}

fn write_image(path: &Path, pixels: &[u8], width: u32, kind: ImageKind) -> Result<(), FractalError> {
    let file = File::create(path).map_err(|e| FractalError::io(path, e))?;
    let mut output = BufWriter::new(file);
    let encoded = match kind {
        ImageKind::Bmp => {
            BmpEncoder::new(&mut output).write_image(pixels, width, width, ColorType::L8)
        }
        ImageKind::Pgm => PnmEncoder::new(&mut output)
            .with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary))
            .write_image(pixels, width, width, ColorType::L8),
    };
    encoded.map_err(|e| FractalError::encode(path, e))?;
    output
        .into_inner()
        .map_err(|e| FractalError::io(path, e.into_error()))?;
    Ok(())
}

/// Write every frame of `frames` into `dir`, creating it if needed.
/// Returns the paths written, in frame order.
pub fn write_frames(dir: &Path, frames: &FrameBuffer, kind: ImageKind) -> Result<Vec<PathBuf>, FractalError> {
    fs::create_dir_all(dir).map_err(|e| FractalError::io(dir, e))?;
    let width = frames.width() as u32;
    let mut written = Vec::with_capacity(frames.frame_count());
    for (index, pixels) in frames.frames().enumerate() {
        let path = frame_path(dir, index, kind);
        write_image(&path, pixels, width, kind)?;
        debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
