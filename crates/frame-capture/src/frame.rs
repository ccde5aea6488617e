//! Frame types, pixel-format normalization, and rotation arithmetic.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::CameraError;

/// Cardinal frame rotation, clockwise degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }
}

/// Map a sensor-reported rotation through the current display rotation.
///
/// Table-driven over the four cardinal rotations. Continuous orientation
/// tracking is off by default; callers that do not track the display simply
/// pass the frame rotation through unchanged.
pub fn corrected_rotation(display: Rotation, frame: Rotation) -> Rotation {
    let offset = match display {
        Rotation::Deg0 => 0,
        Rotation::Deg90 => 270,
        Rotation::Deg180 => 180,
        Rotation::Deg270 => 90,
    };
    Rotation::from_degrees((frame.degrees() + offset) % 360).unwrap_or(frame)
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit grayscale, one byte per pixel.
    Luma8,
    /// Packed RGB, three bytes per pixel.
    Rgb24,
    /// Y plane followed by interleaved VU; only the Y plane is decoded.
    Nv21,
    /// JPEG-compressed frame, as streamed by MJPEG cameras.
    Mjpeg,
}

/// Grayscale image handed to the decode capability.
#[derive(Debug, Clone)]
pub struct LumaImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// One captured video frame.
///
/// The pixel buffer is borrowed from the camera's fixed pool; dropping the
/// frame returns it, so whichever code path finishes with the frame releases
/// the buffer exactly once. A frame may carry no buffer at all (the camera
/// reported an absent image), which downstream treats as a no-op.
#[derive(Debug)]
pub struct Frame {
    buffer: Option<PixelBuffer>,
    format: PixelFormat,
    rotation: Rotation,
    width: u32,
    height: u32,
    timestamp_ms: u64,
}

impl Frame {
    pub fn new(
        buffer: PixelBuffer,
        format: PixelFormat,
        rotation: Rotation,
        width: u32,
        height: u32,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            buffer: Some(buffer),
            format,
            rotation,
            width,
            height,
            timestamp_ms,
        }
    }

    /// Frame whose image was reported absent by the camera.
    pub fn without_buffer(
        format: PixelFormat,
        rotation: Rotation,
        width: u32,
        height: u32,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            buffer: None,
            format,
            rotation,
            width,
            height,
            timestamp_ms,
        }
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Monotonic capture timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Normalize the frame to grayscale for the decode capability.
    pub fn to_luma(&self) -> Result<LumaImage, CameraError> {
        let buffer = self.buffer.as_ref().ok_or(CameraError::Buffer)?;
        let data = buffer.as_slice();
        let pixels = (self.width * self.height) as usize;

        match self.format {
            PixelFormat::Luma8 | PixelFormat::Nv21 => {
                // Nv21: the Y plane leads the payload and is the luma image.
                if data.len() < pixels {
                    return Err(CameraError::Format(format!(
                        "expected at least {} luma bytes, got {}",
                        pixels,
                        data.len()
                    )));
                }
                Ok(LumaImage {
                    data: data[..pixels].to_vec(),
                    width: self.width,
                    height: self.height,
                })
            }
            PixelFormat::Rgb24 => {
                if data.len() < pixels * 3 {
                    return Err(CameraError::Format(format!(
                        "expected {} rgb bytes, got {}",
                        pixels * 3,
                        data.len()
                    )));
                }
                let mut luma = Vec::with_capacity(pixels);
                for pixel in data[..pixels * 3].chunks(3) {
                    // Luminance formula: 0.299*R + 0.587*G + 0.114*B
                    let y = (pixel[0] as f32 * 0.299
                        + pixel[1] as f32 * 0.587
                        + pixel[2] as f32 * 0.114) as u8;
                    luma.push(y);
                }
                Ok(LumaImage {
                    data: luma,
                    width: self.width,
                    height: self.height,
                })
            }
            PixelFormat::Mjpeg => {
                let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
                    .map_err(|e| CameraError::Format(format!("mjpeg decode failed: {e}")))?;
                let gray = decoded.to_luma8();
                let (width, height) = (gray.width(), gray.height());
                Ok(LumaImage {
                    data: gray.into_raw(),
                    width,
                    height,
                })
            }
        }
    }
}
