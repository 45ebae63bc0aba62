use thiserror::Error;

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// Number of bytes a tightly packed frame of this size occupies.
    pub fn byte_len(&self, format: PixelFormat) -> usize {
        self.width as usize * self.height as usize * format.bytes_per_pixel()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Premultiplied ARGB, 32 bits per pixel (Android `ARGB_8888`).
    PreMulArgb32,
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::PreMulArgb32 | PixelFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("frame is {got} bytes, sink expects {expected}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("stride {stride} is too small for a row of {width} pixels")]
    InvalidStride { width: u32, stride: u32 },
}

/// Destination for rasterized page content.
///
/// The native instance renders off-screen and hands over a complete frame in
/// one [`commit`](PixelSink::commit) call. Implementations must either take the
/// whole frame or reject it and keep their previous contents.
pub trait PixelSink {
    /// Size the sink expects frames to have.
    fn size(&self) -> SurfaceSize;

    fn format(&self) -> PixelFormat;

    /// Replace the sink contents with a full frame.
    fn commit(&mut self, pixels: &[u8], stride: u32) -> Result<(), SinkError>;
}

/// Owned CPU pixel buffer, the simplest [`PixelSink`].
#[derive(Clone)]
pub struct RgbaBuffer {
    pub pixels: Vec<u8>,
    pub size: SurfaceSize,
    pub stride: u32,
    pub format: PixelFormat,
    /// Bumped on every accepted frame
    pub frame_id: u64,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = SurfaceSize { width, height };
        Self {
            pixels: vec![0u8; size.byte_len(format)],
            size,
            stride: width * format.bytes_per_pixel() as u32,
            format,
            frame_id: 0,
        }
    }

    /// Returns the 4 bytes of the pixel at `(x, y)`, if inside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = y as usize * self.stride as usize + x as usize * 4;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl std::fmt::Debug for RgbaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaBuffer")
            .field("width", &self.size.width)
            .field("height", &self.size.height)
            .field("len", &self.pixels.len())
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

impl PixelSink for RgbaBuffer {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn commit(&mut self, pixels: &[u8], stride: u32) -> Result<(), SinkError> {
        let row = self.size.width * self.format.bytes_per_pixel() as u32;
        if stride < row {
            return Err(SinkError::InvalidStride {
                width: self.size.width,
                stride,
            });
        }

        let expected = stride as usize * self.size.height as usize;
        if pixels.len() != expected {
            return Err(SinkError::SizeMismatch {
                expected,
                got: pixels.len(),
            });
        }

        self.pixels.clear();
        self.pixels.extend_from_slice(pixels);
        self.stride = stride;
        self.frame_id = self.frame_id.wrapping_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_replaces_whole_frame() {
        let mut buf = RgbaBuffer::new(2, 2, PixelFormat::Rgba8);
        let frame = vec![7u8; 16];
        buf.commit(&frame, 8).unwrap();

        assert_eq!(buf.frame_id, 1);
        assert_eq!(buf.pixel(1, 1), Some([7, 7, 7, 7]));
        assert_eq!(buf.pixel(2, 0), None);
    }

    #[test]
    fn rejected_frame_leaves_contents_untouched() {
        let mut buf = RgbaBuffer::new(2, 2, PixelFormat::Rgba8);
        buf.commit(&[1u8; 16], 8).unwrap();

        let err = buf.commit(&[9u8; 15], 8).unwrap_err();
        assert_eq!(err, SinkError::SizeMismatch { expected: 16, got: 15 });
        assert_eq!(buf.frame_id, 1);
        assert!(buf.pixels.iter().all(|b| *b == 1));

        let err = buf.commit(&[9u8; 8], 4).unwrap_err();
        assert!(matches!(err, SinkError::InvalidStride { .. }));
    }
}
