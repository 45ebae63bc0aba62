pub mod sink;

mod viewport;

pub use sink::{PixelFormat, PixelSink, RgbaBuffer, SinkError, SurfaceSize};
pub use viewport::Viewport;
