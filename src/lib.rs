pub mod bridge;
pub mod render;

pub use bridge::{BridgeConfig, BridgeError, Surface, SurfaceEvent};
