//! Presentation-layer bridge between a host UI surface and a native rendering
//! instance.
//!
//! The [`Surface`] is the entry point. It is built from a [`BridgeConfig`], a
//! [`NativeEngine`] that owns the actual rendering instances and a
//! [`ServiceBackend`] used to bind the content service.

pub mod config;
pub mod errors;
pub mod events;
pub mod gesture;
pub mod handle;
pub mod native;
pub mod native_bridge;
pub mod navigation;
pub mod service;
pub mod surface;
pub mod viewport;

pub mod engines {
    pub mod null;
}


pub use config::{BridgeConfig, BridgeConfigBuilder, ConfigError};
pub use errors::{BridgeError, ConnectError, NativeError};
pub use events::{BridgeMessage, SurfaceEvent, SurfaceObserver};
pub use gesture::{GestureEvent, GestureRouter, PointerEvent};
pub use handle::{HandleState, InstanceId, NativeInstanceHandle};
pub use native::{CallbackSink, InstanceInit, NativeCallback, NativeEngine, RawInstance};
pub use native_bridge::NativeBridge;
pub use navigation::normalize_url;
pub use service::{ConnectionState, ServiceBackend, ServiceChannels, ServiceConnector, ServiceTarget};
pub use surface::Surface;
pub use viewport::{ScrollDelta, ViewportController, ViewportState};
