//! Interface to the native rendering instance.
//!
//! The rendering engine itself is opaque. The bridge talks to it through the
//! [`NativeEngine`] command trait, and the engine talks back by posting
//! [`NativeCallback`]s through the [`CallbackSink`] it receives on creation.
//!
//! Callbacks may be raised from any thread (the engine runs its own event loop);
//! the sink only enqueues them on the marshal channel. They are applied later on
//! the thread that owns the [`Surface`](crate::bridge::Surface).

use crate::bridge::errors::NativeError;
use crate::bridge::events::BridgeMessage;
use crate::bridge::handle::InstanceId;
use crate::bridge::service::ServiceChannels;
use crate::render::{PixelSink, Viewport};
use std::num::NonZeroU64;
use std::os::fd::BorrowedFd;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Engine-side token for an allocated instance. Never zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawInstance(NonZeroU64);

impl RawInstance {
    /// Returns `None` for the null token.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

/// Everything a native instance needs at creation time.
#[derive(Debug, Clone)]
pub struct InstanceInit {
    pub resource_dir: Option<PathBuf>,
    pub callbacks: CallbackSink,
}

/// Commands the bridge issues to the native rendering layer.
///
/// Implementations must be callable from the UI thread without blocking. All
/// methods except `create` take the token returned by `create`; the bridge
/// never passes a token that was already disposed.
pub trait NativeEngine: Send + Sync {
    /// Name of the engine, for logging.
    fn name(&self) -> &str;

    /// Allocate a new instance.
    fn create(&self, init: InstanceInit) -> Result<RawInstance, NativeError>;

    /// Release an instance. Pending work on the instance must be dropped.
    fn dispose(&self, instance: RawInstance);

    fn load_url(&self, instance: RawInstance, url: &str);

    fn set_viewport_geometry(&self, instance: RawInstance, viewport: Viewport);

    fn set_device_pixel_ratio(&self, instance: RawInstance, ratio: f32);

    fn set_mouse_down(&self, instance: RawInstance, x: i32, y: i32);

    fn set_mouse_up(&self, instance: RawInstance, x: i32, y: i32);

    /// Rasterize the current content into `sink`. The sink must end up either
    /// fully updated or untouched.
    fn draw_into(&self, instance: RawInstance, sink: &mut dyn PixelSink);

    /// The content service is connected. The descriptors stay owned by the
    /// bridge; the engine has to duplicate them if it needs them beyond this call.
    fn service_connected(&self, instance: RawInstance, command: BorrowedFd<'_>, fd_passing: BorrowedFd<'_>);
}

/// Calls from the native instance back into the bridge.
#[derive(Debug)]
pub enum NativeCallback {
    /// A navigation started (or was redirected)
    LoadStart { url: String, is_redirect: bool },
    /// The current navigation finished
    LoadFinish,
    /// The user activated a link
    LinkClick { url: String },
    /// Page layout completed with the given content extents
    LayoutComplete { content_width: u32, content_height: u32 },
    /// The instance wants its content service bound using these descriptors
    ServiceConnectionRequested { channels: ServiceChannels },
    /// The instance asks the host to re-measure and redraw the surface
    InvalidateLayout,
}

/// Handed to a native instance so it can post callbacks from any thread.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    instance: InstanceId,
    tx: UnboundedSender<BridgeMessage>,
}

impl CallbackSink {
    pub(crate) fn new(instance: InstanceId, tx: UnboundedSender<BridgeMessage>) -> Self {
        Self { instance, tx }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Enqueue a callback. Returns false once the owning surface is gone.
    pub fn post(&self, callback: NativeCallback) -> bool {
        self.tx
            .send(BridgeMessage::Native {
                instance: self.instance,
                callback,
            })
            .is_ok()
    }

    pub fn on_load_start(&self, url: impl Into<String>, is_redirect: bool) -> bool {
        self.post(NativeCallback::LoadStart {
            url: url.into(),
            is_redirect,
        })
    }

    pub fn on_load_finish(&self) -> bool {
        self.post(NativeCallback::LoadFinish)
    }

    pub fn on_link_click(&self, url: impl Into<String>) -> bool {
        self.post(NativeCallback::LinkClick { url: url.into() })
    }

    pub fn on_layout_complete(&self, content_width: u32, content_height: u32) -> bool {
        self.post(NativeCallback::LayoutComplete {
            content_width,
            content_height,
        })
    }

    pub fn on_service_connection_requested(&self, channels: ServiceChannels) -> bool {
        self.post(NativeCallback::ServiceConnectionRequested { channels })
    }

    pub fn invalidate_layout(&self) -> bool {
        self.post(NativeCallback::InvalidateLayout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn raw_instance_rejects_null() {
        assert!(RawInstance::new(0).is_none());
        assert_eq!(RawInstance::new(42).map(|r| r.get()), Some(42));
    }

    #[test]
    fn sink_tags_callbacks_with_instance() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = InstanceId::new();
        let sink = CallbackSink::new(id, tx);

        assert!(sink.on_link_click("https://example.com/a"));

        match rx.try_recv().unwrap() {
            BridgeMessage::Native { instance, callback } => {
                assert_eq!(instance, id);
                assert!(matches!(callback, NativeCallback::LinkClick { url } if url == "https://example.com/a"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn sink_reports_closed_surface() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = CallbackSink::new(InstanceId::new(), tx);
        drop(rx);
        assert!(!sink.on_load_finish());
    }
}
