//! Messages crossing the bridge.
//!
//! - [`BridgeMessage`]: work posted from other execution contexts (native
//!   callbacks, service bind results) onto the marshal channel. Only the owning
//!   surface applies them.
//! - [`SurfaceEvent`]: notifications for UI-facing observers.

use crate::bridge::gesture::GestureEvent;
use crate::bridge::handle::InstanceId;
use crate::bridge::native::NativeCallback;
use crate::bridge::service::ServiceMessage;

/// A unit of work marshaled onto the surface's owning thread.
#[derive(Debug)]
pub enum BridgeMessage {
    /// Callback raised by a native instance
    Native { instance: InstanceId, callback: NativeCallback },
    /// Progress of the content service connection
    Service(ServiceMessage),
}

/// Events emitted by a surface to its observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    // ****************************************
    // ** Lifecycle
    /// Native instance has been created
    InstanceCreated { instance: InstanceId },
    /// Native instance has been disposed
    InstanceDisposed { instance: InstanceId },

    // ****************************************
    // ** Navigation
    /// Loading of a page started
    LoadStarted { url: String, is_redirect: bool },
    /// Loading of the page has finished
    LoadFinished,
    /// A link was activated inside the page
    LinkClicked { url: String },

    // ****************************************
    // ** Geometry
    /// Page layout produced new content extents
    LayoutChanged { content_width: u32, content_height: u32 },
    /// The surface must be re-measured and redrawn
    LayoutInvalidated,
    /// Scroll offset changed
    Scrolled { x: u32, y: u32 },

    // ****************************************
    // ** Input
    /// A gesture was recognized
    Gesture(GestureEvent),

    // ****************************************
    // ** Content service
    /// Content service is connected
    ServiceConnected { service: String },
    /// Content service went away
    ServiceDisconnected { service: String },
    /// Binding to the content service failed
    ServiceBindFailed { service: String, error: String },
}

/// Receives surface events synchronously on the owning thread.
pub trait SurfaceObserver {
    fn on_event(&mut self, event: &SurfaceEvent);
}

impl<F> SurfaceObserver for F
where
    F: FnMut(&SurfaceEvent),
{
    fn on_event(&mut self, event: &SurfaceEvent) {
        self(event)
    }
}
