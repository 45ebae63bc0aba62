use crate::bridge::errors::BridgeError;
use crate::bridge::events::BridgeMessage;
use crate::bridge::handle::{HandleState, InstanceId, NativeInstanceHandle};
use crate::bridge::native::{CallbackSink, InstanceInit, NativeEngine, RawInstance};
use crate::render::{PixelSink, Viewport};
use std::os::fd::BorrowedFd;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Owns at most one native rendering instance and forwards commands to it.
///
/// Forwarding commands issued while no instance is live are not errors: late
/// input during teardown is normal, so they are logged and dropped.
pub struct NativeBridge {
    engine: Arc<dyn NativeEngine>,
    handle: HandleState,
    /// Marshal channel handed to every instance for its callbacks
    callback_tx: UnboundedSender<BridgeMessage>,
    resource_dir: Option<PathBuf>,
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("engine", &self.engine.name())
            .field("handle", &self.handle)
            .field("resource_dir", &self.resource_dir)
            .finish()
    }
}

impl NativeBridge {
    pub fn new(
        engine: Arc<dyn NativeEngine>,
        callback_tx: UnboundedSender<BridgeMessage>,
        resource_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            engine,
            handle: HandleState::Unallocated,
            callback_tx,
            resource_dir,
        }
    }

    /// Allocate the native instance and register it for callback delivery.
    pub fn create(&mut self) -> Result<NativeInstanceHandle, BridgeError> {
        if let HandleState::Live(h) = self.handle {
            return Err(BridgeError::Initialization(format!(
                "instance {} is still live, dispose it first",
                h.id
            )));
        }

        let id = InstanceId::new();
        let init = InstanceInit {
            resource_dir: self.resource_dir.clone(),
            callbacks: CallbackSink::new(id, self.callback_tx.clone()),
        };

        let raw = self
            .engine
            .create(init)
            .map_err(|e| BridgeError::Initialization(e.to_string()))?;

        let handle = NativeInstanceHandle { id, raw };
        self.handle = HandleState::Live(handle);
        log::debug!("Created native instance {} on engine {}", id, self.engine.name());

        Ok(handle)
    }

    /// Release the native instance. Calling this again is a no-op.
    pub fn dispose(&mut self) {
        // Flip the state first so anything observing the bridge during the
        // engine call already sees the instance as gone.
        let previous = std::mem::replace(&mut self.handle, HandleState::Disposed);
        match previous {
            HandleState::Live(h) => {
                self.engine.dispose(h.raw);
                log::debug!("Disposed native instance {}", h.id);
            }
            HandleState::Unallocated => self.handle = HandleState::Unallocated,
            HandleState::Disposed => {}
        }
    }

    pub fn state(&self) -> HandleState {
        self.handle
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.handle.live().map(|h| h.id)
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    fn live(&self, operation: &'static str) -> Option<RawInstance> {
        match self.handle.live() {
            Some(h) => Some(h.raw),
            None => {
                log::warn!("{}", BridgeError::StaleHandle { operation });
                None
            }
        }
    }

    pub fn load_url(&self, url: &str) {
        if let Some(raw) = self.live("load_url") {
            log::info!("Loading URL '{}'", url);
            self.engine.load_url(raw, url);
        }
    }

    pub fn set_viewport_geometry(&self, viewport: Viewport) {
        if let Some(raw) = self.live("set_viewport_geometry") {
            self.engine.set_viewport_geometry(raw, viewport);
        }
    }

    pub fn set_device_pixel_ratio(&self, ratio: f32) {
        if let Some(raw) = self.live("set_device_pixel_ratio") {
            self.engine.set_device_pixel_ratio(raw, ratio);
        }
    }

    pub fn set_mouse_down(&self, x: i32, y: i32) {
        if let Some(raw) = self.live("set_mouse_down") {
            self.engine.set_mouse_down(raw, x, y);
        }
    }

    pub fn set_mouse_up(&self, x: i32, y: i32) {
        if let Some(raw) = self.live("set_mouse_up") {
            self.engine.set_mouse_up(raw, x, y);
        }
    }

    pub fn draw_into(&self, sink: &mut dyn PixelSink) {
        if let Some(raw) = self.live("draw_into") {
            self.engine.draw_into(raw, sink);
        }
    }

    /// Lend the content service descriptors to the native instance.
    pub fn attach_service(&self, command: BorrowedFd<'_>, fd_passing: BorrowedFd<'_>) {
        if let Some(raw) = self.live("attach_service") {
            self.engine.service_connected(raw, command, fd_passing);
        }
    }
}

impl Drop for NativeBridge {
    fn drop(&mut self) {
        self.dispose();
    }
}
