use crate::bridge::errors::NativeError;
use crate::bridge::native::{CallbackSink, InstanceInit, NativeEngine, RawInstance};
use crate::render::{PixelSink, Viewport};
use std::collections::HashMap;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Fill colour of frames produced by [`NullEngine::draw_into`].
pub const NULL_FILL: [u8; 4] = [0x1e, 0x1e, 0x2e, 0xff];

/// A command received by the [`NullEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create { instance: RawInstance },
    Dispose { instance: RawInstance },
    LoadUrl { instance: RawInstance, url: String },
    SetViewportGeometry { instance: RawInstance, viewport: Viewport },
    SetDevicePixelRatio { instance: RawInstance, ratio: f32 },
    MouseDown { instance: RawInstance, x: i32, y: i32 },
    MouseUp { instance: RawInstance, x: i32, y: i32 },
    DrawInto { instance: RawInstance },
    ServiceConnected { instance: RawInstance, command: RawFd, fd_passing: RawFd },
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    instances: HashMap<RawInstance, InstanceInit>,
    calls: Vec<EngineCall>,
}

/// Native engine that renders nothing and records every command it receives.
///
/// Useful for hosts without a real engine and for exercising the bridge.
/// Callbacks can be raised on behalf of an instance through [`NullEngine::callbacks`].
pub struct NullEngine {
    inner: Mutex<Inner>,
    fail_allocation: bool,
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            fail_allocation: false,
        }
    }

    /// An engine whose every allocation fails.
    pub fn failing() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            fail_allocation: true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: EngineCall) {
        log::trace!("NullEngine: {:?}", call);
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn last_call(&self) -> Option<EngineCall> {
        self.lock().calls.last().cloned()
    }

    pub fn live_instances(&self) -> usize {
        self.lock().instances.len()
    }

    /// Callback sink of a live instance, to raise native events from the outside.
    pub fn callbacks(&self, instance: RawInstance) -> Option<CallbackSink> {
        self.lock().instances.get(&instance).map(|i| i.callbacks.clone())
    }

    pub fn resource_dir(&self, instance: RawInstance) -> Option<PathBuf> {
        self.lock().instances.get(&instance).and_then(|i| i.resource_dir.clone())
    }
}

impl NativeEngine for NullEngine {
    fn name(&self) -> &str {
        "NullEngine"
    }

    fn create(&self, init: InstanceInit) -> Result<RawInstance, NativeError> {
        if self.fail_allocation {
            return Err(NativeError::AllocationFailed("null engine configured to fail".into()));
        }

        let mut inner = self.lock();
        inner.next_id += 1;
        let instance = RawInstance::new(inner.next_id).ok_or(NativeError::Unavailable)?;
        inner.instances.insert(instance, init);
        inner.calls.push(EngineCall::Create { instance });
        Ok(instance)
    }

    fn dispose(&self, instance: RawInstance) {
        let mut inner = self.lock();
        inner.instances.remove(&instance);
        inner.calls.push(EngineCall::Dispose { instance });
    }

    fn load_url(&self, instance: RawInstance, url: &str) {
        self.record(EngineCall::LoadUrl {
            instance,
            url: url.to_string(),
        });
    }

    fn set_viewport_geometry(&self, instance: RawInstance, viewport: Viewport) {
        self.record(EngineCall::SetViewportGeometry { instance, viewport });
    }

    fn set_device_pixel_ratio(&self, instance: RawInstance, ratio: f32) {
        self.record(EngineCall::SetDevicePixelRatio { instance, ratio });
    }

    fn set_mouse_down(&self, instance: RawInstance, x: i32, y: i32) {
        self.record(EngineCall::MouseDown { instance, x, y });
    }

    fn set_mouse_up(&self, instance: RawInstance, x: i32, y: i32) {
        self.record(EngineCall::MouseUp { instance, x, y });
    }

    fn draw_into(&self, instance: RawInstance, sink: &mut dyn PixelSink) {
        self.record(EngineCall::DrawInto { instance });

        let size = sink.size();
        let stride = size.width * sink.format().bytes_per_pixel() as u32;
        let frame: Vec<u8> = NULL_FILL
            .iter()
            .copied()
            .cycle()
            .take(stride as usize * size.height as usize)
            .collect();

        if let Err(e) = sink.commit(&frame, stride) {
            log::warn!("NullEngine: sink rejected frame: {}", e);
        }
    }

    fn service_connected(&self, instance: RawInstance, command: BorrowedFd<'_>, fd_passing: BorrowedFd<'_>) {
        self.record(EngineCall::ServiceConnected {
            instance,
            command: command.as_raw_fd(),
            fd_passing: fd_passing.as_raw_fd(),
        });
    }
}
