//! The surface adapter.
//!
//! A [`Surface`] is what a host UI embeds: it owns the native instance, the
//! viewport, the gesture router and the content service connection, and it is
//! driven from a single owner thread through `&mut self`.
//!
//! Native callbacks and service results never touch this state directly. They
//! are queued on the marshal channel and applied by [`Surface::pump`] (or
//! [`Surface::process_next`]), which also re-publishes them as
//! [`SurfaceEvent`]s to observers and broadcast subscribers.

use crate::bridge::config::BridgeConfig;
use crate::bridge::errors::BridgeError;
use crate::bridge::events::{BridgeMessage, SurfaceEvent, SurfaceObserver};
use crate::bridge::gesture::{GestureEvent, GestureRouter, PointerEvent};
use crate::bridge::handle::{HandleState, InstanceId};
use crate::bridge::native::{NativeCallback, NativeEngine};
use crate::bridge::native_bridge::NativeBridge;
use crate::bridge::navigation::normalize_url;
use crate::bridge::service::connector::ConnectionEvent;
use crate::bridge::service::{ConnectionState, ServiceBackend, ServiceChannels, ServiceConnector, ServiceTarget};
use crate::bridge::viewport::{ScrollDelta, ViewportController, ViewportState};
use crate::render::PixelSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};

/// Capacity of the broadcast event bus. Slow subscribers lag, they don't block.
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct Surface {
    config: BridgeConfig,
    viewport: ViewportController,
    bridge: NativeBridge,
    gestures: GestureRouter,
    connector: ServiceConnector,
    /// Native callbacks and service results, applied on the owning thread
    marshal_rx: mpsc::UnboundedReceiver<BridgeMessage>,
    event_tx: broadcast::Sender<SurfaceEvent>,
    observers: Vec<Box<dyn SurfaceObserver>>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("viewport", self.viewport.state())
            .field("bridge", &self.bridge)
            .field("gestures", self.gestures.state())
            .field("connector", &self.connector)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Surface {
    /// Create a surface. No native instance exists until [`initialize`](Self::initialize).
    /// Async work (service binds, liveness watches) is spawned on `runtime`.
    pub fn new(
        config: BridgeConfig,
        engine: Arc<dyn NativeEngine>,
        backend: Arc<dyn ServiceBackend>,
        runtime: Handle,
    ) -> Self {
        let (marshal_tx, marshal_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            viewport: ViewportController::new(config.default_device_pixel_ratio),
            bridge: NativeBridge::new(engine, marshal_tx.clone(), config.resource_dir.clone()),
            gestures: GestureRouter::from_config(&config),
            connector: ServiceConnector::new(backend, runtime, marshal_tx),
            config,
            marshal_rx,
            event_tx,
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn bridge(&self) -> &NativeBridge {
        &self.bridge
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connector.state()
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.bridge.instance_id()
    }

    /// Subscribe to surface events from any thread.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.event_tx.subscribe()
    }

    /// Register an observer that is called synchronously on the owning thread.
    pub fn add_observer<O: SurfaceObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Create the native instance, push the current geometry to it, lend it a
    /// service connection established earlier and load the configured home page.
    pub fn initialize(&mut self) -> Result<InstanceId, BridgeError> {
        let handle = self.bridge.create()?;
        self.emit(SurfaceEvent::InstanceCreated { instance: handle.id });

        self.bridge.set_device_pixel_ratio(self.viewport.state().device_pixel_ratio);
        self.bridge.set_viewport_geometry(self.viewport.geometry());

        if let Some(connection) = self.connector.connection() {
            log::debug!("Attaching service '{}' to new instance {}", connection.target, handle.id);
            self.bridge.attach_service(connection.command_fd(), connection.fd_passing_fd());
        }

        if let Some(home) = self.config.home_url.clone() {
            self.navigate(&home);
        }
        Ok(handle.id)
    }

    /// Returns true (and logs) when the surface has been torn down.
    fn disposed(&self, operation: &'static str) -> bool {
        if matches!(self.bridge.state(), HandleState::Disposed) {
            log::warn!("{}", BridgeError::StaleHandle { operation });
            return true;
        }
        false
    }

    /// Normalize typed input and load it. Returns the URL that was loaded.
    pub fn navigate(&mut self, input: &str) -> String {
        let url = normalize_url(input);
        if !self.disposed("navigate") {
            log::debug!("Navigating to {}", url);
            self.bridge.load_url(&url);
        }
        url
    }

    /// The host surface changed size or density.
    pub fn resize(&mut self, view_width: u32, view_height: u32, device_pixel_ratio: f32) {
        if self.disposed("resize") {
            return;
        }

        let before = *self.viewport.state();
        self.viewport.set_device_pixel_ratio(device_pixel_ratio);
        self.viewport.on_resize(view_width, view_height);

        self.bridge.set_device_pixel_ratio(self.viewport.state().device_pixel_ratio);
        self.bridge.set_viewport_geometry(self.viewport.geometry());
        self.emit_scroll_change(&before);
    }

    /// Scroll programmatically (keyboard, fling animation) by a delta in pixels.
    pub fn scroll_by(&mut self, dx: i32, dy: i32) -> Option<ScrollDelta> {
        if self.disposed("scroll_by") {
            return None;
        }

        let delta = self.viewport.scroll_by(dx, dy);
        if !delta.is_noop() {
            self.bridge.set_viewport_geometry(self.viewport.geometry());
            self.emit(SurfaceEvent::Scrolled { x: delta.x, y: delta.y });
        }
        Some(delta)
    }

    /// Feed a pointer event through gesture recognition.
    pub fn input(&mut self, event: PointerEvent) -> Option<GestureEvent> {
        if self.disposed("input") {
            return None;
        }

        let before = *self.viewport.state();
        let gesture = self.gestures.route(event, &mut self.viewport, &self.bridge);
        self.emit_scroll_change(&before);

        let gesture = gesture?;
        self.emit(SurfaceEvent::Gesture(gesture.clone()));
        Some(gesture)
    }

    /// Let time-based gestures fire. `now` must be on the clock used for the
    /// pointer event timestamps.
    pub fn tick(&mut self, now: Duration) -> Option<GestureEvent> {
        let gesture = self.gestures.check_long_press(now, &self.viewport)?;
        self.emit(SurfaceEvent::Gesture(gesture.clone()));
        Some(gesture)
    }

    pub fn draw(&self, sink: &mut dyn PixelSink) {
        self.bridge.draw_into(sink);
    }

    /// Bind the content service with the given descriptors.
    pub fn request_service(&mut self, channels: ServiceChannels) -> Result<(), BridgeError> {
        if self.disposed("request_service") {
            return Err(BridgeError::StaleHandle {
                operation: "request_service",
            });
        }
        let target = ServiceTarget::new(self.config.service_name.clone());
        self.connector.request_connection(target, channels)
    }

    /// Drop the content service connection, if any.
    pub fn unbind_service(&mut self) {
        self.connector.unbind();
    }

    /// Apply everything queued on the marshal channel. Returns how many
    /// messages were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(msg) = self.marshal_rx.try_recv() {
            self.process_message(msg);
            processed += 1;
        }
        processed
    }

    /// Wait for the next queued message and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.marshal_rx.recv().await {
            Some(msg) => {
                self.process_message(msg);
                true
            }
            None => false,
        }
    }

    /// Apply a single marshaled message.
    pub fn process_message(&mut self, msg: BridgeMessage) {
        match msg {
            BridgeMessage::Native { instance, callback } => {
                if self.bridge.instance_id() != Some(instance) {
                    log::debug!("Dropping callback from stale instance {}: {:?}", instance, callback);
                    return;
                }
                self.handle_native(callback);
            }
            BridgeMessage::Service(msg) => {
                let Some(event) = self.connector.handle_message(msg, &self.bridge) else {
                    return;
                };
                let service = self
                    .connector
                    .target()
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| self.config.service_name.clone());

                let ev = match event {
                    ConnectionEvent::Connected => SurfaceEvent::ServiceConnected { service },
                    ConnectionEvent::Disconnected => SurfaceEvent::ServiceDisconnected { service },
                    ConnectionEvent::BindFailed(e) => SurfaceEvent::ServiceBindFailed {
                        service,
                        error: e.to_string(),
                    },
                };
                self.emit(ev);
            }
        }
    }

    fn handle_native(&mut self, callback: NativeCallback) {
        match callback {
            NativeCallback::LoadStart { url, is_redirect } => {
                log::info!("Load started: {} (redirect: {})", url, is_redirect);
                self.emit(SurfaceEvent::LoadStarted { url, is_redirect });
            }
            NativeCallback::LoadFinish => {
                self.emit(SurfaceEvent::LoadFinished);
            }
            NativeCallback::LinkClick { url } => {
                self.emit(SurfaceEvent::LinkClicked { url });
            }
            NativeCallback::LayoutComplete {
                content_width,
                content_height,
            } => {
                let before = *self.viewport.state();
                self.viewport.on_content_layout(content_width, content_height);
                self.bridge.set_viewport_geometry(self.viewport.geometry());
                self.emit(SurfaceEvent::LayoutChanged {
                    content_width,
                    content_height,
                });
                self.emit_scroll_change(&before);
            }
            NativeCallback::ServiceConnectionRequested { channels } => {
                if let Err(e) = self.request_service(channels) {
                    log::error!("Cannot start service connection: {}", e);
                }
            }
            NativeCallback::InvalidateLayout => {
                self.bridge.set_viewport_geometry(self.viewport.geometry());
                self.emit(SurfaceEvent::LayoutInvalidated);
            }
        }
    }

    /// Tear down the native instance and the service connection. Later
    /// commands are logged and ignored; queued callbacks of the old instance
    /// are dropped.
    pub fn dispose(&mut self) {
        let instance = self.bridge.instance_id();

        self.connector.unbind();
        self.gestures.reset();
        self.bridge.dispose();

        if let Some(instance) = instance {
            self.emit(SurfaceEvent::InstanceDisposed { instance });
        }
    }

    fn emit_scroll_change(&mut self, before: &ViewportState) {
        let after = *self.viewport.state();
        if before.scroll_x != after.scroll_x || before.scroll_y != after.scroll_y {
            self.emit(SurfaceEvent::Scrolled {
                x: after.scroll_x,
                y: after.scroll_y,
            });
        }
    }

    fn emit(&mut self, event: SurfaceEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::engines::null::{EngineCall, NullEngine};
    use crate::bridge::native::CallbackSink;
    use crate::bridge::service::backends::in_process::InProcessBackend;
    use crate::bridge::test_utils::init_logging;
    use crate::render::{PixelFormat, RgbaBuffer, Viewport};
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;
    use tokio::sync::oneshot;

    fn surface_with(config: BridgeConfig) -> (Surface, Arc<NullEngine>) {
        let backend = InProcessBackend::new(|_target, _channels| async { Ok(()) });
        surface_with_backend(config, backend)
    }

    fn surface_with_backend(config: BridgeConfig, backend: InProcessBackend) -> (Surface, Arc<NullEngine>) {
        init_logging();
        let engine = Arc::new(NullEngine::new());
        let surface = Surface::new(config, engine.clone(), Arc::new(backend), Handle::current());
        (surface, engine)
    }

    /// Backend whose host keeps its descriptors until it is stopped, and
    /// reports on `stopped` when that happens.
    fn long_running_backend() -> (InProcessBackend, oneshot::Receiver<()>) {
        let (stopped_tx, stopped_rx) = oneshot::channel();
        let stopped = Mutex::new(Some(stopped_tx));
        let backend = InProcessBackend::new(move |_target, channels: ServiceChannels| {
            let guard = StopSignal(stopped.lock().unwrap().take());
            async move {
                let _guard = guard;
                let _channels = channels;
                futures::future::pending::<()>().await;
                Ok(())
            }
        });
        (backend, stopped_rx)
    }

    struct StopSignal(Option<oneshot::Sender<()>>);

    impl Drop for StopSignal {
        fn drop(&mut self) {
            if let Some(tx) = self.0.take() {
                let _ = tx.send(());
            }
        }
    }

    fn surface() -> (Surface, Arc<NullEngine>) {
        surface_with(BridgeConfig::default())
    }

    fn callbacks(surface: &Surface, engine: &NullEngine) -> CallbackSink {
        let raw = surface.bridge().state().live().unwrap().raw();
        engine.callbacks(raw).unwrap()
    }

    fn recorder(surface: &mut Surface) -> Arc<Mutex<Vec<SurfaceEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        surface.add_observer(move |ev: &SurfaceEvent| sink.lock().unwrap().push(ev.clone()));
        seen
    }

    async fn next(surface: &mut Surface) {
        let got = tokio::time::timeout(Duration::from_secs(1), surface.process_next())
            .await
            .expect("timed out waiting for marshaled message");
        assert!(got);
    }

    #[tokio::test]
    async fn layout_and_scroll_scenario() {
        let (mut s, engine) = surface();
        s.initialize().unwrap();
        s.resize(400, 800, 1.0);

        let cb = callbacks(&s, &engine);
        cb.on_layout_complete(400, 2000);
        assert_eq!(s.pump(), 1);

        let delta = s.scroll_by(0, 5000).unwrap();
        assert_eq!(delta.y, 1200);
        assert_eq!(s.viewport().scroll_y, 1200);
        assert_eq!(
            engine.last_call(),
            Some(EngineCall::SetViewportGeometry {
                instance: s.bridge().state().live().unwrap().raw(),
                viewport: Viewport::new(0, 1200, 400, 800),
            })
        );

        cb.on_layout_complete(400, 900);
        s.pump();
        assert_eq!(s.viewport().scroll_y, 100);
        assert_eq!(
            engine.last_call(),
            Some(EngineCall::SetViewportGeometry {
                instance: s.bridge().state().live().unwrap().raw(),
                viewport: Viewport::new(0, 100, 400, 800),
            })
        );
    }

    #[tokio::test]
    async fn initialize_pushes_state_and_loads_home() {
        let config = BridgeConfig::builder()
            .default_device_pixel_ratio(2.0)
            .home_url("ladybird.dev")
            .build()
            .unwrap();
        let (mut s, engine) = surface_with(config);
        let mut rx = s.subscribe_events();

        let id = s.initialize().unwrap();
        assert_eq!(rx.try_recv().unwrap(), SurfaceEvent::InstanceCreated { instance: id });

        let raw = s.bridge().state().live().unwrap().raw();
        let calls = engine.calls();
        assert!(calls.contains(&EngineCall::SetDevicePixelRatio { instance: raw, ratio: 2.0 }));
        assert!(calls.contains(&EngineCall::LoadUrl {
            instance: raw,
            url: "https://ladybird.dev".into()
        }));
    }

    #[tokio::test]
    async fn navigate_normalizes_input() {
        let (mut s, engine) = surface();
        s.initialize().unwrap();

        assert_eq!(s.navigate("example.com"), "https://example.com");
        assert_eq!(s.navigate("https://example.com/path"), "https://example.com/path");

        let loaded: Vec<_> = engine
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::LoadUrl { url, .. } => Some(url),
                _ => None,
            })
            .collect();
        assert_eq!(loaded, vec!["https://example.com", "https://example.com/path"]);
    }

    #[tokio::test]
    async fn callbacks_reach_observers() {
        let (mut s, engine) = surface();
        let seen = recorder(&mut s);
        s.initialize().unwrap();

        let cb = callbacks(&s, &engine);
        cb.on_load_start("https://example.com/", false);
        cb.on_link_click("https://example.com/next");
        cb.on_load_finish();
        cb.invalidate_layout();
        assert_eq!(s.pump(), 4);

        let seen = seen.lock().unwrap();
        assert_eq!(
            &seen[1..],
            &[
                SurfaceEvent::LoadStarted {
                    url: "https://example.com/".into(),
                    is_redirect: false
                },
                SurfaceEvent::LinkClicked {
                    url: "https://example.com/next".into()
                },
                SurfaceEvent::LoadFinished,
                SurfaceEvent::LayoutInvalidated,
            ]
        );
    }

    #[tokio::test]
    async fn commands_after_dispose_leave_state_alone() {
        let (mut s, engine) = surface();
        s.initialize().unwrap();
        s.resize(400, 800, 1.0);
        let cb = callbacks(&s, &engine);
        cb.on_layout_complete(400, 2000);
        s.pump();
        s.scroll_by(0, 300);

        s.dispose();
        s.dispose();
        let before = *s.viewport();
        engine.clear_calls();

        s.resize(10, 10, 3.0);
        assert!(s.scroll_by(0, 50).is_none());
        assert!(s
            .input(PointerEvent::Down {
                x: 1.0,
                y: 1.0,
                time: Duration::ZERO
            })
            .is_none());
        s.navigate("example.com");
        let mut sink = RgbaBuffer::new(4, 4, PixelFormat::Rgba8);
        s.draw(&mut sink);

        // Late callbacks from the disposed instance are dropped too.
        cb.on_layout_complete(10, 10);
        s.pump();

        assert_eq!(*s.viewport(), before);
        assert!(engine.calls().is_empty());
        assert_eq!(sink.frame_id, 0);
    }

    #[tokio::test]
    async fn callbacks_of_replaced_instance_are_dropped() {
        let (mut s, engine) = surface();
        s.initialize().unwrap();
        s.resize(100, 100, 1.0);
        let old = callbacks(&s, &engine);

        s.dispose();
        s.initialize().unwrap();
        s.resize(100, 100, 1.0);

        old.on_layout_complete(100, 5000);
        s.pump();
        assert_eq!(s.viewport().content_height, 0);

        callbacks(&s, &engine).on_layout_complete(100, 500);
        s.pump();
        assert_eq!(s.viewport().content_height, 500);
    }

    #[tokio::test]
    async fn scroll_gesture_moves_viewport() {
        let (mut s, engine) = surface();
        let mut rx = s.subscribe_events();
        s.initialize().unwrap();
        s.resize(400, 800, 1.0);
        callbacks(&s, &engine).on_layout_complete(400, 2000);
        s.pump();

        s.input(PointerEvent::Down {
            x: 200.0,
            y: 600.0,
            time: Duration::ZERO,
        });
        let g = s.input(PointerEvent::Move {
            x: 200.0,
            y: 400.0,
            time: Duration::from_millis(16),
        });
        assert!(matches!(g, Some(GestureEvent::Scroll { .. })));
        assert!(s.viewport().scroll_y > 0);

        let mut scrolled = false;
        while let Ok(ev) = rx.try_recv() {
            scrolled |= matches!(ev, SurfaceEvent::Scrolled { .. });
        }
        assert!(scrolled);
    }

    #[tokio::test]
    async fn service_request_from_native_connects_then_disconnects() {
        let (mut s, engine) = surface();
        let seen = recorder(&mut s);
        s.initialize().unwrap();

        let (_local, remote) = ServiceChannels::socket_pairs().unwrap();
        callbacks(&s, &engine).on_service_connection_requested(remote);
        s.pump();
        assert_eq!(s.connection_state(), ConnectionState::Binding);

        next(&mut s).await;
        assert_eq!(s.connection_state(), ConnectionState::Connected);
        assert_eq!(engine.count(|c| matches!(c, EngineCall::ServiceConnected { .. })), 1);

        // The in-process host returns right away, so the service goes away.
        next(&mut s).await;
        assert_eq!(s.connection_state(), ConnectionState::Disconnected);

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&SurfaceEvent::ServiceConnected {
            service: "WebContent".into()
        }));
        assert!(seen.contains(&SurfaceEvent::ServiceDisconnected {
            service: "WebContent".into()
        }));
    }

    #[tokio::test]
    async fn duplicate_service_request_is_rejected() {
        let (mut s, _engine) = surface();
        s.initialize().unwrap();

        let (_l1, r1) = ServiceChannels::socket_pairs().unwrap();
        let (_l2, r2) = ServiceChannels::socket_pairs().unwrap();
        s.request_service(r1).unwrap();
        let err = s.request_service(r2).unwrap_err();
        assert!(matches!(err, BridgeError::AlreadyBinding { .. }));

        s.dispose();
        assert_eq!(s.connection_state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn unbind_service_stops_in_process_host() {
        let (backend, stopped) = long_running_backend();
        let (mut s, _engine) = surface_with_backend(BridgeConfig::default(), backend);
        s.initialize().unwrap();

        let (local, remote) = ServiceChannels::socket_pairs().unwrap();
        s.request_service(remote).unwrap();
        next(&mut s).await;
        assert_eq!(s.connection_state(), ConnectionState::Connected);

        s.unbind_service();
        assert_eq!(s.connection_state(), ConnectionState::Idle);
        tokio::time::timeout(Duration::from_secs(1), stopped).await.unwrap().unwrap();

        // Neither the surface nor the host holds the remote end any more.
        let (cmd, _pass) = local.into_streams();
        cmd.set_nonblocking(true).unwrap();
        let mut cmd = tokio::net::UnixStream::from_std(cmd).unwrap();
        let mut buf = [0u8; 1];
        let n = tokio::time::timeout(Duration::from_secs(1), cmd.read(&mut buf)).await.unwrap().unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn dispose_stops_in_process_host() {
        let (backend, stopped) = long_running_backend();
        let (mut s, _engine) = surface_with_backend(BridgeConfig::default(), backend);
        s.initialize().unwrap();

        let (_local, remote) = ServiceChannels::socket_pairs().unwrap();
        s.request_service(remote).unwrap();
        next(&mut s).await;

        s.dispose();
        tokio::time::timeout(Duration::from_secs(1), stopped).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn service_bound_before_initialize_reaches_instance() {
        let (backend, _stopped) = long_running_backend();
        let (mut s, engine) = surface_with_backend(BridgeConfig::default(), backend);

        let (_local, remote) = ServiceChannels::socket_pairs().unwrap();
        s.request_service(remote).unwrap();
        next(&mut s).await;
        assert_eq!(s.connection_state(), ConnectionState::Connected);
        assert_eq!(engine.count(|c| matches!(c, EngineCall::ServiceConnected { .. })), 0);

        let id = s.initialize().unwrap();
        assert_eq!(s.instance_id(), Some(id));
        assert_eq!(engine.count(|c| matches!(c, EngineCall::ServiceConnected { .. })), 1);
    }

    #[tokio::test]
    async fn release_after_scroll_applies_remaining_motion() {
        let (mut s, engine) = surface();
        s.initialize().unwrap();
        s.resize(400, 800, 1.0);
        callbacks(&s, &engine).on_layout_complete(400, 2000);
        s.pump();

        s.input(PointerEvent::Down {
            x: 200.0,
            y: 600.0,
            time: Duration::ZERO,
        });
        s.input(PointerEvent::Move {
            x: 200.0,
            y: 400.0,
            time: Duration::from_millis(100),
        });
        assert_eq!(s.viewport().scroll_y, 200);

        s.input(PointerEvent::Up {
            x: 200.0,
            y: 350.0,
            time: Duration::from_millis(200),
        });
        assert_eq!(s.viewport().scroll_y, 250);
        assert_eq!(
            engine.last_call(),
            Some(EngineCall::SetViewportGeometry {
                instance: s.bridge().state().live().unwrap().raw(),
                viewport: Viewport::new(0, 250, 400, 800),
            })
        );
    }
}
