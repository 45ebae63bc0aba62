use crate::bridge::errors::{BridgeError, ConnectError};
use crate::bridge::events::BridgeMessage;
use crate::bridge::native_bridge::NativeBridge;
use crate::bridge::service::backend::{ServiceBackend, ServiceBinding, ServiceTarget};
use crate::bridge::service::channels::ServiceChannels;
use std::os::fd::BorrowedFd;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Where the content service connection currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never requested, or explicitly unbound
    #[default]
    Idle,
    /// Bind is in flight
    Binding,
    /// Descriptors are held and lent to the native instance
    Connected,
    /// Service went away or the bind failed
    Disconnected,
}

/// Results of async connection work, posted back to the owning thread.
#[derive(Debug)]
pub enum ServiceMessage {
    BindComplete {
        generation: u64,
        channels: ServiceChannels,
        result: Result<ServiceBinding, ConnectError>,
    },
    ChannelClosed {
        generation: u64,
    },
}

/// What a processed [`ServiceMessage`] changed.
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    BindFailed(ConnectError),
}

/// An established connection. Owns the descriptors until dropped.
#[derive(Debug)]
pub struct ServiceConnection {
    pub target: ServiceTarget,
    channels: ServiceChannels,
}

impl ServiceConnection {
    pub fn command_fd(&self) -> BorrowedFd<'_> {
        self.channels.command_fd()
    }

    pub fn fd_passing_fd(&self) -> BorrowedFd<'_> {
        self.channels.fd_passing_fd()
    }
}

/// Binds to the content service and keeps the connection descriptors.
///
/// All state changes happen in [`request_connection`](Self::request_connection),
/// [`handle_message`](Self::handle_message) and [`unbind`](Self::unbind), which
/// are only called from the owning thread. Async work reports back through the
/// marshal channel, tagged with the generation it was started for; results of
/// an older generation are dropped together with their descriptors.
pub struct ServiceConnector {
    backend: Arc<dyn ServiceBackend>,
    runtime: Handle,
    marshal: UnboundedSender<BridgeMessage>,
    state: ConnectionState,
    generation: u64,
    target: Option<ServiceTarget>,
    connection: Option<ServiceConnection>,
    bind_cancel: Option<CancellationToken>,
    watch_cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for ServiceConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConnector")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("target", &self.target)
            .finish()
    }
}

impl ServiceConnector {
    pub fn new(backend: Arc<dyn ServiceBackend>, runtime: Handle, marshal: UnboundedSender<BridgeMessage>) -> Self {
        Self {
            backend,
            runtime,
            marshal,
            state: ConnectionState::Idle,
            generation: 0,
            target: None,
            connection: None,
            bind_cancel: None,
            watch_cancel: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Target of the current or last connection attempt.
    pub fn target(&self) -> Option<&ServiceTarget> {
        self.target.as_ref()
    }

    pub fn connection(&self) -> Option<&ServiceConnection> {
        self.connection.as_ref()
    }

    /// Start binding `channels` to `target`.
    ///
    /// Only allowed from `Idle` or `Disconnected`. The state is `Binding` when
    /// this returns; the outcome arrives later as a [`ServiceMessage`]. On error
    /// the channels are dropped.
    pub fn request_connection(&mut self, target: ServiceTarget, channels: ServiceChannels) -> Result<(), BridgeError> {
        match self.state {
            ConnectionState::Idle | ConnectionState::Disconnected => {}
            state => {
                log::warn!("Connection to '{}' requested while {:?}", target, state);
                return Err(BridgeError::AlreadyBinding { state });
            }
        }

        self.generation += 1;
        let generation = self.generation;
        self.state = ConnectionState::Binding;
        self.target = Some(target.clone());

        log::info!(
            "Binding to service '{}' via {} (generation {})",
            target,
            self.backend.name(),
            generation
        );

        let bind = self.backend.bind(&target, &channels);
        let cancel = CancellationToken::new();
        self.bind_cancel = Some(cancel.clone());
        let marshal = self.marshal.clone();

        self.runtime.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    log::debug!("Bind of '{}' cancelled (generation {})", target, generation);
                    return;
                }
                res = bind => res,
            };

            let msg = ServiceMessage::BindComplete { generation, channels, result };
            if marshal.send(BridgeMessage::Service(msg)).is_err() {
                log::debug!("Surface gone before bind of '{}' completed", target);
            }
        });

        Ok(())
    }

    /// Apply an async result. Must run on the owning thread.
    pub fn handle_message(&mut self, msg: ServiceMessage, bridge: &NativeBridge) -> Option<ConnectionEvent> {
        match msg {
            ServiceMessage::BindComplete {
                generation,
                channels,
                result,
            } => {
                if generation != self.generation || self.state != ConnectionState::Binding {
                    log::debug!(
                        "Dropping stale bind result (generation {}, current {}, state {:?})",
                        generation,
                        self.generation,
                        self.state
                    );
                    return None;
                }
                self.bind_cancel = None;

                match result {
                    Ok(binding) => {
                        let target = self.target.clone().unwrap_or_else(|| ServiceTarget::new(""));
                        let connection = ServiceConnection { target, channels };
                        // Without a live instance the descriptors are lent on creation.
                        if bridge.is_live() {
                            bridge.attach_service(connection.command_fd(), connection.fd_passing_fd());
                        }
                        log::info!("Connected to service '{}'", connection.target);

                        self.connection = Some(connection);
                        self.state = ConnectionState::Connected;
                        self.watch(generation, binding);
                        Some(ConnectionEvent::Connected)
                    }
                    Err(e) => {
                        log::error!("Binding to service failed: {}", e);
                        self.state = ConnectionState::Disconnected;
                        Some(ConnectionEvent::BindFailed(e))
                    }
                }
            }
            ServiceMessage::ChannelClosed { generation } => {
                if generation != self.generation || self.state != ConnectionState::Connected {
                    log::debug!("Dropping stale close notification (generation {})", generation);
                    return None;
                }

                let service = self.target.as_ref().map(|t| t.name.clone()).unwrap_or_default();
                log::warn!("{}", BridgeError::Disconnected(format!("service '{}' went away", service)));
                self.watch_cancel = None;
                self.connection = None;
                self.state = ConnectionState::Disconnected;
                Some(ConnectionEvent::Disconnected)
            }
        }
    }

    /// Tear down from any state: cancel pending work, close descriptors, go `Idle`.
    pub fn unbind(&mut self) {
        if let Some(token) = self.bind_cancel.take() {
            token.cancel();
        }
        if let Some(token) = self.watch_cancel.take() {
            token.cancel();
        }
        if self.connection.take().is_some() {
            log::info!("Unbound from service");
        }

        // Anything still in flight belongs to an older generation now.
        self.generation += 1;
        self.state = ConnectionState::Idle;
    }

    fn watch(&mut self, generation: u64, binding: ServiceBinding) {
        let cancel = CancellationToken::new();
        self.watch_cancel = Some(cancel.clone());
        let marshal = self.marshal.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = binding.closed() => {
                    let _ = marshal.send(BridgeMessage::Service(ServiceMessage::ChannelClosed { generation }));
                }
            }
        });
    }
}

impl Drop for ServiceConnector {
    fn drop(&mut self) {
        self.unbind();
    }
}
