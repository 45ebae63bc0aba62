//! Descriptor handoff over a Unix domain socket.
//!
//! The client connects to the service's listening socket and sends one
//! message: a newline terminated JSON handshake with both connection
//! descriptors attached. The service answers with a single byte, `1` to accept
//! and `0` to refuse. After that the control stream stays open for as long as
//! the service keeps the connection; EOF on it means the service went away.

use crate::bridge::errors::ConnectError;
use crate::bridge::service::backend::{ServiceBackend, ServiceBinding, ServiceTarget};
use crate::bridge::service::channels::{recv_fds, send_fds, ServiceChannels};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt, Interest};
use tokio::net::{UnixListener, UnixStream};

const ACK_ACCEPT: u8 = 1;
const ACK_REFUSE: u8 = 0;

/// Upper bound for the handshake line.
const MAX_HANDSHAKE_LEN: usize = 4096;

#[derive(Debug, Serialize, Deserialize)]
struct Handshake {
    service: String,
}

/// Binds by handing the descriptors to a service listening on `socket_path`.
#[derive(Debug, Clone)]
pub struct UnixSocketBackend {
    socket_path: PathBuf,
}

impl UnixSocketBackend {
    pub fn new<P: Into<PathBuf>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl ServiceBackend for UnixSocketBackend {
    fn name(&self) -> &str {
        "unix-socket"
    }

    fn bind(
        &self,
        target: &ServiceTarget,
        channels: &ServiceChannels,
    ) -> BoxFuture<'static, Result<ServiceBinding, ConnectError>> {
        // Descriptors are sent from a task, so it needs its own copies.
        let handoff = match channels.try_clone() {
            Ok(c) => c,
            Err(e) => return futures::future::ready(Err(ConnectError::Io(e))).boxed(),
        };
        let path = self.socket_path.clone();
        let service = target.name.clone();

        async move {
            let mut stream = UnixStream::connect(&path).await?;
            log::debug!("Connected to {} for service '{}'", path.display(), service);

            let mut payload = serde_json::to_vec(&Handshake { service: service.clone() })
                .map_err(|e| ConnectError::Handshake(e.to_string()))?;
            payload.push(b'\n');

            let sent = loop {
                stream.writable().await?;
                let res = stream.try_io(Interest::WRITABLE, || {
                    send_fds(
                        stream.as_fd(),
                        &payload,
                        &[handoff.command_fd(), handoff.fd_passing_fd()],
                    )
                });
                match res {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            if sent < payload.len() {
                stream.write_all(&payload[sent..]).await?;
            }
            // The kernel holds references now.
            drop(handoff);

            let mut ack = [0u8; 1];
            match stream.read(&mut ack).await? {
                0 => {
                    return Err(ConnectError::Handshake(
                        "connection closed before acknowledgement".into(),
                    ))
                }
                _ if ack[0] == ACK_ACCEPT => {}
                _ => return Err(ConnectError::Refused { service }),
            }

            log::info!("Service '{}' accepted the connection", service);
            Ok(ServiceBinding::new(async move {
                let mut buf = [0u8; 64];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(_) => continue,
                        Err(e) => {
                            log::warn!("Control stream of '{}' failed: {}", service, e);
                            break;
                        }
                    }
                }
            }))
        }
        .boxed()
    }
}

/// Service side of [`UnixSocketBackend`].
pub struct ServiceListener {
    listener: UnixListener,
    path: PathBuf,
}

impl ServiceListener {
    /// Listen on `path`. Must be called from within a tokio runtime.
    pub fn bind<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let listener = UnixListener::bind(&path)?;
        log::info!("Service listening on {}", path.display());
        Ok(Self { listener, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next bind request and read its handshake.
    pub async fn accept(&self) -> io::Result<BindRequest> {
        let (control, _) = self.listener.accept().await?;

        let mut line = Vec::new();
        let mut fds: Vec<OwnedFd> = Vec::new();
        let mut buf = [0u8; 512];

        while !line.contains(&b'\n') {
            control.readable().await?;
            let res = control.try_io(Interest::READABLE, || recv_fds(control.as_fd(), &mut buf));
            let (n, received) = match res {
                Ok(r) => r,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "client hung up during handshake"));
            }
            line.extend_from_slice(&buf[..n]);
            fds.extend(received);
            if line.len() > MAX_HANDSHAKE_LEN {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "handshake too long"));
            }
        }

        let end = line.iter().position(|b| *b == b'\n').unwrap_or(line.len());
        let handshake: Handshake = serde_json::from_slice(&line[..end])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if fds.len() != 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected 2 descriptors, got {}", fds.len()),
            ));
        }
        let fd_passing = fds.pop();
        let command = fds.pop();
        let (Some(command), Some(fd_passing)) = (command, fd_passing) else {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "missing descriptors"));
        };

        log::debug!("Bind request for service '{}'", handshake.service);
        Ok(BindRequest {
            service: handshake.service,
            channels: ServiceChannels::new(command, fd_passing),
            control,
        })
    }
}

impl Drop for ServiceListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// A pending bind. Dropping it without answering counts as a failed handshake
/// on the client side.
#[derive(Debug)]
pub struct BindRequest {
    pub service: String,
    channels: ServiceChannels,
    control: UnixStream,
}

impl BindRequest {
    /// Acknowledge and take the connection descriptors.
    pub async fn accept(mut self) -> io::Result<(ServiceChannels, ServiceSession)> {
        self.control.write_all(&[ACK_ACCEPT]).await?;
        Ok((self.channels, ServiceSession { control: self.control }))
    }

    /// Decline. The descriptors are closed.
    pub async fn refuse(mut self) -> io::Result<()> {
        self.control.write_all(&[ACK_REFUSE]).await
    }
}

/// An accepted connection. The client sees the service as gone once this drops.
#[derive(Debug)]
pub struct ServiceSession {
    control: UnixStream,
}

impl ServiceSession {
    /// Resolves when the client closed its end.
    pub async fn closed(mut self) {
        let mut buf = [0u8; 64];
        while let Ok(n) = self.control.read(&mut buf).await {
            if n == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::test_utils::init_logging;
    use std::time::Duration;

    fn stream(fd: OwnedFd) -> UnixStream {
        let inner = std::os::unix::net::UnixStream::from(fd);
        inner.set_nonblocking(true).unwrap();
        UnixStream::from_std(inner).unwrap()
    }

    #[tokio::test]
    async fn handoff_reaches_service() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.sock");
        let listener = ServiceListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let req = listener.accept().await.unwrap();
            assert_eq!(req.service, "WebContent");
            let (channels, session) = req.accept().await.unwrap();
            let mut cmd = stream(channels.command);
            cmd.write_all(b"ready").await.unwrap();
            session
        });

        let backend = UnixSocketBackend::new(&path);
        let (local, remote) = ServiceChannels::socket_pairs().unwrap();
        let binding = backend.bind(&ServiceTarget::new("WebContent"), &remote).await.unwrap();
        drop(remote);

        let mut cmd = stream(local.command);
        let mut buf = [0u8; 5];
        cmd.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ready");

        // Service drops its session: the binding reports closure.
        let session = server.await.unwrap();
        drop(session);
        tokio::time::timeout(Duration::from_secs(1), binding.closed()).await.unwrap();
    }

    #[tokio::test]
    async fn refusal_is_reported() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.sock");
        let listener = ServiceListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let req = listener.accept().await.unwrap();
            req.refuse().await.unwrap();
        });

        let backend = UnixSocketBackend::new(&path);
        let (_local, remote) = ServiceChannels::socket_pairs().unwrap();
        let err = backend.bind(&ServiceTarget::new("Other"), &remote).await.unwrap_err();
        assert!(matches!(err, ConnectError::Refused { service } if service == "Other"));
    }

    #[tokio::test]
    async fn missing_socket_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = UnixSocketBackend::new(dir.path().join("nobody.sock"));
        let (_local, remote) = ServiceChannels::socket_pairs().unwrap();
        let err = backend.bind(&ServiceTarget::new("x"), &remote).await.unwrap_err();
        assert!(matches!(err, ConnectError::Io(_)));
    }

    #[tokio::test]
    async fn session_sees_client_hangup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.sock");
        let listener = ServiceListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let req = listener.accept().await.unwrap();
            let (_channels, session) = req.accept().await.unwrap();
            session.closed().await;
        });

        let backend = UnixSocketBackend::new(&path);
        let (_local, remote) = ServiceChannels::socket_pairs().unwrap();
        let binding = backend.bind(&ServiceTarget::new("x"), &remote).await.unwrap();
        drop(binding);

        tokio::time::timeout(Duration::from_secs(1), server).await.unwrap().unwrap();
    }
}
