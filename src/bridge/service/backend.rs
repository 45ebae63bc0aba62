use crate::bridge::errors::ConnectError;
use crate::bridge::service::channels::ServiceChannels;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use std::fmt::{Debug, Display};
use std::future::Future;

/// Abstract identity of the service to bind to. Backends decide what the name
/// maps to (a socket path, a process, a task).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceTarget {
    pub name: String,
}

impl ServiceTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Display for ServiceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A successful bind. Holds a future that resolves once the remote side is gone
/// (channel closed, process died). Dropping the binding releases whatever the
/// backend keeps for the connection.
pub struct ServiceBinding {
    closed: BoxFuture<'static, ()>,
}

impl Debug for ServiceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBinding").finish_non_exhaustive()
    }
}

impl ServiceBinding {
    pub fn new<F>(closed: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self { closed: closed.boxed() }
    }

    /// A binding without liveness information; it is never reported as closed.
    pub fn detached() -> Self {
        Self::new(future::pending())
    }

    /// Resolves when the remote side went away.
    pub async fn closed(self) {
        self.closed.await
    }
}

/// Transport that can hand two descriptors to an out-of-process service.
///
/// `bind` is called on the surface's owning thread and must not block; the
/// returned future runs on the async runtime. The channels stay owned by the
/// caller: a backend that needs them past the call must duplicate them.
pub trait ServiceBackend: Send + Sync {
    fn name(&self) -> &str;

    fn bind(
        &self,
        target: &ServiceTarget,
        channels: &ServiceChannels,
    ) -> BoxFuture<'static, Result<ServiceBinding, ConnectError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn binding_resolves_with_its_future() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let binding = ServiceBinding::new(async move {
            let _ = rx.await;
        });

        let closed = tokio::spawn(binding.closed());
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), closed).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn detached_binding_never_closes() {
        let binding = ServiceBinding::detached();
        let res = tokio::time::timeout(Duration::from_millis(20), binding.closed()).await;
        assert!(res.is_err());
    }

    #[test]
    fn target_display() {
        assert_eq!(ServiceTarget::new("WebContent").to_string(), "WebContent");
    }
}
