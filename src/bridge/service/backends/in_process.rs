use crate::bridge::errors::ConnectError;
use crate::bridge::service::backend::{ServiceBackend, ServiceBinding, ServiceTarget};
use crate::bridge::service::channels::ServiceChannels;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::task::AbortOnDropHandle;

type HostFn = dyn Fn(ServiceTarget, ServiceChannels) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// Runs the content service as a task on the bridge's own runtime.
///
/// The host receives duplicates of the connection descriptors and serves them
/// until it returns; its return counts as the service going away. Dropping the
/// binding aborts the host task, which closes its descriptors. This is the
/// backend for platforms where the content process is a thread of the host.
pub struct InProcessBackend {
    host: Arc<HostFn>,
}

impl InProcessBackend {
    pub fn new<F, Fut>(host: F) -> Self
    where
        F: Fn(ServiceTarget, ServiceChannels) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            host: Arc::new(move |target, channels| host(target, channels).boxed()),
        }
    }
}

impl ServiceBackend for InProcessBackend {
    fn name(&self) -> &str {
        "in-process"
    }

    fn bind(
        &self,
        target: &ServiceTarget,
        channels: &ServiceChannels,
    ) -> BoxFuture<'static, Result<ServiceBinding, ConnectError>> {
        let remote = match channels.try_clone() {
            Ok(remote) => remote,
            Err(e) => return futures::future::ready(Err(ConnectError::Io(e))).boxed(),
        };
        let host = self.host.clone();
        let target = target.clone();

        async move {
            let name = target.name.clone();
            let task = AbortOnDropHandle::new(tokio::spawn(host(target, remote)));

            Ok(ServiceBinding::new(async move {
                match task.await {
                    Ok(Ok(())) => log::info!("Service '{}' exited", name),
                    Ok(Err(e)) => log::error!("Service '{}' failed: {}", name, e),
                    Err(e) if e.is_cancelled() => log::debug!("Service '{}' stopped", name),
                    Err(e) => log::error!("Service '{}' task failed: {}", name, e),
                }
            }))
        }
        .boxed()
    }
}
