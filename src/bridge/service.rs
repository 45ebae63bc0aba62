//! Connection to the out-of-process content service.

pub mod backend;
pub mod channels;
pub mod connector;

pub mod backends {
    pub mod in_process;
    pub mod unix;
}

pub use backend::{ServiceBackend, ServiceBinding, ServiceTarget};
pub use channels::{recv_fds, send_fds, ServiceChannels};
pub use connector::{ConnectionEvent, ConnectionState, ServiceConnection, ServiceConnector, ServiceMessage};
