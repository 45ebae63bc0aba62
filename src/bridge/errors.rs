use crate::bridge::service::ConnectionState;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Native instance initialization failed: {0}")]
    Initialization(String),

    #[error("Service connection already in progress (state: {state:?})")]
    AlreadyBinding { state: ConnectionState },

    #[error("Service channel lost: {0}")]
    Disconnected(String),

    #[error("Command '{operation}' issued without a live native instance")]
    StaleHandle { operation: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::bridge::config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by the native rendering layer.
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    #[error("Allocation of native instance failed: {0}")]
    AllocationFailed(String),

    #[error("Native layer unavailable")]
    Unavailable,
}

/// Failures while binding to an out-of-process service.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("I/O error while binding: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service '{service}' refused the binding")]
    Refused { service: String },

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Binding was cancelled")]
    Cancelled,
}
