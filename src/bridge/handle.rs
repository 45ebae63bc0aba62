use crate::bridge::native::RawInstance;
use uuid::Uuid;

/// Identifies one native instance for the lifetime of the process.
///
/// Callbacks raised by a native instance carry this id, so that anything
/// arriving after the instance was disposed can be recognized and dropped.
/// Treat it as an opaque value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live native instance: the bridge-side id plus the engine's own token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NativeInstanceHandle {
    pub id: InstanceId,
    pub(crate) raw: RawInstance,
}

impl NativeInstanceHandle {
    pub fn raw(&self) -> RawInstance {
        self.raw
    }
}

/// Lifecycle of the native instance owned by a [`NativeBridge`](crate::bridge::NativeBridge).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum HandleState {
    /// Nothing has been allocated yet
    #[default]
    Unallocated,
    /// Instance is alive and accepts commands
    Live(NativeInstanceHandle),
    /// Instance has been released. A new one may be created.
    Disposed,
}

impl HandleState {
    pub fn live(&self) -> Option<&NativeInstanceHandle> {
        match self {
            HandleState::Live(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, HandleState::Live(_))
    }
}
