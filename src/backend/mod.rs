//! The seam between the controller and the real-time audio engine.
//!
//! Everything the controller needs from the backend is behind
//! [`AudioBackend`]: resolve an event path to a descriptor, build a playback
//! instance from it, and drive that instance with start/stop/parameter calls.
//! Production builds implement this over the engine's C API; tests and
//! headless runs use scripted or [`NullBackend`] implementations.

mod null;

pub use null::NullBackend;

/// Any error surfaced by the backend adapter itself.
///
/// The controller never propagates these; during startup they are treated as
/// "bank not loaded yet" and retried, elsewhere they are logged and dropped.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct AdapterError(pub String);

/// Outcome of looking up an event descriptor by path.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// The path names nothing the backend currently knows about. Usually a
    /// bank that has not finished loading, sometimes a typo.
    #[error("event not found")]
    NotFound,

    /// The backend failed outright (not initialized, device lost, ...).
    #[error(transparent)]
    Backend(#[from] AdapterError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Starting,
    Stopped,
    /// The handle no longer refers to a live instance.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    Immediate,
    /// Let reverb/delay tails ring out.
    AllowTail,
}

/// Adapter over the external event-audio engine.
///
/// Instances are exclusively owned by whoever holds them and must be passed
/// back to [`AudioBackend::release`] to free engine resources; dropping one
/// on the floor leaks.
pub trait AudioBackend {
    type Descriptor: 'static;
    type Instance: 'static;

    fn resolve_event(&self, path: &str) -> Result<Self::Descriptor, ResolveError>;
    fn instantiate(&self, descriptor: &Self::Descriptor) -> Result<Self::Instance, AdapterError>;
    fn start(&self, instance: &Self::Instance) -> Result<(), AdapterError>;
    fn stop(&self, instance: &Self::Instance, mode: StopMode) -> Result<(), AdapterError>;
    fn release(&self, instance: Self::Instance);
    fn set_parameter(
        &self,
        instance: &Self::Instance,
        name: &str,
        value: f32,
    ) -> Result<(), AdapterError>;
    fn get_parameter(&self, instance: &Self::Instance, name: &str) -> Result<f32, AdapterError>;
    fn playback_state(&self, instance: &Self::Instance) -> PlaybackState;
    fn set_volume(&self, instance: &Self::Instance, value: f32) -> Result<(), AdapterError>;
}
