//! Music-control error taxonomy.
//!
//! Nothing here crosses the public controller surface as an `Err`: background
//! music is an enhancement, so every failure collapses to a logged warning
//! plus no-op, or to "no music playing". The types exist so the internal
//! paths can use `Result` + `?` and so logs carry structure.

use crate::backend::AdapterError;

#[derive(Debug, thiserror::Error)]
pub enum MusicError {
    /// The theme name has no registry entry (or both sides are empty).
    #[error("unknown theme: {name}")]
    UnknownTheme { name: String },

    /// The event path did not resolve; the bank likely has not loaded yet.
    #[error("asset not ready: {path}")]
    AssetNotReady { path: String },

    /// The start retry budget was exhausted; playback never began.
    #[error("start failed after {attempts} attempts: {path}")]
    StartFailed { path: String, attempts: u32 },

    /// A control that does not apply right now (loop change on a non-looped
    /// event, parameter set with nothing playing, ...).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The backend adapter itself failed.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

impl MusicError {
    /// Whether the start protocol should retry after this error.
    ///
    /// Adapter failures retry exactly like not-yet-loaded assets: both are
    /// symptomatic of a backend that has not finished initializing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MusicError::AssetNotReady { .. } | MusicError::Adapter(_)
        )
    }
}
