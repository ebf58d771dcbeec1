//! Adaptive background-music controller for event-based audio backends.
//!
//! The controller owns at most one live playback instance at a time and
//! reconciles the logical "currently intended theme" with a backend whose
//! asset banks load asynchronously: starts retry while banks are still
//! loading, stops fade out and release in the background, and the user's
//! A/B soundtrack side preference restarts the active theme in place.
//!
//! Suspending work (start retries, stop polls, volume subscriptions) runs on
//! `tokio::task::spawn_local`, so a [`MusicController`] must live inside a
//! [`tokio::task::LocalSet`] on a current-thread runtime.

pub mod backend;
pub mod controller;
pub mod error;
pub mod logging;
pub mod registry;
pub mod settings;

pub use backend::{AudioBackend, NullBackend, PlaybackState, StopMode};
pub use controller::MusicController;
pub use error::MusicError;
pub use registry::{ControlScheme, EventRegistry, ThemeEntry, ThemeRegistry};
pub use settings::{PrefStore, SoundtrackSide};
