use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Integer-valued float selecting one of the loop regions of a looped event.
pub const LOOP_INDEX_PARAM: &str = "loop-index";
/// 0 while playing, 1 to request a fade-out followed by a natural stop.
pub const END_FADE_PARAM: &str = "end-fade";
/// 0/1, requests the backend to finish the current loop region and stop.
pub const END_SECTION_PARAM: &str = "end-section";

/// Which parameters an event responds to.
///
/// Authored events fall into one of these three shapes; anything the registry
/// does not know about is assumed to be a plain [`ControlScheme::SimpleFade`]
/// one-shot. Adding a fourth scheme is a compile-checked change: every match
/// on this type is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum ControlScheme {
    /// One parameter, `end-fade`.
    SimpleFade,
    /// `loop-index` plus `end-section`.
    LoopedWithSectionEnd { max_loops: u32 },
    /// `loop-index` plus `end-fade`.
    LoopedWithFadeEnd { max_loops: u32 },
}

impl ControlScheme {
    /// Number of loop regions; 0 for non-looped events.
    pub fn max_loops(self) -> u32 {
        match self {
            ControlScheme::SimpleFade => 0,
            ControlScheme::LoopedWithSectionEnd { max_loops }
            | ControlScheme::LoopedWithFadeEnd { max_loops } => max_loops,
        }
    }

    pub fn is_looped(self) -> bool {
        !matches!(self, ControlScheme::SimpleFade)
    }

    /// Name of the parameter that asks the backend to wind the event down.
    pub fn end_parameter(self) -> &'static str {
        match self {
            ControlScheme::SimpleFade | ControlScheme::LoopedWithFadeEnd { .. } => END_FADE_PARAM,
            ControlScheme::LoopedWithSectionEnd { .. } => END_SECTION_PARAM,
        }
    }

    /// Clamps a requested loop region into the valid range.
    pub fn clamp_loop(self, index: u32) -> u32 {
        match self.max_loops() {
            0 => 0,
            max => index.min(max - 1),
        }
    }
}

/// Maps the authored loop-region letters to indices.
///
/// The soundtrack labels its regions `a`..`d`; unknown names are rejected by
/// the caller with a warning.
pub fn loop_index_for_name(name: &str) -> Option<u32> {
    match name.trim().to_ascii_lowercase().as_str() {
        "a" => Some(0),
        "b" => Some(1),
        "c" => Some(2),
        "d" => Some(3),
        _ => None,
    }
}

/// Event id → control scheme, fixed at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRegistry {
    entries: HashMap<String, ControlScheme>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event_id: impl Into<String>, scheme: ControlScheme) {
        self.entries.insert(event_id.into(), scheme);
    }

    /// Builder-style [`EventRegistry::insert`].
    pub fn with(mut self, event_id: impl Into<String>, scheme: ControlScheme) -> Self {
        self.insert(event_id, scheme);
        self
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ControlScheme)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (event_id, scheme) in entries {
            registry.insert(event_id, scheme);
        }
        registry
    }

    /// Scheme for an event id. Unregistered ids get
    /// [`ControlScheme::SimpleFade`]; unregistered events are assumed to be
    /// one-shots.
    pub fn config_for(&self, event_id: &str) -> ControlScheme {
        self.entries
            .get(event_id)
            .copied()
            .unwrap_or(ControlScheme::SimpleFade)
    }
}
