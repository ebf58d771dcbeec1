use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MusicError;
use crate::settings::SoundtrackSide;

/// One event id per soundtrack side; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    #[serde(default)]
    pub side_a: Option<String>,
    #[serde(default)]
    pub side_b: Option<String>,
}

impl ThemeEntry {
    pub fn new(side_a: impl Into<String>, side_b: impl Into<String>) -> Self {
        Self {
            side_a: filled(side_a.into()),
            side_b: filled(side_b.into()),
        }
    }

    pub fn side_a_only(event_id: impl Into<String>) -> Self {
        Self {
            side_a: filled(event_id.into()),
            side_b: None,
        }
    }

    pub fn side_b_only(event_id: impl Into<String>) -> Self {
        Self {
            side_a: None,
            side_b: filled(event_id.into()),
        }
    }

    fn for_side(&self, side: SoundtrackSide) -> Option<&str> {
        let event = match side {
            SoundtrackSide::A => self.side_a.as_deref(),
            SoundtrackSide::B => self.side_b.as_deref(),
        };
        event.filter(|e| !e.is_empty())
    }
}

// Authored tables sometimes carry "" instead of omitting a side.
fn filled(event_id: String) -> Option<String> {
    if event_id.is_empty() { None } else { Some(event_id) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTheme {
    pub event_id: String,
    /// True when the requested side was absent and the other side was used.
    pub fallback: bool,
}

/// Theme name → per-side event ids, fixed at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeRegistry {
    entries: HashMap<String, ThemeEntry>,
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: ThemeEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Builder-style [`ThemeRegistry::insert`].
    pub fn with(mut self, name: impl Into<String>, entry: ThemeEntry) -> Self {
        self.insert(name, entry);
        self
    }

    /// Registers another name for an existing theme.
    pub fn alias(&mut self, alias: impl Into<String>, existing: &str) {
        match self.entries.get(existing).cloned() {
            Some(entry) => {
                self.entries.insert(alias.into(), entry);
            }
            None => {
                tracing::warn!(alias = %alias.into(), existing, "alias target not registered, skipping");
            }
        }
    }

    /// Resolves a theme to the event id for the requested side, falling back
    /// to the other side when the requested one is absent.
    pub fn resolve(&self, name: &str, side: SoundtrackSide) -> Result<ResolvedTheme, MusicError> {
        let entry = self.entries.get(name).ok_or_else(|| MusicError::UnknownTheme {
            name: name.to_owned(),
        })?;
        if let Some(event_id) = entry.for_side(side) {
            return Ok(ResolvedTheme {
                event_id: event_id.to_owned(),
                fallback: false,
            });
        }
        if let Some(event_id) = entry.for_side(side.other()) {
            return Ok(ResolvedTheme {
                event_id: event_id.to_owned(),
                fallback: true,
            });
        }
        // Registered but empty on both sides.
        Err(MusicError::UnknownTheme {
            name: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ThemeRegistry {
        ThemeRegistry::new()
            .with("Main", ThemeEntry::new("Music/MainA", "Music/MainB"))
            .with("Caves", ThemeEntry::side_b_only("Music/CavesB"))
            .with("Empty", ThemeEntry::default())
    }

    #[test]
    fn resolves_requested_side() {
        let resolved = registry().resolve("Main", SoundtrackSide::B).expect("resolve");
        assert_eq!(resolved.event_id, "Music/MainB");
        assert!(!resolved.fallback);
    }

    #[test]
    fn missing_side_falls_back() {
        let resolved = registry().resolve("Caves", SoundtrackSide::A).expect("resolve");
        assert_eq!(resolved.event_id, "Music/CavesB");
        assert!(resolved.fallback);
    }

    #[test]
    fn unknown_and_empty_themes_fail() {
        assert!(matches!(
            registry().resolve("Nope", SoundtrackSide::A),
            Err(MusicError::UnknownTheme { .. })
        ));
        assert!(matches!(
            registry().resolve("Empty", SoundtrackSide::A),
            Err(MusicError::UnknownTheme { .. })
        ));
    }

    #[test]
    fn alias_resolves_to_same_pair() {
        let mut registry = registry();
        registry.alias("MainMenu", "Main");
        let resolved = registry
            .resolve("MainMenu", SoundtrackSide::A)
            .expect("resolve");
        assert_eq!(resolved.event_id, "Music/MainA");
    }

    #[test]
    fn empty_string_side_counts_as_absent() {
        let registry = ThemeRegistry::new().with("Duel", ThemeEntry::new("", "Music/DuelB"));
        let resolved = registry.resolve("Duel", SoundtrackSide::A).expect("resolve");
        assert_eq!(resolved.event_id, "Music/DuelB");
        assert!(resolved.fallback);
    }
}
