//! Persisted player preferences.

mod store;

pub use store::{PrefStore, SOUNDTRACK_SIDE_KEY};

/// Which of the two alternate orchestrations of the soundtrack to play.
///
/// Persisted as a single character under [`SOUNDTRACK_SIDE_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundtrackSide {
    #[default]
    A,
    B,
}

impl SoundtrackSide {
    /// Case-insensitive parse; anything but `A`/`B` is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Some(SoundtrackSide::A),
            "B" => Some(SoundtrackSide::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoundtrackSide::A => "A",
            SoundtrackSide::B => "B",
        }
    }

    pub fn other(self) -> Self {
        match self {
            SoundtrackSide::A => SoundtrackSide::B,
            SoundtrackSide::B => SoundtrackSide::A,
        }
    }
}

impl std::fmt::Display for SoundtrackSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(SoundtrackSide::parse("a"), Some(SoundtrackSide::A));
        assert_eq!(SoundtrackSide::parse("B"), Some(SoundtrackSide::B));
        assert_eq!(SoundtrackSide::parse(" b "), Some(SoundtrackSide::B));
        assert_eq!(SoundtrackSide::parse("C"), None);
        assert_eq!(SoundtrackSide::parse(""), None);
    }

    #[test]
    fn other_toggles() {
        assert_eq!(SoundtrackSide::A.other(), SoundtrackSide::B);
        assert_eq!(SoundtrackSide::B.other(), SoundtrackSide::A);
    }
}
