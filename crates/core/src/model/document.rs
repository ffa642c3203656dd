use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned revision counter of a persisted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Adopt `other` only when it is not older; versions never move back.
    pub fn advance_to(&mut self, other: Version) {
        if other > *self {
            *self = other;
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Staleness indicator shown next to an editable document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Saved,
    Unsaved,
    Saving,
    Failed,
}

impl SaveStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Saved => "Saved",
            SaveStatus::Unsaved => "Unsaved changes",
            SaveStatus::Saving => "Saving",
            SaveStatus::Failed => "Save failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_never_regresses() {
        let mut version = Version::new(4);
        version.advance_to(Version::new(2));
        assert_eq!(version, Version::new(4));
        version.advance_to(Version::new(5));
        assert_eq!(version.value(), 5);
    }
}
