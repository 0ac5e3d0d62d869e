//! Frame-indexed logical relations between slots.
//!
//! "Requires" ties two slots' fill status together (both filled or both
//! null); "excludes" forbids filling both. Relations are advisory given
//! the observed candidates: a pair naming a slot absent from an
//! instance's table is skipped, never an error.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One ordered pair of slot names.
pub type SlotPair = (String, String);

/// Requires/excludes pairs keyed by frame name. Loaded once per process
/// and treated as immutable for the run; safe to share across decoders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameRelations {
    #[serde(default)]
    requires: HashMap<String, BTreeSet<SlotPair>>,
    #[serde(default)]
    excludes: HashMap<String, BTreeSet<SlotPair>>,
}

impl FrameRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from the JSON configuration format:
    /// `{"requires": {"Frame": [["A","B"]]}, "excludes": {...}}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn add_requires(&mut self, frame: &str, a: &str, b: &str) {
        self.requires
            .entry(frame.to_string())
            .or_default()
            .insert((a.to_string(), b.to_string()));
    }

    pub fn add_excludes(&mut self, frame: &str, a: &str, b: &str) {
        self.excludes
            .entry(frame.to_string())
            .or_default()
            .insert((a.to_string(), b.to_string()));
    }

    /// Requires pairs for a frame, in deterministic order; empty when the
    /// frame has none.
    pub fn requires_for(&self, frame: &str) -> impl Iterator<Item = &SlotPair> {
        self.requires.get(frame).into_iter().flatten()
    }

    /// Excludes pairs for a frame, in deterministic order.
    pub fn excludes_for(&self, frame: &str) -> impl Iterator<Item = &SlotPair> {
        self.excludes.get(frame).into_iter().flatten()
    }
}
