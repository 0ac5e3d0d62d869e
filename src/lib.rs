//! Joint decoding of predicate-frame role assignments.
//!
//! Given, per semantic-role slot, a set of candidate token spans scored by
//! a linear model, find the single globally optimal one-candidate-per-slot
//! assignment subject to hard structural constraints: selected spans may
//! not overlap, and frame-scoped "requires"/"excludes" relations tie the
//! fill status of slot pairs together. The problem is reduced to a 0/1
//! integer linear program and handed to a [`decoding::MilpSolver`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod decoding;
pub mod relations;
pub mod score;

pub use decoding::{
    decision_line, BranchBound, DecodeError, JointDecoder, MilpSolver, RoleAssignment,
    SolveOutcome, SolverError,
};
pub use relations::FrameRelations;
pub use score::{DecoderConfig, ScoreTable};

/// Inclusive token-offset span. [`Span::NULL`] marks an unrealized role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: i32,
    pub end: i32,
}

impl Span {
    /// The sentinel "role not realized" span.
    pub const NULL: Span = Span { start: -1, end: -1 };

    pub fn new(start: i32, end: i32) -> Self {
        Span { start, end }
    }

    pub fn is_null(&self) -> bool {
        self.start == -1 && self.end == -1
    }

    /// Token positions covered by this span; empty for the null span.
    pub fn positions(&self) -> impl Iterator<Item = i32> {
        if self.is_null() {
            0..=-1
        } else {
            self.start..=self.end
        }
    }

    /// Two non-null spans overlap when they share a token position.
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.start, self.end)
    }
}

/// One scored candidate for a slot, carrying a softmax-normalized
/// log-probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub span: Span,
    pub log_prob: f64,
}

/// Caller-facing input for one slot: the role name and the raw
/// feature-weight sum per candidate span, straight from the scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCandidates {
    pub name: String,
    pub candidates: Vec<(Span, f64)>,
}

/// One predicate occurrence: the active frame plus its candidate slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateInstance {
    pub frame: String,
    pub slots: Vec<SlotCandidates>,
}

/// Gold span per slot, supplied for cost-augmented (training-time)
/// decoding.
pub type GoldAssignment = BTreeMap<String, Span>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_span() {
        assert!(Span::NULL.is_null());
        assert!(!Span::new(0, 0).is_null());
        assert_eq!(Span::NULL.positions().count(), 0);
    }

    #[test]
    fn test_positions() {
        let p: Vec<i32> = Span::new(2, 4).positions().collect();
        assert_eq!(p, vec![2, 3, 4]);
        assert_eq!(Span::new(3, 3).positions().count(), 1);
    }

    #[test]
    fn test_overlaps() {
        assert!(Span::new(1, 3).overlaps(&Span::new(3, 5)));
        assert!(Span::new(2, 4).overlaps(&Span::new(0, 9)));
        assert!(!Span::new(1, 2).overlaps(&Span::new(3, 4)));
        assert!(!Span::NULL.overlaps(&Span::new(0, 9)));
        assert!(!Span::new(0, 9).overlaps(&Span::NULL));
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(2, 5).to_string(), "2_5");
        assert_eq!(Span::NULL.to_string(), "-1_-1");
    }
}
