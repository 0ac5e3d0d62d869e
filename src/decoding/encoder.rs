//! Reduction of a score table plus frame relations into a 0/1 program.
//!
//! One binary indicator per (slot, candidate) pair, flattened into a
//! single index space; four constraint families: per-slot uniqueness,
//! per-position non-overlap, requires, excludes. Variable ordering is
//! stable (slots lexicographic, candidates in table order) so identical
//! inputs produce identical models.

use std::collections::BTreeMap;
use std::ops::Range;

use tracing::{debug, trace};

use super::error::DecodeError;
use super::linear::{Constraint, Ilp, LinearExpr, Sense, VarId};
use crate::relations::FrameRelations;
use crate::score::ScoreTable;
use crate::GoldAssignment;

/// Bidirectional mapping between flat variable indices and (slot,
/// candidate) positions in the score table. One arena per decoding call.
#[derive(Debug)]
pub(crate) struct VarArena {
    slot_names: Vec<String>,
    ranges: Vec<Range<usize>>,
    back: Vec<(usize, usize)>,
}

impl VarArena {
    /// Slots in encoding order with their contiguous variable ranges.
    pub(crate) fn slots(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.slot_names
            .iter()
            .zip(self.ranges.iter())
            .map(|(n, r)| (n.as_str(), r.clone()))
    }

    /// Map a flat variable index back to (slot index, candidate index).
    pub(crate) fn locate(&self, v: VarId) -> (usize, usize) {
        self.back[v.0]
    }

    pub(crate) fn slot_range(&self, slot: &str) -> Option<Range<usize>> {
        self.slot_names
            .iter()
            .position(|n| n == slot)
            .map(|i| self.ranges[i].clone())
    }

    pub(crate) fn num_vars(&self) -> usize {
        self.back.len()
    }
}

/// Assemble the program for one predicate instance. With `gold` present,
/// a Hamming cost (1 per gold-mismatching candidate) is added to the
/// objective coefficients for margin-based training.
pub(crate) fn encode(
    table: &ScoreTable,
    frame: &str,
    relations: &FrameRelations,
    gold: Option<&GoldAssignment>,
) -> Result<(Ilp, VarArena), DecodeError> {
    // every gold slot must be present in the table; anything else means
    // the contract with the scoring collaborator is broken
    if let Some(gold) = gold {
        for slot in gold.keys() {
            if table.get(slot).is_none() {
                return Err(DecodeError::GoldSlotMissing {
                    slot: slot.clone(),
                    frame: frame.to_string(),
                });
            }
        }
    }

    let mut ilp = Ilp::new();
    let mut arena = VarArena {
        slot_names: Vec::new(),
        ranges: Vec::new(),
        back: Vec::new(),
    };

    // variables and objective
    for (si, (slot, cands)) in table.slots().enumerate() {
        let start = ilp.num_vars();
        let gold_span = gold.and_then(|g| g.get(slot).copied());
        for (ci, cand) in cands.iter().enumerate() {
            let v = ilp.add_var(format!("{}__{}", slot, ci));
            let mut coeff = cand.log_prob;
            if let Some(gs) = gold_span {
                if cand.span != gs {
                    coeff += 1.0;
                }
            }
            ilp.objective.add_term(v, coeff);
            arena.back.push((si, ci));
        }
        arena.slot_names.push(slot.to_string());
        arena.ranges.push(start..ilp.num_vars());
    }

    // uniqueness: each slot selects exactly one candidate (null included)
    for (slot, range) in arena.slots() {
        let mut expr = LinearExpr::zero();
        for i in range {
            expr.add_term(VarId(i), 1.0);
        }
        ilp.constraints.push(Constraint {
            name: format!("one__{}", slot),
            expr,
            sense: Sense::Eq,
            rhs: 1.0,
        });
    }

    // position coverage index over all non-null candidates
    let mut coverage: BTreeMap<i32, Vec<VarId>> = BTreeMap::new();
    for ((_, cands), (_, range)) in table.slots().zip(arena.slots()) {
        for (ci, cand) in cands.iter().enumerate() {
            for pos in cand.span.positions() {
                coverage.entry(pos).or_default().push(VarId(range.start + ci));
            }
        }
    }
    // overlap: each covered position is claimed by at most one selection
    for (pos, vars) in &coverage {
        let mut expr = LinearExpr::zero();
        for &v in vars {
            expr.add_term(v, 1.0);
        }
        ilp.constraints.push(Constraint {
            name: format!("pos__{}", pos),
            expr,
            sense: Sense::Le,
            rhs: 1.0,
        });
    }

    // requires: fill status of both slots must match
    for (a, b) in relations.requires_for(frame) {
        let Some((nn_a, null_a)) = split_slot(table, &arena, a) else {
            trace!(frame, a = %a, b = %b, "requires pair references absent slot, skipping");
            continue;
        };
        let Some((nn_b, null_b)) = split_slot(table, &arena, b) else {
            trace!(frame, a = %a, b = %b, "requires pair references absent slot, skipping");
            continue;
        };
        debug!(frame, a = %a, b = %b, "requires pair active");
        let mut expr = LinearExpr::zero();
        for v in nn_a {
            expr.add_term(v, 1.0);
        }
        for v in nn_b {
            expr.add_term(v, -1.0);
        }
        ilp.constraints.push(Constraint {
            name: format!("req__{}__{}", a, b),
            expr,
            sense: Sense::Eq,
            rhs: 0.0,
        });
        // null indicators must match too; skipped when a slot has no null
        // candidate, since there is no variable to reference
        if let (Some(na), Some(nb)) = (null_a, null_b) {
            let mut expr = LinearExpr::from_var(na, 1.0);
            expr.add_term(nb, -1.0);
            ilp.constraints.push(Constraint {
                name: format!("req_null__{}__{}", a, b),
                expr,
                sense: Sense::Eq,
                rhs: 0.0,
            });
        }
    }

    // excludes: at most one of the two slots may be filled
    for (a, b) in relations.excludes_for(frame) {
        let Some((nn_a, _)) = split_slot(table, &arena, a) else {
            trace!(frame, a = %a, b = %b, "excludes pair references absent slot, skipping");
            continue;
        };
        let Some((nn_b, _)) = split_slot(table, &arena, b) else {
            trace!(frame, a = %a, b = %b, "excludes pair references absent slot, skipping");
            continue;
        };
        debug!(frame, a = %a, b = %b, "excludes pair active");
        let mut expr = LinearExpr::zero();
        for v in nn_a.into_iter().chain(nn_b) {
            expr.add_term(v, 1.0);
        }
        ilp.constraints.push(Constraint {
            name: format!("excl__{}__{}", a, b),
            expr,
            sense: Sense::Le,
            rhs: 1.0,
        });
    }

    Ok((ilp, arena))
}

/// Partition a slot's variables into (non-null indicators, null
/// indicator). `None` when the slot is absent from the table.
fn split_slot(
    table: &ScoreTable,
    arena: &VarArena,
    slot: &str,
) -> Option<(Vec<VarId>, Option<VarId>)> {
    let cands = table.get(slot)?;
    let range = arena.slot_range(slot)?;
    let mut non_null = Vec::with_capacity(cands.len());
    let mut null = None;
    for (ci, cand) in cands.iter().enumerate() {
        let v = VarId(range.start + ci);
        if cand.span.is_null() {
            null = Some(v);
        } else {
            non_null.push(v);
        }
    }
    Some((non_null, null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::DecoderConfig;
    use crate::{PredicateInstance, SlotCandidates, Span};

    fn table(slots: Vec<(&str, Vec<(Span, f64)>)>) -> ScoreTable {
        let inst = PredicateInstance {
            frame: "F".into(),
            slots: slots
                .into_iter()
                .map(|(name, candidates)| SlotCandidates {
                    name: name.into(),
                    candidates,
                })
                .collect(),
        };
        let config = DecoderConfig {
            ignore_null_spans: false,
        };
        ScoreTable::from_instance(&inst, &config)
    }

    fn two_slot_table() -> ScoreTable {
        table(vec![
            (
                "Agent",
                vec![(Span::new(0, 1), 1.0), (Span::NULL, 0.0)],
            ),
            (
                "Theme",
                vec![(Span::new(1, 2), 0.5), (Span::NULL, 0.0)],
            ),
        ])
    }

    #[test]
    fn test_variable_layout_is_stable() {
        let t = two_slot_table();
        let rel = FrameRelations::new();
        let (ilp, arena) = encode(&t, "F", &rel, None).unwrap();
        assert_eq!(ilp.num_vars(), 4);
        assert_eq!(ilp.var_name(VarId(0)), "Agent__0");
        assert_eq!(ilp.var_name(VarId(3)), "Theme__1");
        assert_eq!(arena.slot_range("Agent"), Some(0..2));
        assert_eq!(arena.slot_range("Theme"), Some(2..4));
        assert_eq!(arena.locate(VarId(3)), (1, 1));
        assert_eq!(arena.num_vars(), 4);
    }

    #[test]
    fn test_uniqueness_and_overlap_constraints() {
        let t = two_slot_table();
        let rel = FrameRelations::new();
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        let ones: Vec<&Constraint> = ilp
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("one__"))
            .collect();
        assert_eq!(ones.len(), 2);
        assert!(ones.iter().all(|c| c.sense == Sense::Eq && c.rhs == 1.0));
        // positions 0,1,2 covered; position 1 covered by both spans
        let pos: Vec<&Constraint> = ilp
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("pos__"))
            .collect();
        assert_eq!(pos.len(), 3);
        let shared = ilp
            .constraints
            .iter()
            .find(|c| c.name == "pos__1")
            .unwrap();
        assert_eq!(shared.expr.len(), 2);
        assert_eq!(shared.sense, Sense::Le);
    }

    #[test]
    fn test_no_constraint_for_uncovered_position() {
        let t = table(vec![("Agent", vec![(Span::new(5, 5), 1.0), (Span::NULL, 0.0)])]);
        let rel = FrameRelations::new();
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        assert!(ilp.constraints.iter().any(|c| c.name == "pos__5"));
        assert!(!ilp.constraints.iter().any(|c| c.name == "pos__0"));
    }

    #[test]
    fn test_requires_constraints() {
        let t = two_slot_table();
        let mut rel = FrameRelations::new();
        rel.add_requires("F", "Agent", "Theme");
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        let req = ilp
            .constraints
            .iter()
            .find(|c| c.name == "req__Agent__Theme")
            .unwrap();
        assert_eq!(req.sense, Sense::Eq);
        assert_eq!(req.expr.coeff(VarId(0)), 1.0);
        assert_eq!(req.expr.coeff(VarId(2)), -1.0);
        let null = ilp
            .constraints
            .iter()
            .find(|c| c.name == "req_null__Agent__Theme")
            .unwrap();
        assert_eq!(null.expr.coeff(VarId(1)), 1.0);
        assert_eq!(null.expr.coeff(VarId(3)), -1.0);
    }

    #[test]
    fn test_requires_null_equality_skipped_without_null_candidate() {
        let t = table(vec![
            ("Agent", vec![(Span::new(0, 0), 1.0)]),
            ("Theme", vec![(Span::new(2, 2), 0.5), (Span::NULL, 0.0)]),
        ]);
        let mut rel = FrameRelations::new();
        rel.add_requires("F", "Agent", "Theme");
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        assert!(ilp.constraints.iter().any(|c| c.name == "req__Agent__Theme"));
        assert!(!ilp
            .constraints
            .iter()
            .any(|c| c.name.starts_with("req_null__")));
    }

    #[test]
    fn test_relation_with_absent_slot_skipped() {
        let t = two_slot_table();
        let mut rel = FrameRelations::new();
        rel.add_requires("F", "Agent", "Goal");
        rel.add_excludes("F", "Goal", "Theme");
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        assert!(!ilp.constraints.iter().any(|c| c.name.starts_with("req__")));
        assert!(!ilp.constraints.iter().any(|c| c.name.starts_with("excl__")));
    }

    #[test]
    fn test_relation_for_other_frame_ignored() {
        let t = two_slot_table();
        let mut rel = FrameRelations::new();
        rel.add_excludes("OtherFrame", "Agent", "Theme");
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        assert!(!ilp.constraints.iter().any(|c| c.name.starts_with("excl__")));
    }

    #[test]
    fn test_excludes_constraint() {
        let t = two_slot_table();
        let mut rel = FrameRelations::new();
        rel.add_excludes("F", "Agent", "Theme");
        let (ilp, _) = encode(&t, "F", &rel, None).unwrap();
        let excl = ilp
            .constraints
            .iter()
            .find(|c| c.name == "excl__Agent__Theme")
            .unwrap();
        assert_eq!(excl.sense, Sense::Le);
        assert_eq!(excl.rhs, 1.0);
        // only the two non-null indicators participate
        assert_eq!(excl.expr.len(), 2);
        assert_eq!(excl.expr.coeff(VarId(0)), 1.0);
        assert_eq!(excl.expr.coeff(VarId(2)), 1.0);
    }

    #[test]
    fn test_cost_augmentation() {
        let t = table(vec![(
            "Agent",
            vec![(Span::new(0, 0), 1.0), (Span::new(2, 2), 0.5), (Span::NULL, 0.0)],
        )]);
        let rel = FrameRelations::new();
        let mut gold = GoldAssignment::new();
        gold.insert("Agent".into(), Span::new(2, 2));
        let (plain, _) = encode(&t, "F", &rel, None).unwrap();
        let (aug, _) = encode(&t, "F", &rel, Some(&gold)).unwrap();
        // candidates sort (0,0), (2,2), null; gold (2,2) keeps its score,
        // the two mismatches gain exactly 1.0
        for v in 0..3 {
            let delta = aug.objective.coeff(VarId(v)) - plain.objective.coeff(VarId(v));
            let expected = if v == 1 { 0.0 } else { 1.0 };
            assert!((delta - expected).abs() < 1e-9, "var {} delta {}", v, delta);
        }
    }

    #[test]
    fn test_gold_slot_missing_is_fatal() {
        let t = two_slot_table();
        let rel = FrameRelations::new();
        let mut gold = GoldAssignment::new();
        gold.insert("Goal".into(), Span::new(1, 1));
        let err = encode(&t, "F", &rel, Some(&gold)).unwrap_err();
        assert!(matches!(err, DecodeError::GoldSlotMissing { slot, .. } if slot == "Goal"));
    }

    #[test]
    fn test_identical_inputs_identical_model() {
        let t = two_slot_table();
        let mut rel = FrameRelations::new();
        rel.add_requires("F", "Agent", "Theme");
        let (a, _) = encode(&t, "F", &rel, None).unwrap();
        let (b, _) = encode(&t, "F", &rel, None).unwrap();
        assert_eq!(a.num_vars(), b.num_vars());
        assert_eq!(a.constraints.len(), b.constraints.len());
        for (ca, cb) in a.constraints.iter().zip(b.constraints.iter()) {
            assert_eq!(ca.name, cb.name);
            assert_eq!(
                ca.expr.terms().collect::<Vec<_>>(),
                cb.expr.terms().collect::<Vec<_>>()
            );
        }
    }
}
