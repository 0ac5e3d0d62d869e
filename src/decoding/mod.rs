//! Joint decoding pipeline: score table -> 0/1 program -> solve ->
//! role assignment.

mod emit;
mod encoder;
mod error;
mod linear;
mod output;
mod solve;

pub use emit::emit_lp;
pub use error::{DecodeError, SolverError};
pub use linear::{Constraint, Ilp, LinearExpr, Sense, VarId};
pub use output::decision_line;
pub use solve::{BranchBound, MilpSolver, SolveOutcome};

use std::collections::BTreeMap;

use tracing::debug;

use crate::relations::FrameRelations;
use crate::score::{DecoderConfig, ScoreTable};
use crate::{Candidate, GoldAssignment, PredicateInstance, Span};

/// Final slot -> span mapping for one predicate instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    roles: BTreeMap<String, Span>,
    joint: bool,
}

impl RoleAssignment {
    /// Slots in lexicographic order with their chosen spans, null spans
    /// included.
    pub fn roles(&self) -> impl Iterator<Item = (&str, Span)> {
        self.roles.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn get(&self, slot: &str) -> Option<Span> {
        self.roles.get(slot).copied()
    }

    /// Slots filled with a non-null span.
    pub fn filled(&self) -> impl Iterator<Item = (&str, Span)> {
        self.roles().filter(|(_, s)| !s.is_null())
    }

    /// Whether the joint program ran for this instance.
    pub fn is_joint(&self) -> bool {
        self.joint
    }

    pub(crate) fn insert(&mut self, slot: String, span: Span) {
        self.roles.insert(slot, span);
    }

    pub(crate) fn mark_joint(&mut self) {
        self.joint = true;
    }
}

/// Joint decoder over one MILP engine.
///
/// Holds only read-only configuration; every decode call builds, solves
/// and drops its own model, so independent predicate instances can run
/// on independent decoders in parallel.
#[derive(Debug, Clone)]
pub struct JointDecoder<S = BranchBound> {
    relations: FrameRelations,
    config: DecoderConfig,
    solver: S,
}

impl JointDecoder<BranchBound> {
    pub fn new(relations: FrameRelations, config: DecoderConfig) -> Self {
        Self::with_solver(relations, config, BranchBound)
    }
}

impl<S: MilpSolver> JointDecoder<S> {
    pub fn with_solver(relations: FrameRelations, config: DecoderConfig, solver: S) -> Self {
        JointDecoder {
            relations,
            config,
            solver,
        }
    }

    /// Decode one predicate instance into its optimal role assignment.
    pub fn decode(&mut self, inst: &PredicateInstance) -> Result<RoleAssignment, DecodeError> {
        self.run(inst, None)
    }

    /// Cost-augmented decode against a gold assignment: every
    /// gold-mismatching candidate gains a margin of 1.0 in the objective,
    /// yielding the most-violating assignment for structured-margin
    /// training. Output format is identical to [`JointDecoder::decode`].
    pub fn decode_cost_augmented(
        &mut self,
        inst: &PredicateInstance,
        gold: &GoldAssignment,
    ) -> Result<RoleAssignment, DecodeError> {
        self.run(inst, Some(gold))
    }

    fn run(
        &mut self,
        inst: &PredicateInstance,
        gold: Option<&GoldAssignment>,
    ) -> Result<RoleAssignment, DecodeError> {
        let table = ScoreTable::from_instance(inst, &self.config);
        let mut assignment = RoleAssignment::default();
        for slot in table.resolved_null() {
            assignment.insert(slot.clone(), Span::NULL);
        }
        if table.is_empty() {
            return Ok(assignment);
        }

        let (ilp, arena) = encoder::encode(&table, &inst.frame, &self.relations, gold)?;
        debug!(
            frame = %inst.frame,
            vars = ilp.num_vars(),
            constraints = ilp.constraints.len(),
            "assembled joint program"
        );
        let values = match self.solver.maximize(&ilp)? {
            SolveOutcome::Optimal { values, objective } => {
                debug!(frame = %inst.frame, objective, "solve optimal");
                values
            }
            SolveOutcome::Infeasible => {
                return Err(DecodeError::Infeasible {
                    frame: inst.frame.clone(),
                })
            }
        };
        if values.len() != ilp.num_vars() {
            return Err(DecodeError::ColumnCountMismatch {
                expected: ilp.num_vars(),
                actual: values.len(),
            });
        }

        let slot_cands: Vec<(&str, &[Candidate])> = table.slots().collect();
        for (slot, range) in arena.slots() {
            let mut chosen: Option<Span> = None;
            let mut selected = 0usize;
            for i in range {
                if values[i] > 0.5 {
                    selected += 1;
                    let (si, ci) = arena.locate(VarId(i));
                    chosen = Some(slot_cands[si].1[ci].span);
                }
            }
            match (selected, chosen) {
                (1, Some(span)) => assignment.insert(slot.to_string(), span),
                _ => {
                    return Err(DecodeError::SelectionFault {
                        slot: slot.to_string(),
                        selected,
                    })
                }
            }
        }
        assignment.mark_joint();
        Ok(assignment)
    }
}
