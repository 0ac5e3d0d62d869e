//! Candidate score table: softmax normalization of raw feature-weight
//! sums into per-slot log-probability distributions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Candidate, PredicateInstance, Span};

/// Decoding policy knobs, read-only for the lifetime of a decoder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Drop a slot from the joint program when its top-ranked candidate is
    /// the null span, resolving it to null independently. Shrinks the
    /// program without changing any other slot's feasible outcomes.
    pub ignore_null_spans: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            ignore_null_spans: true,
        }
    }
}

/// Per-slot candidates with softmax-normalized log-probabilities.
///
/// Slots iterate in lexicographic order; within a slot candidates are
/// sorted by descending log-probability, ties keeping input order.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    slots: BTreeMap<String, Vec<Candidate>>,
    resolved_null: Vec<String>,
}

impl ScoreTable {
    /// Normalize an instance's raw weights into the table. Slots with no
    /// candidates are not entered; under the null-drop policy, slots whose
    /// best candidate is null are recorded in [`ScoreTable::resolved_null`]
    /// instead.
    pub fn from_instance(inst: &PredicateInstance, config: &DecoderConfig) -> Self {
        let mut slots = BTreeMap::new();
        let mut resolved_null = Vec::new();
        for slot in &inst.slots {
            if slot.candidates.is_empty() {
                continue;
            }
            let cands = softmax(&slot.candidates);
            for c in &cands {
                trace!(slot = %slot.name, span = %c.span, log_prob = c.log_prob, "candidate");
            }
            if config.ignore_null_spans && cands[0].span.is_null() {
                debug!(slot = %slot.name, "best candidate is null, resolving outside the joint program");
                resolved_null.push(slot.name.clone());
                continue;
            }
            slots.insert(slot.name.clone(), cands);
        }
        ScoreTable {
            slots,
            resolved_null,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Slots in lexicographic order with their ranked candidates.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &[Candidate])> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn get(&self, slot: &str) -> Option<&[Candidate]> {
        self.slots.get(slot).map(|v| v.as_slice())
    }

    /// Slots the null-drop policy resolved to null without joint decoding.
    pub fn resolved_null(&self) -> &[String] {
        &self.resolved_null
    }
}

/// `log_prob_j = w_j - ln Z`, `Z = sum(exp(w))`, computed against the
/// maximum weight so large sums do not overflow.
fn softmax(raw: &[(Span, f64)]) -> Vec<Candidate> {
    let max = raw.iter().map(|&(_, w)| w).fold(f64::NEG_INFINITY, f64::max);
    let z: f64 = raw.iter().map(|&(_, w)| (w - max).exp()).sum();
    let log_z = z.ln() + max;
    let mut cands: Vec<Candidate> = raw
        .iter()
        .map(|&(span, w)| Candidate {
            span,
            log_prob: w - log_z,
        })
        .collect();
    // stable sort: equal scores keep original candidate order
    cands.sort_by(|a, b| b.log_prob.total_cmp(&a.log_prob));
    cands
}
