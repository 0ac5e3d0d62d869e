//! Solver adapter: the minimal mixed-integer surface the decoder depends
//! on, plus an exact built-in reference solver.

use super::error::SolverError;
use super::linear::{Ilp, Sense};

/// Result of one maximization.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Optimal 0/1 assignment, one value per model variable in index
    /// order.
    Optimal { values: Vec<f64>, objective: f64 },
    /// The constraint system admits no assignment.
    Infeasible,
}

/// Minimal surface a mixed-integer solver must provide: maximize a
/// linear objective over binary variables under linear
/// equality/inequality constraints. The model is borrowed per call and
/// implementations must not carry state from one model into the next.
pub trait MilpSolver {
    fn maximize(&mut self, model: &Ilp) -> Result<SolveOutcome, SolverError>;
}

/// Exact reference solver: depth-first 0/1 search with interval-based
/// constraint pruning and an optimistic bound on the remaining
/// objective.
///
/// Deterministic: variables branch in index order, 1 before 0, and only
/// a strictly better objective replaces the incumbent. Worst case
/// exponential, but fast on the small per-predicate programs this crate
/// builds; plug an external engine through [`MilpSolver`] (or export via
/// [`super::emit_lp`]) for anything bigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchBound;

impl MilpSolver for BranchBound {
    fn maximize(&mut self, model: &Ilp) -> Result<SolveOutcome, SolverError> {
        Ok(Search::new(model).run())
    }
}

const EPS: f64 = 1e-9;

struct Search<'a> {
    model: &'a Ilp,
    obj: Vec<f64>,
    /// var -> (constraint index, coefficient)
    cols: Vec<Vec<(usize, f64)>>,
    /// lhs over assigned vars, per constraint
    acc: Vec<f64>,
    /// lowest / highest lhs delta still reachable over unassigned vars
    lo: Vec<f64>,
    hi: Vec<f64>,
    /// optimistic objective still available from var i onward
    opt_tail: Vec<f64>,
    assign: Vec<f64>,
    current: f64,
    best: Option<(f64, Vec<f64>)>,
}

impl<'a> Search<'a> {
    fn new(model: &'a Ilp) -> Self {
        let n = model.num_vars();
        let m = model.constraints.len();
        let mut obj = vec![0.0; n];
        for (v, c) in model.objective.terms() {
            obj[v.0] = c;
        }
        let mut cols: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut lo = vec![0.0; m];
        let mut hi = vec![0.0; m];
        for (ci, cst) in model.constraints.iter().enumerate() {
            for (v, c) in cst.expr.terms() {
                cols[v.0].push((ci, c));
                if c > 0.0 {
                    hi[ci] += c;
                } else {
                    lo[ci] += c;
                }
            }
        }
        let mut opt_tail = vec![0.0; n + 1];
        for i in (0..n).rev() {
            opt_tail[i] = opt_tail[i + 1] + obj[i].max(0.0);
        }
        Search {
            model,
            obj,
            cols,
            acc: vec![0.0; m],
            lo,
            hi,
            opt_tail,
            assign: vec![0.0; n],
            current: 0.0,
            best: None,
        }
    }

    fn run(mut self) -> SolveOutcome {
        self.dfs(0);
        match self.best {
            Some((objective, values)) => SolveOutcome::Optimal { values, objective },
            None => SolveOutcome::Infeasible,
        }
    }

    fn dfs(&mut self, i: usize) {
        if !self.interval_feasible() {
            return;
        }
        if let Some((incumbent, _)) = &self.best {
            if self.current + self.opt_tail[i] <= *incumbent + EPS {
                return;
            }
        }
        if i == self.model.num_vars() {
            self.best = Some((self.current, self.assign.clone()));
            return;
        }
        for val in [1.0, 0.0] {
            self.set(i, val);
            self.dfs(i + 1);
            self.unset(i, val);
        }
    }

    /// A constraint is still satisfiable iff its rhs lies within the lhs
    /// interval reachable from the current partial assignment. With all
    /// variables assigned the interval collapses and this is an exact
    /// check.
    fn interval_feasible(&self) -> bool {
        for (ci, cst) in self.model.constraints.iter().enumerate() {
            let min = self.acc[ci] + self.lo[ci];
            let max = self.acc[ci] + self.hi[ci];
            let ok = match cst.sense {
                Sense::Le => min <= cst.rhs + EPS,
                Sense::Ge => max >= cst.rhs - EPS,
                Sense::Eq => min <= cst.rhs + EPS && max >= cst.rhs - EPS,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    fn set(&mut self, i: usize, val: f64) {
        self.assign[i] = val;
        self.current += val * self.obj[i];
        for &(ci, c) in &self.cols[i] {
            self.acc[ci] += val * c;
            if c > 0.0 {
                self.hi[ci] -= c;
            } else {
                self.lo[ci] -= c;
            }
        }
    }

    fn unset(&mut self, i: usize, val: f64) {
        self.assign[i] = 0.0;
        self.current -= val * self.obj[i];
        for &(ci, c) in &self.cols[i] {
            self.acc[ci] -= val * c;
            if c > 0.0 {
                self.hi[ci] += c;
            } else {
                self.lo[ci] += c;
            }
        }
    }
}
