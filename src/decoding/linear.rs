//! Linear-program model containers: sparse expressions, constraints and
//! the assembled 0/1 program.

use std::collections::BTreeMap;

/// Flat index of one binary indicator variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

/// Sparse linear expression over indicator variables. Term order is
/// deterministic (ascending variable index).
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
}

impl LinearExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_var(v: VarId, c: f64) -> Self {
        let mut e = Self::zero();
        e.add_term(v, c);
        e
    }

    pub fn add_term(&mut self, v: VarId, c: f64) {
        *self.terms.entry(v).or_insert(0.0) += c;
    }

    pub fn coeff(&self, v: VarId) -> f64 {
        self.terms.get(&v).copied().unwrap_or(0.0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Constraint sense for `expr (sense) rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// One named linear constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// A 0/1 integer linear program: maximize `objective` subject to
/// `constraints`, every variable binary. Built fresh per decoding call
/// and dropped with it; nothing is shared between instances.
#[derive(Debug, Clone, Default)]
pub struct Ilp {
    pub objective: LinearExpr,
    pub constraints: Vec<Constraint>,
    var_names: Vec<String>,
}

impl Ilp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new binary variable; ids are dense and allocation-ordered.
    pub fn add_var(&mut self, name: String) -> VarId {
        let id = VarId(self.var_names.len());
        self.var_names.push(name);
        id
    }

    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    pub fn var_name(&self, v: VarId) -> &str {
        &self.var_names[v.0]
    }
}
