//! Guard coverage over the state space.
//!
//! The guards of a chain are kept as written, so two alternatives may admit the same state
//! and some states may be admitted by none. [`coverage`] makes both visible by enumerating
//! every assignment of the model's state variables.

use num_bigint::BigUint;
use thiserror::Error;

use crate::extract::ComponentModel;
use crate::types::{eval_cnf, Branch, Literal};

/// Enumeration is refused above this many state variables.
pub const MAX_STATE_VARIABLES: usize = 24;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CoverageError {
    #[error("too many state variables to enumerate: {count} (limit is {limit})")]
    TooManyVariables { count: usize, limit: usize },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Coverage {
    /// Number of assignments of the state variables.
    pub total: BigUint,
    /// Assignments admitted by each branch guard, in branch order.
    pub per_branch: Vec<BigUint>,
    /// Assignments admitted by no guard.
    pub uncovered: BigUint,
    /// Assignments admitted by more than one guard.
    pub overlapping: BigUint,
    /// The first uncovered assignment, if any.
    pub uncovered_witness: Option<Vec<Literal>>,
}

/// An assignment of `names`, encoded as the bits of `mask` (bit `i` is `names[i]`).
#[derive(Debug, Copy, Clone)]
pub struct State<'a> {
    names: &'a [String],
    mask: u32,
}

impl<'a> State<'a> {
    pub fn new(names: &'a [String], mask: u32) -> Self {
        Self { names, mask }
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn value(&self, name: &str) -> Option<bool> {
        self.index_of(name).map(|i| self.mask & (1 << i) != 0)
    }

    /// Whether this state is admitted by the guard of `branch`.
    pub fn admitted_by(&self, branch: &Branch) -> bool {
        eval_cnf(&branch.conditions, |name| self.value(name))
    }

    pub fn literals(&self) -> Vec<Literal> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| Literal::new(name.clone(), self.mask & (1 << i) != 0))
            .collect()
    }
}

/// Iterates all states over `names`, failing when there are too many to enumerate.
pub fn all_states(names: &[String]) -> Result<impl Iterator<Item = State<'_>>, CoverageError> {
    if names.len() > MAX_STATE_VARIABLES {
        return Err(CoverageError::TooManyVariables {
            count: names.len(),
            limit: MAX_STATE_VARIABLES,
        });
    }
    Ok((0..1u32 << names.len()).map(move |mask| State::new(names, mask)))
}

pub fn coverage(model: &ComponentModel) -> Result<Coverage, CoverageError> {
    let names = &model.state_variables;
    let mut per_branch = vec![0u64; model.branches.len()];
    let mut uncovered = 0u64;
    let mut overlapping = 0u64;
    let mut uncovered_witness = None;

    for state in all_states(names)? {
        let mut admitted = 0;
        for (i, branch) in model.branches.iter().enumerate() {
            if state.admitted_by(branch) {
                per_branch[i] += 1;
                admitted += 1;
            }
        }
        match admitted {
            0 => {
                uncovered += 1;
                if uncovered_witness.is_none() {
                    uncovered_witness = Some(state.literals());
                }
            }
            1 => {}
            _ => overlapping += 1,
        }
    }

    let two = BigUint::from(2u32);
    let coverage = Coverage {
        total: two.pow(names.len() as u32),
        per_branch: per_branch.into_iter().map(BigUint::from).collect(),
        uncovered: BigUint::from(uncovered),
        overlapping: BigUint::from(overlapping),
        uncovered_witness,
    };
    log::debug!(
        "Coverage: total={}, uncovered={}, overlapping={}",
        coverage.total,
        coverage.uncovered,
        coverage.overlapping
    );
    Ok(coverage)
}

impl Coverage {
    /// Fraction of states admitted by at least one guard.
    pub fn covered_ratio(&self) -> f64 {
        // Enumerable state spaces fit in a single digit.
        let small = |n: &BigUint| n.to_u64_digits().first().copied().unwrap_or(0);
        let covered = &self.total - &self.uncovered;
        small(&covered) as f64 / small(&self.total).max(1) as f64
    }

    pub fn is_exhaustive(&self) -> bool {
        self.uncovered == BigUint::ZERO
    }
}
