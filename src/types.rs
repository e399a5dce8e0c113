//! Core value types shared by the extractor and the solver request.
//!
//! A [`Cnf`] is a plain `Vec<Clause>` and a [`Clause`] is a plain `Vec<Literal>`, so that the
//! serialized form is exactly the nested-array shape the solver consumes:
//!
//! ```text
//! [[{"name": "isLoading", "assignment": true}], [{"name": "a", "assignment": false}, ...]]
//! ```
//!
//! An empty formula means "true" (no constraint). An empty clause is unsatisfiable by
//! construction and is only ever produced as an extraction fallback.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named boolean variable together with a required polarity.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub name: String,
    pub assignment: bool,
}

impl Literal {
    pub fn new(name: impl Into<String>, assignment: bool) -> Self {
        Literal {
            name: name.into(),
            assignment,
        }
    }

    pub fn pos(name: impl Into<String>) -> Self {
        Literal::new(name, true)
    }

    pub fn neg(name: impl Into<String>) -> Self {
        Literal::new(name, false)
    }

    /// Returns the same variable with the opposite polarity.
    pub fn negated(&self) -> Self {
        Literal::new(self.name.clone(), !self.assignment)
    }

    /// Checks whether the literal holds under `value` for its variable.
    pub fn holds(&self, value: bool) -> bool {
        self.assignment == value
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.assignment {
            write!(f, "{}", self.name)
        } else {
            write!(f, "!{}", self.name)
        }
    }
}

/// Disjunction of literals.
pub type Clause = Vec<Literal>;

/// Conjunction of clauses.
pub type Cnf = Vec<Clause>;

/// Renders a CNF formula as `(a | !b) & (c)`; the empty formula renders as `true`.
pub fn cnf_to_string(cnf: &[Clause]) -> String {
    if cnf.is_empty() {
        return "true".to_string();
    }
    cnf.iter()
        .map(|clause| {
            let lits: Vec<String> = clause.iter().map(|lit| lit.to_string()).collect();
            format!("({})", lits.join(" | "))
        })
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Evaluates a CNF formula under a total assignment given as a lookup function.
///
/// Variables the lookup does not know are treated as `false`.
pub fn eval_cnf<F>(cnf: &[Clause], lookup: F) -> bool
where
    F: Fn(&str) -> Option<bool>,
{
    cnf.iter()
        .all(|clause| clause.iter().any(|lit| lit.holds(lookup(&lit.name).unwrap_or(false))))
}

/// The set of values a state variable may take after interacting with a branch.
///
/// # Invariants
///
/// - `assignments` holds at most two entries and never repeats a value.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub name: String,
    pub assignments: Vec<bool>,
}

impl Transition {
    pub fn new(name: impl Into<String>) -> Self {
        Transition {
            name: name.into(),
            assignments: Vec::new(),
        }
    }

    /// Records `value`, ignoring it when already present.
    pub fn add(&mut self, value: bool) {
        if !self.assignments.contains(&value) {
            self.assignments.push(value);
        }
    }

    /// Records both values (the over-approximating case).
    pub fn add_both(&mut self) {
        self.add(true);
        self.add(false);
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// One guarded alternative of a conditional-rendering chain.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Guard under which the branch is active.
    pub conditions: Cnf,
    /// One literal per declared assertion: does the rendered output satisfy it?
    pub implications: Vec<Literal>,
    /// May-transitions reachable by interacting with the rendered output.
    pub transitions: Vec<Transition>,
}
