//! Solver request assembly.

use serde::{Deserialize, Serialize};

use crate::cnf::flip_polarity;
use crate::extract::ComponentModel;
use crate::types::{Branch, Cnf};

/// The property to check, encoded negated: the solver searches for a state satisfying it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PbtAssertion {
    pub name: String,
    pub cnf: Cnf,
}

/// Everything the solver needs to check one assertion over the component.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SolverRequest {
    pub state_variables: Vec<String>,
    pub pbt_variables: Vec<String>,
    pub branches: Vec<Branch>,
    pub preconditionals: Cnf,
    pub pbt_assertion: PbtAssertion,
}

/// One request per assertion of `model`, in assertion order.
///
/// When `stateful` is false every branch is sent without transitions, so the solver only
/// explores the states reachable without user interaction.
pub fn assemble(model: &ComponentModel, stateful: bool) -> Vec<SolverRequest> {
    let branches: Vec<Branch> = if stateful {
        model.branches.clone()
    } else {
        model
            .branches
            .iter()
            .map(|branch| Branch {
                transitions: Vec::new(),
                ..branch.clone()
            })
            .collect()
    };

    model
        .assertions
        .iter()
        .map(|assertion| SolverRequest {
            state_variables: model.state_variables.clone(),
            pbt_variables: model.pbt_variables.clone(),
            branches: branches.clone(),
            preconditionals: assertion.lhs.clone(),
            pbt_assertion: PbtAssertion {
                name: assertion.name.clone(),
                cnf: flip_polarity(&assertion.rhs),
            },
        })
        .collect()
}
