//! The solver collaborator.
//!
//! A solver receives one [`SolverRequest`] and answers whether the asserted property holds
//! in every reachable state. On failure it reports the violated property and a trace of
//! states leading to the violation.
//!
//! [`HttpSolver`] posts requests as JSON to a solving service. [`dispatch_all`] sends a batch
//! concurrently; each request succeeds or fails on its own.

use std::fmt;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::SolverRequest;
use crate::types::Literal;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/solve/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::Failed => write!(f, "failed"),
        }
    }
}

/// The solver's answer to one request.
///
/// A passing answer carries an empty `violated_pbt` and no states.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SolverResponse {
    pub result: Verdict,
    #[serde(default)]
    pub violated_pbt: String,
    /// Trace of states, each a full assignment of the state variables, ending in the
    /// violating state.
    #[serde(default)]
    pub states: Vec<Vec<Literal>>,
}

impl SolverResponse {
    pub fn passed() -> Self {
        SolverResponse {
            result: Verdict::Passed,
            violated_pbt: String::new(),
            states: Vec::new(),
        }
    }

    pub fn failed(violated_pbt: impl Into<String>, states: Vec<Vec<Literal>>) -> Self {
        SolverResponse {
            result: Verdict::Failed,
            violated_pbt: violated_pbt.into(),
            states,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.result == Verdict::Passed
    }
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid solver response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("solver returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("solver worker panicked")]
    Panicked,
}

pub trait Solve: Sync {
    fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, SolverError>;
}

/// A solving service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSolver {
    client: Client,
    endpoint: String,
}

impl HttpSolver {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SolverError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2).min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Solve for HttpSolver {
    fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, SolverError> {
        log::debug!("Posting '{}' to {}", request.pbt_assertion.name, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(SolverError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Solves every request concurrently, one thread per request, results in input order.
pub fn dispatch_all<S: Solve + ?Sized>(solver: &S, requests: &[SolverRequest]) -> Vec<Result<SolverResponse, SolverError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| scope.spawn(move || solver.solve(request)))
            .collect();
        handles
            .into_iter()
            .zip(requests)
            .map(|(handle, request)| {
                let result = handle.join().unwrap_or(Err(SolverError::Panicked));
                match &result {
                    Ok(response) => log::info!("{}: {}", request.pbt_assertion.name, response.result),
                    Err(e) => log::warn!("{}: {}", request.pbt_assertion.name, e),
                }
                result
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    use test_log::test;

    use crate::request::PbtAssertion;

    fn request(name: &str) -> SolverRequest {
        SolverRequest {
            state_variables: vec!["isLoading".to_string()],
            pbt_variables: vec![name.to_string()],
            branches: vec![],
            preconditionals: vec![],
            pbt_assertion: PbtAssertion {
                name: name.to_string(),
                cnf: vec![vec![Literal::neg(name)]],
            },
        }
    }

    struct FakeSolver;

    impl Solve for FakeSolver {
        fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, SolverError> {
            match request.pbt_assertion.name.as_str() {
                "ok" => Ok(SolverResponse::passed()),
                "bad" => Ok(SolverResponse::failed("bad", vec![vec![Literal::pos("isLoading")]])),
                "panic" => panic!("solver crashed"),
                _ => Err(SolverError::Status {
                    status: 500,
                    body: "boom".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_parse_passed() {
        let response: SolverResponse =
            serde_json::from_value(json!({"result": "passed", "states": [], "violated_pbt": ""})).unwrap();
        assert!(response.is_passed());

        let response: SolverResponse = serde_json::from_value(json!({"result": "passed"})).unwrap();
        assert_eq!(response, SolverResponse::passed());
    }

    #[test]
    fn test_parse_failed() {
        let response: SolverResponse = serde_json::from_value(json!({
            "result": "failed",
            "violated_pbt": "hasLoadingText",
            "states": [[{"name": "isLoading", "assignment": true}], [{"name": "isLoading", "assignment": false}]]
        }))
        .unwrap();
        assert!(!response.is_passed());
        assert_eq!(response.violated_pbt, "hasLoadingText");
        assert_eq!(response.states.len(), 2);
        assert_eq!(response.states[1], vec![Literal::neg("isLoading")]);
    }

    #[test]
    fn test_parse_unknown_result() {
        assert!(serde_json::from_value::<SolverResponse>(json!({"result": "maybe"})).is_err());
    }

    #[test]
    fn test_dispatch_isolation() {
        let requests = vec![request("ok"), request("err"), request("bad"), request("panic"), request("ok")];
        let results = dispatch_all(&FakeSolver, &requests);
        assert_eq!(results.len(), 5);
        assert!(results[0].as_ref().unwrap().is_passed());
        assert!(matches!(results[1], Err(SolverError::Status { status: 500, .. })));
        assert_eq!(results[2].as_ref().unwrap().violated_pbt, "bad");
        assert!(matches!(results[3], Err(SolverError::Panicked)));
        assert!(results[4].as_ref().unwrap().is_passed());
    }

    #[test]
    fn test_dispatch_empty() {
        assert!(dispatch_all(&FakeSolver, &[]).is_empty());
    }

    #[test]
    fn test_http_solver_unreachable() {
        let solver = HttpSolver::new("http://127.0.0.1:9/solve/", Duration::from_millis(200)).unwrap();
        assert_eq!(solver.endpoint(), "http://127.0.0.1:9/solve/");
        assert!(matches!(solver.solve(&request("ok")), Err(SolverError::Http(_))));
    }
}
