//! # pbt-model: solver-ready state models of UI components
//!
//! **`pbt-model`** reads the source of a stateful UI component that renders different output
//! depending on boolean state variables, and builds the formal model needed to check
//! property assertions of the form *"whenever C holds, P must hold"* over every reachable
//! state of the component.
//!
//! ## What is extracted?
//!
//! Every alternative of a top-level `if` / `else if` / `else` chain becomes a **branch**:
//!
//! - its guard, as a formula in conjunctive normal form over the state variables;
//! - one literal per declared assertion, telling whether the branch's rendered output
//!   satisfies the observable property (contains a text, carries a label, ...);
//! - the **transitions** reachable by interacting with that output: for each state variable
//!   whose setter is invoked there, the values it may take afterwards.
//!
//! The model and each assertion are then packaged into one [`SolverRequest`][crate::request::SolverRequest]
//! per assertion, with the asserted property negated so that the solver looks for a
//! counterexample.
//!
//! ## Basic Usage
//!
//! ```rust
//! use pbt_model::assertion::RawAssertion;
//! use pbt_model::extract::Extractor;
//! use pbt_model::types::Literal;
//!
//! let source = r#"
//!     const [isLoading, setIsLoading] = useState(true);
//!     if (isLoading) {
//!         return (
//!             <div>
//!                 <span>Loading...</span>
//!                 <button onClick={() => setIsLoading(false)}>Stop</button>
//!             </div>
//!         );
//!     } else {
//!         return <p>Done</p>;
//!     }
//! "#;
//! let assertions: Vec<RawAssertion> = serde_json::from_str(r#"[{
//!     "name": "hasLoadingText",
//!     "textToFind": "Loading...",
//!     "lhs": [[{"name": "isLoading", "assignment": true}]],
//!     "rhs": [[{"name": "hasLoadingText", "assignment": true}]]
//! }]"#).unwrap();
//!
//! let extraction = Extractor::default().extract_source(source, &assertions).unwrap();
//! let request = &extraction.requests[0];
//!
//! assert_eq!(request.state_variables, vec!["isLoading"]);
//! assert_eq!(request.branches.len(), 2);
//! assert_eq!(request.branches[0].transitions[0].assignments, vec![false]);
//! assert_eq!(request.pbt_assertion.cnf, vec![vec![Literal::neg("hasLoadingText")]]);
//! ```
//!
//! ## Core Components
//!
//! - **[`extract`]**: the pipeline, from source text to solver requests.
//! - **[`syntax`]**: a tolerant tokenizer and the structural queries the pipeline needs.
//! - **[`cnf`]**, **[`walker`]**, **[`detect`]**, **[`transition`]**: the model extractor.
//! - **[`validate`]**, **[`request`]**: categorized validation and request assembly.
//! - **[`solver`]**: the HTTP solver client and concurrent dispatch.
//! - **[`coverage`]**, **[`dot`]**: guard coverage counts and the branch transition graph.

pub mod alias;
pub mod assertion;
pub mod cnf;
pub mod config;
pub mod coverage;
pub mod detect;
pub mod dot;
pub mod extract;
pub mod request;
pub mod solver;
pub mod syntax;
pub mod transition;
pub mod types;
pub mod validate;
pub mod walker;
