//! The extraction pipeline.
//!
//! [`Extractor`] turns component source plus raw assertions into a [`ComponentModel`] and
//! one [`SolverRequest`] per assertion:
//!
//! 1. parse the source into a [`SourceTree`];
//! 2. build the setter aliases and the transition miner over the whole source;
//! 3. walk every top-level chain into branches, probing each assertion's detector;
//! 4. collect the state variables and validate the assertions against them;
//! 5. assemble the requests.
//!
//! The extractor holds only immutable configuration and its detector registry, so one
//! instance can serve concurrent extractions on different inputs.
//!
//! # Examples
//!
//! ```
//! use pbt_model::assertion::RawAssertion;
//! use pbt_model::extract::Extractor;
//!
//! let source = r#"
//!     const [isLoading, setIsLoading] = useState(true);
//!     if (isLoading) {
//!         return <span>Loading...</span>;
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
//! assert_eq!(extraction.model.branches.len(), 2);
//! assert_eq!(extraction.requests.len(), 1);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alias::extract_setter_aliases;
use crate::assertion::{Assertion, RawAssertion};
use crate::config::ExtractConfig;
use crate::detect::DetectorRegistry;
use crate::request::{assemble, SolverRequest};
use crate::syntax::SourceTree;
use crate::transition::TransitionMiner;
use crate::types::Branch;
use crate::validate::{validate, ErrorType, ModelError};
use crate::walker::{collect_state_variables, ChainWalker, Probe};

/// The symbolic model of one component.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComponentModel {
    pub state_variables: Vec<String>,
    pub pbt_variables: Vec<String>,
    pub branches: Vec<Branch>,
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Extraction {
    pub model: ComponentModel,
    pub requests: Vec<SolverRequest>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot read component source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ModelError>),
}

impl ExtractError {
    /// The failure as categorized errors; a source failure is a single GENERAL error.
    pub fn model_errors(&self) -> Vec<ModelError> {
        match self {
            ExtractError::Source { .. } => vec![ModelError::new(ErrorType::General, self.to_string())],
            ExtractError::Invalid(errors) => errors.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Extractor {
    config: ExtractConfig,
    registry: DetectorRegistry,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        let registry = DetectorRegistry::with_markers(&config.marker_attributes);
        Self { config, registry }
    }

    /// Uses `registry` instead of the default text and label detectors.
    pub fn with_registry(config: ExtractConfig, registry: DetectorRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn extract_file(&self, path: impl AsRef<Path>, assertions: &[RawAssertion]) -> Result<Extraction, ExtractError> {
        let path = path.as_ref();
        log::info!("Reading component from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Source {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_source(&text, assertions)
    }

    /// State variables and branches of `text`, before the assertions are validated.
    pub fn walk(&self, text: &str, assertions: &[RawAssertion]) -> (Vec<String>, Vec<Branch>) {
        let tree = SourceTree::parse(text);
        let aliases = extract_setter_aliases(&tree, &self.config.state_constructors);
        log::debug!("Found {} setter aliases", aliases.len());
        let miner = TransitionMiner::new(&tree, &aliases);
        log::debug!("Found {} named handlers", miner.num_handlers());

        let probes: Vec<Probe> = assertions.iter().map(Probe::from).collect();
        let branches = ChainWalker::new(&tree, &self.registry, &miner, &probes)
            .exclusive(self.config.exclusive_chains)
            .walk_all();

        let targets: Vec<&str> = aliases
            .iter()
            .map(|(_, variable)| variable)
            .filter(|variable| {
                branches
                    .iter()
                    .any(|b| b.transitions.iter().any(|t| t.name == *variable))
            })
            .collect();
        let state_variables = collect_state_variables(&branches, targets);
        (state_variables, branches)
    }

    pub fn extract_source(&self, text: &str, assertions: &[RawAssertion]) -> Result<Extraction, ExtractError> {
        let (state_variables, branches) = self.walk(text, assertions);
        log::info!(
            "Extracted {} branches over {} state variables",
            branches.len(),
            state_variables.len()
        );

        let assertions = validate(assertions, &state_variables).map_err(|errors| {
            log::info!("Validation failed with {} error(s)", errors.len());
            ExtractError::Invalid(errors)
        })?;

        let model = ComponentModel {
            pbt_variables: assertions.iter().map(|a| a.name.clone()).collect(),
            state_variables,
            branches,
            assertions,
        };
        let requests = assemble(&model, self.config.stateful);
        log::info!("Assembled {} solver request(s)", requests.len());

        Ok(Extraction { model, requests })
    }
}
