//! Extraction settings.

use crate::detect::DEFAULT_MARKER_ATTRIBUTES;

/// Configuration of an [`Extractor`][crate::extract::Extractor].
///
/// # Examples
///
/// ```
/// use pbt_model::config::ExtractConfig;
///
/// let config = ExtractConfig::default()
///     .with_stateful(false)
///     .with_state_constructor("useToggle");
/// assert!(!config.stateful);
/// assert_eq!(config.state_constructors, vec!["useState", "useToggle"]);
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExtractConfig {
    /// Keep inferred transitions in the solver requests (default: true).
    pub stateful: bool,
    /// Names of the calls that declare a state variable (default: `useState`).
    pub state_constructors: Vec<String>,
    /// Attributes the label detector treats as identification markers.
    pub marker_attributes: Vec<String>,
    /// Conjoin each alternative of a chain with the negation of the earlier guards
    /// (default: false, guards are kept as written).
    pub exclusive_chains: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            stateful: true,
            state_constructors: vec!["useState".to_string()],
            marker_attributes: DEFAULT_MARKER_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            exclusive_chains: false,
        }
    }
}

impl ExtractConfig {
    pub fn with_stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    pub fn with_exclusive_chains(mut self, exclusive: bool) -> Self {
        self.exclusive_chains = exclusive;
        self
    }

    /// Adds another state constructor name, keeping the existing ones.
    pub fn with_state_constructor(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.state_constructors.contains(&name) {
            self.state_constructors.push(name);
        }
        self
    }

    /// Replaces the marker attribute list.
    pub fn with_marker_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.marker_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}
