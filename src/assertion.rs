//! User-declared assertions.
//!
//! On the wire an assertion is a loosely-shaped record; which detector it uses is decided by
//! which optional field is present:
//!
//! ```json
//! { "name": "hasLoadingText", "textToFind": "Loading...",
//!   "lhs": [[{"name": "isLoading", "assignment": true}]],
//!   "rhs": [[{"name": "hasLoadingText", "assignment": true}]] }
//! ```
//!
//! Such a record is read as a [`RawAssertion`] (formulas still untyped JSON, so that
//! structural problems can be reported rather than rejected by the deserializer) and turned
//! into a typed [`Assertion`] by the validator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Cnf;

/// Name reserved in preconditions for "no precondition".
pub const UNCONDITIONAL: &str = "default";

/// How an assertion decides whether a branch's rendered output satisfies it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Detector {
    /// The rendered output contains this literal text.
    #[serde(rename_all = "camelCase")]
    Text { text_to_find: String },
    /// The rendered output carries an identification marker with this value.
    #[serde(rename_all = "camelCase")]
    Label { label_to_find: String },
    /// No detector field was given.
    Unspecified,
}

impl Detector {
    pub fn kind(&self) -> &'static str {
        match self {
            Detector::Text { .. } => "text",
            Detector::Label { .. } => "label",
            Detector::Unspecified => "unspecified",
        }
    }
}

/// A validated assertion: `lhs` implies the named property, as encoded by `rhs`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub name: String,
    pub detector: Detector,
    pub lhs: Cnf,
    pub rhs: Cnf,
}

impl Assertion {
    pub fn text(name: impl Into<String>, text_to_find: impl Into<String>, lhs: Cnf, rhs: Cnf) -> Self {
        Assertion {
            name: name.into(),
            detector: Detector::Text {
                text_to_find: text_to_find.into(),
            },
            lhs,
            rhs,
        }
    }

    pub fn label(name: impl Into<String>, label_to_find: impl Into<String>, lhs: Cnf, rhs: Cnf) -> Self {
        Assertion {
            name: name.into(),
            detector: Detector::Label {
                label_to_find: label_to_find.into(),
            },
            lhs,
            rhs,
        }
    }
}

/// An assertion as received, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssertion {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_to_find: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_to_find: Option<String>,
    #[serde(default)]
    pub lhs: Value,
    #[serde(default)]
    pub rhs: Value,
}

impl RawAssertion {
    /// The detector selected by the fields present; text wins when both are given.
    pub fn detector(&self) -> Detector {
        if let Some(text) = &self.text_to_find {
            Detector::Text {
                text_to_find: text.clone(),
            }
        } else if let Some(label) = &self.label_to_find {
            Detector::Label {
                label_to_find: label.clone(),
            }
        } else {
            Detector::Unspecified
        }
    }
}

impl From<&Assertion> for RawAssertion {
    fn from(assertion: &Assertion) -> Self {
        let (text_to_find, label_to_find) = match &assertion.detector {
            Detector::Text { text_to_find } => (Some(text_to_find.clone()), None),
            Detector::Label { label_to_find } => (None, Some(label_to_find.clone())),
            Detector::Unspecified => (None, None),
        };
        RawAssertion {
            name: assertion.name.clone(),
            text_to_find,
            label_to_find,
            lhs: serde_json::to_value(&assertion.lhs).unwrap_or(Value::Null),
            rhs: serde_json::to_value(&assertion.rhs).unwrap_or(Value::Null),
        }
    }
}

/// The assertion file accepted by the command-line tool: either a bare list of assertions,
/// or the request object `{filepath, useStatefulTesting, textAssertions}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AssertionFile {
    List(Vec<RawAssertion>),
    #[serde(rename_all = "camelCase")]
    Request {
        #[serde(default)]
        filepath: Option<String>,
        #[serde(default)]
        use_stateful_testing: Option<bool>,
        text_assertions: Vec<RawAssertion>,
    },
}

impl AssertionFile {
    pub fn assertions(&self) -> &[RawAssertion] {
        match self {
            AssertionFile::List(list) => list,
            AssertionFile::Request { text_assertions, .. } => text_assertions,
        }
    }
}
