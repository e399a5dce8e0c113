//! Model validation.
//!
//! Every check runs on every assertion and all problems are reported together; a model with
//! any error never reaches request assembly.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertion::{Assertion, RawAssertion, UNCONDITIONAL};
use crate::types::{Clause, Cnf, Literal};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// A precondition names something that is not a state variable.
    StateVariable,
    /// The encoded property names something other than the assertion.
    AssertionFormat,
    /// A formula is not an array of arrays of literals.
    CnfFormat,
    General,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorType::StateVariable => "STATE_VARIABLE",
            ErrorType::AssertionFormat => "ASSERTION_FORMAT",
            ErrorType::CnfFormat => "CNF_FORMAT",
            ErrorType::General => "GENERAL",
        };
        f.write_str(s)
    }
}

/// One categorized problem with the extracted model or its assertions.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion_name: Option<String>,
    pub error_type: ErrorType,
}

impl ModelError {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        ModelError {
            message: message.into(),
            assertion_name: None,
            error_type,
        }
    }

    pub fn for_assertion(error_type: ErrorType, name: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError {
            message: message.into(),
            assertion_name: Some(name.into()),
            error_type,
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.assertion_name {
            Some(name) => write!(f, "[{}] {}: {}", self.error_type, name, self.message),
            None => write!(f, "[{}] {}", self.error_type, self.message),
        }
    }
}

/// Reads an untyped formula as a [`Cnf`], describing the first structural problem.
pub fn parse_cnf(value: &Value) -> Result<Cnf, String> {
    let clauses = value
        .as_array()
        .ok_or_else(|| format!("expected an array of clauses, found {}", json_kind(value)))?;
    clauses
        .iter()
        .enumerate()
        .map(|(i, clause)| parse_clause(clause).map_err(|e| format!("clause {}: {}", i, e)))
        .collect()
}

fn parse_clause(value: &Value) -> Result<Clause, String> {
    let literals = value
        .as_array()
        .ok_or_else(|| format!("expected an array of literals, found {}", json_kind(value)))?;
    literals
        .iter()
        .enumerate()
        .map(|(i, lit)| parse_literal(lit).map_err(|e| format!("literal {}: {}", i, e)))
        .collect()
}

fn parse_literal(value: &Value) -> Result<Literal, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("expected an object, found {}", json_kind(value)))?;
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or("missing string field 'name'")?;
    let assignment = object
        .get("assignment")
        .and_then(Value::as_bool)
        .ok_or("missing boolean field 'assignment'")?;
    Ok(Literal::new(name, assignment))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validates `raw` against the extracted `state_variables` and returns the typed assertions.
pub fn validate(raw: &[RawAssertion], state_variables: &[String]) -> Result<Vec<Assertion>, Vec<ModelError>> {
    let mut errors = Vec::new();
    let mut assertions = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();

    for item in raw {
        let name = item.name.as_str();

        if name.is_empty() {
            errors.push(ModelError::new(ErrorType::General, "Assertion without a name"));
        } else if !seen.insert(name) {
            errors.push(ModelError::for_assertion(
                ErrorType::General,
                name,
                format!("Duplicate assertion name '{}'", name),
            ));
        }

        let lhs = parse_cnf(&item.lhs).map_err(|e| {
            ModelError::for_assertion(ErrorType::CnfFormat, name, format!("Invalid CNF in lhs: {}", e))
        });
        let rhs = parse_cnf(&item.rhs).map_err(|e| {
            ModelError::for_assertion(ErrorType::CnfFormat, name, format!("Invalid CNF in rhs: {}", e))
        });

        if let Ok(rhs) = &rhs {
            for lit in rhs.iter().flatten() {
                if lit.name != name {
                    errors.push(ModelError::for_assertion(
                        ErrorType::AssertionFormat,
                        name,
                        format!(
                            "The rhs of assertion '{}' must only reference '{}', found '{}'",
                            name, name, lit.name
                        ),
                    ));
                }
            }
        }

        if let Ok(lhs) = &lhs {
            for lit in lhs.iter().flatten() {
                if lit.name != UNCONDITIONAL && !state_variables.contains(&lit.name) {
                    errors.push(ModelError::for_assertion(
                        ErrorType::StateVariable,
                        name,
                        format!(
                            "Unknown state variable '{}'. Available state variables: [{}]",
                            lit.name,
                            state_variables.join(", ")
                        ),
                    ));
                }
            }
        }

        match (lhs, rhs) {
            (Ok(lhs), Ok(rhs)) => assertions.push(Assertion {
                name: item.name.clone(),
                detector: item.detector(),
                lhs,
                rhs,
            }),
            (lhs, rhs) => {
                errors.extend(lhs.err());
                errors.extend(rhs.err());
            }
        }
    }

    if errors.is_empty() {
        Ok(assertions)
    } else {
        for error in &errors {
            log::debug!("Validation error: {}", error);
        }
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    use test_log::test;

    fn raw(value: Value) -> RawAssertion {
        serde_json::from_value(value).unwrap()
    }

    fn vars() -> Vec<String> {
        vec!["isLoading".to_string(), "isError".to_string()]
    }

    #[test]
    fn test_valid_assertion() {
        let assertions = validate(
            &[raw(json!({
                "name": "hasLoadingText",
                "textToFind": "Loading...",
                "lhs": [[{"name": "isLoading", "assignment": true}]],
                "rhs": [[{"name": "hasLoadingText", "assignment": true}]]
            }))],
            &vars(),
        )
        .unwrap();
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].lhs, vec![vec![Literal::pos("isLoading")]]);
    }

    #[test]
    fn test_unconditional_precondition() {
        let result = validate(
            &[raw(json!({
                "name": "p",
                "textToFind": "x",
                "lhs": [[{"name": "default", "assignment": true}]],
                "rhs": [[{"name": "p", "assignment": true}]]
            }))],
            &vars(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_wrong_rhs_name() {
        let errors = validate(
            &[raw(json!({
                "name": "hasLoadingText",
                "textToFind": "Loading...",
                "lhs": [[{"name": "isLoading", "assignment": true}]],
                "rhs": [[{"name": "somethingElse", "assignment": true}]]
            }))],
            &vars(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::AssertionFormat);
        assert_eq!(errors[0].assertion_name.as_deref(), Some("hasLoadingText"));
    }

    #[test]
    fn test_unknown_state_variable() {
        let errors = validate(
            &[raw(json!({
                "name": "p",
                "textToFind": "x",
                "lhs": [[{"name": "isMissing", "assignment": false}]],
                "rhs": [[{"name": "p", "assignment": true}]]
            }))],
            &vars(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::StateVariable);
        assert!(errors[0].message.contains("isMissing"));
        assert!(errors[0].message.contains("isLoading, isError"));
    }

    #[test]
    fn test_cnf_format() {
        let errors = validate(
            &[raw(json!({
                "name": "p",
                "textToFind": "x",
                "lhs": [{"name": "isLoading", "assignment": true}],
                "rhs": [[{"name": "p", "assignment": "yes"}]]
            }))],
            &vars(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.error_type == ErrorType::CnfFormat));
        assert!(errors[0].message.contains("lhs"));
        assert!(errors[1].message.contains("rhs"));
    }

    #[test]
    fn test_missing_formulas() {
        let errors = validate(&[raw(json!({"name": "p", "textToFind": "x"}))], &vars()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("found null"));
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = validate(
            &[
                raw(json!({"name": "a", "textToFind": "x", "lhs": [[{"name": "zzz", "assignment": true}]], "rhs": [[{"name": "b", "assignment": true}]]})),
                raw(json!({"name": "a", "textToFind": "y", "lhs": [], "rhs": []})),
                raw(json!({"textToFind": "z", "lhs": [], "rhs": []})),
            ],
            &vars(),
        )
        .unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.error_type).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorType::AssertionFormat,
                ErrorType::StateVariable,
                ErrorType::General,
                ErrorType::General
            ]
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = ModelError::for_assertion(ErrorType::StateVariable, "p", "bad");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"message": "bad", "assertionName": "p", "errorType": "STATE_VARIABLE"})
        );
        let error = ModelError::new(ErrorType::General, "gone");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"message": "gone", "errorType": "GENERAL"})
        );
    }
}
