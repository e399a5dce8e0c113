//! Branch transition graph to DOT (Graphviz) conversion.
//!
//! The graph has one node per branch and an edge `i -> j` whenever some state admitted by
//! the guard of branch `i`, after one of the transitions inferred for branch `i`, is admitted
//! by the guard of branch `j`. The edge is labelled with the assignments that lead there.
//!
//! # DOT Format
//!
//! - **Guarded branches** use [`DotConfig::node_shape`] and show their guard;
//! - **Unconditional branches** (a trailing `else`) use [`DotConfig::fallback_shape`];
//! - **Edges** use [`DotConfig::edge_style`]; self-loops are kept.
//!
//! # Examples
//!
//! ```
//! use pbt_model::extract::Extractor;
//!
//! let source = r#"
//!     const [open, setOpen] = useState(false);
//!     if (open) {
//!         return <button onClick={() => setOpen(false)}>Close</button>;
//!     } else {
//!         return <button onClick={() => setOpen(true)}>Open</button>;
//!     }
//! "#;
//! let extraction = Extractor::default().extract_source(source, &[]).unwrap();
//! let dot = pbt_model::dot::to_dot(&extraction.model).unwrap();
//! assert!(dot.contains("b0 -> b1"));
//! // Render with: dot -Tpng model.dot -o model.png
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::coverage::{all_states, CoverageError, State};
use crate::extract::ComponentModel;
use crate::types::cnf_to_string;

/// Configuration options for DOT output generation.
///
/// ```
/// use pbt_model::dot::DotConfig;
///
/// let config = DotConfig {
///     node_shape: "ellipse",
///     ..DotConfig::default()
/// };
/// assert!(config.show_implications);
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for guarded branches (default: "box")
    pub node_shape: &'static str,
    /// Shape for unconditional branches (default: "doubleoctagon")
    pub fallback_shape: &'static str,
    /// Style for transition edges (default: "solid")
    pub edge_style: &'static str,
    /// Graph direction (default: "LR")
    pub rankdir: &'static str,
    /// List the properties that hold in each branch (default: true)
    pub show_implications: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "box",
            fallback_shape: "doubleoctagon",
            edge_style: "solid",
            rankdir: "LR",
            show_implications: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum DotError {
    #[error(transparent)]
    Coverage(#[from] CoverageError),
    #[error("formatting failed")]
    Fmt(#[from] std::fmt::Error),
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Edges of the branch transition graph: `(from, to) -> labels`.
pub fn transition_edges(model: &ComponentModel) -> Result<BTreeMap<(usize, usize), Vec<String>>, CoverageError> {
    let names = &model.state_variables;
    let mut edges: BTreeMap<(usize, usize), Vec<String>> = BTreeMap::new();

    for state in all_states(names)? {
        for (i, from) in model.branches.iter().enumerate() {
            if !state.admitted_by(from) {
                continue;
            }
            for transition in &from.transitions {
                let Some(bit) = state.index_of(&transition.name) else {
                    continue;
                };
                for &value in &transition.assignments {
                    let mask = if value { state.mask() | 1 << bit } else { state.mask() & !(1 << bit) };
                    let next = State::new(names, mask);
                    let label = format!("{}={}", transition.name, value);
                    for (j, to) in model.branches.iter().enumerate() {
                        if next.admitted_by(to) {
                            let labels = edges.entry((i, j)).or_default();
                            if !labels.contains(&label) {
                                labels.push(label.clone());
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(edges)
}

pub fn to_dot(model: &ComponentModel) -> Result<String, DotError> {
    to_dot_with_config(model, &DotConfig::default())
}

pub fn to_dot_with_config(model: &ComponentModel, config: &DotConfig) -> Result<String, DotError> {
    let edges = transition_edges(model)?;

    let mut dot = String::new();
    writeln!(dot, "digraph {{")?;
    writeln!(dot, "rankdir={};", config.rankdir)?;

    for (i, branch) in model.branches.iter().enumerate() {
        let mut label = format!("#{}\\n{}", i, escape(&cnf_to_string(&branch.conditions)));
        if config.show_implications {
            let holds: Vec<&str> = branch
                .implications
                .iter()
                .filter(|lit| lit.assignment)
                .map(|lit| lit.name.as_str())
                .collect();
            if !holds.is_empty() {
                write!(label, "\\n[{}]", escape(&holds.join(", ")))?;
            }
        }
        let shape = if branch.conditions.is_empty() {
            config.fallback_shape
        } else {
            config.node_shape
        };
        writeln!(dot, "b{} [shape={}, label=\"{}\"];", i, shape, label)?;
    }

    for ((i, j), labels) in &edges {
        writeln!(
            dot,
            "b{} -> b{} [style={}, label=\"{}\"];",
            i,
            j,
            config.edge_style,
            escape(&labels.join(", "))
        )?;
    }

    writeln!(dot, "}}")?;
    Ok(dot)
}
