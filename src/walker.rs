//! Branch-chain walking.
//!
//! Each alternative of a top-level `if` / `else if` / `else` chain becomes one [`Branch`]:
//! its guard in CNF, one implication literal per probed property, and the transitions mined
//! from its body. The final `else` gets an empty guard.
//!
//! With exclusive chains enabled, every alternative is additionally conjoined with the
//! negation of each earlier guard of the same chain, so that at most one alternative of a
//! chain admits any state. Guards that could not be read completely are not negated.

use crate::assertion::{Assertion, Detector, RawAssertion};
use crate::cnf::{drop_unknown_clauses, extract_cnf, has_unknown_clause, negate_cnf};
use crate::detect::DetectorRegistry;
use crate::syntax::{IfChain, SourceTree};
use crate::transition::TransitionMiner;
use crate::types::{Branch, Cnf, Literal};

/// A named observable property together with the detector deciding it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Probe {
    pub name: String,
    pub detector: Detector,
}

impl From<&RawAssertion> for Probe {
    fn from(raw: &RawAssertion) -> Self {
        Probe {
            name: raw.name.clone(),
            detector: raw.detector(),
        }
    }
}

impl From<&Assertion> for Probe {
    fn from(assertion: &Assertion) -> Self {
        Probe {
            name: assertion.name.clone(),
            detector: assertion.detector.clone(),
        }
    }
}

pub struct ChainWalker<'a> {
    tree: &'a SourceTree,
    registry: &'a DetectorRegistry,
    miner: &'a TransitionMiner<'a>,
    probes: &'a [Probe],
    exclusive: bool,
}

impl<'a> ChainWalker<'a> {
    pub fn new(
        tree: &'a SourceTree,
        registry: &'a DetectorRegistry,
        miner: &'a TransitionMiner<'a>,
        probes: &'a [Probe],
    ) -> Self {
        Self {
            tree,
            registry,
            miner,
            probes,
            exclusive: false,
        }
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Branches of every top-level chain, in source order.
    pub fn walk_all(&self) -> Vec<Branch> {
        let chains = self.tree.if_chains();
        log::debug!("Found {} top-level if-chains", chains.len());
        chains.iter().flat_map(|chain| self.walk(chain)).collect()
    }

    /// Branches of one chain, one per alternative.
    pub fn walk(&self, chain: &IfChain) -> Vec<Branch> {
        let mut branches = Vec::with_capacity(chain.alternatives.len());
        let mut earlier: Vec<Cnf> = Vec::new();

        for alt in &chain.alternatives {
            let guard = alt.guard.as_ref().map(|g| extract_cnf(&self.tree.parse_expr(g.clone())));
            let mut conditions = guard.clone().map(drop_unknown_clauses).unwrap_or_default();
            if self.exclusive {
                for previous in &earlier {
                    conditions.extend(negate_cnf(previous));
                }
            }
            if let Some(cnf) = guard {
                if !has_unknown_clause(&cnf) {
                    earlier.push(cnf);
                }
            }

            let rendered = self.tree.slice(&alt.body);
            let implications = self
                .probes
                .iter()
                .map(|probe| {
                    let holds = self.registry.evaluate(&probe.name, &probe.detector, rendered);
                    Literal::new(probe.name.clone(), holds)
                })
                .collect();
            let transitions = self.miner.mine(alt.body.clone());

            let branch = Branch {
                conditions,
                implications,
                transitions,
            };
            log::debug!("Branch {}: {:?}", branches.len(), branch);
            branches.push(branch);
        }

        branches
    }
}

/// State variables in canonical order: first appearance in branch guards, then the
/// remaining `transition_targets` in the order given.
pub fn collect_state_variables<'b>(
    branches: &'b [Branch],
    transition_targets: impl IntoIterator<Item = &'b str>,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let guard_names = branches
        .iter()
        .flat_map(|b| b.conditions.iter().flatten())
        .map(|lit| lit.name.as_str());
    for name in guard_names.chain(transition_targets) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::alias::{extract_setter_aliases, SetterAliases};
    use crate::types::Transition;

    const SOURCE: &str = r#"
        const [isLoading, setIsLoading] = useState(true);
        const [isError, setIsError] = useState(false);
        if (isLoading) {
            return (<div><span>Loading...</span><button onClick={() => setIsLoading(false)}>Stop</button></div>);
        } else if (!isLoading && isError) {
            return (<p aria-label="error">Oops</p>);
        } else {
            return (<p>Done</p>);
        }
    "#;

    fn probes() -> Vec<Probe> {
        vec![
            Probe {
                name: "hasLoadingText".to_string(),
                detector: Detector::Text {
                    text_to_find: "Loading...".to_string(),
                },
            },
            Probe {
                name: "hasError".to_string(),
                detector: Detector::Label {
                    label_to_find: "error".to_string(),
                },
            },
        ]
    }

    fn walk(src: &str, exclusive: bool) -> Vec<Branch> {
        let tree = SourceTree::parse(src);
        let aliases = extract_setter_aliases(&tree, &["useState".to_string()]);
        let miner = TransitionMiner::new(&tree, &aliases);
        let registry = DetectorRegistry::default();
        let probes = probes();
        ChainWalker::new(&tree, &registry, &miner, &probes)
            .exclusive(exclusive)
            .walk_all()
    }

    #[test]
    fn test_walk_chain() {
        let branches = walk(SOURCE, false);
        assert_eq!(branches.len(), 3);

        assert_eq!(branches[0].conditions, vec![vec![Literal::pos("isLoading")]]);
        assert_eq!(
            branches[0].implications,
            vec![Literal::pos("hasLoadingText"), Literal::neg("hasError")]
        );
        assert_eq!(
            branches[0].transitions,
            vec![Transition {
                name: "isLoading".to_string(),
                assignments: vec![false],
            }]
        );

        assert_eq!(
            branches[1].conditions,
            vec![vec![Literal::neg("isLoading")], vec![Literal::pos("isError")]]
        );
        assert_eq!(
            branches[1].implications,
            vec![Literal::neg("hasLoadingText"), Literal::pos("hasError")]
        );
        assert!(branches[1].transitions.is_empty());

        assert!(branches[2].conditions.is_empty());
        assert_eq!(
            branches[2].implications,
            vec![Literal::neg("hasLoadingText"), Literal::neg("hasError")]
        );
    }

    #[test]
    fn test_unreadable_guard_is_unconstrained() {
        let src = "if (count > 3 && isOpen) { return <p/>; }";
        let branches = walk(src, false);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].conditions, vec![vec![Literal::pos("isOpen")]]);
    }

    #[test]
    fn test_nested_if_not_walked() {
        let src = "if (a) { if (b) { return <p/>; } return <i/>; }";
        let branches = walk(src, false);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].conditions, vec![vec![Literal::pos("a")]]);
    }

    #[test]
    fn test_exclusive_chain() {
        let branches = walk(SOURCE, true);
        assert_eq!(branches[0].conditions, vec![vec![Literal::pos("isLoading")]]);
        assert_eq!(
            branches[1].conditions,
            vec![
                vec![Literal::neg("isLoading")],
                vec![Literal::pos("isError")],
                vec![Literal::neg("isLoading")],
            ]
        );
        assert_eq!(
            branches[2].conditions,
            vec![
                vec![Literal::neg("isLoading")],
                vec![Literal::pos("isLoading"), Literal::neg("isError")],
            ]
        );
    }

    #[test]
    fn test_exclusive_skips_unreadable_guard() {
        let src = "if (count > 3) { return <p/>; } else { return <i/>; }";
        let branches = walk(src, true);
        assert!(branches[0].conditions.is_empty());
        assert!(branches[1].conditions.is_empty());
    }

    #[test]
    fn test_collect_state_variables() {
        let branches = walk(SOURCE, false);
        let aliases = {
            let mut a = SetterAliases::new();
            a.insert("setIsLoading", "isLoading");
            a.insert("setIsMuted", "isMuted");
            a
        };
        let names = collect_state_variables(&branches, aliases.iter().map(|(_, v)| v));
        assert_eq!(names, vec!["isLoading", "isError", "isMuted"]);
    }
}
