//! CNF extraction from guard expressions.
//!
//! The extractor is not a general CNF conversion. It assumes guards are already written
//! close to CNF (conjunctions of literals and of parenthesized disjunctions) and reads them
//! structurally:
//!
//! | guard        | result                                  |
//! |--------------|-----------------------------------------|
//! | `x`          | `[[x]]`                                 |
//! | `!x`         | `[[!x]]`                                |
//! | `a && b`     | `clauses(a) ++ clauses(b)`              |
//! | `a \|\| b`   | `[lits(a) ++ lits(b)]` if both sides are single clauses |
//!
//! Any other shape yields the fallback `[[]]` together with a warning. Callers must read the
//! fallback clause as "guard unknown", not as "false"; see [`drop_unknown_clauses`].

use crate::syntax::Expr;
use crate::types::{Clause, Cnf, Literal};

/// Extracts the CNF form of a guard expression.
pub fn extract_cnf(expr: &Expr) -> Cnf {
    match expr {
        Expr::Ident(name) => vec![vec![Literal::pos(name.clone())]],
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Ident(name) => vec![vec![Literal::neg(name.clone())]],
            _ => fallback(expr),
        },
        Expr::And(lhs, rhs) => {
            let mut clauses = extract_cnf(lhs);
            clauses.extend(extract_cnf(rhs));
            clauses
        }
        Expr::Or(lhs, rhs) => {
            let lhs_cnf = extract_cnf(lhs);
            let rhs_cnf = extract_cnf(rhs);
            match (<[Clause; 1]>::try_from(lhs_cnf), <[Clause; 1]>::try_from(rhs_cnf)) {
                (Ok([mut left]), Ok([right])) => {
                    left.extend(right);
                    vec![left]
                }
                _ => fallback(expr),
            }
        }
        Expr::Other(_) => fallback(expr),
    }
}

fn fallback(expr: &Expr) -> Cnf {
    log::warn!("Expression may not be in proper CNF: {}", expr);
    vec![vec![]]
}

/// Removes fallback empty clauses, turning an unreadable guard part into "no constraint".
pub fn drop_unknown_clauses(cnf: Cnf) -> Cnf {
    cnf.into_iter().filter(|clause| !clause.is_empty()).collect()
}

/// Whether the formula contains a fallback empty clause.
pub fn has_unknown_clause(cnf: &[Clause]) -> bool {
    cnf.iter().any(|clause| clause.is_empty())
}

/// Negates every literal of the formula in place, keeping its clause structure.
///
/// This is a polarity flip, not a logical negation of the formula: for the single-literal
/// assertion formulas it is applied to, both coincide.
pub fn flip_polarity(cnf: &[Clause]) -> Cnf {
    cnf.iter()
        .map(|clause| clause.iter().map(Literal::negated).collect())
        .collect()
}

/// Logical negation of a CNF formula, distributed back into CNF.
///
/// `!(C1 & C2 & ...)` is `!C1 | !C2 | ...`, where each `!Ci` is a conjunction of negated
/// literals; the disjunction is distributed into the cartesian product of those literals.
/// The negation of the empty formula ("true") is `[[]]` ("false").
pub fn negate_cnf(cnf: &[Clause]) -> Cnf {
    let mut result: Cnf = vec![vec![]];
    for clause in cnf {
        let mut next = Vec::with_capacity(result.len() * clause.len());
        for partial in &result {
            for lit in clause {
                // `x | !x` is a tautology clause: drop it.
                if partial.contains(lit) {
                    continue;
                }
                let mut extended = partial.clone();
                let negated = lit.negated();
                if !extended.contains(&negated) {
                    extended.push(negated);
                }
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::syntax::SourceTree;
    use crate::types::eval_cnf;

    fn cnf_of(src: &str) -> Cnf {
        let tree = SourceTree::parse(src);
        extract_cnf(&tree.parse_expr(tree.full_range()))
    }

    #[test]
    fn test_ident() {
        assert_eq!(cnf_of("isLoading"), vec![vec![Literal::pos("isLoading")]]);
    }

    #[test]
    fn test_not_ident() {
        assert_eq!(cnf_of("!isLoading"), vec![vec![Literal::neg("isLoading")]]);
    }

    #[test]
    fn test_and_concatenates() {
        assert_eq!(
            cnf_of("a && !b && c"),
            vec![vec![Literal::pos("a")], vec![Literal::neg("b")], vec![Literal::pos("c")]]
        );
    }

    #[test]
    fn test_or_merges_single_clauses() {
        assert_eq!(
            cnf_of("a || !b || c"),
            vec![vec![Literal::pos("a"), Literal::neg("b"), Literal::pos("c")]]
        );
    }

    #[test]
    fn test_parenthesized_or_inside_and() {
        assert_eq!(
            cnf_of("!night && (heater || ac)"),
            vec![vec![Literal::neg("night")], vec![Literal::pos("heater"), Literal::pos("ac")]]
        );
    }

    #[test]
    fn test_or_of_conjunction_falls_back() {
        assert_eq!(cnf_of("(a && b) || c"), vec![vec![]]);
    }

    #[test]
    fn test_unknown_shapes_fall_back() {
        assert_eq!(cnf_of("count > 3"), vec![vec![]]);
        assert_eq!(cnf_of("!(a && b)"), vec![vec![]]);
        assert_eq!(cnf_of("a && user.isAdmin"), vec![vec![Literal::pos("a")], vec![]]);
    }

    #[test]
    fn test_drop_unknown_clauses() {
        let cnf = vec![vec![Literal::pos("a")], vec![]];
        assert!(has_unknown_clause(&cnf));
        assert_eq!(drop_unknown_clauses(cnf), vec![vec![Literal::pos("a")]]);
    }

    #[test]
    fn test_flip_polarity() {
        let cnf = vec![vec![Literal::pos("hasText")]];
        assert_eq!(flip_polarity(&cnf), vec![vec![Literal::neg("hasText")]]);
    }

    #[test]
    fn test_negate_cnf_truth_table() {
        let cnf = vec![vec![Literal::pos("a"), Literal::neg("b")], vec![Literal::pos("c")]];
        let negated = negate_cnf(&cnf);
        for bits in 0..8u8 {
            let lookup = |name: &str| match name {
                "a" => Some(bits & 1 != 0),
                "b" => Some(bits & 2 != 0),
                "c" => Some(bits & 4 != 0),
                _ => None,
            };
            assert_eq!(eval_cnf(&negated, lookup), !eval_cnf(&cnf, lookup), "bits = {:03b}", bits);
        }
    }

    #[test]
    fn test_negate_empty_is_false() {
        assert_eq!(negate_cnf(&[]), vec![Vec::<Literal>::new()]);
    }
}
