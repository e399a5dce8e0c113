//! Transition mining: which state variables can a branch's rendered output change?
//!
//! Evidence is collected from the branch body by two syntax-tree queries:
//!
//! 1. setter calls written directly in the body, inline event handlers included
//!    (`onClick={() => setOpen(false)}`);
//! 2. named handlers reached from the body, either referenced by an event attribute
//!    (`onClick={toggle}`) or called (`onClick={() => toggle()}`), whose definitions are
//!    looked up in the whole source and searched the same way, transitively.
//!
//! Each setter call is classified by its argument. A literal `true`/`false` records that
//! value. A toggle (`setOpen(!open)`, `setOpen(prev => !prev)`) or any other argument records
//! both values. The result is a may-transition relation: it over-approximates, never drops a
//! setter call it has seen.

use std::collections::{HashMap, HashSet};

use crate::alias::SetterAliases;
use crate::syntax::lexer::TokenKind;
use crate::syntax::{SourceTree, TokenRange};
use crate::types::Transition;

/// What a single setter call does to its variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    Set(bool),
    Toggle,
    Unknown,
}

/// One observed setter invocation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Evidence {
    pub setter: String,
    pub effect: Effect,
    /// Handler through which the call was reached, `None` when inline in the branch.
    pub via: Option<String>,
}

pub struct TransitionMiner<'a> {
    tree: &'a SourceTree,
    aliases: &'a SetterAliases,
    handlers: HashMap<String, TokenRange>,
}

impl<'a> TransitionMiner<'a> {
    pub fn new(tree: &'a SourceTree, aliases: &'a SetterAliases) -> Self {
        let mut handlers = HashMap::new();
        for def in tree.functions() {
            handlers.entry(def.name).or_insert(def.body);
        }
        Self { tree, aliases, handlers }
    }

    pub fn num_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Classifies the argument list of a setter call.
    pub fn classify(&self, args: TokenRange) -> Effect {
        let tree = self.tree;
        if args.len() == 1 {
            match tree.token(args.start) {
                "true" if tree.kind(args.start) == Some(TokenKind::Ident) => return Effect::Set(true),
                "false" if tree.kind(args.start) == Some(TokenKind::Ident) => return Effect::Set(false),
                _ => {}
            }
        }
        if tree.is_punct(args.start, "!") {
            return Effect::Toggle;
        }
        let is_callback = args
            .clone()
            .any(|i| tree.is_punct(i, "=>") || tree.is_ident(i, "function"));
        if is_callback && args.clone().any(|i| tree.is_punct(i, "!")) {
            return Effect::Toggle;
        }
        Effect::Unknown
    }

    /// All setter invocations reachable from `range`, in source order.
    pub fn evidence(&self, range: TokenRange) -> Vec<Evidence> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect(range, None, &mut visited, &mut out);
        out
    }

    fn collect(&self, range: TokenRange, via: Option<&str>, visited: &mut HashSet<String>, out: &mut Vec<Evidence>) {
        let tree = self.tree;

        for call in tree.calls_in(range.clone()) {
            if self.aliases.is_setter(&call.callee) {
                out.push(Evidence {
                    effect: self.classify(call.args),
                    setter: call.callee,
                    via: via.map(str::to_string),
                });
            } else if let Some(body) = self.handlers.get(&call.callee) {
                if visited.insert(call.callee.clone()) {
                    self.collect(body.clone(), Some(&call.callee), visited, out);
                }
            }
        }

        for value in tree.event_handlers_in(range) {
            if value.len() != 1 || tree.kind(value.start) != Some(TokenKind::Ident) {
                continue;
            }
            let name = tree.token(value.start);
            if self.aliases.is_setter(name) {
                // `onChange={setOpen}` passes an event value we cannot see.
                out.push(Evidence {
                    setter: name.to_string(),
                    effect: Effect::Unknown,
                    via: via.map(str::to_string),
                });
            } else if let Some(body) = self.handlers.get(name) {
                if visited.insert(name.to_string()) {
                    self.collect(body.clone(), Some(name), visited, out);
                }
            }
        }
    }

    /// Transitions of the branch whose body is `body`, one per state variable at most.
    pub fn mine(&self, body: TokenRange) -> Vec<Transition> {
        let evidence = self.evidence(body);
        let mut transitions = Vec::new();
        let mut processed = HashSet::new();

        for (setter, variable) in self.aliases.iter() {
            if processed.contains(variable) {
                continue;
            }
            let mut transition = Transition::new(variable);
            for ev in evidence.iter().filter(|ev| ev.setter == setter) {
                match ev.effect {
                    Effect::Set(value) => transition.add(value),
                    Effect::Toggle => transition.add_both(),
                    Effect::Unknown => {
                        log::warn!(
                            "Cannot tell how {} changes {}{}; assuming both values",
                            setter,
                            variable,
                            ev.via.as_ref().map_or(String::new(), |h| format!(" (via {})", h))
                        );
                        transition.add_both();
                    }
                }
            }
            if !transition.is_empty() {
                log::debug!("Transition {:?} from {}", transition, setter);
                processed.insert(variable);
                transitions.push(transition);
            }
        }

        transitions
    }
}
