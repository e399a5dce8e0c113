//! Lightweight syntax front-end for component source.
//!
//! This is not a TypeScript parser. It tokenizes the source once (see [`lexer`]), pairs
//! brackets, and answers the handful of structural queries the extractor needs:
//!
//! - [`SourceTree::if_chains`]: top-level `if` / `else if` / `else` chains,
//! - [`SourceTree::parse_expr`]: guard expressions reduced to [`Expr`],
//! - [`SourceTree::variable_declarations`] and [`SourceTree::call_at`]: state-hook bindings,
//! - [`SourceTree::functions`]: named handler definitions,
//! - [`SourceTree::calls_in`] and [`SourceTree::event_handlers_in`]: call sites and JSX
//!   event-handler attributes inside a region.
//!
//! Regions are token index ranges ([`TokenRange`]); [`SourceTree::slice`] maps them back to
//! source text.

pub mod expr;
pub mod lexer;

use std::ops::Range;

pub use self::expr::Expr;
use self::lexer::{match_brackets, tokenize, Token, TokenKind};

/// Half-open range of token indices.
pub type TokenRange = Range<usize>;

/// One alternative of an `if` chain. The trailing `else` has no guard.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Alternative {
    pub guard: Option<TokenRange>,
    pub body: TokenRange,
}

/// A complete `if` / `else if` / `else` chain, alternatives in source order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IfChain {
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Binding {
    /// `const [a, b] = ...`, one raw element text per slot.
    Array(Vec<String>),
    /// `const a = ...`, raw text between the keyword and `=` (may carry `: Type`).
    Name(String),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VarDecl {
    pub binding: Binding,
    pub init: TokenRange,
}

/// A named function: `function f() {}` or `const f = (...) => ...`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub body: TokenRange,
}

/// A call site `callee(args)`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Call {
    pub callee: String,
    pub args: TokenRange,
}

/// The shape of a call expression starting at some token: `a.b.c<T>(args)`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CallShape {
    pub path: Vec<String>,
    pub args: TokenRange,
    /// Index just past the closing parenthesis.
    pub end: usize,
}

const NOT_CALLABLE: &[&str] = &["if", "for", "while", "switch", "catch", "return", "typeof", "function", "new"];

/// Strips a trailing type annotation: `"isOpen: boolean"` becomes `"isOpen"`.
pub fn strip_type_annotation(text: &str) -> &str {
    text.split(':').next().unwrap_or(text).trim()
}

#[derive(Debug, Clone)]
pub struct SourceTree {
    text: String,
    tokens: Vec<Token>,
    partner: Vec<Option<usize>>,
}

impl SourceTree {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = tokenize(&text);
        let partner = match_brackets(&text, &tokens);
        Self { text, tokens, partner }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn full_range(&self) -> TokenRange {
        0..self.tokens.len()
    }

    /// Text of token `i` (empty when out of bounds).
    pub fn token(&self, i: usize) -> &str {
        self.tokens.get(i).map_or("", |t| &self.text[t.range()])
    }

    pub fn kind(&self, i: usize) -> Option<TokenKind> {
        self.tokens.get(i).map(|t| t.kind)
    }

    pub fn is_ident(&self, i: usize, s: &str) -> bool {
        self.kind(i) == Some(TokenKind::Ident) && self.token(i) == s
    }

    pub fn is_punct(&self, i: usize, s: &str) -> bool {
        self.kind(i) == Some(TokenKind::Punct) && self.token(i) == s
    }

    /// Closing (or opening) partner of the bracket at `i`.
    pub fn partner(&self, i: usize) -> Option<usize> {
        self.partner.get(i).copied().flatten()
    }

    /// Source text covering the tokens in `range`.
    pub fn slice(&self, range: &TokenRange) -> &str {
        if range.start >= range.end || range.end > self.tokens.len() {
            return "";
        }
        &self.text[self.tokens[range.start].span.0..self.tokens[range.end - 1].span.1]
    }

    /// Index just past the bracket group opening at `i`, or `i + 1` for any other token.
    fn skip_group(&self, i: usize) -> usize {
        if matches!(self.token(i), "(" | "[" | "{") && self.kind(i) == Some(TokenKind::Punct) {
            if let Some(close) = self.partner(i) {
                if close > i {
                    return close + 1;
                }
            }
        }
        i + 1
    }

    fn is_closer(&self, i: usize) -> bool {
        self.kind(i) == Some(TokenKind::Punct) && matches!(self.token(i), ")" | "]" | "}")
    }

    /// Index just past the statement starting at `start`.
    fn statement_end(&self, start: usize) -> usize {
        let n = self.tokens.len();
        if start >= n {
            return n;
        }
        if self.is_punct(start, "{") {
            return self.partner(start).map_or(n, |close| close + 1);
        }
        if self.is_ident(start, "if") {
            if let Some((_, end)) = self.parse_chain(start) {
                return end;
            }
        }
        let mut j = start;
        while j < n {
            if self.is_punct(j, ";") {
                return j + 1;
            }
            if self.is_closer(j) || (j > start && self.is_ident(j, "else")) {
                return j;
            }
            j = self.skip_group(j);
        }
        n
    }

    /// Parses the chain whose first `if` keyword is at `start`.
    ///
    /// Returns the alternatives and the index just past the whole chain.
    fn parse_chain(&self, start: usize) -> Option<(Vec<Alternative>, usize)> {
        let mut alternatives = Vec::new();
        let mut cur = start;
        loop {
            let close = if self.is_ident(cur, "if") && self.is_punct(cur + 1, "(") {
                self.partner(cur + 1)
            } else {
                None
            };
            let Some(close) = close else {
                return if alternatives.is_empty() {
                    None
                } else {
                    Some((alternatives, cur))
                };
            };

            let then_start = close + 1;
            let then_end = self.statement_end(then_start);
            alternatives.push(Alternative {
                guard: Some(cur + 2..close),
                body: then_start..then_end,
            });

            if !self.is_ident(then_end, "else") {
                return Some((alternatives, then_end));
            }
            let else_start = then_end + 1;
            if self.is_ident(else_start, "if") && self.is_punct(else_start + 1, "(") {
                cur = else_start;
                continue;
            }
            let else_end = self.statement_end(else_start);
            alternatives.push(Alternative {
                guard: None,
                body: else_start..else_end,
            });
            return Some((alternatives, else_end));
        }
    }

    fn in_case_clause(&self, i: usize) -> bool {
        if i == 0 || !self.is_punct(i - 1, ":") {
            return false;
        }
        let mut j = i - 1;
        while j > 0 {
            j -= 1;
            if self.is_punct(j, ";") || self.is_punct(j, "{") || self.is_punct(j, "}") {
                return false;
            }
            if self.is_ident(j, "case") || self.is_ident(j, "default") {
                return true;
            }
        }
        false
    }

    /// All top-level `if` chains in source order.
    ///
    /// An `if` lexically inside another `if` statement (in a guard, body or `else`) belongs
    /// to that statement and is not reported. Chains directly under a `case` clause are
    /// skipped.
    pub fn if_chains(&self) -> Vec<IfChain> {
        let mut chains = Vec::new();
        let mut covered = 0;
        for i in 0..self.tokens.len() {
            if i < covered || !self.is_ident(i, "if") || !self.is_punct(i + 1, "(") {
                continue;
            }
            let Some((alternatives, end)) = self.parse_chain(i) else {
                continue;
            };
            covered = end;
            if self.in_case_clause(i) {
                log::debug!("Skipping if-chain inside a case clause at token {}", i);
                continue;
            }
            chains.push(IfChain { alternatives });
        }
        chains
    }

    /// Index of the `=` of a declaration whose binding ends before `from`.
    fn find_assign(&self, from: usize) -> Option<usize> {
        let mut j = from;
        while j < self.tokens.len() {
            if self.is_punct(j, "=") {
                return Some(j);
            }
            if self.is_punct(j, ";") || self.is_punct(j, "=>") || self.is_closer(j) {
                return None;
            }
            if self.is_ident(j, "of") || self.is_ident(j, "in") {
                return None;
            }
            j = self.skip_group(j);
        }
        None
    }

    fn initializer(&self, eq: usize) -> TokenRange {
        let end = self.statement_end(eq + 1);
        let end = if end > eq + 1 && self.is_punct(end - 1, ";") { end - 1 } else { end };
        eq + 1..end
    }

    /// Splits `range` on top-level commas, returning the text of each element.
    fn split_commas(&self, range: TokenRange) -> Vec<String> {
        let mut parts = Vec::new();
        let mut part_start = range.start;
        let mut j = range.start;
        while j < range.end {
            if self.is_punct(j, ",") {
                parts.push(self.slice(&(part_start..j)).to_string());
                part_start = j + 1;
                j += 1;
                continue;
            }
            j = self.skip_group(j);
        }
        if part_start < range.end {
            parts.push(self.slice(&(part_start..range.end)).to_string());
        }
        parts
    }

    /// All `const` / `let` / `var` declarations with an initializer, in source order.
    pub fn variable_declarations(&self) -> Vec<VarDecl> {
        let mut decls = Vec::new();
        for i in 0..self.tokens.len() {
            if !(self.is_ident(i, "const") || self.is_ident(i, "let") || self.is_ident(i, "var")) {
                continue;
            }
            if self.is_punct(i + 1, "[") {
                let Some(close) = self.partner(i + 1) else {
                    continue;
                };
                let Some(eq) = self.find_assign(close + 1) else {
                    continue;
                };
                decls.push(VarDecl {
                    binding: Binding::Array(self.split_commas(i + 2..close)),
                    init: self.initializer(eq),
                });
            } else if self.kind(i + 1) == Some(TokenKind::Ident) {
                let Some(eq) = self.find_assign(i + 2) else {
                    continue;
                };
                decls.push(VarDecl {
                    binding: Binding::Name(self.slice(&(i + 1..eq)).to_string()),
                    init: self.initializer(eq),
                });
            }
        }
        decls
    }

    /// Recognizes a call expression `a.b<T>(args)` starting at token `start`.
    pub fn call_at(&self, start: usize) -> Option<CallShape> {
        let mut path = Vec::new();
        let mut j = start;
        loop {
            if self.kind(j) != Some(TokenKind::Ident) {
                return None;
            }
            path.push(self.token(j).to_string());
            j += 1;
            if self.is_punct(j, ".") {
                j += 1;
                continue;
            }
            break;
        }
        if self.is_punct(j, "<") {
            let mut depth = 0usize;
            while j < self.tokens.len() {
                if self.is_punct(j, "<") {
                    depth += 1;
                } else if self.is_punct(j, ">") {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                } else if self.is_punct(j, ";") || self.is_punct(j, "=") {
                    return None;
                }
                j += 1;
            }
            j += 1;
        }
        if !self.is_punct(j, "(") {
            return None;
        }
        let close = self.partner(j)?;
        Some(CallShape {
            path,
            args: j + 1..close,
            end: close + 1,
        })
    }

    /// Named functions: `function f(...) {...}` declarations and `const f = ...`
    /// declarations whose initializer is (or wraps) a function expression.
    pub fn functions(&self) -> Vec<FunctionDef> {
        let mut defs = Vec::new();
        for i in 0..self.tokens.len() {
            if !self.is_ident(i, "function") || self.kind(i + 1) != Some(TokenKind::Ident) {
                continue;
            }
            if !self.is_punct(i + 2, "(") {
                continue;
            }
            let Some(close) = self.partner(i + 2) else {
                continue;
            };
            let mut j = close + 1;
            while j < self.tokens.len() && !self.is_punct(j, "{") && !self.is_punct(j, ";") {
                j += 1;
            }
            if let Some(end) = self.partner(j).filter(|_| self.is_punct(j, "{")) {
                defs.push(FunctionDef {
                    name: self.token(i + 1).to_string(),
                    body: j + 1..end,
                });
            }
        }
        for decl in self.variable_declarations() {
            let Binding::Name(raw) = &decl.binding else {
                continue;
            };
            let is_function = decl
                .init
                .clone()
                .any(|j| self.is_punct(j, "=>") || self.is_ident(j, "function"));
            if is_function {
                defs.push(FunctionDef {
                    name: strip_type_annotation(raw).to_string(),
                    body: decl.init,
                });
            }
        }
        defs
    }

    /// Plain call sites `name(...)` inside `range` (method calls `x.name(...)` excluded).
    pub fn calls_in(&self, range: TokenRange) -> Vec<Call> {
        let mut calls = Vec::new();
        for i in range.clone() {
            if self.kind(i) != Some(TokenKind::Ident) || !self.is_punct(i + 1, "(") {
                continue;
            }
            if NOT_CALLABLE.contains(&self.token(i)) {
                continue;
            }
            if i > 0 && (self.is_punct(i - 1, ".") || self.is_punct(i - 1, "?.") || self.is_ident(i - 1, "function"))
            {
                continue;
            }
            let Some(close) = self.partner(i + 1) else {
                continue;
            };
            if close >= range.end {
                continue;
            }
            calls.push(Call {
                callee: self.token(i).to_string(),
                args: i + 2..close,
            });
        }
        calls
    }

    /// Value regions of JSX event-handler attributes (`onClick={...}`) inside `range`.
    pub fn event_handlers_in(&self, range: TokenRange) -> Vec<TokenRange> {
        let mut values = Vec::new();
        for i in range.clone() {
            let name = self.token(i);
            let is_event = self.kind(i) == Some(TokenKind::Ident)
                && name.len() > 2
                && name.starts_with("on")
                && name[2..].starts_with(|c: char| c.is_ascii_uppercase());
            if !is_event || !self.is_punct(i + 1, "=") || !self.is_punct(i + 2, "{") {
                continue;
            }
            if let Some(close) = self.partner(i + 2).filter(|&close| close < range.end) {
                values.push(i + 3..close);
            }
        }
        values
    }

    /// Parses the guard expression covering `range`.
    pub fn parse_expr(&self, range: TokenRange) -> Expr {
        let mut parser = ExprParser {
            tree: self,
            pos: range.start,
            end: range.end,
        };
        let expr = parser.parse_or();
        if parser.pos < parser.end {
            return Expr::Other(self.slice(&range).to_string());
        }
        expr
    }
}

/// Precedence climbing over `||`, `&&` and prefix `!`; every other operand shape is opaque.
struct ExprParser<'a> {
    tree: &'a SourceTree,
    pos: usize,
    end: usize,
}

impl ExprParser<'_> {
    fn at(&self, s: &str) -> bool {
        self.pos < self.end && self.tree.is_punct(self.pos, s)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.at(s) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_one(&mut self) {
        let next = self.tree.skip_group(self.pos);
        self.pos = if next <= self.end { next } else { self.pos + 1 };
    }

    fn parse_or(&mut self) -> Expr {
        let mut lhs = self.parse_and();
        while self.eat("||") {
            let rhs = self.parse_and();
            lhs = Expr::or(lhs, rhs);
        }
        lhs
    }

    fn parse_and(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        while self.eat("&&") {
            let rhs = self.parse_unary();
            lhs = Expr::and(lhs, rhs);
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        if self.eat("!") {
            return Expr::not(self.parse_unary());
        }
        self.parse_operand()
    }

    fn parse_operand(&mut self) -> Expr {
        let start = self.pos;
        let expr = self.parse_primary();
        if self.pos >= self.end || self.at("&&") || self.at("||") {
            return expr;
        }
        // Comparisons, member access, calls: the whole operand becomes opaque.
        while self.pos < self.end && !self.at("&&") && !self.at("||") {
            self.skip_one();
        }
        Expr::Other(self.tree.slice(&(start..self.pos)).to_string())
    }

    fn parse_primary(&mut self) -> Expr {
        let i = self.pos;
        if i >= self.end {
            return Expr::Other(String::new());
        }
        if self.tree.is_punct(i, "(") {
            if let Some(close) = self.tree.partner(i).filter(|&close| close > i && close < self.end) {
                self.pos = close + 1;
                return self.tree.parse_expr(i + 1..close);
            }
        }
        let text = self.tree.token(i);
        let is_name = self.tree.kind(i) == Some(TokenKind::Ident)
            && !matches!(text, "true" | "false" | "null" | "undefined" | "this");
        self.skip_one();
        if is_name {
            Expr::Ident(text.to_string())
        } else {
            Expr::Other(self.tree.slice(&(i..self.pos)).to_string())
        }
    }
}
