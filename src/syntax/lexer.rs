//! Tolerant tokenizer for component source (TypeScript with JSX).
//!
//! The tokenizer never fails. Anything it does not recognize becomes a one-character
//! punctuation token. JSX is tracked well enough to keep element text out of the code:
//! a run of text between tags becomes a single [`TokenKind::Text`] token, so an apostrophe
//! in `<p>Don't</p>` or a URL in `<p>https://example.com</p>` is never read as a string
//! literal or a comment. Tag attributes and `{...}` expressions are lexed as code.

use std::ops::Range;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Template,
    Punct,
    /// Element text between JSX tags, trimmed.
    Text,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offsets into the source text.
    pub span: (usize, usize),
}

impl Token {
    pub fn range(&self) -> Range<usize> {
        self.span.0..self.span.1
    }
}

const MULTI_PUNCT: &[&str] = &[
    "===", "!==", "...", "&&=", "||=", "??=", "=>", "==", "!=", "&&", "||", "??", "<=", ">=", "?.", "++", "--",
    "+=", "-=", "*=", "/=",
];

/// Keywords after which `<` opens an element rather than comparing.
const JSX_PREFIX_KEYWORDS: &[&str] = &["return", "yield", "await", "case", "default"];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Where the lexer is, relative to the JSX around it. Plain code when the stack is empty.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Context {
    /// A `{...}` expression inside JSX, with `braces` nested braces still open.
    Expr { braces: usize },
    /// Inside `<tag ...>` or `</tag>`, with `depth` elements open around it.
    Tag { closing: bool, depth: usize },
    /// Children of `depth` open elements.
    Text { depth: usize },
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    stack: Vec<Context>,
}

pub fn tokenize(text: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        text,
        pos: 0,
        tokens: Vec::new(),
        stack: Vec::new(),
    };
    while lexer.pos < text.len() {
        match lexer.stack.last().copied() {
            Some(Context::Tag { closing, depth }) => lexer.tag(closing, depth),
            Some(Context::Text { depth }) => lexer.jsx_text(depth),
            Some(Context::Expr { .. }) | None => lexer.code(),
        }
    }
    lexer.tokens
}

impl Lexer<'_> {
    fn push(&mut self, kind: TokenKind, end: usize) {
        self.tokens.push(Token {
            kind,
            span: (self.pos, end),
        });
        self.pos = end;
    }

    /// Replaces the top frame with `context`, or drops it when no element is left open.
    fn set_top(&mut self, context: Context) {
        self.stack.pop();
        if !matches!(context, Context::Text { depth: 0 }) {
            self.stack.push(context);
        }
    }

    /// `<` at the current position opens an element.
    fn at_element_start(&self, rest: &str) -> bool {
        let opens = rest[1..].starts_with(|ch: char| is_ident_start(ch) || ch == '>');
        if !opens {
            return false;
        }
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        let prev_text = &self.text[prev.range()];
        match prev.kind {
            TokenKind::Punct => !matches!(prev_text, ")" | "]" | "}"),
            TokenKind::Ident => JSX_PREFIX_KEYWORDS.contains(&prev_text),
            _ => false,
        }
    }

    fn code(&mut self) {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(c) = rest.chars().next() else {
            self.pos = text.len();
            return;
        };

        if c.is_whitespace() {
            self.pos += c.len_utf8();
            return;
        }
        if rest.starts_with("//") {
            self.pos += rest.find('\n').unwrap_or(rest.len());
            return;
        }
        if rest.starts_with("/*") {
            self.pos += rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
            return;
        }

        match c {
            '{' => {
                if let Some(Context::Expr { braces }) = self.stack.last_mut() {
                    *braces += 1;
                }
            }
            '}' => {
                if let Some(Context::Expr { braces }) = self.stack.last_mut() {
                    if *braces == 0 {
                        self.stack.pop();
                    } else {
                        *braces -= 1;
                    }
                }
            }
            '<' if self.at_element_start(rest) => {
                self.push(TokenKind::Punct, self.pos + 1);
                self.stack.push(Context::Tag { closing: false, depth: 0 });
                return;
            }
            _ => {}
        }
        self.scan(rest, c);
    }

    fn tag(&mut self, closing: bool, depth: usize) {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(c) = rest.chars().next() else {
            self.pos = text.len();
            return;
        };

        match c {
            _ if c.is_whitespace() => self.pos += c.len_utf8(),
            '{' => {
                self.push(TokenKind::Punct, self.pos + 1);
                self.stack.push(Context::Expr { braces: 0 });
            }
            '/' if !closing && rest.starts_with("/>") => {
                self.push(TokenKind::Punct, self.pos + 1);
                self.push(TokenKind::Punct, self.pos + 1);
                self.set_top(Context::Text { depth });
            }
            '>' => {
                self.push(TokenKind::Punct, self.pos + 1);
                let depth = if closing { depth.saturating_sub(1) } else { depth + 1 };
                self.set_top(Context::Text { depth });
            }
            // Never inside a tag: this `<` was a comparison after all.
            ';' | ')' | '}' => {
                self.stack.pop();
            }
            _ => self.scan(rest, c),
        }
    }

    fn jsx_text(&mut self, depth: usize) {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(c) = rest.chars().next() else {
            self.pos = text.len();
            return;
        };

        match c {
            _ if c.is_whitespace() => self.pos += c.len_utf8(),
            '<' => {
                let closing = rest[1..].trim_start().starts_with('/');
                self.push(TokenKind::Punct, self.pos + 1);
                self.set_top(Context::Tag { closing, depth });
            }
            '{' => {
                self.push(TokenKind::Punct, self.pos + 1);
                self.stack.push(Context::Expr { braces: 0 });
            }
            // A stray closer ends what was not an element; the code lexer takes it.
            '}' => {
                self.stack.pop();
            }
            _ => {
                let len = rest
                    .find(|ch: char| matches!(ch, '<' | '{' | '}'))
                    .unwrap_or(rest.len());
                let run = rest[..len].trim_end();
                self.push(TokenKind::Text, self.pos + run.len());
                self.pos += len - run.len();
            }
        }
    }

    /// One code token: identifier, number, string, template or punctuation.
    fn scan(&mut self, rest: &str, c: char) {
        let text = self.text;
        let bytes = text.as_bytes();

        if is_ident_start(c) {
            let len = rest.find(|ch: char| !is_ident_continue(ch)).unwrap_or(rest.len());
            self.push(TokenKind::Ident, self.pos + len);
            return;
        }

        if c.is_ascii_digit() {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '_'))
                .unwrap_or(rest.len());
            self.push(TokenKind::Number, self.pos + len);
            return;
        }

        if c == '"' || c == '\'' {
            match scan_string(bytes, self.pos, c as u8) {
                Some(end) => self.push(TokenKind::Str, end),
                None => self.push(TokenKind::Punct, self.pos + 1),
            }
            return;
        }

        if c == '`' {
            let end = scan_template(bytes, self.pos);
            self.push(TokenKind::Template, end);
            return;
        }

        let len = MULTI_PUNCT
            .iter()
            .find(|op| rest.starts_with(**op))
            .map_or(c.len_utf8(), |op| op.len());
        self.push(TokenKind::Punct, self.pos + len);
    }
}

/// Returns the offset just past the closing quote, or `None` if the line ends first.
fn scan_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn scan_template(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'$' if depth == 0 && bytes.get(i + 1) == Some(&b'{') => {
                depth = 1;
                i += 2;
                continue;
            }
            b'{' if depth > 0 => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'`' if depth == 0 => return i + 1,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Pairs every opening bracket with its closing partner.
///
/// Mismatched closers are tolerated: a closer pops the nearest opener of the same kind and
/// abandons any unclosed openers above it; a closer without an opener is ignored.
pub fn match_brackets(text: &str, tokens: &[Token]) -> Vec<Option<usize>> {
    let mut partner = vec![None; tokens.len()];
    let mut stack: Vec<(usize, &str)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Punct {
            continue;
        }
        let s = &text[token.range()];
        match s {
            "(" | "[" | "{" => stack.push((i, s)),
            ")" | "]" | "}" => {
                let open = match s {
                    ")" => "(",
                    "]" => "[",
                    _ => "{",
                };
                if let Some(depth) = stack.iter().rposition(|&(_, o)| o == open) {
                    let (j, _) = stack[depth];
                    stack.truncate(depth);
                    partner[i] = Some(j);
                    partner[j] = Some(i);
                }
            }
            _ => {}
        }
    }

    partner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<&str> {
        tokenize(text).iter().map(|t| &text[t.range()]).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            texts("if (isLoading && !isDark) { return 1; }"),
            vec!["if", "(", "isLoading", "&&", "!", "isDark", ")", "{", "return", "1", ";", "}"]
        );
    }

    #[test]
    fn test_tokenize_multi_punct() {
        assert_eq!(texts("a === b => c || d"), vec!["a", "===", "b", "=>", "c", "||", "d"]);
    }

    #[test]
    fn test_tokenize_comments_skipped() {
        assert_eq!(texts("a // comment\n/* block\n */ b"), vec!["a", "b"]);
    }

    #[test]
    fn test_tokenize_strings() {
        let toks = tokenize(r#"x = "a \" b"; y = 'c'"#);
        let strs: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Str).collect();
        assert_eq!(strs.len(), 2);
    }

    #[test]
    fn test_tokenize_jsx_apostrophe() {
        let src = "<p>Don't panic</p>\n{x}";
        assert_eq!(texts(src), vec!["<", "p", ">", "Don't panic", "<", "/", "p", ">", "{", "x", "}"]);
        assert_eq!(tokenize(src)[3].kind, TokenKind::Text);
    }

    #[test]
    fn test_tokenize_jsx_apostrophes_across_branches() {
        let src = "if (a) { return <p>Don't</p>; } else { return <p>It's</p>; }";
        let toks = texts(src);
        assert!(toks.contains(&"else"));
        assert!(toks.contains(&"Don't"));
        assert!(toks.contains(&"It's"));
        assert_eq!(toks.last(), Some(&"}"));
    }

    #[test]
    fn test_tokenize_jsx_url_is_not_a_comment() {
        let src = "<p>See https://docs.example.com</p><button onClick={() => setIsOpen(false)}>Close</button>";
        let toks = texts(src);
        assert!(toks.contains(&"See https://docs.example.com"));
        assert!(toks.contains(&"setIsOpen"));
        assert!(toks.contains(&"Close"));
    }

    #[test]
    fn test_tokenize_jsx_attributes_and_nesting() {
        let src = r#"return (<div className='x'><b>{n > 1 ? <i/> : "one"}</b></div>);"#;
        assert_eq!(
            texts(src),
            vec![
                "return", "(", "<", "div", "className", "=", "'x'", ">", "<", "b", ">", "{", "n", ">", "1", "?", "<",
                "i", "/", ">", ":", "\"one\"", "}", "<", "/", "b", ">", "<", "/", "div", ">", ")", ";"
            ]
        );
    }

    #[test]
    fn test_tokenize_fragment() {
        assert_eq!(texts("<>hi</> x"), vec!["<", ">", "hi", "<", "/", ">", "x"]);
    }

    #[test]
    fn test_tokenize_comparisons_and_generics_are_code() {
        assert_eq!(
            texts("useState<boolean>(false); a < b; if (x<y) {}"),
            vec![
                "useState", "<", "boolean", ">", "(", "false", ")", ";", "a", "<", "b", ";", "if", "(", "x", "<", "y",
                ")", "{", "}"
            ]
        );
    }

    #[test]
    fn test_tokenize_misread_element_recovers() {
        assert_eq!(texts("x = <d; y = 'z';"), vec!["x", "=", "<", "d", ";", "y", "=", "'z'", ";"]);
    }

    #[test]
    fn test_tokenize_template() {
        let src = "`a ${ {b: 1}.b } c` d";
        let toks = tokenize(src);
        assert_eq!(toks[0].kind, TokenKind::Template);
        assert_eq!(&src[toks[1].range()], "d");
    }

    #[test]
    fn test_match_brackets() {
        let src = "f(a[1], { b })";
        let toks = tokenize(src);
        let partner = match_brackets(src, &toks);
        assert_eq!(partner[1], Some(toks.len() - 1));
        assert_eq!(partner[3], Some(5));
    }

    #[test]
    fn test_match_brackets_tolerant() {
        let src = "{ ( }";
        let toks = tokenize(src);
        let partner = match_brackets(src, &toks);
        assert_eq!(partner[0], Some(2));
        assert_eq!(partner[1], None);
    }
}
