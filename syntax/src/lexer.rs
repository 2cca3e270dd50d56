use crate::kind::{keyword, TokenKind, TriviaKind};
use crate::source::TextRange;
use crate::tree::{Diagnostic, Trivia};

#[derive(Debug, Clone)]
pub struct LexedToken {
    pub kind: TokenKind,
    pub range: TextRange,
    pub full_start: usize,
    pub trivia: Vec<Trivia>,
}

/// Splits `text` into tokens with leading trivia. Always terminates with an
/// `Eof` token so every offset in the document maps to some token.
pub fn lex(text: &str) -> (Vec<LexedToken>, Vec<Diagnostic>) {
    let mut lexer = Lexer {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        diagnostics: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.diagnostics)
}

struct Lexer<'t> {
    text: &'t str,
    bytes: &'t [u8],
    pos: usize,
    tokens: Vec<LexedToken>,
    diagnostics: Vec<Diagnostic>,
}

impl<'t> Lexer<'t> {
    fn run(&mut self) {
        loop {
            let full_start = self.pos;
            let trivia = self.trivia();
            let start = self.pos;
            if self.pos >= self.bytes.len() {
                self.tokens.push(LexedToken {
                    kind: TokenKind::Eof,
                    range: TextRange::empty(start),
                    full_start,
                    trivia,
                });
                return;
            }
            let kind = self.token();
            self.tokens.push(LexedToken {
                kind,
                range: TextRange::new(start, self.pos),
                full_start,
                trivia,
            });
        }
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, n: usize) -> u8 {
        self.bytes.get(self.pos + n).copied().unwrap_or(0)
    }

    fn trivia(&mut self) -> Vec<Trivia> {
        let mut out = Vec::new();
        loop {
            let start = self.pos;
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C => {
                    while matches!(self.peek(), b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C) && self.pos < self.bytes.len()
                    {
                        self.pos += 1;
                    }
                    out.push(Trivia {
                        kind: TriviaKind::Whitespace,
                        range: TextRange::new(start, self.pos),
                    });
                }
                b'#' if start == 0 && self.peek_at(1) == b'!' => {
                    while self.pos < self.bytes.len() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                    out.push(Trivia {
                        kind: TriviaKind::Shebang,
                        range: TextRange::new(start, self.pos),
                    });
                }
                b'-' if self.peek_at(1) == b'-' => {
                    self.pos += 2;
                    if self.peek() == b'[' {
                        if let Some(level) = self.long_bracket_level() {
                            let closed = self.long_bracket_body(level);
                            if !closed {
                                self.diagnostics.push(Diagnostic {
                                    message: "unterminated multi-line comment".to_string(),
                                    range: TextRange::new(start, self.pos),
                                });
                            }
                            out.push(Trivia {
                                kind: TriviaKind::BlockComment,
                                range: TextRange::new(start, self.pos),
                            });
                            continue;
                        }
                    }
                    while self.pos < self.bytes.len() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                    out.push(Trivia {
                        kind: TriviaKind::LineComment,
                        range: TextRange::new(start, self.pos),
                    });
                }
                _ => return out,
            }
        }
    }

    /// At a `[` that may open a long bracket: consumes `[=*[` and returns the
    /// level, or consumes nothing and returns `None`.
    fn long_bracket_level(&mut self) -> Option<usize> {
        debug_assert_eq!(self.peek(), b'[');
        let mut level = 0;
        while self.peek_at(level + 1) == b'=' {
            level += 1;
        }
        if self.peek_at(level + 1) == b'[' {
            self.pos += level + 2;
            Some(level)
        } else {
            None
        }
    }

    /// Consumes up to and including the matching `]=*]`. Returns whether the
    /// closer was found.
    fn long_bracket_body(&mut self, level: usize) -> bool {
        while self.pos < self.bytes.len() {
            if self.peek() == b']' {
                let mut eqs = 0;
                while self.peek_at(eqs + 1) == b'=' {
                    eqs += 1;
                }
                if eqs == level && self.peek_at(eqs + 1) == b']' {
                    self.pos += eqs + 2;
                    return true;
                }
            }
            self.pos += 1;
        }
        false
    }

    fn token(&mut self) -> TokenKind {
        let start = self.pos;
        let c = self.peek();
        match c {
            b'"' | b'\'' => self.string(c),
            b'[' => {
                if self.peek_at(1) == b'[' || self.peek_at(1) == b'=' {
                    if let Some(level) = self.long_bracket_level() {
                        if !self.long_bracket_body(level) {
                            self.diagnostics.push(Diagnostic {
                                message: "unterminated long string".to_string(),
                                range: TextRange::new(start, self.pos),
                            });
                        }
                        return TokenKind::Str;
                    }
                }
                self.pos += 1;
                TokenKind::LBracket
            }
            b'0'..=b'9' => self.number(),
            b'.' if self.peek_at(1).is_ascii_digit() => self.number(),
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while {
                    let b = self.peek();
                    b == b'_' || b.is_ascii_alphanumeric()
                } {
                    self.pos += 1;
                }
                keyword(&self.text[start..self.pos]).unwrap_or(TokenKind::Name)
            }
            _ => self.symbol(),
        }
    }

    fn string(&mut self, quote: u8) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.peek() {
                b'\\' => {
                    self.pos += 2.min(self.bytes.len() - self.pos);
                }
                b'\n' => break,
                c if c == quote => {
                    self.pos += 1;
                    return TokenKind::Str;
                }
                _ => self.pos += 1,
            }
        }
        self.diagnostics.push(Diagnostic {
            message: "unterminated string".to_string(),
            range: TextRange::new(start, self.pos),
        });
        TokenKind::Str
    }

    fn number(&mut self) -> TokenKind {
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
            self.pos += 2;
            while self.peek().is_ascii_hexdigit() || self.peek() == b'.' {
                self.pos += 1;
            }
            if matches!(self.peek(), b'p' | b'P') {
                self.pos += 1;
                if matches!(self.peek(), b'+' | b'-') {
                    self.pos += 1;
                }
                while self.peek().is_ascii_digit() {
                    self.pos += 1;
                }
            }
            return TokenKind::Number;
        }
        while self.peek().is_ascii_digit() || self.peek() == b'.' {
            self.pos += 1;
        }
        if matches!(self.peek(), b'e' | b'E') {
            self.pos += 1;
            if matches!(self.peek(), b'+' | b'-') {
                self.pos += 1;
            }
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        TokenKind::Number
    }

    fn symbol(&mut self) -> TokenKind {
        let start = self.pos;
        let one = self.peek();
        let two = self.peek_at(1);
        let three = self.peek_at(2);
        let (kind, len) = match (one, two, three) {
            (b'.', b'.', b'.') => (TokenKind::Ellipsis, 3),
            (b'.', b'.', _) => (TokenKind::DotDot, 2),
            (b'.', _, _) => (TokenKind::Dot, 1),
            (b':', b':', _) => (TokenKind::ColonColon, 2),
            (b':', _, _) => (TokenKind::Colon, 1),
            (b'=', b'=', _) => (TokenKind::EqEq, 2),
            (b'=', _, _) => (TokenKind::Assign, 1),
            (b'~', b'=', _) => (TokenKind::TildeEq, 2),
            (b'~', _, _) => (TokenKind::Tilde, 1),
            (b'<', b'=', _) => (TokenKind::LtEq, 2),
            (b'<', b'<', _) => (TokenKind::LtLt, 2),
            (b'<', _, _) => (TokenKind::Lt, 1),
            (b'>', b'=', _) => (TokenKind::GtEq, 2),
            (b'>', b'>', _) => (TokenKind::GtGt, 2),
            (b'>', _, _) => (TokenKind::Gt, 1),
            (b'/', b'/', _) => (TokenKind::SlashSlash, 2),
            (b'/', _, _) => (TokenKind::Slash, 1),
            (b'+', _, _) => (TokenKind::Plus, 1),
            (b'-', _, _) => (TokenKind::Minus, 1),
            (b'*', _, _) => (TokenKind::Star, 1),
            (b'%', _, _) => (TokenKind::Percent, 1),
            (b'^', _, _) => (TokenKind::Caret, 1),
            (b'#', _, _) => (TokenKind::Hash, 1),
            (b'&', _, _) => (TokenKind::Ampersand, 1),
            (b'|', _, _) => (TokenKind::Pipe, 1),
            (b'(', _, _) => (TokenKind::LParen, 1),
            (b')', _, _) => (TokenKind::RParen, 1),
            (b'{', _, _) => (TokenKind::LBrace, 1),
            (b'}', _, _) => (TokenKind::RBrace, 1),
            (b']', _, _) => (TokenKind::RBracket, 1),
            (b';', _, _) => (TokenKind::Semicolon, 1),
            (b',', _, _) => (TokenKind::Comma, 1),
            _ => {
                // Skip a whole UTF-8 scalar so we never split a character.
                let ch_len = self.text[self.pos..].chars().next().map_or(1, |c| c.len_utf8());
                self.diagnostics.push(Diagnostic {
                    message: format!("unexpected character `{}`", &self.text[start..start + ch_len]),
                    range: TextRange::new(start, start + ch_len),
                });
                (TokenKind::Unknown, ch_len)
            }
        };
        self.pos += len;
        kind
    }
}
