//! Whitespace normalization. Re-emits the token stream of a node with
//! canonical spacing, one statement per line and block-based indentation,
//! then diffs the result against the original text.

use crate::kind::{NodeKind, TokenKind};
use crate::source::TextRange;
use crate::tree::{NodeId, SyntaxTree, TokenId};

/// A single text replacement, in byte offsets of the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub range: TextRange,
    pub text: String,
}

/// Renders `node` with normalized whitespace. The first line carries no
/// indentation; nested blocks indent relative to it.
pub fn normalize(tree: &SyntaxTree, node: NodeId, indent_unit: &str, eol: &str) -> String {
    let mut p = Printer {
        tree,
        indent_unit,
        lines: Vec::new(),
        cur: String::new(),
        cur_depth: 0,
        depth: 0,
        prev: None,
        prev_stmt: None,
    };
    for token in tree.tokens_of(node) {
        if tree.token_kind(token) == TokenKind::Eof {
            p.flush_trivia(token);
            continue;
        }
        p.emit(token);
    }
    let mut out = p.finish(eol);
    if tree.kind(node) == NodeKind::Chunk && !out.is_empty() {
        out.push_str(eol);
    }
    out
}

/// Minimal single-replacement diff between `old` and `new`, offset by
/// `base`. Empty when the texts already agree.
pub fn text_changes(old: &str, new: &str, base: usize) -> Vec<TextChange> {
    if old == new {
        return Vec::new();
    }
    let old_bytes = old.as_bytes();
    let new_bytes = new.as_bytes();
    let mut prefix = old_bytes
        .iter()
        .zip(new_bytes)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(prefix) {
        prefix -= 1;
    }
    let max_suffix = old.len().min(new.len()) - prefix;
    let mut suffix = old_bytes
        .iter()
        .rev()
        .zip(new_bytes.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(old.len() - suffix) {
        suffix -= 1;
    }
    vec![TextChange {
        range: TextRange::new(base + prefix, base + old.len() - suffix),
        text: new[prefix..new.len() - suffix].to_string(),
    }]
}

struct Printer<'t> {
    tree: &'t SyntaxTree,
    indent_unit: &'t str,
    lines: Vec<String>,
    cur: String,
    cur_depth: usize,
    depth: usize,
    prev: Option<TokenId>,
    prev_stmt: Option<NodeId>,
}

impl<'t> Printer<'t> {
    fn emit(&mut self, token: TokenId) {
        let kind = self.tree.token_kind(token);
        match kind {
            TokenKind::EndKw | TokenKind::UntilKw | TokenKind::ElseKw | TokenKind::ElseifKw => {
                self.depth = self.depth.saturating_sub(1);
                self.newline();
                self.prev_stmt = self.stmt_of(token);
            }
            TokenKind::Semicolon => {}
            _ => {
                let stmt = self.stmt_of(token);
                if stmt.is_some() && stmt != self.prev_stmt {
                    self.newline();
                }
                self.prev_stmt = stmt;
            }
        }
        self.flush_trivia(token);
        let text = self.tree.token_text(token);
        if !self.cur.is_empty() && self.space_before(token) {
            self.cur.push(' ');
        }
        self.cur.push_str(text);
        match kind {
            TokenKind::DoKw | TokenKind::ThenKw | TokenKind::ElseKw | TokenKind::RepeatKw => {
                self.depth += 1;
                self.newline();
            }
            TokenKind::RParen
                if self
                    .tree
                    .token_parent(token)
                    .map(|p| self.tree.kind(p) == NodeKind::ParamList)
                    .unwrap_or(false) =>
            {
                self.depth += 1;
                self.newline();
            }
            _ => {}
        }
        self.prev = Some(token);
    }

    /// Comments survive normalization, each on its own line. Other trivia
    /// is discarded.
    fn flush_trivia(&mut self, token: TokenId) {
        let comments: Vec<TextRange> = self
            .tree
            .token_trivia(token)
            .iter()
            .filter(|t| t.kind.is_comment())
            .map(|t| t.range)
            .collect();
        for range in comments {
            self.newline();
            self.cur
                .push_str(&self.tree.text()[range.start..range.end]);
            self.newline();
        }
    }

    fn newline(&mut self) {
        if self.cur.is_empty() {
            self.cur_depth = self.depth;
            return;
        }
        let mut line = self.indent_unit.repeat(self.cur_depth);
        line.push_str(self.cur.trim_end());
        self.lines.push(line);
        self.cur.clear();
        self.cur_depth = self.depth;
    }

    fn finish(mut self, eol: &str) -> String {
        self.newline();
        self.lines.join(eol)
    }

    fn stmt_of(&self, token: TokenId) -> Option<NodeId> {
        let mut node = self.tree.token_parent(token);
        while let Some(n) = node {
            if self.tree.kind(n).is_statement() {
                return Some(n);
            }
            node = self.tree.parent(n);
        }
        None
    }

    fn space_before(&self, token: TokenId) -> bool {
        let Some(prev) = self.prev else {
            return false;
        };
        let prev_kind = self.tree.token_kind(prev);
        let kind = self.tree.token_kind(token);
        match kind {
            TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::Dot
            | TokenKind::Colon
            | TokenKind::ColonColon => return false,
            TokenKind::LParen | TokenKind::LBracket => {
                if matches!(
                    prev_kind,
                    TokenKind::Name
                        | TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::Str
                        | TokenKind::FunctionKw
                ) {
                    return false;
                }
            }
            TokenKind::RBrace => {
                if prev_kind == TokenKind::LBrace {
                    return false;
                }
            }
            _ => {}
        }
        match prev_kind {
            TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Dot
            | TokenKind::Colon
            | TokenKind::ColonColon => return false,
            TokenKind::Minus | TokenKind::Hash | TokenKind::Tilde => {
                // Unary operators stick to their operand.
                if self
                    .tree
                    .token_parent(prev)
                    .map(|p| self.tree.kind(p) == NodeKind::UnaryExpr)
                    .unwrap_or(false)
                {
                    return false;
                }
            }
            _ => {}
        }
        true
    }
}
