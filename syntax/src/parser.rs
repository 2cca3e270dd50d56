use crate::kind::{NodeKind, TokenKind};
use crate::lexer::{lex, LexedToken};
use crate::tree::{SyntaxTree, TreeBuilder};

/// Parses `text` into a [`SyntaxTree`]. Tolerant of malformed input: errors
/// are recorded as diagnostics and parsing continues.
pub fn parse(text: &str, path: &str) -> SyntaxTree {
    let (tokens, lex_diagnostics) = lex(text);
    let mut parser = Parser {
        tokens,
        pos: 0,
        b: TreeBuilder::new(),
    };
    let root = parser.chunk();
    parser
        .b
        .finish(text.to_string(), path.to_string(), root, lex_diagnostics)
}

struct Parser {
    tokens: Vec<LexedToken>,
    pos: usize,
    b: TreeBuilder,
}

impl Parser {
    fn cur(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur() == kind
    }

    fn bump(&mut self) {
        let tok = self.tokens[self.pos].clone();
        self.b.token(tok.kind, tok.range, tok.full_start, tok.trivia);
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) {
        if self.at(kind) {
            self.bump();
        } else {
            self.error_here(format!("expected {what}"));
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.tokens[self.pos].range;
        self.b.error(message, range);
    }

    fn chunk(&mut self) -> crate::tree::NodeId {
        let root = self.b.start_node(NodeKind::Chunk);
        self.block(true);
        self.bump(); // Eof
        self.b.finish_node();
        root
    }

    fn block(&mut self, top_level: bool) {
        self.b.start_node(NodeKind::Block);
        loop {
            match self.cur() {
                TokenKind::Eof => break,
                TokenKind::EndKw | TokenKind::ElseKw | TokenKind::ElseifKw | TokenKind::UntilKw => {
                    if top_level {
                        self.error_here("unexpected token");
                        self.bump();
                    } else {
                        break;
                    }
                }
                TokenKind::ReturnKw => {
                    // `return` must be the last statement of a block.
                    self.return_stmt();
                    if !top_level {
                        break;
                    }
                }
                _ => self.stmt(),
            }
        }
        self.b.finish_node();
    }

    fn stmt(&mut self) {
        match self.cur() {
            TokenKind::Semicolon => self.bump(),
            TokenKind::LocalKw => self.local_stmt(),
            TokenKind::IfKw => self.if_stmt(),
            TokenKind::WhileKw => {
                self.b.start_node(NodeKind::WhileStmt);
                self.bump();
                self.expr();
                self.expect(TokenKind::DoKw, "`do`");
                self.block(false);
                self.expect(TokenKind::EndKw, "`end`");
                self.b.finish_node();
            }
            TokenKind::DoKw => {
                self.b.start_node(NodeKind::DoStmt);
                self.bump();
                self.block(false);
                self.expect(TokenKind::EndKw, "`end`");
                self.b.finish_node();
            }
            TokenKind::ForKw => self.for_stmt(),
            TokenKind::RepeatKw => {
                self.b.start_node(NodeKind::RepeatStmt);
                self.bump();
                self.block(false);
                self.expect(TokenKind::UntilKw, "`until`");
                self.expr();
                self.b.finish_node();
            }
            TokenKind::FunctionKw => self.function_decl(),
            TokenKind::BreakKw => {
                self.b.start_node(NodeKind::BreakStmt);
                self.bump();
                self.b.finish_node();
            }
            TokenKind::GotoKw => {
                self.b.start_node(NodeKind::GotoStmt);
                self.bump();
                if self.at(TokenKind::Name) {
                    self.bump();
                } else {
                    self.error_here("expected label name after `goto`");
                }
                self.b.finish_node();
            }
            TokenKind::ColonColon => {
                self.b.start_node(NodeKind::LabelStmt);
                self.bump();
                if self.at(TokenKind::Name) {
                    self.bump();
                } else {
                    self.error_here("expected label name");
                }
                self.expect(TokenKind::ColonColon, "`::`");
                self.b.finish_node();
            }
            _ => self.expr_stmt(),
        }
    }

    fn return_stmt(&mut self) {
        self.b.start_node(NodeKind::ReturnStmt);
        self.bump();
        if !matches!(
            self.cur(),
            TokenKind::Eof
                | TokenKind::EndKw
                | TokenKind::ElseKw
                | TokenKind::ElseifKw
                | TokenKind::UntilKw
                | TokenKind::Semicolon
        ) {
            self.expr_list();
        }
        if self.at(TokenKind::Semicolon) {
            self.bump();
        }
        self.b.finish_node();
    }

    fn local_stmt(&mut self) {
        if self.nth(1) == TokenKind::FunctionKw {
            self.b.start_node(NodeKind::LocalFunctionDeclStmt);
            self.bump(); // local
            self.bump(); // function
            self.name_expr();
            self.function_body();
            self.b.finish_node();
            return;
        }
        self.b.start_node(NodeKind::LocalDeclStmt);
        self.bump(); // local
        self.name_expr();
        self.attrib();
        while self.at(TokenKind::Comma) {
            self.bump();
            self.name_expr();
            self.attrib();
        }
        if self.at(TokenKind::Assign) {
            self.bump();
            self.expr_list();
        }
        self.b.finish_node();
    }

    /// Lua 5.4 `<const>` / `<close>` attribute after a local name.
    fn attrib(&mut self) {
        if self.at(TokenKind::Lt) {
            self.bump();
            self.expect(TokenKind::Name, "attribute name");
            self.expect(TokenKind::Gt, "`>`");
        }
    }

    fn name_expr(&mut self) {
        if self.at(TokenKind::Name) {
            self.b.start_node(NodeKind::NameExpr);
            self.bump();
            self.b.finish_node();
        } else {
            self.error_here("expected name");
        }
    }

    fn function_decl(&mut self) {
        self.b.start_node(NodeKind::FunctionDeclStmt);
        self.bump(); // function
        self.b.start_node(NodeKind::FunctionName);
        self.name_expr();
        while self.at(TokenKind::Dot) {
            self.bump();
            if self.at(TokenKind::Name) {
                self.bump();
            } else {
                self.error_here("expected name after `.`");
                break;
            }
        }
        if self.at(TokenKind::Colon) {
            self.bump();
            if self.at(TokenKind::Name) {
                self.bump();
            } else {
                self.error_here("expected method name after `:`");
            }
        }
        self.b.finish_node();
        self.function_body();
        self.b.finish_node();
    }

    fn function_body(&mut self) {
        self.b.start_node(NodeKind::FunctionBody);
        self.b.start_node(NodeKind::ParamList);
        self.expect(TokenKind::LParen, "`(`");
        if !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            loop {
                if self.at(TokenKind::Ellipsis) {
                    self.bump();
                } else if self.at(TokenKind::Name) {
                    self.name_expr();
                } else {
                    self.error_here("expected parameter name");
                    break;
                }
                if self.at(TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`");
        self.b.finish_node();
        self.block(false);
        self.expect(TokenKind::EndKw, "`end`");
        self.b.finish_node();
    }

    fn for_stmt(&mut self) {
        if self.nth(1) == TokenKind::Name && self.nth(2) == TokenKind::Assign {
            self.b.start_node(NodeKind::NumericForStmt);
            self.bump(); // for
            self.name_expr();
            self.bump(); // =
            self.expr();
            self.expect(TokenKind::Comma, "`,`");
            self.expr();
            if self.at(TokenKind::Comma) {
                self.bump();
                self.expr();
            }
            self.expect(TokenKind::DoKw, "`do`");
            self.block(false);
            self.expect(TokenKind::EndKw, "`end`");
            self.b.finish_node();
        } else {
            self.b.start_node(NodeKind::GenericForStmt);
            self.bump(); // for
            self.name_expr();
            while self.at(TokenKind::Comma) {
                self.bump();
                self.name_expr();
            }
            self.expect(TokenKind::InKw, "`in`");
            self.expr_list();
            self.expect(TokenKind::DoKw, "`do`");
            self.block(false);
            self.expect(TokenKind::EndKw, "`end`");
            self.b.finish_node();
        }
    }

    fn if_stmt(&mut self) {
        self.b.start_node(NodeKind::IfStmt);
        self.bump(); // if
        self.expr();
        self.expect(TokenKind::ThenKw, "`then`");
        self.block(false);
        while self.at(TokenKind::ElseifKw) {
            self.b.start_node(NodeKind::ElseifClause);
            self.bump();
            self.expr();
            self.expect(TokenKind::ThenKw, "`then`");
            self.block(false);
            self.b.finish_node();
        }
        if self.at(TokenKind::ElseKw) {
            self.b.start_node(NodeKind::ElseClause);
            self.bump();
            self.block(false);
            self.b.finish_node();
        }
        self.expect(TokenKind::EndKw, "`end`");
        self.b.finish_node();
    }

    fn expr_stmt(&mut self) {
        if !matches!(self.cur(), TokenKind::Name | TokenKind::LParen) {
            self.error_here("unexpected token");
            self.bump();
            return;
        }
        let cp = self.b.checkpoint();
        let kind = self.suffixed_expr();
        if self.at(TokenKind::Assign) || self.at(TokenKind::Comma) {
            self.b.start_node_at(cp, NodeKind::AssignStmt);
            while self.at(TokenKind::Comma) {
                self.bump();
                if matches!(self.cur(), TokenKind::Name | TokenKind::LParen) {
                    self.suffixed_expr();
                } else {
                    self.error_here("expected assignment target");
                    break;
                }
            }
            self.expect(TokenKind::Assign, "`=`");
            self.expr_list();
            self.b.finish_node();
        } else if matches!(kind, NodeKind::CallExpr | NodeKind::MethodCallExpr) {
            self.b.start_node_at(cp, NodeKind::CallStmt);
            self.b.finish_node();
        } else {
            self.b.start_node_at(cp, NodeKind::ExprStmt);
            self.b.finish_node();
            self.error_here("syntax error: expression is not a statement");
        }
    }

    /// prefixexp with `.name`, `[e]`, `:m(args)` and call suffixes.
    /// Returns the kind of the outermost parsed node.
    fn suffixed_expr(&mut self) -> NodeKind {
        let cp = self.b.checkpoint();
        let mut kind = match self.cur() {
            TokenKind::Name => {
                self.name_expr();
                NodeKind::NameExpr
            }
            TokenKind::LParen => {
                self.b.start_node(NodeKind::ParenExpr);
                self.bump();
                self.expr();
                self.expect(TokenKind::RParen, "`)`");
                self.b.finish_node();
                NodeKind::ParenExpr
            }
            _ => unreachable!("suffixed_expr called on a non-prefix token"),
        };
        loop {
            match self.cur() {
                TokenKind::Dot => {
                    self.b.start_node_at(cp, NodeKind::MemberExpr);
                    self.bump();
                    if self.at(TokenKind::Name) {
                        self.bump();
                    } else {
                        self.error_here("expected member name after `.`");
                    }
                    self.b.finish_node();
                    kind = NodeKind::MemberExpr;
                }
                TokenKind::LBracket => {
                    self.b.start_node_at(cp, NodeKind::IndexExpr);
                    self.bump();
                    self.expr();
                    self.expect(TokenKind::RBracket, "`]`");
                    self.b.finish_node();
                    kind = NodeKind::IndexExpr;
                }
                TokenKind::Colon => {
                    self.b.start_node_at(cp, NodeKind::MethodCallExpr);
                    self.bump();
                    if self.at(TokenKind::Name) {
                        self.bump();
                    } else {
                        self.error_here("expected method name after `:`");
                    }
                    self.call_args();
                    self.b.finish_node();
                    kind = NodeKind::MethodCallExpr;
                }
                TokenKind::LParen | TokenKind::Str | TokenKind::LBrace => {
                    self.b.start_node_at(cp, NodeKind::CallExpr);
                    self.call_args();
                    self.b.finish_node();
                    kind = NodeKind::CallExpr;
                }
                _ => break,
            }
        }
        kind
    }

    fn call_args(&mut self) {
        self.b.start_node(NodeKind::ArgList);
        match self.cur() {
            TokenKind::Str => {
                self.b.start_node(NodeKind::Literal);
                self.bump();
                self.b.finish_node();
            }
            TokenKind::LBrace => self.table_expr(),
            _ => {
                self.expect(TokenKind::LParen, "`(`");
                if !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                    self.expr_list();
                }
                self.expect(TokenKind::RParen, "`)`");
            }
        }
        self.b.finish_node();
    }

    fn expr_list(&mut self) {
        self.expr();
        while self.at(TokenKind::Comma) {
            self.bump();
            self.expr();
        }
    }

    fn expr(&mut self) {
        self.expr_bp(0);
    }

    fn expr_bp(&mut self, min_bp: u8) {
        let cp = self.b.checkpoint();
        match self.cur() {
            TokenKind::NotKw | TokenKind::Minus | TokenKind::Hash | TokenKind::Tilde => {
                self.b.start_node(NodeKind::UnaryExpr);
                self.bump();
                self.expr_bp(UNARY_BP);
                self.b.finish_node();
            }
            TokenKind::NilKw
            | TokenKind::TrueKw
            | TokenKind::FalseKw
            | TokenKind::Number
            | TokenKind::Str => {
                self.b.start_node(NodeKind::Literal);
                self.bump();
                self.b.finish_node();
            }
            TokenKind::Ellipsis => {
                self.b.start_node(NodeKind::VarargExpr);
                self.bump();
                self.b.finish_node();
            }
            TokenKind::FunctionKw => {
                self.b.start_node(NodeKind::FunctionExpr);
                self.bump();
                self.function_body();
                self.b.finish_node();
            }
            TokenKind::LBrace => self.table_expr(),
            TokenKind::Name | TokenKind::LParen => {
                self.suffixed_expr();
            }
            _ => {
                self.error_here("expected expression");
                return;
            }
        }
        loop {
            let Some((lbp, rbp)) = binary_bp(self.cur()) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            self.b.start_node_at(cp, NodeKind::BinaryExpr);
            self.bump(); // the operator token
            self.expr_bp(rbp);
            self.b.finish_node();
        }
    }

    fn table_expr(&mut self) {
        self.b.start_node(NodeKind::TableExpr);
        self.expect(TokenKind::LBrace, "`{`");
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            self.table_field();
            if self.at(TokenKind::Comma) || self.at(TokenKind::Semicolon) {
                self.bump();
            } else if self.pos == before {
                self.error_here("unexpected token in table constructor");
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "`}`");
        self.b.finish_node();
    }

    fn table_field(&mut self) {
        match self.cur() {
            TokenKind::RBrace | TokenKind::Eof => {}
            TokenKind::LBracket => {
                self.b.start_node(NodeKind::TableField);
                self.bump();
                self.expr();
                self.expect(TokenKind::RBracket, "`]`");
                self.expect(TokenKind::Assign, "`=`");
                self.expr();
                self.b.finish_node();
            }
            TokenKind::Name if self.nth(1) == TokenKind::Assign => {
                self.b.start_node(NodeKind::TableField);
                self.bump(); // the key, not a variable reference
                self.bump(); // =
                self.expr();
                self.b.finish_node();
            }
            _ => {
                self.b.start_node(NodeKind::TableField);
                self.expr();
                self.b.finish_node();
            }
        }
    }
}

const UNARY_BP: u8 = 21;

fn binary_bp(kind: TokenKind) -> Option<(u8, u8)> {
    Some(match kind {
        TokenKind::OrKw => (1, 2),
        TokenKind::AndKw => (3, 4),
        TokenKind::Lt
        | TokenKind::Gt
        | TokenKind::LtEq
        | TokenKind::GtEq
        | TokenKind::TildeEq
        | TokenKind::EqEq => (5, 6),
        TokenKind::Pipe => (7, 8),
        TokenKind::Tilde => (9, 10),
        TokenKind::Ampersand => (11, 12),
        TokenKind::LtLt | TokenKind::GtGt => (13, 14),
        TokenKind::DotDot => (16, 15), // right-associative
        TokenKind::Plus | TokenKind::Minus => (17, 18),
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent => (19, 20),
        TokenKind::Caret => (22, 21), // right-associative
        _ => return None,
    })
}
