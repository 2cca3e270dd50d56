/// Lexical token kinds for Lua 5.4 source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Number,
    Str,
    // Keywords
    AndKw,
    BreakKw,
    DoKw,
    ElseKw,
    ElseifKw,
    EndKw,
    FalseKw,
    ForKw,
    FunctionKw,
    GotoKw,
    IfKw,
    InKw,
    LocalKw,
    NilKw,
    NotKw,
    OrKw,
    RepeatKw,
    ReturnKw,
    ThenKw,
    TrueKw,
    UntilKw,
    WhileKw,
    // Symbols
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    Caret,
    Hash,
    Ampersand,
    Tilde,
    Pipe,
    LtLt,
    GtGt,
    EqEq,
    TildeEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Assign,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    ColonColon,
    Semicolon,
    Colon,
    Comma,
    Dot,
    DotDot,
    Ellipsis,
    Eof,
    Unknown,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::AndKw
                | TokenKind::BreakKw
                | TokenKind::DoKw
                | TokenKind::ElseKw
                | TokenKind::ElseifKw
                | TokenKind::EndKw
                | TokenKind::FalseKw
                | TokenKind::ForKw
                | TokenKind::FunctionKw
                | TokenKind::GotoKw
                | TokenKind::IfKw
                | TokenKind::InKw
                | TokenKind::LocalKw
                | TokenKind::NilKw
                | TokenKind::NotKw
                | TokenKind::OrKw
                | TokenKind::RepeatKw
                | TokenKind::ReturnKw
                | TokenKind::ThenKw
                | TokenKind::TrueKw
                | TokenKind::UntilKw
                | TokenKind::WhileKw
        )
    }

    /// Tokens that are lexically unary or binary operators. Whether such a
    /// token actually acts as an operator depends on its syntactic parent.
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::SlashSlash
                | TokenKind::Percent
                | TokenKind::Caret
                | TokenKind::Hash
                | TokenKind::Ampersand
                | TokenKind::Tilde
                | TokenKind::Pipe
                | TokenKind::LtLt
                | TokenKind::GtGt
                | TokenKind::EqEq
                | TokenKind::TildeEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq
                | TokenKind::DotDot
        )
    }
}

pub fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "and" => TokenKind::AndKw,
        "break" => TokenKind::BreakKw,
        "do" => TokenKind::DoKw,
        "else" => TokenKind::ElseKw,
        "elseif" => TokenKind::ElseifKw,
        "end" => TokenKind::EndKw,
        "false" => TokenKind::FalseKw,
        "for" => TokenKind::ForKw,
        "function" => TokenKind::FunctionKw,
        "goto" => TokenKind::GotoKw,
        "if" => TokenKind::IfKw,
        "in" => TokenKind::InKw,
        "local" => TokenKind::LocalKw,
        "nil" => TokenKind::NilKw,
        "not" => TokenKind::NotKw,
        "or" => TokenKind::OrKw,
        "repeat" => TokenKind::RepeatKw,
        "return" => TokenKind::ReturnKw,
        "then" => TokenKind::ThenKw,
        "true" => TokenKind::TrueKw,
        "until" => TokenKind::UntilKw,
        "while" => TokenKind::WhileKw,
        _ => return None,
    })
}

/// Trivia attached to the front of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    LineComment,
    BlockComment,
    Shebang,
}

impl TriviaKind {
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TriviaKind::LineComment | TriviaKind::BlockComment | TriviaKind::Shebang
        )
    }
}

/// Syntactic node kinds. A closed set, consumed through exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Chunk,
    Block,
    // Statements
    LocalDeclStmt,
    LocalFunctionDeclStmt,
    FunctionDeclStmt,
    AssignStmt,
    CallStmt,
    DoStmt,
    WhileStmt,
    RepeatStmt,
    IfStmt,
    ElseifClause,
    ElseClause,
    NumericForStmt,
    GenericForStmt,
    ReturnStmt,
    BreakStmt,
    GotoStmt,
    LabelStmt,
    ExprStmt,
    // Function pieces
    FunctionName,
    FunctionBody,
    ParamList,
    // Expressions
    NameExpr,
    Literal,
    VarargExpr,
    FunctionExpr,
    ParenExpr,
    MemberExpr,
    IndexExpr,
    CallExpr,
    MethodCallExpr,
    ArgList,
    BinaryExpr,
    UnaryExpr,
    TableExpr,
    TableField,
}

impl NodeKind {
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::LocalDeclStmt
                | NodeKind::LocalFunctionDeclStmt
                | NodeKind::FunctionDeclStmt
                | NodeKind::AssignStmt
                | NodeKind::CallStmt
                | NodeKind::DoStmt
                | NodeKind::WhileStmt
                | NodeKind::RepeatStmt
                | NodeKind::IfStmt
                | NodeKind::NumericForStmt
                | NodeKind::GenericForStmt
                | NodeKind::ReturnStmt
                | NodeKind::BreakStmt
                | NodeKind::GotoStmt
                | NodeKind::LabelStmt
                | NodeKind::ExprStmt
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::NameExpr
                | NodeKind::Literal
                | NodeKind::VarargExpr
                | NodeKind::FunctionExpr
                | NodeKind::ParenExpr
                | NodeKind::MemberExpr
                | NodeKind::IndexExpr
                | NodeKind::CallExpr
                | NodeKind::MethodCallExpr
                | NodeKind::BinaryExpr
                | NodeKind::UnaryExpr
                | NodeKind::TableExpr
        )
    }
}
