use crate::kind::{NodeKind, TokenKind, TriviaKind};
use crate::source::{LineIndex, TextRange};

/// Index of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Index of a token in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub range: TextRange,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone)]
pub struct TokenData {
    pub kind: TokenKind,
    pub range: TextRange,
    /// Start of the token including its leading trivia.
    pub full_start: usize,
    pub parent: Option<NodeId>,
    pub trivia: Vec<Trivia>,
}

/// A parse problem reported against a span of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub range: TextRange,
}

/// An immutable parsed file: the full token sequence, the node arena and the
/// line-break index of the source text. Never mutated after construction;
/// edits produce a whole new tree.
#[derive(Debug)]
pub struct SyntaxTree {
    path: String,
    text: String,
    line_index: LineIndex,
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
    diagnostics: Vec<Diagnostic>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes[node.0 as usize].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0 as usize].parent
    }

    pub fn range(&self, node: NodeId) -> TextRange {
        self.nodes[node.0 as usize].range
    }

    pub fn children(&self, node: NodeId) -> &[Element] {
        &self.nodes[node.0 as usize].children
    }

    pub fn child_nodes(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node).iter().filter_map(|el| match el {
            Element::Node(n) => Some(*n),
            Element::Token(_) => None,
        })
    }

    pub fn child_tokens(&self, node: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        self.children(node).iter().filter_map(|el| match el {
            Element::Token(t) => Some(*t),
            Element::Node(_) => None,
        })
    }

    pub fn node_text(&self, node: NodeId) -> &str {
        let range = self.range(node);
        &self.text[range.start..range.end]
    }

    pub fn token_kind(&self, token: TokenId) -> TokenKind {
        self.tokens[token.0 as usize].kind
    }

    pub fn token_range(&self, token: TokenId) -> TextRange {
        self.tokens[token.0 as usize].range
    }

    pub fn token_parent(&self, token: TokenId) -> Option<NodeId> {
        self.tokens[token.0 as usize].parent
    }

    pub fn token_text(&self, token: TokenId) -> &str {
        let range = self.token_range(token);
        &self.text[range.start..range.end]
    }

    pub fn token_trivia(&self, token: TokenId) -> &[Trivia] {
        &self.tokens[token.0 as usize].trivia
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// The token whose full span (leading trivia included) covers `offset`.
    /// Offsets past the last token land on the end-of-file token.
    pub fn token_at_offset(&self, offset: usize) -> Option<TokenId> {
        if self.tokens.is_empty() {
            return None;
        }
        let idx = self
            .tokens
            .partition_point(|tok| tok.full_start <= offset)
            .saturating_sub(1);
        Some(TokenId(idx as u32))
    }

    /// The token preceding `token` in the file, if any.
    pub fn previous_token(&self, token: TokenId) -> Option<TokenId> {
        token.0.checked_sub(1).map(TokenId)
    }

    /// The lowest node whose range contains `range` entirely.
    pub fn covering_node(&self, range: TextRange) -> NodeId {
        let mut current = self.root;
        'descend: loop {
            for child in self.child_nodes(current) {
                if self.range(child).contains_range(range) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Walks `node` and its ancestors, yielding `node` first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |&n| self.parent(n))
    }

    /// All tokens belonging to `node`'s subtree, in source order.
    pub fn tokens_of(&self, node: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        let range = self.range(node);
        let start = self.tokens.partition_point(|tok| tok.range.start < range.start);
        let end = self.tokens.partition_point(|tok| tok.range.start < range.end);
        (start..end).map(|i| TokenId(i as u32))
    }
}

/// Incremental tree construction used by the parser. Nodes are opened with
/// [`TreeBuilder::start_node`], filled with tokens and child nodes, then
/// closed with [`TreeBuilder::finish_node`].
pub(crate) struct TreeBuilder {
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
    stack: Vec<NodeId>,
    diagnostics: Vec<Diagnostic>,
    last_end: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint(usize);

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            tokens: Vec::new(),
            stack: Vec::new(),
            diagnostics: Vec::new(),
            last_end: 0,
        }
    }

    pub(crate) fn start_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            parent,
            range: TextRange::empty(self.last_end),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(Element::Node(id));
        }
        self.stack.push(id);
        id
    }

    /// Position marker inside the currently open node, for later wrapping
    /// with [`TreeBuilder::start_node_at`].
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        let top = *self.stack.last().expect("checkpoint outside of a node");
        Checkpoint(self.nodes[top.0 as usize].children.len())
    }

    /// Wraps everything added to the current node since `checkpoint` into a
    /// new node of `kind`, then leaves that node open.
    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) -> NodeId {
        let top = *self.stack.last().expect("start_node_at outside of a node");
        let moved: Vec<Element> = self.nodes[top.0 as usize].children.split_off(checkpoint.0);
        let id = NodeId(self.nodes.len() as u32);
        for el in &moved {
            match el {
                Element::Node(n) => self.nodes[n.0 as usize].parent = Some(id),
                Element::Token(t) => self.tokens[t.0 as usize].parent = Some(id),
            }
        }
        self.nodes.push(NodeData {
            kind,
            parent: Some(top),
            range: TextRange::empty(self.last_end),
            children: moved,
        });
        self.nodes[top.0 as usize].children.push(Element::Node(id));
        self.stack.push(id);
        id
    }

    pub(crate) fn finish_node(&mut self) {
        let id = self.stack.pop().expect("finish_node without start_node");
        let range = self.compute_range(id);
        self.nodes[id.0 as usize].range = range;
    }

    fn compute_range(&self, id: NodeId) -> TextRange {
        let node = &self.nodes[id.0 as usize];
        let mut range: Option<TextRange> = None;
        for child in &node.children {
            let child_range = match child {
                Element::Node(n) => self.nodes[n.0 as usize].range,
                Element::Token(t) => self.tokens[t.0 as usize].range,
            };
            range = Some(match range {
                Some(r) => TextRange::cover(r, child_range),
                None => child_range,
            });
        }
        range.unwrap_or_else(|| TextRange::empty(self.last_end))
    }

    pub(crate) fn token(&mut self, kind: TokenKind, range: TextRange, full_start: usize, trivia: Vec<Trivia>) {
        let parent = self.stack.last().copied();
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(TokenData {
            kind,
            range,
            full_start,
            parent,
            trivia,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(Element::Token(id));
        }
        self.last_end = range.end;
    }

    pub(crate) fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            range,
        });
    }

    pub(crate) fn finish(mut self, text: String, path: String, root: NodeId, mut lex_diagnostics: Vec<Diagnostic>) -> SyntaxTree {
        assert!(self.stack.is_empty(), "unbalanced tree builder");
        lex_diagnostics.append(&mut self.diagnostics);
        lex_diagnostics.sort_by_key(|d| (d.range.start, d.range.end));
        SyntaxTree {
            line_index: LineIndex::new(&text),
            path,
            text,
            nodes: self.nodes,
            tokens: self.tokens,
            diagnostics: lex_diagnostics,
            root,
        }
    }
}
