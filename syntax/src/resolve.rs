use std::collections::HashMap;

use crate::kind::{NodeKind, TokenKind};
use crate::tree::{Element, NodeId, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The implicit scope of a whole file. Acts as a function boundary:
    /// a file body is a vararg function.
    File,
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Global,
    Local,
    Parameter,
    Iteration,
    Function,
}

#[derive(Debug)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub node: NodeId,
    pub variables: Vec<VariableId>,
    pub labels: Vec<LabelId>,
    bindings: HashMap<String, VariableId>,
    label_bindings: HashMap<String, LabelId>,
}

#[derive(Debug)]
pub struct VariableData {
    pub name: String,
    pub kind: VariableKind,
    /// The `NameExpr` node of the declaration, when the variable is
    /// declared in this file. Globals have no declaration node.
    pub declaration: Option<NodeId>,
    /// `NameExpr` nodes that read the variable.
    pub reads: Vec<NodeId>,
    /// Statement nodes that write the variable.
    pub writes: Vec<NodeId>,
}

#[derive(Debug)]
pub struct LabelData {
    pub name: String,
    /// The `LabelStmt` node, when the label is declared.
    pub declaration: Option<NodeId>,
    /// `GotoStmt` nodes that jump to the label.
    pub jumps: Vec<NodeId>,
}

/// Name binding for one syntax tree. Built once per parse and immutable
/// afterwards.
#[derive(Debug)]
pub struct Resolution {
    pub scopes: Vec<ScopeData>,
    pub variables: Vec<VariableData>,
    pub labels: Vec<LabelData>,
    node_scopes: HashMap<NodeId, ScopeId>,
    variable_refs: HashMap<NodeId, VariableId>,
    label_refs: HashMap<NodeId, LabelId>,
}

impl Resolution {
    pub fn resolve(tree: &SyntaxTree) -> Resolution {
        let mut binder = Binder {
            tree,
            res: Resolution {
                scopes: Vec::new(),
                variables: Vec::new(),
                labels: Vec::new(),
                node_scopes: HashMap::new(),
                variable_refs: HashMap::new(),
                label_refs: HashMap::new(),
            },
            stack: Vec::new(),
            pending_gotos: Vec::new(),
        };
        binder.bind();
        binder.res
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    pub fn variable(&self, id: VariableId) -> &VariableData {
        &self.variables[id.0 as usize]
    }

    pub fn label(&self, id: LabelId) -> &LabelData {
        &self.labels[id.0 as usize]
    }

    /// The innermost scope containing `node`.
    pub fn scope_of(&self, tree: &SyntaxTree, node: NodeId) -> Option<ScopeId> {
        tree.ancestors(node)
            .find_map(|n| self.node_scopes.get(&n).copied())
    }

    /// The variable referenced by a `NameExpr` node, if any.
    pub fn variable_of(&self, node: NodeId) -> Option<VariableId> {
        self.variable_refs.get(&node).copied()
    }

    /// The label referenced by a `LabelStmt` or `GotoStmt` node, if any.
    pub fn label_of(&self, node: NodeId) -> Option<LabelId> {
        self.label_refs.get(&node).copied()
    }

    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }
}

struct Binder<'t> {
    tree: &'t SyntaxTree,
    res: Resolution,
    stack: Vec<ScopeId>,
    pending_gotos: Vec<(NodeId, ScopeId, String)>,
}

impl<'t> Binder<'t> {
    fn bind(&mut self) {
        let root = self.tree.root();
        let file = self.new_scope(ScopeKind::File, root);
        self.stack.push(file);
        for child in self.tree.child_nodes(root) {
            self.visit(child);
        }
        self.stack.pop();
        self.resolve_gotos();
    }

    fn new_scope(&mut self, kind: ScopeKind, node: NodeId) -> ScopeId {
        let id = ScopeId(self.res.scopes.len() as u32);
        self.res.scopes.push(ScopeData {
            kind,
            parent: self.stack.last().copied(),
            node,
            variables: Vec::new(),
            labels: Vec::new(),
            bindings: HashMap::new(),
            label_bindings: HashMap::new(),
        });
        self.res.node_scopes.insert(node, id);
        id
    }

    fn current(&self) -> ScopeId {
        *self.stack.last().unwrap()
    }

    fn scoped(&mut self, kind: ScopeKind, node: NodeId, f: impl FnOnce(&mut Self)) {
        let id = self.new_scope(kind, node);
        self.stack.push(id);
        f(self);
        self.stack.pop();
    }

    fn visit(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::Block => self.scoped(ScopeKind::Block, node, |b| {
                for child in b.tree.child_nodes(node) {
                    b.visit(child);
                }
            }),
            NodeKind::LocalDeclStmt => self.local_decl(node),
            NodeKind::LocalFunctionDeclStmt => self.local_function_decl(node),
            NodeKind::AssignStmt => self.assign(node),
            NodeKind::FunctionDeclStmt => self.function_decl(node),
            NodeKind::FunctionBody => self.function_body(node, false),
            NodeKind::FunctionExpr => {
                for child in self.tree.child_nodes(node) {
                    self.visit(child);
                }
            }
            NodeKind::NumericForStmt => self.numeric_for(node),
            NodeKind::GenericForStmt => self.generic_for(node),
            NodeKind::RepeatStmt => self.scoped(ScopeKind::Block, node, |b| {
                // The until expression can see locals declared in the body,
                // so the body block shares the repeat scope.
                for child in b.tree.child_nodes(node) {
                    if b.tree.kind(child) == NodeKind::Block {
                        for stmt in b.tree.child_nodes(child) {
                            b.visit(stmt);
                        }
                    } else {
                        b.visit(child);
                    }
                }
            }),
            NodeKind::NameExpr => self.read(node),
            NodeKind::GotoStmt => {
                if let Some(name) = first_name_token(self.tree, node) {
                    self.pending_gotos.push((node, self.current(), name));
                }
            }
            NodeKind::LabelStmt => self.label_decl(node),
            _ => {
                for child in self.tree.child_nodes(node) {
                    self.visit(child);
                }
            }
        }
    }

    fn local_decl(&mut self, node: NodeId) {
        let (targets, values) = split_at_assign(self.tree, node);
        let has_values = !values.is_empty();
        for value in values {
            self.visit(value);
        }
        for target in targets {
            if self.tree.kind(target) == NodeKind::NameExpr {
                let id = self.declare(target, VariableKind::Local);
                if has_values {
                    self.res.variables[id.0 as usize].writes.push(node);
                }
            }
        }
    }

    fn local_function_decl(&mut self, node: NodeId) {
        let mut nodes = self.tree.child_nodes(node);
        if let Some(name) = nodes.next() {
            if self.tree.kind(name) == NodeKind::NameExpr {
                let id = self.declare(name, VariableKind::Function);
                self.res.variables[id.0 as usize].writes.push(node);
            }
        }
        for child in nodes {
            self.visit(child);
        }
    }

    fn assign(&mut self, node: NodeId) {
        let (targets, values) = split_at_assign(self.tree, node);
        for value in values {
            self.visit(value);
        }
        for target in targets {
            if self.tree.kind(target) == NodeKind::NameExpr {
                let id = self.resolve_or_global(target);
                self.res.variables[id.0 as usize].writes.push(node);
                self.res.variable_refs.insert(target, id);
            } else {
                self.visit(target);
            }
        }
    }

    fn function_decl(&mut self, node: NodeId) {
        let mut nodes = self.tree.child_nodes(node);
        let mut is_method = false;
        if let Some(fname) = nodes.next() {
            if self.tree.kind(fname) == NodeKind::FunctionName {
                let dotted = self.tree.child_tokens(fname).any(|t| {
                    matches!(
                        self.tree.token_kind(t),
                        TokenKind::Dot | TokenKind::Colon
                    )
                });
                is_method = self
                    .tree
                    .child_tokens(fname)
                    .any(|t| self.tree.token_kind(t) == TokenKind::Colon);
                if let Some(base) = self.tree.child_nodes(fname).next() {
                    if dotted {
                        // `function t.f()` reads `t`, it does not declare `f`.
                        self.read(base);
                    } else {
                        let id = self.resolve_or_global(base);
                        self.res.variables[id.0 as usize].writes.push(node);
                        self.res.variable_refs.insert(base, id);
                    }
                }
            }
        }
        for child in nodes {
            if self.tree.kind(child) == NodeKind::FunctionBody {
                self.function_body(child, is_method);
            } else {
                self.visit(child);
            }
        }
    }

    fn function_body(&mut self, node: NodeId, is_method: bool) {
        self.scoped(ScopeKind::Function, node, |b| {
            if is_method {
                b.declare_synthetic("self", VariableKind::Parameter);
            }
            for child in b.tree.child_nodes(node) {
                if b.tree.kind(child) == NodeKind::ParamList {
                    for param in b.tree.child_nodes(child) {
                        if b.tree.kind(param) == NodeKind::NameExpr {
                            b.declare(param, VariableKind::Parameter);
                        }
                    }
                } else {
                    b.visit(child);
                }
            }
        });
    }

    fn numeric_for(&mut self, node: NodeId) {
        let mut nodes = self.tree.child_nodes(node);
        let control = nodes.next();
        let rest: Vec<NodeId> = nodes.collect();
        for child in &rest {
            if self.tree.kind(*child) != NodeKind::Block {
                self.visit(*child);
            }
        }
        self.scoped(ScopeKind::Block, node, |b| {
            if let Some(control) = control {
                if b.tree.kind(control) == NodeKind::NameExpr {
                    b.declare(control, VariableKind::Iteration);
                }
            }
            for child in &rest {
                if b.tree.kind(*child) == NodeKind::Block {
                    b.visit(*child);
                }
            }
        });
    }

    fn generic_for(&mut self, node: NodeId) {
        // Names before `in` are iteration variables, expressions after it
        // evaluate in the enclosing scope.
        let mut names = Vec::new();
        let mut exprs = Vec::new();
        let mut block = None;
        let mut seen_in = false;
        for element in self.tree.children(node) {
            match element {
                Element::Token(t) => {
                    if self.tree.token_kind(*t) == TokenKind::InKw {
                        seen_in = true;
                    }
                }
                Element::Node(n) => {
                    if self.tree.kind(*n) == NodeKind::Block {
                        block = Some(*n);
                    } else if seen_in {
                        exprs.push(*n);
                    } else {
                        names.push(*n);
                    }
                }
            }
        }
        for expr in exprs {
            self.visit(expr);
        }
        self.scoped(ScopeKind::Block, node, |b| {
            for name in names {
                if b.tree.kind(name) == NodeKind::NameExpr {
                    b.declare(name, VariableKind::Iteration);
                }
            }
            if let Some(block) = block {
                b.visit(block);
            }
        });
    }

    fn label_decl(&mut self, node: NodeId) {
        let Some(name) = first_name_token(self.tree, node) else {
            return;
        };
        let scope = self.current();
        let id = match self.res.scopes[scope.0 as usize].label_bindings.get(&name) {
            Some(&existing) if self.res.labels[existing.0 as usize].declaration.is_none() => {
                self.res.labels[existing.0 as usize].declaration = Some(node);
                existing
            }
            Some(&existing) => existing,
            None => {
                let id = LabelId(self.res.labels.len() as u32);
                self.res.labels.push(LabelData {
                    name: name.clone(),
                    declaration: Some(node),
                    jumps: Vec::new(),
                });
                let data = &mut self.res.scopes[scope.0 as usize];
                data.labels.push(id);
                data.label_bindings.insert(name, id);
                id
            }
        };
        self.res.label_refs.insert(node, id);
    }

    fn read(&mut self, node: NodeId) {
        let id = self.resolve_or_global(node);
        self.res.variables[id.0 as usize].reads.push(node);
        self.res.variable_refs.insert(node, id);
    }

    fn declare(&mut self, name_node: NodeId, kind: VariableKind) -> VariableId {
        let name = self.tree.node_text(name_node).to_string();
        let id = VariableId(self.res.variables.len() as u32);
        self.res.variables.push(VariableData {
            name: name.clone(),
            kind,
            declaration: Some(name_node),
            reads: Vec::new(),
            writes: Vec::new(),
        });
        let scope = self.current();
        let data = &mut self.res.scopes[scope.0 as usize];
        data.variables.push(id);
        data.bindings.insert(name, id);
        self.res.variable_refs.insert(name_node, id);
        id
    }

    fn declare_synthetic(&mut self, name: &str, kind: VariableKind) -> VariableId {
        let id = VariableId(self.res.variables.len() as u32);
        self.res.variables.push(VariableData {
            name: name.to_string(),
            kind,
            declaration: None,
            reads: Vec::new(),
            writes: Vec::new(),
        });
        let scope = self.current();
        let data = &mut self.res.scopes[scope.0 as usize];
        data.variables.push(id);
        data.bindings.insert(name.to_string(), id);
        id
    }

    fn resolve_or_global(&mut self, name_node: NodeId) -> VariableId {
        let name = self.tree.node_text(name_node);
        let mut scope = Some(self.current());
        while let Some(id) = scope {
            let data = &self.res.scopes[id.0 as usize];
            if let Some(&var) = data.bindings.get(name) {
                return var;
            }
            scope = data.parent;
        }
        // Unresolved names are globals, registered in the file scope so the
        // whole file sees them.
        let name = name.to_string();
        let id = VariableId(self.res.variables.len() as u32);
        self.res.variables.push(VariableData {
            name: name.clone(),
            kind: VariableKind::Global,
            declaration: None,
            reads: Vec::new(),
            writes: Vec::new(),
        });
        let root = self.res.root_scope();
        let data = &mut self.res.scopes[root.0 as usize];
        data.variables.push(id);
        data.bindings.insert(name, id);
        id
    }

    fn resolve_gotos(&mut self) {
        let pending = std::mem::take(&mut self.pending_gotos);
        for (node, scope, name) in pending {
            let mut cursor = Some(scope);
            let mut found = None;
            while let Some(id) = cursor {
                let data = &self.res.scopes[id.0 as usize];
                if let Some(&label) = data.label_bindings.get(&name) {
                    found = Some(label);
                    break;
                }
                // Labels are not visible across function boundaries.
                if matches!(data.kind, ScopeKind::Function | ScopeKind::File) {
                    break;
                }
                cursor = data.parent;
            }
            let id = match found {
                Some(id) => id,
                None => {
                    let id = LabelId(self.res.labels.len() as u32);
                    self.res.labels.push(LabelData {
                        name: name.clone(),
                        declaration: None,
                        jumps: Vec::new(),
                    });
                    let data = &mut self.res.scopes[scope.0 as usize];
                    data.labels.push(id);
                    data.label_bindings.insert(name, id);
                    id
                }
            };
            self.res.labels[id.0 as usize].jumps.push(node);
            self.res.label_refs.insert(node, id);
        }
    }
}

/// Splits a declaration or assignment statement's child nodes into the
/// targets before the `=` token and the values after it.
pub(crate) fn split_at_assign(tree: &SyntaxTree, node: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut targets = Vec::new();
    let mut values = Vec::new();
    let mut seen_assign = false;
    for element in tree.children(node) {
        match element {
            Element::Token(t) => {
                if tree.token_kind(*t) == TokenKind::Assign {
                    seen_assign = true;
                }
            }
            Element::Node(n) => {
                if seen_assign {
                    values.push(*n);
                } else {
                    targets.push(*n);
                }
            }
        }
    }
    (targets, values)
}

fn first_name_token(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    tree.child_tokens(node)
        .find(|&t| tree.token_kind(t) == TokenKind::Name)
        .map(|t| tree.token_text(t).to_string())
}
