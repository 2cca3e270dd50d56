use std::collections::HashMap;
use std::sync::Arc;

use crate::kind::NodeKind;
use crate::resolve::{
    LabelId, Resolution, ScopeId, ScopeKind, VariableKind,
};
use crate::source::TextRange;
use crate::tree::{NodeId, SyntaxTree};

/// A node handle that pins the tree it came from, so it stays valid across
/// workspace updates.
#[derive(Clone)]
pub struct NodeRef {
    pub tree: Arc<SyntaxTree>,
    pub id: NodeId,
}

impl NodeRef {
    pub fn new(tree: Arc<SyntaxTree>, id: NodeId) -> NodeRef {
        NodeRef { tree, id }
    }

    pub fn kind(&self) -> NodeKind {
        self.tree.kind(self.id)
    }

    pub fn range(&self) -> TextRange {
        self.tree.range(self.id)
    }

    pub fn text(&self) -> &str {
        self.tree.node_text(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.tree
            .parent(self.id)
            .map(|id| NodeRef::new(self.tree.clone(), id))
    }

    /// The file this node belongs to, as recorded at parse time.
    pub fn path(&self) -> &str {
        self.tree.path()
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef {}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}:{}", self.kind(), self.path(), self.range())
    }
}

/// A resolved variable with every place it is read and written. Globals
/// aggregate references across all files of a [`Program`].
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub declaration: Option<NodeRef>,
    pub reads: Vec<NodeRef>,
    pub writes: Vec<NodeRef>,
}

impl Variable {
    /// Whether the variable is only ever assigned a function. Globals
    /// written from several places do not qualify.
    pub fn is_function(&self) -> bool {
        self.writes.len() == 1
            && matches!(
                self.writes[0].kind(),
                NodeKind::FunctionDeclStmt | NodeKind::LocalFunctionDeclStmt
            )
    }

    /// The `NameExpr` naming this variable inside a write statement.
    pub fn assignee_node_in(&self, write: &NodeRef) -> Option<NodeRef> {
        let tree = &write.tree;
        match write.kind() {
            NodeKind::LocalDeclStmt | NodeKind::AssignStmt => {
                let (targets, _) = crate::resolve::split_at_assign(tree, write.id);
                targets
                    .into_iter()
                    .find(|&n| {
                        tree.kind(n) == NodeKind::NameExpr && tree.node_text(n) == self.name
                    })
                    .map(|n| NodeRef::new(tree.clone(), n))
            }
            NodeKind::LocalFunctionDeclStmt => tree
                .child_nodes(write.id)
                .find(|&n| tree.kind(n) == NodeKind::NameExpr)
                .map(|n| NodeRef::new(tree.clone(), n)),
            NodeKind::FunctionDeclStmt => {
                let fname = tree
                    .child_nodes(write.id)
                    .find(|&n| tree.kind(n) == NodeKind::FunctionName)?;
                tree.child_nodes(fname)
                    .next()
                    .map(|n| NodeRef::new(tree.clone(), n))
            }
            _ => None,
        }
    }
}

/// A goto label and the jumps targeting it. Labels never cross files.
#[derive(Debug)]
pub struct GotoLabel {
    pub name: String,
    pub declaration: Option<NodeRef>,
    pub jumps: Vec<NodeRef>,
}

/// One file's contribution to a [`Program`]: the tree, its name binding and
/// prebuilt handles for every file-local variable and label.
pub struct ProgramEntry {
    pub tree: Arc<SyntaxTree>,
    pub resolution: Resolution,
    /// Indexed by `VariableId`. `None` for globals, which only exist merged
    /// at the program level.
    locals: Vec<Option<Arc<Variable>>>,
    labels: Vec<Arc<GotoLabel>>,
}

impl ProgramEntry {
    pub fn new(tree: Arc<SyntaxTree>) -> ProgramEntry {
        let resolution = Resolution::resolve(&tree);
        let locals = resolution
            .variables
            .iter()
            .map(|data| {
                if data.kind == VariableKind::Global {
                    return None;
                }
                Some(Arc::new(Variable {
                    name: data.name.clone(),
                    kind: data.kind,
                    declaration: data
                        .declaration
                        .map(|n| NodeRef::new(tree.clone(), n)),
                    reads: data
                        .reads
                        .iter()
                        .map(|&n| NodeRef::new(tree.clone(), n))
                        .collect(),
                    writes: data
                        .writes
                        .iter()
                        .map(|&n| NodeRef::new(tree.clone(), n))
                        .collect(),
                }))
            })
            .collect();
        let labels = resolution
            .labels
            .iter()
            .map(|data| {
                Arc::new(GotoLabel {
                    name: data.name.clone(),
                    declaration: data
                        .declaration
                        .map(|n| NodeRef::new(tree.clone(), n)),
                    jumps: data
                        .jumps
                        .iter()
                        .map(|&n| NodeRef::new(tree.clone(), n))
                        .collect(),
                })
            })
            .collect();
        ProgramEntry {
            tree,
            resolution,
            locals,
            labels,
        }
    }
}

impl std::fmt::Debug for ProgramEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramEntry")
            .field("path", &self.tree.path())
            .finish_non_exhaustive()
    }
}

/// An immutable view over every open file. Each workspace mutation builds a
/// fresh `Program`; entries for untouched files are shared by `Arc`.
#[derive(Debug)]
pub struct Program {
    entries: Vec<Arc<ProgramEntry>>,
    globals: HashMap<String, Arc<Variable>>,
}

impl Program {
    pub fn new(entries: Vec<Arc<ProgramEntry>>) -> Program {
        let mut merged: HashMap<String, Variable> = HashMap::new();
        for entry in &entries {
            for data in &entry.resolution.variables {
                if data.kind != VariableKind::Global {
                    continue;
                }
                let acc = merged.entry(data.name.clone()).or_insert_with(|| Variable {
                    name: data.name.clone(),
                    kind: VariableKind::Global,
                    declaration: None,
                    reads: Vec::new(),
                    writes: Vec::new(),
                });
                acc.reads.extend(
                    data.reads
                        .iter()
                        .map(|&n| NodeRef::new(entry.tree.clone(), n)),
                );
                acc.writes.extend(
                    data.writes
                        .iter()
                        .map(|&n| NodeRef::new(entry.tree.clone(), n)),
                );
            }
        }
        let globals = merged
            .into_iter()
            .map(|(name, var)| (name, Arc::new(var)))
            .collect();
        Program { entries, globals }
    }

    pub fn empty() -> Program {
        Program::new(Vec::new())
    }

    pub fn entries(&self) -> &[Arc<ProgramEntry>] {
        &self.entries
    }

    pub fn entry_for(&self, tree: &Arc<SyntaxTree>) -> Option<&Arc<ProgramEntry>> {
        self.entries.iter().find(|e| Arc::ptr_eq(&e.tree, tree))
    }

    pub fn global(&self, name: &str) -> Option<Arc<Variable>> {
        self.globals.get(name).cloned()
    }

    pub fn globals(&self) -> impl Iterator<Item = &Arc<Variable>> {
        self.globals.values()
    }

    /// The innermost scope containing `node`.
    pub fn scope_at(&self, node: &NodeRef) -> Option<Scope> {
        let entry = self.entry_for(&node.tree)?;
        let id = entry.resolution.scope_of(&node.tree, node.id)?;
        Some(Scope {
            entry: entry.clone(),
            id,
        })
    }

    /// The variable referenced by a `NameExpr` node.
    pub fn variable_at(&self, node: &NodeRef) -> Option<Arc<Variable>> {
        let entry = self.entry_for(&node.tree)?;
        let id = entry.resolution.variable_of(node.id)?;
        let data = entry.resolution.variable(id);
        if data.kind == VariableKind::Global {
            self.global(&data.name)
        } else {
            entry.locals[id.0 as usize].clone()
        }
    }

    /// The label referenced by a `LabelStmt` or `GotoStmt` node.
    pub fn label_at(&self, node: &NodeRef) -> Option<Arc<GotoLabel>> {
        let entry = self.entry_for(&node.tree)?;
        let id = entry.resolution.label_of(node.id)?;
        Some(entry.labels[id.0 as usize].clone())
    }
}

/// A scope handle, cheap to clone and to walk outwards.
#[derive(Clone)]
pub struct Scope {
    pub entry: Arc<ProgramEntry>,
    pub id: ScopeId,
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        self.entry.resolution.scope(self.id).kind
    }

    pub fn parent(&self) -> Option<Scope> {
        self.entry
            .resolution
            .scope(self.id)
            .parent
            .map(|id| Scope {
                entry: self.entry.clone(),
                id,
            })
    }

    pub fn node(&self) -> NodeRef {
        NodeRef::new(self.entry.tree.clone(), self.entry.resolution.scope(self.id).node)
    }

    /// Variables declared directly in this scope. Globals come from the
    /// program-wide merged table.
    pub fn variables(&self, program: &Program) -> Vec<Arc<Variable>> {
        let data = self.entry.resolution.scope(self.id);
        let mut out = Vec::with_capacity(data.variables.len());
        for &id in &data.variables {
            let var = self.entry.resolution.variable(id);
            let handle = if var.kind == VariableKind::Global {
                program.global(&var.name)
            } else {
                self.entry.locals[id.0 as usize].clone()
            };
            if let Some(handle) = handle {
                out.push(handle);
            }
        }
        out
    }

    /// Labels declared directly in this scope.
    pub fn labels(&self) -> Vec<Arc<GotoLabel>> {
        self.entry
            .resolution
            .scope(self.id)
            .labels
            .iter()
            .map(|&LabelId(i)| self.entry.labels[i as usize].clone())
            .collect()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.kind())
            .field("id", &self.id)
            .finish()
    }
}
