//! The workspace store: the single source of truth for open files and the
//! aggregate program. Readers clone immutable snapshots under a shared lock;
//! mutators serialize on the exclusive lock and replace the aggregate
//! wholesale, sharing the entries of untouched files.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use lls_syntax::program::{NodeRef, Program, ProgramEntry};
use lls_syntax::{LineIndex, Position, SyntaxTree};
use tracing::debug;
use url::Url;

use crate::error::{AnalyzeError, Result};

#[cfg(test)]
mod tests;

/// Immutable snapshot of one open file. The aggregate program reference is
/// the one that was live when the snapshot was taken; later mutations are
/// never visible through it.
#[derive(Clone)]
pub(crate) struct WorkspaceFile {
    pub(crate) uri: Url,
    pub(crate) tree: Arc<SyntaxTree>,
    pub(crate) program: Arc<Program>,
}

impl std::fmt::Debug for WorkspaceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceFile")
            .field("uri", &self.uri.as_str())
            .finish_non_exhaustive()
    }
}

/// One text replacement in editor coordinates. `range: None` replaces the
/// whole document.
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    pub(crate) range: Option<(Position, Position)>,
    pub(crate) text: String,
}

struct State {
    files: BTreeMap<Url, Arc<ProgramEntry>>,
    program: Arc<Program>,
}

type UpdateObserver = Box<dyn Fn(&WorkspaceFile, &WorkspaceFile) + Send + Sync>;
type RemoveObserver = Box<dyn Fn(&WorkspaceFile) + Send + Sync>;

pub(crate) struct Workspace {
    state: RwLock<State>,
    update_observers: Mutex<Vec<UpdateObserver>>,
    remove_observers: Mutex<Vec<RemoveObserver>>,
}

impl Workspace {
    pub(crate) fn new() -> Workspace {
        Workspace {
            state: RwLock::new(State {
                files: BTreeMap::new(),
                program: Arc::new(Program::empty()),
            }),
            update_observers: Mutex::new(Vec::new()),
            remove_observers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback for successful edits, called synchronously with
    /// (old snapshot, new snapshot) before the mutator returns.
    pub(crate) fn on_update(&self, f: impl Fn(&WorkspaceFile, &WorkspaceFile) + Send + Sync + 'static) {
        self.update_observers.lock().unwrap().push(Box::new(f));
    }

    /// Registers a callback for removals, called with the final snapshot.
    pub(crate) fn on_remove(&self, f: impl Fn(&WorkspaceFile) + Send + Sync + 'static) {
        self.remove_observers.lock().unwrap().push(Box::new(f));
    }

    pub(crate) fn get_if_open(&self, uri: &Url) -> Option<WorkspaceFile> {
        let state = self.state.read().unwrap();
        state.files.get(uri).map(|entry| snapshot(uri, entry, &state.program))
    }

    /// Returns the tracked snapshot, or loads and parses the file from disk.
    pub(crate) fn get_or_load(&self, uri: &Url) -> Result<WorkspaceFile> {
        if let Some(file) = self.get_if_open(uri) {
            return Ok(file);
        }
        let path = uri
            .to_file_path()
            .map_err(|_| AnalyzeError::NotFound(uri.to_string()))?;
        let text = std::fs::read_to_string(&path)
            .map_err(|_| AnalyzeError::NotFound(uri.to_string()))?;
        let tree = lls_syntax::parse(&text, &path.to_string_lossy());
        let entry = Arc::new(ProgramEntry::new(tree));

        let mut state = self.state.write().unwrap();
        // Another task may have loaded it while we were reading from disk.
        if let Some(existing) = state.files.get(uri) {
            return Ok(snapshot(uri, existing, &state.program));
        }
        debug!(uri = %uri, "loading file into workspace");
        state.files.insert(uri.clone(), entry);
        state.program = rebuild(&state.files);
        Ok(snapshot(uri, &state.files[uri], &state.program))
    }

    /// Tracks `text` under `uri`, replacing any previous content.
    pub(crate) fn open_or_replace(&self, uri: &Url, text: &str) -> WorkspaceFile {
        let tree = lls_syntax::parse(text, &source_path(uri));
        let entry = Arc::new(ProgramEntry::new(tree));

        let mut state = self.state.write().unwrap();
        let old = state
            .files
            .get(uri)
            .map(|prev| snapshot(uri, prev, &state.program));
        debug!(uri = %uri, replaced = old.is_some(), "open_or_replace");
        state.files.insert(uri.clone(), entry);
        state.program = rebuild(&state.files);
        let new = snapshot(uri, &state.files[uri], &state.program);
        drop(state);

        if let Some(old) = old {
            self.notify_update(&old, &new);
        }
        new
    }

    /// Applies editor edits to `old` and installs the result. Rejects
    /// snapshots that are stale or foreign to the store.
    pub(crate) fn apply_edits(&self, old: &WorkspaceFile, edits: &[Edit]) -> Result<WorkspaceFile> {
        let new_text = apply_edits_to_text(old.tree.text(), edits)?;
        self.replace(old, new_text)
    }

    /// Whole-text replacement. Content-equal text returns `old` unchanged.
    pub(crate) fn update(&self, old: &WorkspaceFile, text: &str) -> Result<WorkspaceFile> {
        self.replace(old, text.to_string())
    }

    pub(crate) fn remove(&self, uri: &Url) {
        let mut state = self.state.write().unwrap();
        let Some(entry) = state.files.remove(uri) else {
            return;
        };
        // The final snapshot keeps the aggregate the file was still part of.
        let last = snapshot(uri, &entry, &state.program);
        debug!(uri = %uri, "removing file from workspace");
        state.program = rebuild(&state.files);
        drop(state);

        for observer in self.remove_observers.lock().unwrap().iter() {
            observer(&last);
        }
    }

    /// Resolves a node from any tree back to its owning file, loading it
    /// from disk if it is not tracked.
    pub(crate) fn locate(&self, node: &NodeRef) -> Option<WorkspaceFile> {
        {
            let state = self.state.read().unwrap();
            for (uri, entry) in &state.files {
                if Arc::ptr_eq(&entry.tree, &node.tree) {
                    return Some(snapshot(uri, entry, &state.program));
                }
            }
        }
        let uri = uri_for_path(node.path())?;
        self.get_or_load(&uri).ok()
    }

    pub(crate) fn open_files(&self) -> Vec<WorkspaceFile> {
        let state = self.state.read().unwrap();
        state
            .files
            .iter()
            .map(|(uri, entry)| snapshot(uri, entry, &state.program))
            .collect()
    }

    fn replace(&self, old: &WorkspaceFile, new_text: String) -> Result<WorkspaceFile> {
        let mut state = self.state.write().unwrap();
        let entry = state
            .files
            .get(&old.uri)
            .ok_or_else(|| AnalyzeError::InvalidState("file is no longer open".to_string()))?;
        if !Arc::ptr_eq(&entry.tree, &old.tree) {
            return Err(AnalyzeError::InvalidState(
                "snapshot does not match the live entry".to_string(),
            ));
        }
        if new_text == old.tree.text() {
            return Ok(old.clone());
        }
        let tree = lls_syntax::parse(&new_text, old.tree.path());
        state.files.insert(old.uri.clone(), Arc::new(ProgramEntry::new(tree)));
        state.program = rebuild(&state.files);
        let new = snapshot(&old.uri, &state.files[&old.uri], &state.program);
        drop(state);

        self.notify_update(old, &new);
        Ok(new)
    }

    fn notify_update(&self, old: &WorkspaceFile, new: &WorkspaceFile) {
        for observer in self.update_observers.lock().unwrap().iter() {
            observer(old, new);
        }
    }
}

fn snapshot(uri: &Url, entry: &Arc<ProgramEntry>, program: &Arc<Program>) -> WorkspaceFile {
    WorkspaceFile {
        uri: uri.clone(),
        tree: entry.tree.clone(),
        program: program.clone(),
    }
}

fn rebuild(files: &BTreeMap<Url, Arc<ProgramEntry>>) -> Arc<Program> {
    Arc::new(Program::new(files.values().cloned().collect()))
}

fn source_path(uri: &Url) -> String {
    uri.to_file_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| uri.to_string())
}

fn uri_for_path(path: &str) -> Option<Url> {
    if Path::new(path).is_absolute() {
        Url::from_file_path(path).ok()
    } else {
        Url::parse(path).ok()
    }
}

fn apply_edits_to_text(text: &str, edits: &[Edit]) -> Result<String> {
    let mut current = text.to_string();
    for edit in edits {
        match &edit.range {
            None => current = edit.text.clone(),
            Some((start, end)) => {
                let index = LineIndex::new(&current);
                let invalid = |pos: &Position| AnalyzeError::InvalidState(format!(
                    "edit position {}:{} is outside the document",
                    pos.line, pos.character
                ));
                let start_offset = index.offset(&current, *start).ok_or_else(|| invalid(start))?;
                let end_offset = index.offset(&current, *end).ok_or_else(|| invalid(end))?;
                if end_offset < start_offset {
                    return Err(AnalyzeError::InvalidState("edit range is reversed".to_string()));
                }
                current.replace_range(start_offset..end_offset, &edit.text);
            }
        }
    }
    Ok(current)
}
