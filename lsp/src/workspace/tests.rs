use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lls_syntax::{NodeRef, Position};
use url::Url;

use super::{Edit, Workspace};
use crate::error::AnalyzeError;

fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///ws/{name}")).unwrap()
}

#[test]
fn test_open_and_read_back() {
    let ws = Workspace::new();
    let file = ws.open_or_replace(&uri("a.lua"), "local x = 1");
    assert_eq!(file.tree.text(), "local x = 1");
    assert_eq!(ws.open_files().len(), 1);

    let again = ws.get_if_open(&uri("a.lua")).unwrap();
    assert!(Arc::ptr_eq(&file.tree, &again.tree));
}

#[test]
fn test_apply_edits_round_trip() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "local x = 1\nreturn x\n");
    let new = ws
        .apply_edits(
            &old,
            &[Edit {
                range: Some((Position::new(0, 6), Position::new(0, 7))),
                text: "count".to_string(),
            }],
        )
        .unwrap();
    assert_eq!(new.tree.text(), "local count = 1\nreturn x\n");
}

#[test]
fn test_edits_apply_in_order() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "a = 1");
    let new = ws
        .apply_edits(
            &old,
            &[
                Edit {
                    range: Some((Position::new(0, 0), Position::new(0, 1))),
                    text: "value".to_string(),
                },
                // Positions are interpreted against the text after the
                // previous edit.
                Edit {
                    range: Some((Position::new(0, 8), Position::new(0, 9))),
                    text: "42".to_string(),
                },
            ],
        )
        .unwrap();
    assert_eq!(new.tree.text(), "value = 42");
}

#[test]
fn test_edit_outside_document_rejected() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "x = 1");
    let err = ws
        .apply_edits(
            &old,
            &[Edit {
                range: Some((Position::new(5, 0), Position::new(5, 0))),
                text: "y".to_string(),
            }],
        )
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::InvalidState(_)));
}

#[test]
fn test_snapshot_survives_later_edit() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "local a = 1");
    let new = ws.update(&old, "local b = 2").unwrap();

    assert_eq!(old.tree.text(), "local a = 1");
    assert_eq!(new.tree.text(), "local b = 2");
    assert!(!Arc::ptr_eq(&old.tree, &new.tree));
    assert_eq!(ws.get_if_open(&uri("a.lua")).unwrap().tree.text(), "local b = 2");
}

#[test]
fn test_snapshot_isolated_from_concurrent_edit() {
    let ws = Arc::new(Workspace::new());
    let old = ws.open_or_replace(&uri("a.lua"), "local a = 1");

    let writer = {
        let ws = ws.clone();
        let old = old.clone();
        std::thread::spawn(move || {
            ws.update(&old, "local b = 2").unwrap();
        })
    };
    writer.join().unwrap();

    // The reader's snapshot still describes the pre-edit world.
    assert_eq!(old.tree.text(), "local a = 1");
    assert!(old.program.entries().iter().any(|e| Arc::ptr_eq(&e.tree, &old.tree)));
}

#[test]
fn test_stale_snapshot_rejected() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "x = 1");
    ws.update(&old, "x = 2").unwrap();

    let err = ws.update(&old, "x = 3").unwrap_err();
    assert!(matches!(err, AnalyzeError::InvalidState(_)));
}

#[test]
fn test_closed_file_rejected() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "x = 1");
    ws.remove(&uri("a.lua"));

    let err = ws.update(&old, "x = 2").unwrap_err();
    assert!(matches!(err, AnalyzeError::InvalidState(_)));
    assert!(ws.get_if_open(&uri("a.lua")).is_none());
}

#[test]
fn test_content_equal_update_keeps_snapshot() {
    let ws = Workspace::new();
    let old = ws.open_or_replace(&uri("a.lua"), "x = 1");
    let new = ws.update(&old, "x = 1").unwrap();
    assert!(Arc::ptr_eq(&old.tree, &new.tree));
    assert!(Arc::ptr_eq(&old.program, &new.program));
}

#[test]
fn test_untouched_files_share_entries() {
    let ws = Workspace::new();
    let a = ws.open_or_replace(&uri("a.lua"), "shared = 1");
    let b = ws.open_or_replace(&uri("b.lua"), "print(shared)");

    ws.update(&a, "shared = 2").unwrap();

    let b_after = ws.get_if_open(&uri("b.lua")).unwrap();
    assert!(Arc::ptr_eq(&b.tree, &b_after.tree));
    assert!(!Arc::ptr_eq(&b.program, &b_after.program));
}

#[test]
fn test_program_merges_globals_across_files() {
    let ws = Workspace::new();
    ws.open_or_replace(&uri("a.lua"), "shared = 1");
    let b = ws.open_or_replace(&uri("b.lua"), "print(shared)");

    let shared = b.program.global("shared").unwrap();
    assert_eq!(shared.writes.len(), 1);
    assert_eq!(shared.reads.len(), 1);
}

#[test]
fn test_update_observer_sees_both_snapshots() {
    let ws = Workspace::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_observer = seen.clone();
    ws.on_update(move |old, new| {
        assert_eq!(old.tree.text(), "x = 1");
        assert_eq!(new.tree.text(), "x = 2");
        seen_in_observer.fetch_add(1, Ordering::SeqCst);
    });

    let old = ws.open_or_replace(&uri("a.lua"), "x = 1");
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    ws.update(&old, "x = 2").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_remove_observer_gets_final_snapshot() {
    let ws = Workspace::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_observer = seen.clone();
    ws.on_remove(move |last| {
        assert_eq!(last.tree.text(), "x = 1");
        // The final snapshot still has the file in its aggregate.
        assert_eq!(last.program.entries().len(), 1);
        seen_in_observer.fetch_add(1, Ordering::SeqCst);
    });

    ws.open_or_replace(&uri("a.lua"), "x = 1");
    ws.remove(&uri("a.lua"));
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    // Removing an unknown uri is a no-op.
    ws.remove(&uri("a.lua"));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_locate_finds_tracked_tree() {
    let ws = Workspace::new();
    let a = ws.open_or_replace(&uri("a.lua"), "x = 1");
    let root = NodeRef::new(a.tree.clone(), a.tree.root());

    let located = ws.locate(&root).unwrap();
    assert_eq!(located.uri, uri("a.lua"));
    assert!(Arc::ptr_eq(&located.tree, &a.tree));
}

#[test]
fn test_locate_loads_untracked_tree_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mod.lua");
    std::fs::write(&path, "return 42\n").unwrap();

    let ws = Workspace::new();
    let tree = lls_syntax::parse("return 42\n", &path.to_string_lossy());
    let root = NodeRef::new(tree.clone(), tree.root());

    let located = ws.locate(&root).unwrap();
    assert_eq!(located.tree.text(), "return 42\n");
    assert_eq!(located.uri, Url::from_file_path(&path).unwrap());
    assert!(ws.get_if_open(&located.uri).is_some());
}

#[test]
fn test_get_or_load_reads_from_disk_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mod.lua");
    std::fs::write(&path, "local m = {}\nreturn m\n").unwrap();
    let file_uri = Url::from_file_path(&path).unwrap();

    let ws = Workspace::new();
    let first = ws.get_or_load(&file_uri).unwrap();
    let second = ws.get_or_load(&file_uri).unwrap();
    assert!(Arc::ptr_eq(&first.tree, &second.tree));

    let missing = Url::from_file_path(dir.path().join("absent.lua")).unwrap();
    let err = ws.get_or_load(&missing).unwrap_err();
    assert!(matches!(err, AnalyzeError::NotFound(_)));
}
