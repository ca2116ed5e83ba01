//! Integration tests for the board: commands, persistence and rollback.
//!
//! Most tests run against `MemoryStorage`; file round trips use a temporary
//! directory.

use treeflow::board::Board;
use treeflow::error::{ErrorCode, StorageError};
use treeflow::store::{FileStorage, MemoryStorage, REGISTRY_KEY, Storage};
use treeflow::types::{LeafCount, Status};

/// Helper to create an empty board backed by memory.
fn setup_board() -> (Board, MemoryStorage) {
    let storage = MemoryStorage::new();
    (Board::open(storage.clone()), storage)
}

/// Storage whose writes always fail.
struct FailingStorage;

impl Storage for FailingStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn write(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io {
            key: key.to_string(),
            source: std::io::Error::other("disk full"),
        })
    }
}

mod scenario_tests {
    use super::*;

    #[test]
    fn new_project_root_is_single_todo_leaf() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").expect("Failed to create project");

        let project = board.project(&pid).expect("Project missing");
        let root = project.tree().root_id().to_string();
        assert_eq!(board.node_status(&pid, &root), Some(Status::Todo));
        assert_eq!(
            board.node_progress(&pid, &root),
            Some(LeafCount { done: 0, total: 1 })
        );
    }

    #[test]
    fn children_drive_root_status_through_to_done() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let root = board.project(&pid).unwrap().tree().root_id().to_string();

        board.add_node(&pid, None, "A", "", Status::Done).unwrap();
        let b = board.add_node(&pid, None, "B", "", Status::Doing).unwrap();
        assert_eq!(board.node_status(&pid, &root), Some(Status::Doing));
        assert_eq!(
            board.node_progress(&pid, &root),
            Some(LeafCount { done: 1, total: 2 })
        );

        board.edit_node(&pid, &b, "B", "", Status::Done).unwrap();
        assert_eq!(board.node_status(&pid, &root), Some(Status::Done));
        assert_eq!(
            board.node_progress(&pid, &root),
            Some(LeafCount { done: 2, total: 2 })
        );

        // Stored status of the root follows the derived value.
        let stored = board.project(&pid).unwrap().tree().root().stored_status();
        assert_eq!(stored, Status::Done);
    }

    #[test]
    fn deleting_subtree_rederives_parent() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let phase = board.add_node(&pid, None, "Phase", "", Status::Todo).unwrap();
        board
            .add_node(&pid, Some(&phase), "Kept", "", Status::Review)
            .unwrap();
        let gone = board
            .add_node(&pid, Some(&phase), "Gone", "", Status::Doing)
            .unwrap();
        board
            .add_node(&pid, Some(&gone), "Nested", "", Status::Done)
            .unwrap();

        assert_eq!(
            board.node_progress(&pid, &phase),
            Some(LeafCount { done: 1, total: 2 })
        );

        let removed = board.delete_node(&pid, &gone).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            board.node_progress(&pid, &phase),
            Some(LeafCount { done: 0, total: 1 })
        );
        assert_eq!(board.node_status(&pid, &phase), Some(Status::Review));
        assert!(board.node_status(&pid, &gone).is_none());
    }

    #[test]
    fn edit_cannot_override_derived_status() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let parent = board.add_node(&pid, None, "P", "", Status::Todo).unwrap();
        board
            .add_node(&pid, Some(&parent), "C", "", Status::Doing)
            .unwrap();

        let applied = board
            .edit_node(&pid, &parent, "P2", "notes", Status::Done)
            .unwrap();
        assert!(!applied);
        assert_eq!(board.node_status(&pid, &parent), Some(Status::Doing));

        let node = board.project(&pid).unwrap().tree().find_node(&parent).unwrap();
        assert_eq!(node.title(), "P2");
        assert_eq!(node.description(), "notes");
        assert_eq!(node.stored_status(), Status::Doing);
    }

    #[test]
    fn cycle_wraps_done_to_todo() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let leaf = board.add_node(&pid, None, "L", "", Status::Done).unwrap();

        assert_eq!(board.cycle_status(&pid, &leaf).unwrap(), Status::Todo);
        assert_eq!(board.cycle_status(&pid, &leaf).unwrap(), Status::Doing);
        assert_eq!(board.cycle_status(&pid, &leaf).unwrap(), Status::Review);
        assert_eq!(board.cycle_status(&pid, &leaf).unwrap(), Status::Done);
    }

    #[test]
    fn cycle_rejects_internal_node() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let parent = board.add_node(&pid, None, "P", "", Status::Todo).unwrap();
        board.add_node(&pid, Some(&parent), "C", "", Status::Todo).unwrap();

        let err = board.cycle_status(&pid, &parent).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTarget);
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn blank_title_is_rejected_without_change() {
        let (mut board, storage) = setup_board();
        let pid = board.create_project("X").unwrap();
        let before = storage.get(REGISTRY_KEY);

        let err = board.add_node(&pid, None, "   ", "", Status::Todo).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(board.project(&pid).unwrap().tree().node_count(), 1);
        assert_eq!(storage.get(REGISTRY_KEY), before);
    }

    #[test]
    fn unknown_parent_and_project_are_not_found() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();

        let err = board
            .add_node(&pid, Some("ghost"), "T", "", Status::Todo)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NodeNotFound);

        let err = board
            .add_node("nope", None, "T", "", Status::Todo)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProjectNotFound);
    }

    #[test]
    fn root_cannot_be_deleted() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let root = board.project(&pid).unwrap().tree().root_id().to_string();

        let err = board.delete_node(&pid, &root).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTarget);
        assert!(board.project(&pid).is_some());
    }

    #[test]
    fn deleting_missing_node_is_repeatable() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("X").unwrap();
        let leaf = board.add_node(&pid, None, "L", "", Status::Todo).unwrap();

        board.delete_node(&pid, &leaf).unwrap();
        for _ in 0..2 {
            let err = board.delete_node(&pid, &leaf).unwrap_err();
            assert_eq!(err.code, ErrorCode::NodeNotFound);
        }
    }
}

mod view_tests {
    use super::*;

    #[test]
    fn node_view_nests_children_with_derived_values() {
        let (mut board, _) = setup_board();
        let pid = board.create_project("Home").unwrap();
        let kitchen = board.add_node(&pid, None, "Kitchen", "", Status::Todo).unwrap();
        board
            .add_node(&pid, Some(&kitchen), "Paint", "two coats", Status::Done)
            .unwrap();
        board
            .add_node(&pid, Some(&kitchen), "Tiles", "", Status::Review)
            .unwrap();
        board.toggle_collapsed(&pid, &kitchen).unwrap();

        let view = board.node_view(&pid, None).expect("Root view missing");
        assert_eq!(view.title, "Home");
        assert_eq!(view.depth, 0);
        assert_eq!(view.status, Status::Review);
        assert_eq!(view.progress, LeafCount { done: 1, total: 2 });

        let kitchen_view = &view.children[0];
        assert!(kitchen_view.collapsed);
        assert_eq!(kitchen_view.depth, 1);
        assert_eq!(kitchen_view.children.len(), 2);
        assert_eq!(kitchen_view.children[0].title, "Paint");
        assert_eq!(kitchen_view.children[0].description, "two coats");
        assert_eq!(kitchen_view.children[1].depth, 2);

        let sub = board.node_view(&pid, Some(&kitchen)).unwrap();
        assert_eq!(sub.id, kitchen);
        assert_eq!(sub.depth, 1);
        assert!(board.node_view(&pid, Some("ghost")).is_none());
    }

    #[test]
    fn list_projects_reports_progress_in_creation_order() {
        let (mut board, _) = setup_board();
        let a = board.create_project("A").unwrap();
        board.create_project("B").unwrap();
        board.add_node(&a, None, "t1", "", Status::Done).unwrap();
        board.add_node(&a, None, "t2", "", Status::Todo).unwrap();

        let list = board.list_projects();
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(list[0].progress, LeafCount { done: 1, total: 2 });
        assert_eq!(list[0].progress.percent(), 50);
        assert!(list[1].active);
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn every_command_persists_whole_registry() {
        let (mut board, storage) = setup_board();
        let pid = board.create_project("X").unwrap();
        let leaf = board.add_node(&pid, None, "L", "", Status::Todo).unwrap();
        board.cycle_status(&pid, &leaf).unwrap();

        let reopened = Board::open(storage);
        let project = reopened.project(&pid).expect("Project not persisted");
        let node = project.tree().find_node(&leaf).expect("Node not persisted");
        assert_eq!(node.stored_status(), Status::Doing);
        assert_eq!(reopened.node_status(&pid, project.tree().root_id()), Some(Status::Doing));
    }

    #[test]
    fn selection_is_not_persisted() {
        let (mut board, storage) = setup_board();
        let a = board.create_project("A").unwrap();
        let b = board.create_project("B").unwrap();
        board.select_project(&b).unwrap();

        let reopened = Board::open(storage);
        assert_eq!(reopened.active_project().map(|p| p.id()), Some(a.as_str()));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (pid, child) = {
            let mut board = Board::open(FileStorage::new(dir.path()));
            let pid = board.create_project("Garden").unwrap();
            let bed = board.add_node(&pid, None, "Bed", "", Status::Todo).unwrap();
            let child = board
                .add_node(&pid, Some(&bed), "Dig", "", Status::Done)
                .unwrap();
            board.toggle_collapsed(&pid, &bed).unwrap();
            (pid, child)
        };

        assert!(dir.path().join(format!("{}.json", REGISTRY_KEY)).is_file());

        let board = Board::open(FileStorage::new(dir.path()));
        let project = board.project(&pid).expect("Project lost");
        assert_eq!(project.name(), "Garden");
        assert_eq!(project.status(), Status::Done);
        let node = project.tree().find_node(&child).unwrap();
        let parent = node.parent_id().expect("Parent link lost");
        assert!(project.tree().find_node(parent).unwrap().collapsed());
    }

    #[test]
    fn corrupt_file_loads_empty_board() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(format!("{}.json", REGISTRY_KEY)),
            "{ this is not json",
        )
        .unwrap();

        let mut board = Board::open(FileStorage::new(dir.path()));
        assert!(board.registry().is_empty());

        // The next command overwrites the corrupt value.
        board.create_project("Fresh").unwrap();
        let board = Board::open(FileStorage::new(dir.path()));
        assert_eq!(board.registry().len(), 1);
    }

    #[test]
    fn wire_format_uses_camel_case_and_omits_expanded_flag() {
        let (mut board, storage) = setup_board();
        let pid = board.create_project("X").unwrap();
        board.add_node(&pid, None, "L", "", Status::Review).unwrap();

        let raw = storage.get(REGISTRY_KEY).expect("Registry not written");
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let project = &json["projects"][0];
        assert!(project["createdAt"].is_i64());
        assert_eq!(project["root"]["status"], "review");
        assert_eq!(project["root"]["children"][0]["status"], "review");
        assert!(project["root"].get("collapsed").is_none());
    }

    #[test]
    fn legacy_collapsed_alias_is_accepted() {
        let storage = MemoryStorage::new();
        storage.insert(
            REGISTRY_KEY,
            r#"{"projects":[{"id":"p1","name":"Old","createdAt":5,
                "root":{"id":"r","title":"Old","status":"todo","children":[
                    {"id":"a","title":"A","status":"done","_collapsed":true,"children":[
                        {"id":"a1","title":"A1","status":"done"}]}]}}]}"#,
        );

        let board = Board::open(storage);
        let project = board.project("p1").expect("Project not loaded");
        assert!(project.tree().find_node("a").unwrap().collapsed());
        assert_eq!(project.status(), Status::Done);
        // Cached root status is re-derived on load.
        assert_eq!(project.tree().root().stored_status(), Status::Done);
    }

    #[test]
    fn both_collapsed_spellings_on_one_node_load() {
        let storage = MemoryStorage::new();
        storage.insert(
            REGISTRY_KEY,
            r#"{"projects":[{"id":"p1","name":"Mixed","createdAt":5,
                "root":{"id":"r","title":"Mixed","children":[
                    {"id":"a","title":"A","collapsed":false,"_collapsed":true}]}}]}"#,
        );

        let board = Board::open(storage);
        let project = board.project("p1").expect("Registry dropped on mixed spellings");
        assert!(project.tree().find_node("a").unwrap().collapsed());
    }

    #[test]
    fn deep_chain_survives_reload() {
        const DEPTH: usize = 150;
        let (mut board, storage) = setup_board();
        let pid = board.create_project("Deep").unwrap();

        let mut parent: Option<String> = None;
        for level in 0..DEPTH {
            let id = board
                .add_node(&pid, parent.as_deref(), &format!("Level {}", level), "", Status::Doing)
                .expect("Failed to add nested node");
            parent = Some(id);
        }
        let deepest = parent.expect("Chain is empty");

        let mut reopened = Board::open(storage.clone());
        let project = reopened.project(&pid).expect("Deep project lost on reload");
        assert_eq!(project.tree().node_count(), DEPTH + 1);
        assert_eq!(project.tree().depth(&deepest), Some(DEPTH));
        assert_eq!(project.status(), Status::Doing);

        reopened.create_project("Other").unwrap();
        let again = Board::open(storage);
        let names: Vec<&str> = again.registry().projects().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Deep", "Other"]);
        assert_eq!(again.project(&pid).unwrap().tree().node_count(), DEPTH + 1);
    }
}

mod rollback_tests {
    use super::*;

    #[test]
    fn failed_persist_rolls_back_command() {
        let mut board = Board::open(FailingStorage);
        let err = board.create_project("X").unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageFailed);
        assert!(board.registry().is_empty());
        assert!(board.active_project().is_none());
    }
}

mod shared_tests {
    use super::*;
    use std::thread;

    #[test]
    fn shared_board_serializes_commands_across_threads() {
        let (mut board, storage) = setup_board();
        let pid = board.create_project("Team").unwrap();
        let shared = board.into_shared();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                let pid = pid.clone();
                thread::spawn(move || {
                    for j in 0..5 {
                        shared
                            .with_board(|b| {
                                b.add_node(&pid, None, &format!("t{}-{}", i, j), "", Status::Done)
                            })
                            .expect("Failed to add node");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Worker panicked");
        }

        let progress = shared.with_board(|b| b.project(&pid).unwrap().progress());
        assert_eq!(progress, LeafCount { done: 20, total: 20 });

        let reopened = Board::open(storage);
        assert_eq!(reopened.project(&pid).unwrap().tree().node_count(), 21);
    }
}
