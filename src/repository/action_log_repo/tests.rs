use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::ensure_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = ActionLog::new(ActionType::LockBatch, "griddle-1")
        .station("G1")
        .payload(json!({"entries": ["A#fry"], "pieces": 12}));
    let id = repo.insert(&log).unwrap();
    assert_eq!(id, log.action_id);

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.action_type, "LOCK_BATCH");
    assert_eq!(found.station_id.as_deref(), Some("G1"));
    assert_eq!(found.payload_json, Some(json!({"entries": ["A#fry"], "pieces": 12})));
    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_find_by_order_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    repo.batch_insert(vec![
        ActionLog::new(ActionType::SubmitOrder, "pos").order("A"),
        ActionLog::new(ActionType::TogglePacked, "packer").order("A").entity("box:0:griddle"),
        ActionLog::new(ActionType::SubmitOrder, "pos").order("B"),
    ])
    .unwrap();

    let logs = repo.find_by_order_id("A").unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.order_id.as_deref() == Some("A")));
}

#[test]
fn test_find_by_action_type_and_count() {
    let repo = ActionLogRepository::new(setup_test_db());

    repo.insert(&ActionLog::new(ActionType::StartBatch, "cook").station("G1")).unwrap();
    repo.insert(&ActionLog::new(ActionType::CompleteBatch, "cook").station("G1")).unwrap();
    repo.insert(&ActionLog::new(ActionType::StartBatch, "cook").station("G2")).unwrap();

    assert_eq!(repo.find_by_action_type("START_BATCH", 10).unwrap().len(), 2);
    assert_eq!(repo.count_by_station("G1").unwrap(), 2);
    assert_eq!(repo.find_recent(2).unwrap().len(), 2);
}
