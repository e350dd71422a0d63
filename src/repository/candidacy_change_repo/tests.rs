use super::CandidacyChangeRepository;
use crate::domain::candidacy::CandidacyChange;
use crate::domain::types::ChangeReason;
use crate::repository::error::RepositoryError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn base_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()
}

fn make_change(person: &str, reason: ChangeReason, offset_minutes: i64) -> CandidacyChange {
    CandidacyChange::at(person, reason, base_ts() + Duration::minutes(offset_minutes))
}

#[test]
fn test_insert_and_find_latest() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    let change = make_change("11111111111", ChangeReason::Checkpoint, 0);
    let uuid = repo.insert(&change).unwrap();
    assert_eq!(uuid, change.uuid);

    let latest = repo.find_latest("11111111111").unwrap().unwrap();
    assert_eq!(latest, change);
    assert!(repo.find_latest("22222222222").unwrap().is_none());
}

#[test]
fn test_latest_is_by_timestamp_not_insertion_order() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    // 先插入较晚的,再插入较早的
    let later = make_change("11111111111", ChangeReason::MeetingCompleted, 30);
    let earlier = make_change("11111111111", ChangeReason::Checkpoint, 0);
    repo.insert(&later).unwrap();
    repo.insert(&earlier).unwrap();

    let latest = repo.find_latest("11111111111").unwrap().unwrap();
    assert_eq!(latest.uuid, later.uuid);
    assert!(!latest.kandidat);

    let latest_candidate = repo.find_latest_candidate("11111111111").unwrap().unwrap();
    assert_eq!(latest_candidate.uuid, earlier.uuid);
}

#[test]
fn test_equal_timestamps_resolve_consistently() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    let first = make_change("11111111111", ChangeReason::Checkpoint, 0);
    let second = make_change("11111111111", ChangeReason::Exception, 0);
    repo.insert(&first).unwrap();
    repo.insert(&second).unwrap();

    let a = repo.find_latest("11111111111").unwrap().unwrap();
    let b = repo.find_latest("11111111111").unwrap().unwrap();
    assert_eq!(a.uuid, b.uuid);
    assert_eq!(a.uuid, second.uuid);
}

#[test]
fn test_duplicate_uuid_is_invariant_violation() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    let change = make_change("11111111111", ChangeReason::Checkpoint, 0);
    repo.insert(&change).unwrap();

    let err = repo.insert(&change).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    assert!(err.is_invariant_violation());
}

#[test]
fn test_history_is_newest_first() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    repo.insert(&make_change("11111111111", ChangeReason::Checkpoint, 0)).unwrap();
    repo.insert(&make_change("11111111111", ChangeReason::Exception, 20)).unwrap();
    repo.insert(&make_change("11111111111", ChangeReason::Checkpoint, 10)).unwrap();
    repo.insert(&make_change("22222222222", ChangeReason::Checkpoint, 5)).unwrap();

    let history = repo.find_history("11111111111").unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].reason, ChangeReason::Exception);
    assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[test]
fn test_find_latest_by_reason() {
    let conn = setup_test_db();
    let repo = CandidacyChangeRepository::new(conn.clone());

    repo.insert(&make_change("11111111111", ChangeReason::Checkpoint, 0)).unwrap();
    repo.insert(&make_change("11111111111", ChangeReason::ManuallyClosed, 10)).unwrap();

    let guard = conn.lock().unwrap();
    let found = CandidacyChangeRepository::find_latest_by_reason_tx(
        &guard,
        "11111111111",
        ChangeReason::Checkpoint,
    )
    .unwrap()
    .unwrap();
    assert_eq!(found.reason, ChangeReason::Checkpoint);

    let missing = CandidacyChangeRepository::find_latest_by_reason_tx(
        &guard,
        "11111111111",
        ChangeReason::Exception,
    )
    .unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_find_stale_candidates_only_considers_latest() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    // A: 最新为候选,早于 cutoff → 命中
    repo.insert(&make_change("11111111111", ChangeReason::Checkpoint, 0)).unwrap();
    // B: 曾经候选,后被关闭 → 不命中
    repo.insert(&make_change("22222222222", ChangeReason::Checkpoint, 0)).unwrap();
    repo.insert(&make_change("22222222222", ChangeReason::MeetingCompleted, 5)).unwrap();
    // C: 最新候选晚于 cutoff → 不命中
    repo.insert(&make_change("33333333333", ChangeReason::Checkpoint, 120)).unwrap();

    let cutoff = base_ts() + Duration::minutes(60);
    let stale = repo.find_stale_candidates(cutoff, 10).unwrap();

    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].person_ident, "11111111111");
}

#[test]
fn test_find_stale_candidates_respects_limit() {
    let repo = CandidacyChangeRepository::new(setup_test_db());

    for i in 0..5 {
        let person = format!("1000000000{}", i);
        repo.insert(&make_change(&person, ChangeReason::Checkpoint, i)).unwrap();
    }

    let stale = repo
        .find_stale_candidates(base_ts() + Duration::days(1), 3)
        .unwrap();
    assert_eq!(stale.len(), 3);
    assert_eq!(stale[0].person_ident, "10000000000");
}
