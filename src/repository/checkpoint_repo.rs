// ==========================================
// 对话会议候选资格 - 检查点仓储
// ==========================================
// 红线: 只有 Planned → 终态 一次流转,终态守卫写在 SQL 条件里
// 说明: 重复投递产生的重复检查点在此不去重
// ==========================================

use crate::db::{format_date, format_ts, parse_code, parse_date, parse_ts};
use crate::domain::checkpoint::Checkpoint;
use crate::domain::types::CheckpointStatus;
use crate::repository::error::{expect_single_row, RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, uuid, created_at, person_ident, planned_date, status, processed_at
    FROM checkpoint
"#;

// ==========================================
// CheckpointRepository - 检查点仓储
// ==========================================
pub struct CheckpointRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CheckpointRepository {
    /// 创建新的检查点仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入检查点,返回行ID
    pub fn insert(&self, checkpoint: &Checkpoint) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, checkpoint)
    }

    pub fn insert_tx(conn: &Connection, checkpoint: &Checkpoint) -> RepositoryResult<i64> {
        let rows = conn.execute(
            r#"
            INSERT INTO checkpoint (
                uuid, created_at, person_ident, planned_date, status, processed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                checkpoint.uuid,
                format_ts(&checkpoint.created_at),
                checkpoint.person_ident,
                format_date(&checkpoint.planned_date),
                checkpoint.status.as_str(),
                checkpoint.processed_at.as_ref().map(format_ts),
            ],
        )?;
        expect_single_row(rows, "checkpoint", &checkpoint.uuid)?;

        Ok(conn.last_insert_rowid())
    }

    /// 将 Planned 检查点流转到终态
    ///
    /// # 返回
    /// - `Err(InvalidStateTransition)`: 目标不是终态,或检查点已不是 Planned
    pub fn mark_processed_tx(
        conn: &Connection,
        uuid: &str,
        status: CheckpointStatus,
        processed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        if !status.is_terminal() {
            return Err(RepositoryError::InvalidStateTransition {
                from: CheckpointStatus::Planned.to_string(),
                to: status.to_string(),
            });
        }

        let rows = conn.execute(
            r#"
            UPDATE checkpoint
            SET status = ?1, processed_at = ?2
            WHERE uuid = ?3 AND status = ?4
            "#,
            params![
                status.as_str(),
                format_ts(&processed_at),
                uuid,
                CheckpointStatus::Planned.as_str(),
            ],
        )?;

        if rows == 0 {
            let current = Self::find_by_uuid_tx(conn, uuid)?;
            return match current {
                Some(cp) => Err(RepositoryError::InvalidStateTransition {
                    from: cp.status.to_string(),
                    to: status.to_string(),
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "checkpoint".to_string(),
                    id: uuid.to_string(),
                }),
            };
        }

        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询计划日期落在 [from, to] 的 Planned 检查点
    pub fn find_due(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<Vec<Checkpoint>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE status = ?1 AND planned_date BETWEEN ?2 AND ?3 ORDER BY planned_date ASC, id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let checkpoints = stmt
            .query_map(
                params![
                    CheckpointStatus::Planned.as_str(),
                    format_date(&from),
                    format_date(&to),
                ],
                Self::map_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(checkpoints)
    }

    pub fn find_by_uuid(&self, uuid: &str) -> RepositoryResult<Option<Checkpoint>> {
        let conn = self.get_conn()?;
        Self::find_by_uuid_tx(&conn, uuid)
    }

    pub fn find_by_uuid_tx(conn: &Connection, uuid: &str) -> RepositoryResult<Option<Checkpoint>> {
        let sql = format!("{} WHERE uuid = ?1", SELECT_COLUMNS);
        let checkpoint = conn
            .query_row(&sql, params![uuid], Self::map_row)
            .optional()?;
        Ok(checkpoint)
    }

    /// 查询人员全部检查点（计划日期倒序）
    pub fn find_by_person(&self, person_ident: &str) -> RepositoryResult<Vec<Checkpoint>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE person_ident = ?1 ORDER BY planned_date DESC, id DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let checkpoints = stmt
            .query_map(params![person_ident], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(checkpoints)
    }

    fn map_row(row: &Row) -> SqliteResult<Checkpoint> {
        let created_at: String = row.get(2)?;
        let planned_date: String = row.get(4)?;
        let status: String = row.get(5)?;
        let processed_at: Option<String> = row.get(6)?;

        Ok(Checkpoint {
            id: row.get(0)?,
            uuid: row.get(1)?,
            created_at: parse_ts(&created_at, 2)?,
            person_ident: row.get(3)?,
            planned_date: parse_date(&planned_date, 4)?,
            status: parse_code(&status, 5, CheckpointStatus::parse)?,
            processed_at: processed_at.map(|ts| parse_ts(&ts, 6)).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_find_due_window_and_status() {
        let conn = setup_test_db();
        let repo = CheckpointRepository::new(conn.clone());

        repo.insert(&Checkpoint::planned("11111111111", date(2025, 5, 9))).unwrap();
        repo.insert(&Checkpoint::planned("22222222222", date(2025, 5, 10))).unwrap();
        repo.insert(&Checkpoint::planned("33333333333", date(2025, 5, 11))).unwrap();
        let processed = Checkpoint::planned("44444444444", date(2025, 5, 10));
        repo.insert(&processed).unwrap();
        {
            let guard = conn.lock().unwrap();
            CheckpointRepository::mark_processed_tx(
                &guard,
                &processed.uuid,
                CheckpointStatus::NotCandidate,
                Utc::now(),
            )
            .unwrap();
        }

        let due = repo.find_due(date(2025, 5, 9), date(2025, 5, 10)).unwrap();
        let persons: Vec<_> = due.iter().map(|c| c.person_ident.as_str()).collect();
        assert_eq!(persons, vec!["11111111111", "22222222222"]);
    }

    #[test]
    fn test_duplicates_are_tolerated() {
        let repo = CheckpointRepository::new(setup_test_db());

        repo.insert(&Checkpoint::planned("11111111111", date(2025, 5, 9))).unwrap();
        repo.insert(&Checkpoint::planned("11111111111", date(2025, 5, 9))).unwrap();

        assert_eq!(repo.find_by_person("11111111111").unwrap().len(), 2);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let conn = setup_test_db();
        let repo = CheckpointRepository::new(conn.clone());

        let cp = Checkpoint::planned("11111111111", date(2025, 5, 9));
        repo.insert(&cp).unwrap();

        let guard = conn.lock().unwrap();
        CheckpointRepository::mark_processed_tx(&guard, &cp.uuid, CheckpointStatus::Candidate, Utc::now())
            .unwrap();

        let err = CheckpointRepository::mark_processed_tx(
            &guard,
            &cp.uuid,
            CheckpointStatus::NotCandidate,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));

        let stored = CheckpointRepository::find_by_uuid_tx(&guard, &cp.uuid).unwrap().unwrap();
        assert_eq!(stored.status, CheckpointStatus::Candidate);
        assert!(stored.processed_at.is_some());
    }

    #[test]
    fn test_mark_processed_rejects_planned_target_and_missing_row() {
        let conn = setup_test_db();
        let guard = conn.lock().unwrap();

        let err = CheckpointRepository::mark_processed_tx(
            &guard,
            "missing",
            CheckpointStatus::Planned,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));

        let err = CheckpointRepository::mark_processed_tx(
            &guard,
            "missing",
            CheckpointStatus::Candidate,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
