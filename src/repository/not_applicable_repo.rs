// ==========================================
// 对话会议候选资格 - 不适用记录仓储
// ==========================================
// 红线: 只追加; 配套的 kandidat=false 变更由服务层在同一事务中写入
// ==========================================

use crate::db::{format_ts, parse_code, parse_ts};
use crate::domain::assessment::NotApplicable;
use crate::domain::types::NotApplicableReason;
use crate::repository::error::{expect_single_row, RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT uuid, created_at, person_ident, reason, note, actor
    FROM not_applicable
"#;

pub struct NotApplicableRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotApplicableRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert_tx(conn: &Connection, record: &NotApplicable) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            INSERT INTO not_applicable (
                uuid, created_at, person_ident, reason, note, actor
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.uuid,
                format_ts(&record.created_at),
                record.person_ident,
                record.reason.as_str(),
                record.note,
                record.actor,
            ],
        )?;
        expect_single_row(rows, "not_applicable", &record.uuid)
    }

    pub fn find_by_person(&self, person_ident: &str) -> RepositoryResult<Vec<NotApplicable>> {
        self.find_by_persons(&[person_ident.to_string()])
    }

    pub fn find_by_persons(&self, persons: &[String]) -> RepositoryResult<Vec<NotApplicable>> {
        if persons.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let placeholders = vec!["?"; persons.len()].join(", ");
        let sql = format!(
            "{} WHERE person_ident IN ({}) ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(persons.iter()), Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    fn map_row(row: &Row) -> SqliteResult<NotApplicable> {
        let created_at: String = row.get(1)?;
        let reason: String = row.get(3)?;

        Ok(NotApplicable {
            uuid: row.get(0)?,
            created_at: parse_ts(&created_at, 1)?,
            person_ident: row.get(2)?,
            reason: parse_code(&reason, 3, NotApplicableReason::parse)?,
            note: row.get(4)?,
            actor: row.get(5)?,
        })
    }
}
