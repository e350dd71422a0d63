// ==========================================
// 对话会议候选资格 - 发布出站箱仓储
// ==========================================
// 职责: 保存已提交变更的对外消息,供转发程序投递
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::repository::error::{expect_single_row, RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 出站箱记录
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntity {
    pub id: i64,
    pub message_uuid: String,
    pub person_ident: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

pub struct OutboxRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OutboxRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, message_uuid: &str, person_ident: &str, payload: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            INSERT INTO candidacy_outbox (message_uuid, person_ident, payload, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![message_uuid, person_ident, payload, format_ts(&Utc::now())],
        )?;
        expect_single_row(rows, "candidacy_outbox", message_uuid)?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询人员的出站消息（按写入顺序）
    pub fn find_by_person(&self, person_ident: &str) -> RepositoryResult<Vec<OutboxEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, message_uuid, person_ident, payload, created_at
            FROM candidacy_outbox
            WHERE person_ident = ?1
            ORDER BY id ASC
            "#,
        )?;
        let entries = stmt
            .query_map(params![person_ident], |row| {
                let created_at: String = row.get(4)?;
                Ok(OutboxEntity {
                    id: row.get(0)?,
                    message_uuid: row.get(1)?,
                    person_ident: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: parse_ts(&created_at, 4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM candidacy_outbox", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
