// ==========================================
// 对话会议候选资格 - 入站记录仓储
// ==========================================
// 职责: 按主题保存入站事件,按偏移量拉取与确认
// 说明: 未确认的记录在下次拉取时重新投递（至少一次）
// ==========================================

use crate::db::format_ts;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 入站记录（payload 为 None 表示墓碑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub offset: i64,
    pub topic: String,
    pub key: Option<String>,
    pub payload: Option<String>,
}

pub struct InboundRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InboundRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加入站记录,返回偏移量
    pub fn append(&self, topic: &str, key: Option<&str>, payload: Option<&str>) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO inbound_record (topic, record_key, payload, received_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![topic, key, payload, format_ts(&Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 拉取主题下最早的未确认记录
    pub fn poll(&self, topic: &str, limit: usize) -> RepositoryResult<Vec<InboundRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_offset, topic, record_key, payload
            FROM inbound_record
            WHERE topic = ?1 AND acked = 0
            ORDER BY record_offset ASC
            LIMIT ?2
            "#,
        )?;
        let records = stmt
            .query_map(params![topic, limit as i64], |row| {
                Ok(InboundRecord {
                    offset: row.get(0)?,
                    topic: row.get(1)?,
                    key: row.get(2)?,
                    payload: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 确认主题下偏移量不超过 `through` 的全部记录
    pub fn ack_through(&self, topic: &str, through: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE inbound_record SET acked = 1 WHERE topic = ?1 AND record_offset <= ?2 AND acked = 0",
            params![topic, through],
        )?;
        Ok(rows)
    }

    /// 主题下未确认记录数
    pub fn pending_count(&self, topic: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM inbound_record WHERE topic = ?1 AND acked = 0",
            params![topic],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
