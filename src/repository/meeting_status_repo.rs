// ==========================================
// 对话会议候选资格 - 会议状态仓储
// ==========================================
// 红线: 每条会议事件无条件落库,只追加
// ==========================================

use crate::db::{format_ts, parse_code, parse_ts};
use crate::domain::meeting::MeetingStatus;
use crate::domain::types::MeetingEventType;
use crate::repository::error::{expect_single_row, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT uuid, created_at, person_ident, event_type, meeting_at, status_changed_at
    FROM meeting_status
"#;

pub struct MeetingStatusRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MeetingStatusRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, status: &MeetingStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, status)
    }

    pub fn insert_tx(conn: &Connection, status: &MeetingStatus) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            INSERT INTO meeting_status (
                uuid, created_at, person_ident, event_type, meeting_at, status_changed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                status.uuid,
                format_ts(&status.created_at),
                status.person_ident,
                status.event_type.as_str(),
                format_ts(&status.meeting_at),
                format_ts(&status.status_changed_at),
            ],
        )?;
        expect_single_row(rows, "meeting_status", &status.uuid)
    }

    /// 查询人员某类型的最新会议事件（按状态变更时间）
    pub fn find_latest_of_type(
        &self,
        person_ident: &str,
        event_type: MeetingEventType,
    ) -> RepositoryResult<Option<MeetingStatus>> {
        let conn = self.get_conn()?;
        Self::find_latest_of_type_tx(&conn, person_ident, event_type)
    }

    pub fn find_latest_of_type_tx(
        conn: &Connection,
        person_ident: &str,
        event_type: MeetingEventType,
    ) -> RepositoryResult<Option<MeetingStatus>> {
        let sql = format!(
            "{} WHERE person_ident = ?1 AND event_type = ?2 ORDER BY status_changed_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let status = conn
            .query_row(&sql, params![person_ident, event_type.as_str()], Self::map_row)
            .optional()?;
        Ok(status)
    }

    pub fn find_by_person(&self, person_ident: &str) -> RepositoryResult<Vec<MeetingStatus>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE person_ident = ?1 ORDER BY status_changed_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let statuses = stmt
            .query_map(params![person_ident], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(statuses)
    }

    fn map_row(row: &Row) -> SqliteResult<MeetingStatus> {
        let created_at: String = row.get(1)?;
        let event_type: String = row.get(3)?;
        let meeting_at: String = row.get(4)?;
        let status_changed_at: String = row.get(5)?;

        Ok(MeetingStatus {
            uuid: row.get(0)?,
            created_at: parse_ts(&created_at, 1)?,
            person_ident: row.get(2)?,
            event_type: parse_code(&event_type, 3, MeetingEventType::parse)?,
            meeting_at: parse_ts(&meeting_at, 4)?,
            status_changed_at: parse_ts(&status_changed_at, 5)?,
        })
    }
}
