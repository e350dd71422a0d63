use super::core::CandidacyChangeRepository;
use crate::db::{format_ts, parse_code, parse_date, parse_ts};
use crate::domain::candidacy::CandidacyChange;
use crate::domain::types::ChangeReason;
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT uuid, created_at, person_ident, kandidat, reason, period_start
    FROM candidacy_change
"#;

impl CandidacyChangeRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询人员最新变更
    pub fn find_latest(&self, person_ident: &str) -> RepositoryResult<Option<CandidacyChange>> {
        let conn = self.get_conn()?;
        Self::find_latest_tx(&conn, person_ident)
    }

    /// 查询人员最新变更（调用方持有连接/事务）
    pub fn find_latest_tx(
        conn: &Connection,
        person_ident: &str,
    ) -> RepositoryResult<Option<CandidacyChange>> {
        let sql = format!(
            "{} WHERE person_ident = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let change = conn
            .query_row(&sql, params![person_ident], Self::map_row)
            .optional()?;
        Ok(change)
    }

    /// 查询人员最新的 kandidat=true 变更
    pub fn find_latest_candidate(
        &self,
        person_ident: &str,
    ) -> RepositoryResult<Option<CandidacyChange>> {
        let conn = self.get_conn()?;
        Self::find_latest_candidate_tx(&conn, person_ident)
    }

    pub fn find_latest_candidate_tx(
        conn: &Connection,
        person_ident: &str,
    ) -> RepositoryResult<Option<CandidacyChange>> {
        let sql = format!(
            "{} WHERE person_ident = ?1 AND kandidat = 1 ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let change = conn
            .query_row(&sql, params![person_ident], Self::map_row)
            .optional()?;
        Ok(change)
    }

    /// 查询人员指定原因的最新变更
    pub fn find_latest_by_reason(
        &self,
        person_ident: &str,
        reason: ChangeReason,
    ) -> RepositoryResult<Option<CandidacyChange>> {
        let conn = self.get_conn()?;
        Self::find_latest_by_reason_tx(&conn, person_ident, reason)
    }

    pub fn find_latest_by_reason_tx(
        conn: &Connection,
        person_ident: &str,
        reason: ChangeReason,
    ) -> RepositoryResult<Option<CandidacyChange>> {
        let sql = format!(
            "{} WHERE person_ident = ?1 AND reason = ?2 ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let change = conn
            .query_row(&sql, params![person_ident, reason.as_str()], Self::map_row)
            .optional()?;
        Ok(change)
    }

    /// 查询人员全部变更历史（最新在前）
    pub fn find_history(&self, person_ident: &str) -> RepositoryResult<Vec<CandidacyChange>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE person_ident = ?1 ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let changes = stmt
            .query_map(params![person_ident], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(changes)
    }

    /// 查询过期候选: 每人最新变更为 kandidat=true 且早于 cutoff
    ///
    /// 说明：
    /// - 只看每人最新一条,被关闭过的人员下次不会再命中（幂等）
    /// - 不区分变更原因
    pub fn find_stale_candidates(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> RepositoryResult<Vec<CandidacyChange>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.uuid, c.created_at, c.person_ident, c.kandidat, c.reason, c.period_start
            FROM candidacy_change c
            WHERE c.id = (
                SELECT l.id FROM candidacy_change l
                WHERE l.person_ident = c.person_ident
                ORDER BY l.created_at DESC, l.id DESC
                LIMIT 1
            )
              AND c.kandidat = 1
              AND c.created_at < ?1
            ORDER BY c.created_at ASC, c.id ASC
            LIMIT ?2
            "#,
        )?;
        let changes = stmt
            .query_map(params![format_ts(&cutoff), limit as i64], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(changes)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 映射数据库行到 CandidacyChange
    fn map_row(row: &Row) -> SqliteResult<CandidacyChange> {
        let created_at: String = row.get(1)?;
        let reason: String = row.get(4)?;
        let period_start: Option<String> = row.get(5)?;

        Ok(CandidacyChange {
            uuid: row.get(0)?,
            created_at: parse_ts(&created_at, 1)?,
            person_ident: row.get(2)?,
            kandidat: row.get(3)?,
            reason: parse_code(&reason, 4, ChangeReason::parse)?,
            period_start: period_start.map(|d| parse_date(&d, 5)).transpose()?,
        })
    }
}
