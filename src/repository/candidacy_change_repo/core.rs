use crate::db::{format_date, format_ts};
use crate::domain::candidacy::CandidacyChange;
use crate::repository::error::{expect_single_row, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// CandidacyChangeRepository - 候选资格变更日志
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct CandidacyChangeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CandidacyChangeRepository {
    /// 创建新的变更日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加一条变更
    ///
    /// # 返回
    /// - `Ok(uuid)`: 成功追加
    /// - `Err(UniqueConstraintViolation)`: uuid 重复
    pub fn insert(&self, change: &CandidacyChange) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, change)
    }

    /// 在调用方事务中追加一条变更
    pub fn insert_tx(conn: &Connection, change: &CandidacyChange) -> RepositoryResult<String> {
        let rows = conn.execute(
            r#"
            INSERT INTO candidacy_change (
                uuid, created_at, person_ident, kandidat, reason, period_start
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                change.uuid,
                format_ts(&change.created_at),
                change.person_ident,
                change.kandidat,
                change.reason.as_str(),
                change.period_start.as_ref().map(format_date),
            ],
        )?;
        expect_single_row(rows, "candidacy_change", &change.uuid)?;

        Ok(change.uuid.clone())
    }
}
