// ==========================================
// 对话会议候选资格 - 人员标识改写仓储
// ==========================================
// 职责: 统计旧标识的数据足迹 / 在事务中把旧标识改写为当前标识
// 红线: 只改 person_ident 列,不增删行,不动时间戳
// ==========================================

use crate::db::PERSON_TABLES;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct IdentityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IdentityRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 统计给定标识在全部人员表中的行数
    pub fn count_footprint(&self, idents: &[String]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Self::count_footprint_tx(&conn, idents)
    }

    pub fn count_footprint_tx(conn: &Connection, idents: &[String]) -> RepositoryResult<usize> {
        let mut total = 0usize;
        for table in PERSON_TABLES {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE person_ident = ?1", table);
            for ident in idents {
                let count: i64 = conn.query_row(&sql, params![ident], |row| row.get(0))?;
                total += count as usize;
            }
        }
        Ok(total)
    }

    /// 把全部人员表中的旧标识改写为当前标识（调用方持有事务）
    ///
    /// # 返回
    /// - Ok(rows): 实际被改写的行数
    pub fn rewrite_tx(
        conn: &Connection,
        active_ident: &str,
        inactive_idents: &[String],
    ) -> RepositoryResult<usize> {
        let mut total = 0usize;
        for table in PERSON_TABLES {
            let sql = format!("UPDATE {} SET person_ident = ?1 WHERE person_ident = ?2", table);
            for inactive in inactive_idents {
                if inactive == active_ident {
                    continue;
                }
                let rows = conn.execute(&sql, params![active_ident, inactive])?;
                if rows > 0 {
                    tracing::debug!(table, rows, "人员标识已改写");
                }
                total += rows;
            }
        }
        Ok(total)
    }
}
