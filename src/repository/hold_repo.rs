// ==========================================
// 对话会议候选资格 - 暂缓记录仓储
// ==========================================
// 说明: 除 closed 标记外只追加
// ==========================================

use crate::db::{format_date, format_ts, parse_date, parse_ts};
use crate::domain::assessment::Hold;
use crate::repository::error::{expect_single_row, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT uuid, created_at, person_ident, deadline, actor, description, closed
    FROM hold
"#;

pub struct HoldRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HoldRepository {
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

    pub fn insert(&self, hold: &Hold) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, hold)
    }

    pub fn insert_tx(conn: &Connection, hold: &Hold) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            INSERT INTO hold (
                uuid, created_at, person_ident, deadline, actor, description, closed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                hold.uuid,
                format_ts(&hold.created_at),
                hold.person_ident,
                format_date(&hold.deadline),
                hold.actor,
                hold.description,
                hold.closed,
            ],
        )?;
        expect_single_row(rows, "hold", &hold.uuid)
    }

    /// 关闭人员的全部未关闭暂缓
    ///
    /// # 返回
    /// - Ok(rows): 被关闭的条数
    pub fn close_open_tx(conn: &Connection, person_ident: &str) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE hold SET closed = 1 WHERE person_ident = ?1 AND closed = 0",
            params![person_ident],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询人员最新一条暂缓（无论是否关闭）
    pub fn find_latest(&self, person_ident: &str) -> RepositoryResult<Option<Hold>> {
        let conn = self.get_conn()?;
        Self::find_latest_tx(&conn, person_ident)
    }

    pub fn find_latest_tx(conn: &Connection, person_ident: &str) -> RepositoryResult<Option<Hold>> {
        let sql = format!(
            "{} WHERE person_ident = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let hold = conn
            .query_row(&sql, params![person_ident], Self::map_row)
            .optional()?;
        Ok(hold)
    }

    /// 查询人员全部暂缓（最新在前）
    pub fn find_by_person(&self, person_ident: &str) -> RepositoryResult<Vec<Hold>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE person_ident = ?1 ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let holds = stmt
            .query_map(params![person_ident], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(holds)
    }

    fn map_row(row: &Row) -> SqliteResult<Hold> {
        let created_at: String = row.get(1)?;
        let deadline: String = row.get(3)?;

        Ok(Hold {
            uuid: row.get(0)?,
            created_at: parse_ts(&created_at, 1)?,
            person_ident: row.get(2)?,
            deadline: parse_date(&deadline, 3)?,
            actor: row.get(4)?,
            description: row.get(5)?,
            closed: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_hold(person: &str) -> Hold {
        Hold::new(
            person,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            "Z999999",
            "等待医生意见",
        )
    }

    #[test]
    fn test_find_latest_picks_newest() {
        let repo = HoldRepository::new(setup_test_db());

        let older = make_hold("11111111111");
        let mut newer = make_hold("11111111111");
        newer.created_at = older.created_at + Duration::minutes(5);
        repo.insert(&newer).unwrap();
        repo.insert(&older).unwrap();

        let latest = repo.find_latest("11111111111").unwrap().unwrap();
        assert_eq!(latest.uuid, newer.uuid);
        assert!(repo.find_latest("22222222222").unwrap().is_none());
    }

    #[test]
    fn test_close_open_only_touches_person() {
        let conn = setup_test_db();
        let repo = HoldRepository::new(conn.clone());

        repo.insert(&make_hold("11111111111")).unwrap();
        repo.insert(&make_hold("11111111111")).unwrap();
        repo.insert(&make_hold("22222222222")).unwrap();

        let closed = {
            let guard = conn.lock().unwrap();
            HoldRepository::close_open_tx(&guard, "11111111111").unwrap()
        };
        assert_eq!(closed, 2);

        assert!(repo.find_by_person("11111111111").unwrap().iter().all(|h| h.closed));
        assert!(!repo.find_latest("22222222222").unwrap().unwrap().closed);

        let again = {
            let guard = conn.lock().unwrap();
            HoldRepository::close_open_tx(&guard, "11111111111").unwrap()
        };
        assert_eq!(again, 0);
    }
}
