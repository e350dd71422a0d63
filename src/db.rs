// ==========================================
// 对话会议候选资格 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一时间戳编码，保证字典序 = 时间序
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（定宽 UTC，微秒精度）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 受身份合并影响的表（均含 person_ident 列）
pub const PERSON_TABLES: [&str; 6] = [
    "candidacy_change",
    "checkpoint",
    "candidacy_exception",
    "not_applicable",
    "hold",
    "meeting_status",
];

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化全部表结构（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS candidacy_change (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            kandidat INTEGER NOT NULL,
            reason TEXT NOT NULL,
            period_start TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_candidacy_change_person
          ON candidacy_change(person_ident, created_at);

        CREATE TABLE IF NOT EXISTS checkpoint (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            planned_date TEXT NOT NULL,
            status TEXT NOT NULL,
            processed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_checkpoint_status_date
          ON checkpoint(status, planned_date);

        CREATE INDEX IF NOT EXISTS idx_checkpoint_person
          ON checkpoint(person_ident);

        CREATE TABLE IF NOT EXISTS candidacy_exception (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            reason TEXT NOT NULL,
            note TEXT,
            actor TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_candidacy_exception_person
          ON candidacy_exception(person_ident);

        CREATE TABLE IF NOT EXISTS not_applicable (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            reason TEXT NOT NULL,
            note TEXT,
            actor TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_not_applicable_person
          ON not_applicable(person_ident);

        CREATE TABLE IF NOT EXISTS hold (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            deadline TEXT NOT NULL,
            actor TEXT NOT NULL,
            description TEXT NOT NULL,
            closed INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_hold_person
          ON hold(person_ident, created_at);

        CREATE TABLE IF NOT EXISTS meeting_status (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            event_type TEXT NOT NULL,
            meeting_at TEXT NOT NULL,
            status_changed_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_meeting_status_person
          ON meeting_status(person_ident, event_type, status_changed_at);

        CREATE TABLE IF NOT EXISTS candidacy_outbox (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            message_uuid TEXT NOT NULL,
            person_ident TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS inbound_record (
            record_offset INTEGER PRIMARY KEY AUTOINCREMENT,
            topic TEXT NOT NULL,
            record_key TEXT,
            payload TEXT,
            received_at TEXT NOT NULL,
            acked INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_inbound_record_topic
          ON inbound_record(topic, acked, record_offset);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// 时间编码
// ==========================================

pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 解析时间戳列（在 row mapper 中使用）
pub fn parse_ts(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// 解析日期列（在 row mapper 中使用）
pub fn parse_date(raw: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// 解析枚举编码列
pub fn parse_code<T>(raw: &str, column: usize, parse: impl Fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Text,
            format!("未知编码: {}", raw).into(),
        )
    })
}
