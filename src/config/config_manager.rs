// ==========================================
// 对话会议候选资格 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 缺失或无法解析的配置项回落到默认值
// ==========================================

use crate::config::candidacy_config::CandidacyConfig;
use crate::db::open_sqlite_connection;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// 配置层错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置库打开失败: {0}")]
    Open(String),

    #[error("锁获取失败: {0}")]
    Lock(String),

    #[error("配置读取失败: {0}")]
    Query(#[from] rusqlite::Error),
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ConfigError::Open(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| ConfigError::Lock(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| ConfigError::Lock(e.to_string()))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> Result<HashMap<String, String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| ConfigError::Lock(e.to_string()))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 读取并解析配置项,失败回落默认值
    fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "配置值无法解析,使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn get_date_or(&self, key: &str, default: NaiveDate) -> Result<NaiveDate, ConfigError> {
        match self.get_global_config_value(key)? {
            Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "日期配置无法解析,使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn get_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
        match self.get_global_config_value(key)? {
            Some(raw) if !raw.trim().is_empty() => match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(v) => Ok(Some(v.with_timezone(&Utc))),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "时间戳配置无法解析,视为未配置");
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    // ==========================================
    // 候选资格配置
    // ==========================================

    /// 加载完整的候选资格配置
    pub fn load_candidacy_config(&self) -> Result<CandidacyConfig, ConfigError> {
        let d = CandidacyConfig::default();

        Ok(CandidacyConfig {
            historical_cutoff_date: self
                .get_date_or(config_keys::HISTORICAL_CUTOFF_DATE, d.historical_cutoff_date)?,
            checkpoint_offset_days: self
                .get_parsed_or(config_keys::CHECKPOINT_OFFSET_DAYS, d.checkpoint_offset_days)?,
            evaluation_window_days: self
                .get_parsed_or(config_keys::EVALUATION_WINDOW_DAYS, d.evaluation_window_days)?
                .max(1),
            reconciliation_cutoff: self.get_timestamp(config_keys::RECONCILIATION_CUTOFF)?,
            reconciliation_batch_size: self.get_parsed_or(
                config_keys::RECONCILIATION_BATCH_SIZE,
                d.reconciliation_batch_size,
            )?,
            consumer_batch_size: self
                .get_parsed_or(config_keys::CONSUMER_BATCH_SIZE, d.consumer_batch_size)?,
            consumer_poll_interval_ms: self.get_parsed_or(
                config_keys::CONSUMER_POLL_INTERVAL_MS,
                d.consumer_poll_interval_ms,
            )?,
            consumer_backoff_secs: self
                .get_parsed_or(config_keys::CONSUMER_BACKOFF_SECS, d.consumer_backoff_secs)?,
            evaluator_interval_secs: self
                .get_parsed_or(config_keys::EVALUATOR_INTERVAL_SECS, d.evaluator_interval_secs)?,
            reconciliation_interval_secs: self.get_parsed_or(
                config_keys::RECONCILIATION_INTERVAL_SECS,
                d.reconciliation_interval_secs,
            )?,
            follow_up_case_url: self
                .get_global_config_value(config_keys::FOLLOW_UP_CASE_URL)?
                .unwrap_or(d.follow_up_case_url),
            identity_source_url: self
                .get_global_config_value(config_keys::IDENTITY_SOURCE_URL)?
                .unwrap_or(d.identity_source_url),
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 检查点
    pub const HISTORICAL_CUTOFF_DATE: &str = "historical_cutoff_date";
    pub const CHECKPOINT_OFFSET_DAYS: &str = "checkpoint_offset_days";
    pub const EVALUATION_WINDOW_DAYS: &str = "evaluation_window_days";

    // 对账
    pub const RECONCILIATION_CUTOFF: &str = "reconciliation_cutoff"; // RFC3339
    pub const RECONCILIATION_BATCH_SIZE: &str = "reconciliation_batch_size";

    // 消费者
    pub const CONSUMER_BATCH_SIZE: &str = "consumer_batch_size";
    pub const CONSUMER_POLL_INTERVAL_MS: &str = "consumer_poll_interval_ms";
    pub const CONSUMER_BACKOFF_SECS: &str = "consumer_backoff_secs";

    // 定时任务
    pub const EVALUATOR_INTERVAL_SECS: &str = "evaluator_interval_secs";
    pub const RECONCILIATION_INTERVAL_SECS: &str = "reconciliation_interval_secs";

    // 外部协作服务
    pub const FOLLOW_UP_CASE_URL: &str = "follow_up_case_url";
    pub const IDENTITY_SOURCE_URL: &str = "identity_source_url";
}
