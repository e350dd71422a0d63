// ==========================================
// 对话会议候选资格 - 运行配置
// ==========================================
// 说明: 历史截止日期等参数作为显式配置注入引擎,不使用进程级可变全局量
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 默认检查点偏移天数（随访期开始 + 119 天）
pub const DEFAULT_CHECKPOINT_OFFSET_DAYS: i64 = 119;

/// 默认历史截止日期
pub fn default_historical_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 7, 1).unwrap_or(NaiveDate::MIN)
}

// ==========================================
// CandidacyConfig - 候选资格引擎配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidacyConfig {
    // ===== 检查点 =====
    pub historical_cutoff_date: NaiveDate, // 早于此日期开始的随访期使用原始偏移
    pub checkpoint_offset_days: i64,       // 检查点偏移天数
    pub evaluation_window_days: i64,       // 评估窗口（2 = 今天和昨天）

    // ===== 对账 =====
    pub reconciliation_cutoff: Option<DateTime<Utc>>, // None 时对账任务停用
    pub reconciliation_batch_size: usize,

    // ===== 消费者 =====
    pub consumer_batch_size: usize,
    pub consumer_poll_interval_ms: u64,
    pub consumer_backoff_secs: u64,

    // ===== 定时任务 =====
    pub evaluator_interval_secs: u64,
    pub reconciliation_interval_secs: u64,

    // ===== 外部协作服务 =====
    pub follow_up_case_url: String,
    pub identity_source_url: String,
}

impl Default for CandidacyConfig {
    fn default() -> Self {
        Self {
            historical_cutoff_date: default_historical_cutoff(),
            checkpoint_offset_days: DEFAULT_CHECKPOINT_OFFSET_DAYS,
            evaluation_window_days: 2,
            reconciliation_cutoff: None,
            reconciliation_batch_size: 100,
            consumer_batch_size: 100,
            consumer_poll_interval_ms: 1_000,
            consumer_backoff_secs: 60,
            evaluator_interval_secs: 600,
            reconciliation_interval_secs: 3_600,
            follow_up_case_url: "http://localhost:8081".to_string(),
            identity_source_url: "http://localhost:8082".to_string(),
        }
    }
}
