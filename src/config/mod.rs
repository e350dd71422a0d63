// ==========================================
// 对话会议候选资格 - 配置层
// ==========================================
// 职责: 系统配置管理,支持 global 覆写
// 存储: config_kv 表
// ==========================================

pub mod candidacy_config;
pub mod config_manager;

// 重导出核心配置
pub use candidacy_config::{CandidacyConfig, DEFAULT_CHECKPOINT_OFFSET_DAYS};
pub use config_manager::{config_keys, ConfigError, ConfigManager};
