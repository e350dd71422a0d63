// ==========================================
// 对话会议候选资格 - 核心库
// ==========================================
// 职责: 病假员工的对话会议候选资格状态机
// 技术栈: Rust + SQLite + tokio
// 红线: 候选历史只追加,"当前状态"永远取时间戳最大的一条
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 状态机规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// 入站事件消费
pub mod consumer;

// 外部协作服务客户端
pub mod client;

// 定时任务
pub mod scheduler;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ChangeReason, CheckpointStatus, ExceptionReason, MeetingEventType, NotApplicableReason,
};

// 领域实体
pub use domain::{
    CandidacyChange, CandidacyException, CandidacyStatus, Checkpoint, FollowUpPeriod, Hold,
    MeetingStatus, NotApplicable,
};

// 引擎
pub use engine::{
    CandidacyCore, CheckpointEvaluator, FollowUpIngestor, IdentityMergeHandler, MeetingReactor,
    ReconciliationJob,
};

// API
pub use api::{AssessmentService, CandidacyApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "对话会议候选资格";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
