// ==========================================
// 对话会议候选资格 - 引擎层
// ==========================================
// 职责: 实现候选状态机规则,不拼 SQL
// 红线: 所有"最新"判断都从存储的时间戳重新推导,不缓存内存状态
// ==========================================

pub mod candidacy_core;
pub mod checkpoint_evaluator;
pub mod error;
pub mod events;
pub mod follow_up_ingestor;
pub mod identity_merge;
pub mod meeting_reactor;
pub mod reconciliation;

// 重导出核心引擎
pub use candidacy_core::CandidacyCore;
pub use checkpoint_evaluator::{CheckpointEvaluator, CheckpointOutcome, EvaluationSummary};
pub use error::{EngineError, EngineResult};
pub use events::{
    CandidacyChangeMessage, CandidacyChangePublisher, NoOpPublisher, OptionalPublisher,
    OutboxPublisher,
};
pub use follow_up_ingestor::{FollowUpIngestor, IngestSummary};
pub use identity_merge::{IdentityMergeHandler, MergeOutcome};
pub use meeting_reactor::{MeetingReactor, ReactorSummary};
pub use reconciliation::{ReconciliationJob, ReconciliationSummary};
