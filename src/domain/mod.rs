// ==========================================
// 对话会议候选资格 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assessment;
pub mod candidacy;
pub mod checkpoint;
pub mod follow_up;
pub mod meeting;
pub mod types;

// 重导出核心类型
pub use assessment::{CandidacyException, Hold, NotApplicable};
pub use candidacy::{CandidacyChange, CandidacyStatus};
pub use checkpoint::Checkpoint;
pub use follow_up::FollowUpPeriod;
pub use meeting::MeetingStatus;
pub use types::{
    ChangeReason, CheckpointStatus, ExceptionReason, MeetingEventType, NotApplicableReason,
};
