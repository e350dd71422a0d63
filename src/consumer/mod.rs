// ==========================================
// 对话会议候选资格 - 入站事件消费
// ==========================================
// 职责: 入站载荷定义、事件源、消费循环、主题处理器
// 说明: 每个主题一个独立的单任务消费循环,至少一次投递
// ==========================================

pub mod handlers;
pub mod records;
pub mod runner;
pub mod source;

pub use handlers::{FollowUpPeriodHandler, IdentityChangeHandler, MeetingStatusHandler};
pub use runner::{BatchHandler, BatchSummary, ConsumerError, ConsumerRunner, ConsumerStats};
pub use source::{EventSource, SqliteInbox};

// 主题名称
pub const FOLLOW_UP_PERIOD_TOPIC: &str = "follow-up-period-updated";
pub const MEETING_STATUS_TOPIC: &str = "meeting-status-changed";
pub const IDENTITY_CHANGED_TOPIC: &str = "identity-changed";
