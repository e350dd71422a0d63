// ==========================================
// 对话会议候选资格 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// 约束: 跨表写入提供 *_tx 关联函数,由调用方持有事务
// ==========================================

pub mod candidacy_change_repo;
pub mod checkpoint_repo;
pub mod error;
pub mod exception_repo;
pub mod hold_repo;
pub mod identity_repo;
pub mod inbound_record_repo;
pub mod meeting_status_repo;
pub mod not_applicable_repo;
pub mod outbox_repo;

// 重导出核心仓储
pub use candidacy_change_repo::CandidacyChangeRepository;
pub use checkpoint_repo::CheckpointRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use exception_repo::ExceptionRepository;
pub use hold_repo::HoldRepository;
pub use identity_repo::IdentityRepository;
pub use inbound_record_repo::{InboundRecord, InboundRecordRepository};
pub use meeting_status_repo::MeetingStatusRepository;
pub use not_applicable_repo::NotApplicableRepository;
pub use outbox_repo::{OutboxEntity, OutboxRepository};
