// ==========================================
// 对话会议候选资格 - 对外接口层
// ==========================================
// 职责: 供外部 REST 层调用的候选查询与人工评估接口
// 红线: 业务前置条件在此校验,错误以 ApiError 类别返回
// ==========================================

pub mod assessment_service;
pub mod candidacy_api;
pub mod error;

pub use assessment_service::AssessmentService;
pub use candidacy_api::{CandidacyApi, CandidacyOverview, HistoryEntry};
pub use error::{ApiError, ApiResult};
