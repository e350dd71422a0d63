// ==========================================
// 对话会议候选资格 - 人工评估领域模型
// ==========================================
// 包含: 例外(Exception) / 不适用(NotApplicable) / 暂缓(Hold)
// 红线: 例外与不适用创建时必须同事务追加 kandidat=false 变更
// ==========================================

use crate::domain::types::{ExceptionReason, NotApplicableReason};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// CandidacyException - 例外
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidacyException {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub person_ident: String,
    pub reason: ExceptionReason,
    pub note: Option<String>, // 自由文本备注
    pub actor: String,        // 操作人
}

impl CandidacyException {
    pub fn new(person_ident: &str, reason: ExceptionReason, note: Option<String>, actor: &str) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            person_ident: person_ident.to_string(),
            reason,
            note,
            actor: actor.to_string(),
        }
    }
}

// ==========================================
// NotApplicable - 不适用
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotApplicable {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub person_ident: String,
    pub reason: NotApplicableReason,
    pub note: Option<String>,
    pub actor: String,
}

impl NotApplicable {
    pub fn new(
        person_ident: &str,
        reason: NotApplicableReason,
        note: Option<String>,
        actor: &str,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            person_ident: person_ident.to_string(),
            reason,
            note,
            actor: actor.to_string(),
        }
    }
}

// ==========================================
// Hold - 暂缓
// ==========================================
// 有效条件: 创建时间严格晚于最新 kandidat=true 变更,且未关闭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub person_ident: String,
    pub deadline: NaiveDate,  // 暂缓截止日期
    pub actor: String,
    pub description: String,
    pub closed: bool,
}

impl Hold {
    pub fn new(person_ident: &str, deadline: NaiveDate, actor: &str, description: &str) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            person_ident: person_ident.to_string(),
            deadline,
            actor: actor.to_string(),
            description: description.to_string(),
            closed: false,
        }
    }

    /// 相对于最新候选时间是否有效
    pub fn is_active_since(&self, latest_candidate_at: DateTime<Utc>) -> bool {
        !self.closed && self.created_at > latest_candidate_at
    }
}
