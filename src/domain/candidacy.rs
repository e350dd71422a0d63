// ==========================================
// 对话会议候选资格 - 候选资格变更领域模型
// ==========================================
// 红线: 变更日志只追加,不修改
// 红线: 当前状态 = 时间戳最大的变更(按时间戳,不按到达顺序)
// ==========================================

use crate::domain::types::ChangeReason;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// CandidacyChange - 候选资格变更
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidacyChange {
    pub uuid: String,                   // 变更ID
    pub created_at: DateTime<Utc>,      // 变更时间戳(决定"最新")
    pub person_ident: String,           // 人员标识
    pub kandidat: bool,                 // 是否候选
    pub reason: ChangeReason,           // 变更原因
    pub period_start: Option<NaiveDate>, // 随访期开始日期(仅检查点变更携带)
}

impl CandidacyChange {
    /// 以当前时间创建新变更
    pub fn new(person_ident: &str, reason: ChangeReason) -> Self {
        Self::at(person_ident, reason, Utc::now())
    }

    /// 以指定时间创建新变更
    pub fn at(person_ident: &str, reason: ChangeReason, created_at: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            created_at,
            person_ident: person_ident.to_string(),
            kandidat: reason.kandidat(),
            reason,
            period_start: None,
        }
    }

    /// 检查点产生的候选变更
    pub fn from_checkpoint(person_ident: &str, period_start: NaiveDate) -> Self {
        let mut change = Self::new(person_ident, ChangeReason::Checkpoint);
        change.period_start = Some(period_start);
        change
    }

    /// 变更是否早于随访期开始
    pub fn is_before_period_start(&self, period_start: NaiveDate) -> bool {
        self.created_at.date_naive() < period_start
    }
}

// ==========================================
// CandidacyStatus - 当前候选状态投影
// ==========================================
// 读时计算: 仅由最新一条变更决定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidacyStatus {
    pub person_ident: String,
    pub kandidat: bool,
    pub reason: Option<ChangeReason>,   // 无历史时为 None
    pub since: Option<DateTime<Utc>>,   // 当前状态生效时间
}

impl CandidacyStatus {
    /// 从最新变更投影当前状态
    pub fn project(person_ident: &str, latest: Option<&CandidacyChange>) -> Self {
        match latest {
            Some(change) => Self {
                person_ident: person_ident.to_string(),
                kandidat: change.kandidat,
                reason: Some(change.reason),
                since: Some(change.created_at),
            },
            None => Self {
                person_ident: person_ident.to_string(),
                kandidat: false,
                reason: None,
                since: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kandidat_follows_reason() {
        let change = CandidacyChange::new("12345678910", ChangeReason::Checkpoint);
        assert!(change.kandidat);

        let change = CandidacyChange::new("12345678910", ChangeReason::Exception);
        assert!(!change.kandidat);
        assert!(change.period_start.is_none());
    }

    #[test]
    fn test_is_before_period_start_compares_dates() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        let change = CandidacyChange::at("12345678910", ChangeReason::Checkpoint, ts);

        assert!(change.is_before_period_start(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()));
        assert!(!change.is_before_period_start(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
    }

    #[test]
    fn test_project_without_history() {
        let status = CandidacyStatus::project("12345678910", None);
        assert!(!status.kandidat);
        assert!(status.reason.is_none());
        assert!(status.since.is_none());
    }
}
