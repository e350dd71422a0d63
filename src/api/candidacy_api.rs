// ==========================================
// 对话会议候选资格 - 候选查询接口
// ==========================================
// 职责: 当前候选状态、完整历史、例外与不适用列表
// 说明: 当前状态在读取时由最新变更投影得到
// ==========================================

use crate::api::assessment_service::AssessmentService;
use crate::api::error::ApiResult;
use crate::domain::{CandidacyChange, CandidacyException, CandidacyStatus, Hold, NotApplicable};
use crate::repository::{
    CandidacyChangeRepository, ExceptionRepository, HoldRepository, NotApplicableRepository,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 人员候选概览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidacyOverview {
    pub status: CandidacyStatus,
    pub active_hold: Option<Hold>,
}

/// 历史条目（按时间合并各类记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEntry {
    Change(CandidacyChange),
    Exception(CandidacyException),
    NotApplicable(NotApplicable),
    Hold(Hold),
}

impl HistoryEntry {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            HistoryEntry::Change(c) => c.created_at,
            HistoryEntry::Exception(e) => e.created_at,
            HistoryEntry::NotApplicable(n) => n.created_at,
            HistoryEntry::Hold(h) => h.created_at,
        }
    }
}

pub struct CandidacyApi {
    changes: CandidacyChangeRepository,
    exceptions: ExceptionRepository,
    not_applicable: NotApplicableRepository,
    holds: HoldRepository,
    assessment: Arc<AssessmentService>,
}

impl CandidacyApi {
    pub fn new(conn: Arc<Mutex<Connection>>, assessment: Arc<AssessmentService>) -> Self {
        Self {
            changes: CandidacyChangeRepository::new(conn.clone()),
            exceptions: ExceptionRepository::new(conn.clone()),
            not_applicable: NotApplicableRepository::new(conn.clone()),
            holds: HoldRepository::new(conn),
            assessment,
        }
    }

    pub fn candidacy_for_person(&self, person_ident: &str) -> ApiResult<CandidacyOverview> {
        let latest = self.changes.find_latest(person_ident)?;
        let status = CandidacyStatus::project(person_ident, latest.as_ref());
        let active_hold = if status.kandidat {
            self.assessment.get_hold(person_ident)?
        } else {
            None
        };

        Ok(CandidacyOverview { status, active_hold })
    }

    /// 全部历史（最新在前）
    pub fn candidacy_history_for_person(&self, person_ident: &str) -> ApiResult<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .changes
            .find_history(person_ident)?
            .into_iter()
            .map(HistoryEntry::Change)
            .collect();
        entries.extend(
            self.exceptions
                .find_by_person(person_ident)?
                .into_iter()
                .map(HistoryEntry::Exception),
        );
        entries.extend(
            self.not_applicable
                .find_by_person(person_ident)?
                .into_iter()
                .map(HistoryEntry::NotApplicable),
        );
        entries.extend(
            self.holds
                .find_by_person(person_ident)?
                .into_iter()
                .map(HistoryEntry::Hold),
        );

        // 稳定排序: 同一时间戳保持仓储返回顺序
        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(entries)
    }

    pub fn list_exceptions(&self, persons: &[String]) -> ApiResult<Vec<CandidacyException>> {
        Ok(self.exceptions.find_by_persons(persons)?)
    }

    pub fn list_not_applicable(&self, persons: &[String]) -> ApiResult<Vec<NotApplicable>> {
        Ok(self.not_applicable.find_by_persons(persons)?)
    }
}
