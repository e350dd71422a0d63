// ==========================================
// 对话会议候选资格 - 人工评估服务
// ==========================================
// 职责: 例外、不适用、暂缓的创建与暂缓查询
// 前置条件: 人员最新变更必须为 kandidat=true,否则 Conflict（同步拒绝,不排队）
// 红线: 例外/不适用与对应的非候选变更在同一事务写入,提交后发布
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{
    CandidacyChange, CandidacyException, ChangeReason, ExceptionReason, Hold, NotApplicable,
    NotApplicableReason,
};
use crate::engine::error::lock_conn;
use crate::engine::events::{CandidacyChangeMessage, OptionalPublisher};
use crate::repository::{
    CandidacyChangeRepository, ExceptionRepository, HoldRepository, NotApplicableRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

pub struct AssessmentService {
    conn: Arc<Mutex<Connection>>,
    changes: CandidacyChangeRepository,
    holds: HoldRepository,
    publisher: OptionalPublisher,
}

impl AssessmentService {
    pub fn new(conn: Arc<Mutex<Connection>>, publisher: OptionalPublisher) -> Self {
        Self {
            changes: CandidacyChangeRepository::new(conn.clone()),
            holds: HoldRepository::new(conn.clone()),
            conn,
            publisher,
        }
    }

    /// 创建例外并关闭候选
    #[instrument(skip(self, note))]
    pub fn create_exception(
        &self,
        person_ident: &str,
        reason: ExceptionReason,
        note: Option<String>,
        actor: &str,
    ) -> ApiResult<CandidacyException> {
        validate_input(person_ident, actor)?;
        let exception = CandidacyException::new(person_ident, reason, normalize_note(note), actor);
        let change = CandidacyChange::new(person_ident, ChangeReason::Exception);

        {
            let conn = lock_conn(&self.conn)?;
            let tx = conn.unchecked_transaction()?;
            ensure_candidate(&tx, person_ident)?;
            ExceptionRepository::insert_tx(&tx, &exception)?;
            CandidacyChangeRepository::insert_tx(&tx, &change)?;
            tx.commit()?;
        }

        tracing::info!(reason = reason.as_str(), "例外已创建");
        self.publisher
            .publish_committed(CandidacyChangeMessage::for_exception(&change, &exception));
        Ok(exception)
    }

    /// 创建不适用记录并关闭候选
    #[instrument(skip(self, note))]
    pub fn create_not_applicable(
        &self,
        person_ident: &str,
        reason: NotApplicableReason,
        note: Option<String>,
        actor: &str,
    ) -> ApiResult<NotApplicable> {
        validate_input(person_ident, actor)?;
        let record = NotApplicable::new(person_ident, reason, normalize_note(note), actor);
        let change = CandidacyChange::new(person_ident, ChangeReason::NotApplicable);

        {
            let conn = lock_conn(&self.conn)?;
            let tx = conn.unchecked_transaction()?;
            ensure_candidate(&tx, person_ident)?;
            NotApplicableRepository::insert_tx(&tx, &record)?;
            CandidacyChangeRepository::insert_tx(&tx, &change)?;
            tx.commit()?;
        }

        tracing::info!(reason = reason.as_str(), "不适用记录已创建");
        self.publisher
            .publish_committed(CandidacyChangeMessage::for_not_applicable(&change, &record));
        Ok(record)
    }

    /// 创建暂缓（不改变候选状态）
    #[instrument(skip(self, description))]
    pub fn create_hold(
        &self,
        person_ident: &str,
        deadline: NaiveDate,
        actor: &str,
        description: &str,
    ) -> ApiResult<Hold> {
        validate_input(person_ident, actor)?;
        let hold = Hold::new(person_ident, deadline, actor, description);

        let conn = lock_conn(&self.conn)?;
        let tx = conn.unchecked_transaction()?;
        ensure_candidate(&tx, person_ident)?;
        HoldRepository::insert_tx(&tx, &hold)?;
        tx.commit()?;

        Ok(hold)
    }

    /// 查询有效暂缓: 最新暂缓严格晚于最新 kandidat=true 变更且未关闭
    pub fn get_hold(&self, person_ident: &str) -> ApiResult<Option<Hold>> {
        let Some(candidate) = self.changes.find_latest_candidate(person_ident)? else {
            return Ok(None);
        };
        let hold = self.holds.find_latest(person_ident)?;
        Ok(hold.filter(|h| h.is_active_since(candidate.created_at)))
    }
}

fn validate_input(person_ident: &str, actor: &str) -> ApiResult<()> {
    if person_ident.trim().is_empty() {
        return Err(ApiError::InvalidInput("人员标识不能为空".to_string()));
    }
    if actor.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
    }
    Ok(())
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.filter(|n| !n.trim().is_empty())
}

fn ensure_candidate(conn: &Connection, person_ident: &str) -> ApiResult<()> {
    match CandidacyChangeRepository::find_latest_tx(conn, person_ident)? {
        Some(latest) if latest.kandidat => Ok(()),
        Some(latest) => Err(ApiError::Conflict(format!(
            "人员当前不是候选 (最新原因={})",
            latest.reason
        ))),
        None => Err(ApiError::Conflict("人员没有候选历史".to_string())),
    }
}
