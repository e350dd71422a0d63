// ==========================================
// 对话会议候选资格 - 检查点评估（定时）
// ==========================================
// 职责: 把到期的 Planned 检查点判定为 Candidate / NotCandidate
// 说明: 评估时刻重新获取随访期与会议完成事件,不沿用入站时的数据
// 红线: 每个检查点一个事务；单个失败计数,不中断整批
// ==========================================

use crate::client::FollowUpCaseQuery;
use crate::config::CandidacyConfig;
use crate::domain::{
    CandidacyChange, ChangeReason, Checkpoint, CheckpointStatus, FollowUpPeriod, MeetingEventType,
};
use crate::engine::candidacy_core::CandidacyCore;
use crate::engine::error::{lock_conn, EngineResult};
use crate::engine::events::{CandidacyChangeMessage, OptionalPublisher};
use crate::repository::{
    CandidacyChangeRepository, CheckpointRepository, MeetingStatusRepository,
};
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

/// 单个检查点的评估结果
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointOutcome {
    Candidate(CandidacyChange),
    NotCandidate,
    /// 已被其他执行者处理
    AlreadyProcessed,
}

/// 一次评估运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub updated: usize,
    pub candidates: usize,
    pub not_candidates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub publish_failed: usize,
}

pub struct CheckpointEvaluator {
    conn: Arc<Mutex<Connection>>,
    checkpoint_repo: CheckpointRepository,
    follow_up: Arc<dyn FollowUpCaseQuery>,
    publisher: OptionalPublisher,
    config: CandidacyConfig,
}

impl CheckpointEvaluator {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        follow_up: Arc<dyn FollowUpCaseQuery>,
        publisher: OptionalPublisher,
        config: CandidacyConfig,
    ) -> Self {
        Self {
            checkpoint_repo: CheckpointRepository::new(conn.clone()),
            conn,
            follow_up,
            publisher,
            config,
        }
    }

    /// 评估窗口 [today - (window - 1), today]
    pub fn due_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days_back = (self.config.evaluation_window_days - 1).max(0);
        (today - Duration::days(days_back), today)
    }

    /// 评估所有到期检查点
    #[instrument(skip(self))]
    pub async fn run(&self, today: NaiveDate) -> EngineResult<EvaluationSummary> {
        let (from, to) = self.due_window(today);
        let due = self.checkpoint_repo.find_due(from, to)?;
        let mut summary = EvaluationSummary::default();

        for checkpoint in &due {
            match self.evaluate(checkpoint, today).await {
                Ok(CheckpointOutcome::Candidate(change)) => {
                    summary.updated += 1;
                    summary.candidates += 1;
                    let message = CandidacyChangeMessage::from_change(&change);
                    if !self.publisher.publish_committed(message) {
                        summary.publish_failed += 1;
                    }
                }
                Ok(CheckpointOutcome::NotCandidate) => {
                    summary.updated += 1;
                    summary.not_candidates += 1;
                }
                Ok(CheckpointOutcome::AlreadyProcessed) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(checkpoint = %checkpoint.uuid, error = %e, "检查点评估失败");
                }
            }
        }

        tracing::info!(
            due = due.len(),
            updated = summary.updated,
            candidates = summary.candidates,
            failed = summary.failed,
            "检查点评估完成"
        );
        Ok(summary)
    }

    /// 评估单个检查点（不发布,由调用方在提交后发布）
    #[instrument(skip(self, checkpoint), fields(checkpoint = %checkpoint.uuid, person = %checkpoint.person_ident))]
    pub async fn evaluate(&self, checkpoint: &Checkpoint, today: NaiveDate) -> EngineResult<CheckpointOutcome> {
        let period = self
            .follow_up
            .latest_period(&checkpoint.person_ident, today)
            .await?;

        self.resolve(checkpoint, period.as_ref(), today)
    }

    fn resolve(
        &self,
        checkpoint: &Checkpoint,
        period: Option<&FollowUpPeriod>,
        today: NaiveDate,
    ) -> EngineResult<CheckpointOutcome> {
        let conn = lock_conn(&self.conn)?;
        let tx = conn.unchecked_transaction()?;

        // 终态检查: 同一检查点只产生一次变更
        match CheckpointRepository::find_by_uuid_tx(&tx, &checkpoint.uuid)? {
            Some(current) if current.status == CheckpointStatus::Planned => {}
            _ => return Ok(CheckpointOutcome::AlreadyProcessed),
        }

        let change = match period {
            Some(period) => {
                let eligible = CandidacyCore::is_eligible(
                    period,
                    today,
                    self.config.historical_cutoff_date,
                    self.config.checkpoint_offset_days,
                );
                let completed = MeetingStatusRepository::find_latest_of_type_tx(
                    &tx,
                    &checkpoint.person_ident,
                    MeetingEventType::Completed,
                )?;
                let latest_checkpoint_change = CandidacyChangeRepository::find_latest_by_reason_tx(
                    &tx,
                    &checkpoint.person_ident,
                    ChangeReason::Checkpoint,
                )?;

                CandidacyCore::is_candidate(
                    eligible,
                    period.start,
                    completed.as_ref(),
                    latest_checkpoint_change.as_ref(),
                )
                .then(|| CandidacyChange::from_checkpoint(&checkpoint.person_ident, period.start))
            }
            None => None,
        };

        let status = if change.is_some() {
            CheckpointStatus::Candidate
        } else {
            CheckpointStatus::NotCandidate
        };
        CheckpointRepository::mark_processed_tx(&tx, &checkpoint.uuid, status, Utc::now())?;
        if let Some(change) = &change {
            CandidacyChangeRepository::insert_tx(&tx, change)?;
        }
        tx.commit()?;

        tracing::debug!(status = %status, "检查点已处理");
        Ok(match change {
            Some(change) => CheckpointOutcome::Candidate(change),
            None => CheckpointOutcome::NotCandidate,
        })
    }
}
