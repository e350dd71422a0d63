// ==========================================
// 对话会议候选资格 - 会议生命周期响应
// ==========================================
// 职责: 保存每个会议事件(含其他类型)；对相关事件关闭暂缓或追加非候选变更
// 相关性: 人员最新变更为 kandidat=true 且早于事件的状态变更时间
// 红线: 一批一个事务,提交后再发布
// ==========================================

use crate::domain::{CandidacyChange, MeetingEventType, MeetingStatus};
use crate::engine::candidacy_core::CandidacyCore;
use crate::engine::error::{lock_conn, EngineResult};
use crate::engine::events::{CandidacyChangeMessage, OptionalPublisher};
use crate::repository::{CandidacyChangeRepository, HoldRepository, MeetingStatusRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

/// 一批会议事件的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactorSummary {
    pub persisted: usize,
    pub holds_closed: usize,
    pub candidacies_closed: usize,
    pub skipped: usize,
    pub publish_failed: usize,
}

pub struct MeetingReactor {
    conn: Arc<Mutex<Connection>>,
    publisher: OptionalPublisher,
}

impl MeetingReactor {
    pub fn new(conn: Arc<Mutex<Connection>>, publisher: OptionalPublisher) -> Self {
        Self { conn, publisher }
    }

    #[instrument(skip(self, statuses), fields(batch = statuses.len()))]
    pub fn react_batch(&self, statuses: &[MeetingStatus]) -> EngineResult<ReactorSummary> {
        let mut summary = ReactorSummary::default();
        let mut appended: Vec<CandidacyChange> = Vec::new();

        {
            let conn = lock_conn(&self.conn)?;
            let tx = conn.unchecked_transaction()?;

            for status in statuses {
                MeetingStatusRepository::insert_tx(&tx, status)?;
                summary.persisted += 1;

                if !status.event_type.is_tracked() {
                    summary.skipped += 1;
                    tracing::debug!(person = %status.person_ident, event = %status.event_type, "其他类型会议事件,只落库");
                    continue;
                }

                let latest = CandidacyChangeRepository::find_latest_tx(&tx, &status.person_ident)?;
                if !CandidacyCore::is_relevant(latest.as_ref(), status.status_changed_at) {
                    summary.skipped += 1;
                    tracing::debug!(person = %status.person_ident, event = %status.event_type, "会议事件与当前候选无关");
                    continue;
                }

                match &status.event_type {
                    MeetingEventType::Invited => {
                        let closed = HoldRepository::close_open_tx(&tx, &status.person_ident)?;
                        summary.holds_closed += closed;
                        tracing::debug!(person = %status.person_ident, closed, "邀请事件关闭暂缓");
                    }
                    MeetingEventType::Completed | MeetingEventType::Closed => {
                        if let Some(reason) = status.event_type.closing_reason() {
                            let change = CandidacyChange::new(&status.person_ident, reason);
                            CandidacyChangeRepository::insert_tx(&tx, &change)?;
                            summary.candidacies_closed += 1;
                            appended.push(change);
                        }
                    }
                    MeetingEventType::Other(_) => {}
                }
            }

            tx.commit()?;
        }

        for change in &appended {
            if !self
                .publisher
                .publish_committed(CandidacyChangeMessage::from_change(change))
            {
                summary.publish_failed += 1;
            }
        }

        tracing::info!(
            persisted = summary.persisted,
            holds_closed = summary.holds_closed,
            closed = summary.candidacies_closed,
            skipped = summary.skipped,
            "会议事件批次处理完成"
        );
        Ok(summary)
    }
}
