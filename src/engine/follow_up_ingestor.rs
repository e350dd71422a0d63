// ==========================================
// 对话会议候选资格 - 随访期入站处理
// ==========================================
// 职责: 解析随访期更新,为满足资格的随访期计划检查点
// 说明: 重投导致的重复检查点在此不去重,由检查点评估负责
// 红线: 一批记录一个事务；任一载荷格式错误则整批失败（至少一次重投）
// ==========================================

use crate::config::CandidacyConfig;
use crate::consumer::records::FollowUpPersonRecord;
use crate::domain::{Checkpoint, FollowUpPeriod};
use crate::engine::candidacy_core::CandidacyCore;
use crate::engine::error::{lock_conn, EngineError, EngineResult};
use crate::repository::{CheckpointRepository, InboundRecord};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

/// 一批随访期记录的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub processed: usize,
    pub tombstones: usize,
    pub checkpoints_planned: usize,
}

pub struct FollowUpIngestor {
    conn: Arc<Mutex<Connection>>,
    config: CandidacyConfig,
}

impl FollowUpIngestor {
    pub fn new(conn: Arc<Mutex<Connection>>, config: CandidacyConfig) -> Self {
        Self { conn, config }
    }

    /// 为一个人员计算应计划的检查点
    ///
    /// 最新随访期一个；今天所在随访期若不同再一个
    pub fn plan_checkpoints(&self, person_ident: &str, periods: &[FollowUpPeriod], today: NaiveDate) -> Vec<Checkpoint> {
        let mut candidates: Vec<&FollowUpPeriod> = Vec::new();
        if let Some(latest) = FollowUpPeriod::latest(periods) {
            candidates.push(latest);
        }
        if let Some(current) = FollowUpPeriod::containing(periods, today) {
            if !candidates.iter().any(|p| *p == current) {
                candidates.push(current);
            }
        }

        let cutoff = self.config.historical_cutoff_date;
        let offset = self.config.checkpoint_offset_days;

        candidates
            .into_iter()
            .filter(|p| CandidacyCore::is_eligible(p, today, cutoff, offset))
            .map(|p| {
                let date = CandidacyCore::checkpoint_date(p, today, cutoff, offset);
                Checkpoint::planned(person_ident, date)
            })
            .collect()
    }

    /// 处理一批入站记录
    #[instrument(skip(self, records), fields(batch = records.len()))]
    pub fn ingest_batch(&self, records: &[InboundRecord], today: NaiveDate) -> EngineResult<IngestSummary> {
        let mut summary = IngestSummary::default();
        let mut planned = Vec::new();

        for record in records {
            let Some(payload) = record.payload.as_deref() else {
                summary.tombstones += 1;
                tracing::debug!(offset = record.offset, key = ?record.key, "墓碑记录,跳过");
                continue;
            };

            let person: FollowUpPersonRecord =
                serde_json::from_str(payload).map_err(|e| EngineError::MalformedPayload {
                    offset: record.offset,
                    message: e.to_string(),
                })?;

            let checkpoints =
                self.plan_checkpoints(&person.person_ident_number, &person.periods(), today);
            tracing::debug!(
                person = %person.person_ident_number,
                planned = checkpoints.len(),
                "随访期已评估"
            );
            planned.extend(checkpoints);
            summary.processed += 1;
        }

        if !planned.is_empty() {
            let conn = lock_conn(&self.conn)?;
            let tx = conn.unchecked_transaction()?;
            for checkpoint in &planned {
                CheckpointRepository::insert_tx(&tx, checkpoint)?;
            }
            tx.commit()?;
        }
        summary.checkpoints_planned = planned.len();

        tracing::info!(
            processed = summary.processed,
            tombstones = summary.tombstones,
            planned = summary.checkpoints_planned,
            "随访期批次处理完成"
        );
        Ok(summary)
    }
}
