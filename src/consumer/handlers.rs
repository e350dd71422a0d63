// ==========================================
// 对话会议候选资格 - 入站主题处理器
// ==========================================
// 职责: 解析三个入站主题的记录并交给对应引擎
// 说明: 墓碑计数后跳过；格式错误让整批失败,等待重投
// ==========================================

use crate::consumer::records::{IdentityChangeRecord, MeetingStatusRecord};
use crate::consumer::runner::{BatchHandler, BatchSummary, ConsumerError};
use crate::engine::{FollowUpIngestor, IdentityMergeHandler, MeetingReactor, MergeOutcome};
use crate::repository::InboundRecord;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::sync::Arc;

fn decode<T: DeserializeOwned>(record: &InboundRecord, payload: &str) -> Result<T, ConsumerError> {
    serde_json::from_str(payload)
        .map_err(|e| ConsumerError::Deserialize(format!("offset={}: {}", record.offset, e)))
}

// ==========================================
// 随访期更新
// ==========================================

pub struct FollowUpPeriodHandler {
    ingestor: Arc<FollowUpIngestor>,
}

impl FollowUpPeriodHandler {
    pub fn new(ingestor: Arc<FollowUpIngestor>) -> Self {
        Self { ingestor }
    }
}

#[async_trait]
impl BatchHandler for FollowUpPeriodHandler {
    fn name(&self) -> &str {
        "follow-up-period"
    }

    async fn handle(&self, records: &[InboundRecord]) -> Result<BatchSummary, ConsumerError> {
        let today = Utc::now().date_naive();
        let summary = self.ingestor.ingest_batch(records, today)?;
        Ok(BatchSummary {
            processed: summary.processed,
            tombstones: summary.tombstones,
            ..Default::default()
        })
    }
}

// ==========================================
// 会议状态变更
// ==========================================

pub struct MeetingStatusHandler {
    reactor: Arc<MeetingReactor>,
}

impl MeetingStatusHandler {
    pub fn new(reactor: Arc<MeetingReactor>) -> Self {
        Self { reactor }
    }
}

#[async_trait]
impl BatchHandler for MeetingStatusHandler {
    fn name(&self) -> &str {
        "meeting-status"
    }

    async fn handle(&self, records: &[InboundRecord]) -> Result<BatchSummary, ConsumerError> {
        let mut summary = BatchSummary::default();
        let mut statuses = Vec::with_capacity(records.len());

        for record in records {
            let Some(payload) = record.payload.as_deref() else {
                summary.tombstones += 1;
                continue;
            };
            let event: MeetingStatusRecord = decode(record, payload)?;
            match event.to_meeting_status() {
                Some(status) => statuses.push(status),
                None => {
                    summary.skipped += 1;
                    tracing::warn!(offset = record.offset, "会议事件缺少类型编码,跳过");
                }
            }
        }

        if !statuses.is_empty() {
            let reacted = self.reactor.react_batch(&statuses)?;
            summary.processed += reacted.persisted - reacted.skipped;
            summary.skipped += reacted.skipped;
        }
        Ok(summary)
    }
}

// ==========================================
// 身份变更
// ==========================================

pub struct IdentityChangeHandler {
    merger: Arc<IdentityMergeHandler>,
}

impl IdentityChangeHandler {
    pub fn new(merger: Arc<IdentityMergeHandler>) -> Self {
        Self { merger }
    }
}

#[async_trait]
impl BatchHandler for IdentityChangeHandler {
    fn name(&self) -> &str {
        "identity-change"
    }

    async fn handle(&self, records: &[InboundRecord]) -> Result<BatchSummary, ConsumerError> {
        let mut summary = BatchSummary::default();

        for record in records {
            let Some(payload) = record.payload.as_deref() else {
                summary.tombstones += 1;
                continue;
            };
            let change: IdentityChangeRecord = decode(record, payload)?;

            let inactive = change.inactive_idents();
            let Some(active) = change.active_ident() else {
                summary.skipped += 1;
                continue;
            };
            if inactive.is_empty() {
                summary.skipped += 1;
                continue;
            }

            match self.merger.merge(active, &inactive).await? {
                MergeOutcome::Merged(_) => summary.processed += 1,
                MergeOutcome::Skipped => summary.skipped += 1,
            }
        }
        Ok(summary)
    }
}
