// ==========================================
// 对话会议候选资格 - 过期候选对账（定时）
// ==========================================
// 职责: 关闭在截止时间前成为候选且之后未被处理的人员
// 说明: 只看每人最新变更,已关闭的人员不会再次命中
// 说明: 不区分候选来源（所有原因一视同仁）
// ==========================================

use crate::domain::{CandidacyChange, ChangeReason};
use crate::engine::error::{lock_conn, EngineResult};
use crate::engine::events::{CandidacyChangeMessage, OptionalPublisher};
use crate::repository::CandidacyChangeRepository;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    pub matched: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub publish_failed: usize,
}

pub struct ReconciliationJob {
    conn: Arc<Mutex<Connection>>,
    changes: CandidacyChangeRepository,
    publisher: OptionalPublisher,
}

impl ReconciliationJob {
    pub fn new(conn: Arc<Mutex<Connection>>, publisher: OptionalPublisher) -> Self {
        Self {
            changes: CandidacyChangeRepository::new(conn.clone()),
            conn,
            publisher,
        }
    }

    #[instrument(skip(self))]
    pub fn run(&self, cutoff: DateTime<Utc>, batch_size: usize) -> EngineResult<ReconciliationSummary> {
        let stale = self.changes.find_stale_candidates(cutoff, batch_size)?;
        let mut summary = ReconciliationSummary {
            matched: stale.len(),
            ..Default::default()
        };

        for candidate in &stale {
            match self.close_one(candidate) {
                Ok(Some(change)) => {
                    summary.updated += 1;
                    if !self
                        .publisher
                        .publish_committed(CandidacyChangeMessage::from_change(&change))
                    {
                        summary.publish_failed += 1;
                    }
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(person = %candidate.person_ident, error = %e, "过期候选关闭失败");
                }
            }
        }

        tracing::info!(
            matched = summary.matched,
            updated = summary.updated,
            failed = summary.failed,
            "过期候选对账完成"
        );
        Ok(summary)
    }

    /// 关闭单个过期候选；最新变更已不是该候选时跳过
    fn close_one(&self, stale: &CandidacyChange) -> EngineResult<Option<CandidacyChange>> {
        let conn = lock_conn(&self.conn)?;
        let tx = conn.unchecked_transaction()?;

        let latest = CandidacyChangeRepository::find_latest_tx(&tx, &stale.person_ident)?;
        if latest.as_ref().map(|c| c.uuid.as_str()) != Some(stale.uuid.as_str()) {
            return Ok(None);
        }

        let change = CandidacyChange::new(&stale.person_ident, ChangeReason::ManuallyClosed);
        CandidacyChangeRepository::insert_tx(&tx, &change)?;
        tx.commit()?;
        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_second_run_with_same_cutoff_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = CandidacyChangeRepository::new(conn.clone());
        let cutoff = Utc::now() - Duration::days(30);

        repo.insert(&CandidacyChange::at(
            "11111111111",
            ChangeReason::Checkpoint,
            cutoff - Duration::days(10),
        ))
        .unwrap();
        // 截止时间之后成为候选,不处理
        repo.insert(&CandidacyChange::at(
            "22222222222",
            ChangeReason::Checkpoint,
            cutoff + Duration::days(1),
        ))
        .unwrap();

        let job = ReconciliationJob::new(conn, OptionalPublisher::none());
        let first = job.run(cutoff, 100).unwrap();
        assert_eq!(first.updated, 1);

        let second = job.run(cutoff, 100).unwrap();
        assert_eq!(second.matched, 0);
        assert_eq!(second.updated, 0);

        let latest = repo.find_latest("11111111111").unwrap().unwrap();
        assert_eq!(latest.reason, ChangeReason::ManuallyClosed);
        assert!(repo.find_latest("22222222222").unwrap().unwrap().kandidat);
    }
}
