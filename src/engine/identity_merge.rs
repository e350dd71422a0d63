// ==========================================
// 对话会议候选资格 - 身份合并
// ==========================================
// 职责: 把失效标识下的全部行改写到当前标识
// 红线: 改写前向身份源复核当前标识；不一致时整体失败,等待事件重投
// 说明: 失效标识没有任何数据时直接跳过（不复核、不开事务）
// ==========================================

use crate::client::IdentitySource;
use crate::engine::error::{lock_conn, EngineError, EngineResult};
use crate::repository::IdentityRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// 失效标识没有数据
    Skipped,
    /// 改写的行数
    Merged(usize),
}

pub struct IdentityMergeHandler {
    conn: Arc<Mutex<Connection>>,
    identities: IdentityRepository,
    identity_source: Arc<dyn IdentitySource>,
}

impl IdentityMergeHandler {
    pub fn new(conn: Arc<Mutex<Connection>>, identity_source: Arc<dyn IdentitySource>) -> Self {
        Self {
            identities: IdentityRepository::new(conn.clone()),
            conn,
            identity_source,
        }
    }

    #[instrument(skip(self, inactive_idents), fields(inactive = inactive_idents.len()))]
    pub async fn merge(&self, active_ident: &str, inactive_idents: &[String]) -> EngineResult<MergeOutcome> {
        let footprint = self.identities.count_footprint(inactive_idents)?;
        if footprint == 0 {
            tracing::debug!("失效标识无数据,跳过");
            return Ok(MergeOutcome::Skipped);
        }

        let actual = self.identity_source.active_identifier(active_ident).await?;
        if actual.as_deref() != Some(active_ident) {
            return Err(EngineError::UpstreamInconsistency {
                supplied: active_ident.to_string(),
                actual,
            });
        }

        let rows = self.rewrite(active_ident, inactive_idents)?;
        tracing::info!(rows, "身份合并完成");
        Ok(MergeOutcome::Merged(rows))
    }

    fn rewrite(&self, active_ident: &str, inactive_idents: &[String]) -> EngineResult<usize> {
        let conn = lock_conn(&self.conn)?;
        let tx = conn.unchecked_transaction()?;
        let rows = IdentityRepository::rewrite_tx(&tx, active_ident, inactive_idents)?;
        tx.commit()?;
        Ok(rows)
    }
}
