// ==========================================
// 对话会议候选资格 - 消费循环
// ==========================================
// 职责: 单任务拉取 → 处理 → 确认,至少一次投递
// 红线: 批内不并行；处理失败不确认,暂停固定退避时间后重新拉取
// 说明: 只在批次之间检查停机信号,当前批次总会处理完
// ==========================================

use crate::consumer::source::EventSource;
use crate::engine::error::EngineError;
use crate::repository::{InboundRecord, RepositoryError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("反序列化失败: {0}")]
    Deserialize(String),

    #[error("事件源错误: {0}")]
    Source(String),

    #[error("处理失败: {0}")]
    Handler(String),
}

impl From<RepositoryError> for ConsumerError {
    fn from(err: RepositoryError) -> Self {
        ConsumerError::Source(err.to_string())
    }
}

impl From<EngineError> for ConsumerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MalformedPayload { offset, message } => {
                ConsumerError::Deserialize(format!("offset={}: {}", offset, message))
            }
            other => ConsumerError::Handler(other.to_string()),
        }
    }
}

/// 一批记录的处理计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub tombstones: usize,
    pub failed: usize,
}

#[async_trait]
pub trait BatchHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, records: &[InboundRecord]) -> Result<BatchSummary, ConsumerError>;
}

/// 消费循环累计统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub batches: usize,
    pub records: usize,
    pub errors: usize,
}

pub struct ConsumerRunner {
    source: Arc<dyn EventSource>,
    handler: Arc<dyn BatchHandler>,
    batch_size: usize,
    poll_interval: Duration,
    backoff: Duration,
}

impl ConsumerRunner {
    pub fn new(
        source: Arc<dyn EventSource>,
        handler: Arc<dyn BatchHandler>,
        batch_size: usize,
        poll_interval: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            source,
            handler,
            batch_size: batch_size.max(1),
            poll_interval,
            backoff,
        }
    }

    /// 拉取并处理一批；没有记录时返回 None
    pub async fn poll_once(&self) -> Result<Option<BatchSummary>, ConsumerError> {
        let records = self.source.poll(self.batch_size).await?;
        let Some(last) = records.last().map(|r| r.offset) else {
            return Ok(None);
        };

        let summary = self.handler.handle(&records).await?;
        self.source.ack(last).await?;

        tracing::info!(
            consumer = self.handler.name(),
            topic = self.source.topic(),
            records = records.len(),
            processed = summary.processed,
            skipped = summary.skipped,
            tombstones = summary.tombstones,
            failed = summary.failed,
            "批次已确认"
        );
        Ok(Some(summary))
    }

    /// 运行消费循环直到收到停机信号
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        tracing::info!(consumer = self.handler.name(), topic = self.source.topic(), "消费循环启动");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match self.poll_once().await {
                Ok(Some(summary)) => {
                    stats.batches += 1;
                    stats.records += summary.processed + summary.skipped + summary.tombstones;
                    continue;
                }
                Ok(None) => self.poll_interval,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!(
                        consumer = self.handler.name(),
                        error = %e,
                        backoff_secs = self.backoff.as_secs(),
                        "批次处理失败,暂停后重试"
                    );
                    self.backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(consumer = self.handler.name(), batches = stats.batches, "消费循环停止");
        stats
    }
}
