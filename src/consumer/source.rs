// ==========================================
// 对话会议候选资格 - 事件源
// ==========================================
// 职责: 按主题拉取入站记录,处理成功后确认偏移量
// 说明: 未确认的记录下次拉取时重新投递
// ==========================================

use crate::consumer::runner::ConsumerError;
use crate::repository::{InboundRecord, InboundRecordRepository};
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait EventSource: Send + Sync {
    fn topic(&self) -> &str;

    /// 拉取最多 max 条未确认记录
    async fn poll(&self, max: usize) -> Result<Vec<InboundRecord>, ConsumerError>;

    /// 确认偏移量不超过 last_offset 的记录
    async fn ack(&self, last_offset: i64) -> Result<(), ConsumerError>;
}

/// 基于 inbound_record 表的事件源
pub struct SqliteInbox {
    topic: String,
    records: InboundRecordRepository,
}

impl SqliteInbox {
    pub fn new(conn: Arc<Mutex<Connection>>, topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            records: InboundRecordRepository::new(conn),
        }
    }

    /// 写入一条记录（payload 为 None 表示墓碑）
    pub fn append(&self, key: Option<&str>, payload: Option<&str>) -> Result<i64, ConsumerError> {
        Ok(self.records.append(&self.topic, key, payload)?)
    }

    pub fn pending(&self) -> Result<usize, ConsumerError> {
        Ok(self.records.pending_count(&self.topic)?)
    }
}

#[async_trait]
impl EventSource for SqliteInbox {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn poll(&self, max: usize) -> Result<Vec<InboundRecord>, ConsumerError> {
        Ok(self.records.poll(&self.topic, max)?)
    }

    async fn ack(&self, last_offset: i64) -> Result<(), ConsumerError> {
        let acked = self.records.ack_through(&self.topic, last_offset)?;
        tracing::debug!(topic = %self.topic, last_offset, acked, "偏移量已确认");
        Ok(())
    }
}
