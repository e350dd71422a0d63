// ==========================================
// 对话会议候选资格 - 候选变更发布
// ==========================================
// 职责: 定义候选变更消息与发布 trait
// 红线: 只在事务提交后发布；发布失败记录日志并计数,不回滚已提交的变更
// ==========================================

use crate::domain::{
    CandidacyChange, CandidacyException, ExceptionReason, NotApplicable, NotApplicableReason,
};
use crate::repository::OutboxRepository;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 候选变更消息
// ==========================================

/// 每条追加的候选变更对应一条消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidacyChangeMessage {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub person_ident: String,
    pub kandidat: bool,
    /// 变更原因编码
    pub arsak: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unntak_arsak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ikke_aktuell_arsak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// 随访期开始日期（仅检查点变更）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilfelle_start: Option<NaiveDate>,
}

impl CandidacyChangeMessage {
    pub fn from_change(change: &CandidacyChange) -> Self {
        Self {
            uuid: change.uuid.clone(),
            created_at: change.created_at,
            person_ident: change.person_ident.clone(),
            kandidat: change.kandidat,
            arsak: change.reason.as_str().to_string(),
            unntak_arsak: None,
            ikke_aktuell_arsak: None,
            actor: None,
            tilfelle_start: change.period_start,
        }
    }

    pub fn for_exception(change: &CandidacyChange, exception: &CandidacyException) -> Self {
        Self::with_sub_reason(change, Some(exception.reason), None, &exception.actor)
    }

    pub fn for_not_applicable(change: &CandidacyChange, record: &NotApplicable) -> Self {
        Self::with_sub_reason(change, None, Some(record.reason), &record.actor)
    }

    fn with_sub_reason(
        change: &CandidacyChange,
        exception: Option<ExceptionReason>,
        not_applicable: Option<NotApplicableReason>,
        actor: &str,
    ) -> Self {
        let mut message = Self::from_change(change);
        message.unntak_arsak = exception.map(|r| r.as_str().to_string());
        message.ikke_aktuell_arsak = not_applicable.map(|r| r.as_str().to_string());
        message.actor = Some(actor.to_string());
        message
    }
}

// ==========================================
// 发布 Trait
// ==========================================

/// 候选变更发布者
///
/// # 返回
/// - `Ok(id)`: 发布回执（不支持时为空字符串）
pub trait CandidacyChangePublisher: Send + Sync {
    fn publish(&self, message: CandidacyChangeMessage) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpPublisher;

impl CandidacyChangePublisher for NoOpPublisher {
    fn publish(&self, message: CandidacyChangeMessage) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpPublisher: 跳过发布 - uuid={}, arsak={}",
            message.uuid,
            message.arsak
        );
        Ok(String::new())
    }
}

/// 写入 candidacy_outbox 表,由转发进程投递到下游主题
pub struct OutboxPublisher {
    outbox: OutboxRepository,
}

impl OutboxPublisher {
    pub fn new(outbox: OutboxRepository) -> Self {
        Self { outbox }
    }
}

impl CandidacyChangePublisher for OutboxPublisher {
    fn publish(&self, message: CandidacyChangeMessage) -> Result<String, Box<dyn Error + Send + Sync>> {
        let payload = serde_json::to_string(&message)?;
        let id = self
            .outbox
            .insert(&message.uuid, &message.person_ident, &payload)?;
        Ok(id.to_string())
    }
}

/// 可选的发布者包装
pub struct OptionalPublisher {
    inner: Option<Arc<dyn CandidacyChangePublisher>>,
}

impl OptionalPublisher {
    pub fn with_publisher(publisher: Arc<dyn CandidacyChangePublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn publish(&self, message: CandidacyChangeMessage) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(message),
            None => {
                tracing::debug!(
                    "OptionalPublisher: 未配置发布者,跳过 - uuid={}",
                    message.uuid
                );
                Ok(String::new())
            }
        }
    }

    /// 提交后发布；失败只记录日志
    ///
    /// # 返回
    /// - true: 发布成功
    pub fn publish_committed(&self, message: CandidacyChangeMessage) -> bool {
        let uuid = message.uuid.clone();
        let person = message.person_ident.clone();
        match self.publish(message) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(uuid = %uuid, person = %person, error = %e, "候选变更已提交但发布失败");
                false
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalPublisher {
    fn default() -> Self {
        Self::none()
    }
}

impl Clone for OptionalPublisher {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeReason;
    use rusqlite::Connection;
    use std::sync::Mutex;

    struct FailingPublisher;

    impl CandidacyChangePublisher for FailingPublisher {
        fn publish(
            &self,
            _message: CandidacyChangeMessage,
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            Err("broker down".into())
        }
    }

    #[test]
    fn test_message_json_shape() {
        let period_start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let change = CandidacyChange::from_checkpoint("12345678910", period_start);
        let json = serde_json::to_value(CandidacyChangeMessage::from_change(&change)).unwrap();

        assert_eq!(json["personIdent"], "12345678910");
        assert_eq!(json["kandidat"], true);
        assert_eq!(json["arsak"], "STOPPUNKT");
        assert_eq!(json["tilfelleStart"], "2025-01-06");
        assert!(json.get("unntakArsak").is_none());
    }

    #[test]
    fn test_exception_message_carries_sub_reason_and_actor() {
        let exception = CandidacyException::new(
            "12345678910",
            ExceptionReason::MedisinskeGrunner,
            None,
            "Z999999",
        );
        let change = CandidacyChange::new("12345678910", ChangeReason::Exception);
        let message = CandidacyChangeMessage::for_exception(&change, &exception);

        assert_eq!(message.unntak_arsak.as_deref(), Some("MEDISINSKE_GRUNNER"));
        assert_eq!(message.actor.as_deref(), Some("Z999999"));
        assert!(!message.kandidat);
    }

    #[test]
    fn test_outbox_publisher_persists_payload() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let outbox = OutboxRepository::new(Arc::new(Mutex::new(conn)));
        let publisher = OutboxPublisher::new(outbox);

        let change = CandidacyChange::new("12345678910", ChangeReason::ManuallyClosed);
        publisher
            .publish(CandidacyChangeMessage::from_change(&change))
            .unwrap();

        let entries = publisher.outbox.find_by_person("12345678910").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message_uuid, change.uuid);
        assert!(entries[0].payload.contains("\"arsak\":\"LUKKET\""));
    }

    #[test]
    fn test_publish_committed_swallows_failure() {
        let change = CandidacyChange::new("12345678910", ChangeReason::ManuallyClosed);
        let message = CandidacyChangeMessage::from_change(&change);

        let failing = OptionalPublisher::with_publisher(Arc::new(FailingPublisher));
        assert!(!failing.publish_committed(message.clone()));
        assert!(OptionalPublisher::none().publish_committed(message));
    }
}
