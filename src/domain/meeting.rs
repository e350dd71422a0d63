// ==========================================
// 对话会议候选资格 - 会议状态领域模型
// ==========================================
// 红线: 每条会议事件无论是否相关都要落库
// ==========================================

use crate::domain::types::MeetingEventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// MeetingStatus - 会议状态记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingStatus {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub person_ident: String,
    pub event_type: MeetingEventType,
    pub meeting_at: DateTime<Utc>,        // 会议时间
    pub status_changed_at: DateTime<Utc>, // 状态变更时间(用于相关性判断)
}

impl MeetingStatus {
    pub fn new(
        person_ident: &str,
        event_type: MeetingEventType,
        meeting_at: DateTime<Utc>,
        status_changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            person_ident: person_ident.to_string(),
            event_type,
            meeting_at,
            status_changed_at,
        }
    }
}
