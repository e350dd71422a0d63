// ==========================================
// 对话会议候选资格 - 检查点领域模型
// ==========================================
// 红线: 一个检查点最多产生一条候选资格变更
// 红线: processed_at 仅在进入终态时写入
// ==========================================

use crate::domain::types::CheckpointStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Checkpoint - 计划评估检查点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: i64,                            // 行ID(插入后由数据库分配)
    pub uuid: String,                       // 检查点ID
    pub created_at: DateTime<Utc>,          // 创建时间
    pub person_ident: String,               // 人员标识
    pub planned_date: NaiveDate,            // 计划评估日期
    pub status: CheckpointStatus,           // 状态
    pub processed_at: Option<DateTime<Utc>>, // 处理时间(终态)
}

impl Checkpoint {
    /// 新建计划中的检查点
    pub fn planned(person_ident: &str, planned_date: NaiveDate) -> Self {
        Self {
            id: 0,
            uuid: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            person_ident: person_ident.to_string(),
            planned_date,
            status: CheckpointStatus::Planned,
            processed_at: None,
        }
    }
}
