// ==========================================
// 对话会议候选资格 - 入站事件载荷
// ==========================================
// 职责: 三个入站主题的 JSON 载荷定义及到领域对象的转换
// 说明: 字段名与上游主题保持一致（camelCase）
// ==========================================

use crate::domain::{FollowUpPeriod, MeetingEventType, MeetingStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 身份主题中唯一相关的标识类型
pub const NATIONAL_ID_TYPE: &str = "FOLKEREGISTERIDENT";

// ==========================================
// 随访期更新 (follow-up-period-updated)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpPeriodRecord {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub arbeidstaker_at_tilfelle_end: bool,
    #[serde(default)]
    pub virksomhetsnummer_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpPersonRecord {
    pub person_ident_number: String,
    #[serde(default)]
    pub oppfolgingstilfelle_list: Vec<FollowUpPeriodRecord>,
    #[serde(default)]
    pub dodsdato: Option<NaiveDate>,
}

impl FollowUpPersonRecord {
    /// 转换为领域随访期列表（死亡日期复制到每个随访期）
    pub fn periods(&self) -> Vec<FollowUpPeriod> {
        self.oppfolgingstilfelle_list
            .iter()
            .map(|p| FollowUpPeriod {
                start: p.start,
                end: p.end,
                worker_at_period_end: p.arbeidstaker_at_tilfelle_end,
                death_date: self.dodsdato,
                workplace_ids: p.virksomhetsnummer_list.clone(),
            })
            .collect()
    }
}

// ==========================================
// 会议状态变更 (meeting-status-changed)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingStatusRecord {
    pub person_ident: String,
    pub status_endring_type: String,
    pub dialogmote_tidspunkt: DateTime<Utc>,
    pub endring_tidspunkt: DateTime<Utc>,
}

impl MeetingStatusRecord {
    /// 转换为会议状态记录；仅缺少类型编码时返回 None
    pub fn to_meeting_status(&self) -> Option<MeetingStatus> {
        let event_type = MeetingEventType::parse(&self.status_endring_type)?;
        Some(MeetingStatus::new(
            &self.person_ident,
            event_type,
            self.dialogmote_tidspunkt,
            self.endring_tidspunkt,
        ))
    }
}

// ==========================================
// 身份变更 (identity-changed)
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRecord {
    pub idnummer: String,
    #[serde(rename = "type")]
    pub id_type: String,
    pub gjeldende: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityChangeRecord {
    #[serde(default)]
    pub identifikatorer: Vec<IdentifierRecord>,
}

impl IdentityChangeRecord {
    fn national_ids(&self) -> impl Iterator<Item = &IdentifierRecord> {
        self.identifikatorer
            .iter()
            .filter(|i| i.id_type == NATIONAL_ID_TYPE)
    }

    /// 当前有效的国民身份号
    pub fn active_ident(&self) -> Option<&str> {
        self.national_ids()
            .find(|i| i.gjeldende)
            .map(|i| i.idnummer.as_str())
    }

    /// 已失效的国民身份号
    pub fn inactive_idents(&self) -> Vec<String> {
        self.national_ids()
            .filter(|i| !i.gjeldende)
            .map(|i| i.idnummer.clone())
            .collect()
    }
}
