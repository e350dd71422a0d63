// ==========================================
// 对话会议候选资格 - 领域类型定义
// ==========================================
// 说明: 所有枚举的数据库/消息编码统一使用 SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 候选资格变更原因 (Change Reason)
// ==========================================
// 红线: kandidat 由原因唯一决定,不允许单独指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeReason {
    Checkpoint,       // 检查点评估 → 候选
    MeetingCompleted, // 会议已完成
    MeetingClosed,    // 会议已关闭
    Exception,        // 人工例外
    NotApplicable,    // 人工不适用
    ManuallyClosed,   // 对账强制关闭
}

impl ChangeReason {
    /// 该原因对应的 kandidat 值
    pub fn kandidat(&self) -> bool {
        matches!(self, ChangeReason::Checkpoint)
    }

    /// 数据库/消息编码
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeReason::Checkpoint => "STOPPUNKT",
            ChangeReason::MeetingCompleted => "DIALOGMOTE_FERDIGSTILT",
            ChangeReason::MeetingClosed => "DIALOGMOTE_LUKKET",
            ChangeReason::Exception => "UNNTAK",
            ChangeReason::NotApplicable => "IKKE_AKTUELL",
            ChangeReason::ManuallyClosed => "LUKKET",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "STOPPUNKT" => Some(ChangeReason::Checkpoint),
            "DIALOGMOTE_FERDIGSTILT" => Some(ChangeReason::MeetingCompleted),
            "DIALOGMOTE_LUKKET" => Some(ChangeReason::MeetingClosed),
            "UNNTAK" => Some(ChangeReason::Exception),
            "IKKE_AKTUELL" => Some(ChangeReason::NotApplicable),
            "LUKKET" => Some(ChangeReason::ManuallyClosed),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 检查点状态 (Checkpoint Status)
// ==========================================
// 红线: Candidate / NotCandidate 为终态,不可再次流转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointStatus {
    Planned,      // 已计划
    Candidate,    // 已判定为候选
    NotCandidate, // 已判定为非候选
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStatus::Planned => "PLANLAGT_KANDIDAT",
            CheckpointStatus::Candidate => "KANDIDAT",
            CheckpointStatus::NotCandidate => "IKKE_KANDIDAT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "PLANLAGT_KANDIDAT" => Some(CheckpointStatus::Planned),
            "KANDIDAT" => Some(CheckpointStatus::Candidate),
            "IKKE_KANDIDAT" => Some(CheckpointStatus::NotCandidate),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckpointStatus::Planned)
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 会议事件类型 (Meeting Event Type)
// ==========================================
// 其余上游类型保留原始编码,照常落库但不引起状态变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingEventType {
    Invited,       // 已邀请
    Completed,     // 已完成
    Closed,        // 已关闭
    Other(String), // 其他类型(原始编码)
}

impl MeetingEventType {
    pub fn as_str(&self) -> &str {
        match self {
            MeetingEventType::Invited => "INNKALT",
            MeetingEventType::Completed => "FERDIGSTILT",
            MeetingEventType::Closed => "LUKKET",
            MeetingEventType::Other(code) => code,
        }
    }

    /// 空编码返回 None；未知编码归为 Other
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "INNKALT" => Some(MeetingEventType::Invited),
            "FERDIGSTILT" => Some(MeetingEventType::Completed),
            "LUKKET" => Some(MeetingEventType::Closed),
            other => Some(MeetingEventType::Other(other.to_string())),
        }
    }

    /// 会议结束类事件对应的变更原因
    pub fn closing_reason(&self) -> Option<ChangeReason> {
        match self {
            MeetingEventType::Completed => Some(ChangeReason::MeetingCompleted),
            MeetingEventType::Closed => Some(ChangeReason::MeetingClosed),
            MeetingEventType::Invited | MeetingEventType::Other(_) => None,
        }
    }

    /// 是否属于状态机关心的三种类型
    pub fn is_tracked(&self) -> bool {
        !matches!(self, MeetingEventType::Other(_))
    }
}

impl fmt::Display for MeetingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 例外原因 (Exception Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionReason {
    MedisinskeGrunner,              // 医疗原因
    InnleggelseInstitusjon,         // 住院/入住机构
    ForventetFriskmeldingInnen28Uker, // 预计 28 周内康复
    DokumentertTiltakFriskmelding,  // 已有书面康复措施
    ArbeidsforholdOpphort,          // 雇佣关系终止
}

impl ExceptionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionReason::MedisinskeGrunner => "MEDISINSKE_GRUNNER",
            ExceptionReason::InnleggelseInstitusjon => "INNLEGGELSE_INSTITUSJON",
            ExceptionReason::ForventetFriskmeldingInnen28Uker => {
                "FORVENTET_FRISKMELDING_INNEN_28UKER"
            }
            ExceptionReason::DokumentertTiltakFriskmelding => "DOKUMENTERT_TILTAK_FRISKMELDING",
            ExceptionReason::ArbeidsforholdOpphort => "ARBEIDSFORHOLD_OPPHORT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "MEDISINSKE_GRUNNER" => Some(ExceptionReason::MedisinskeGrunner),
            "INNLEGGELSE_INSTITUSJON" => Some(ExceptionReason::InnleggelseInstitusjon),
            "FORVENTET_FRISKMELDING_INNEN_28UKER" => {
                Some(ExceptionReason::ForventetFriskmeldingInnen28Uker)
            }
            "DOKUMENTERT_TILTAK_FRISKMELDING" => Some(ExceptionReason::DokumentertTiltakFriskmelding),
            "ARBEIDSFORHOLD_OPPHORT" => Some(ExceptionReason::ArbeidsforholdOpphort),
            _ => None,
        }
    }
}

// ==========================================
// 不适用原因 (Not-Applicable Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotApplicableReason {
    FriskmeldtTilbakeArbeid, // 已康复返岗
    ArbeidstakerAap,         // 转入工作评估津贴
    ArbeidstakerDod,         // 员工死亡
    DialogmoteAvholdt,       // 会议已在系统外举行
}

impl NotApplicableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotApplicableReason::FriskmeldtTilbakeArbeid => "FRISKMELDT_TILBAKE_ARBEID",
            NotApplicableReason::ArbeidstakerAap => "ARBEIDSTAKER_AAP",
            NotApplicableReason::ArbeidstakerDod => "ARBEIDSTAKER_DOD",
            NotApplicableReason::DialogmoteAvholdt => "DIALOGMOTE_AVHOLDT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "FRISKMELDT_TILBAKE_ARBEID" => Some(NotApplicableReason::FriskmeldtTilbakeArbeid),
            "ARBEIDSTAKER_AAP" => Some(NotApplicableReason::ArbeidstakerAap),
            "ARBEIDSTAKER_DOD" => Some(NotApplicableReason::ArbeidstakerDod),
            "DIALOGMOTE_AVHOLDT" => Some(NotApplicableReason::DialogmoteAvholdt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_checkpoint_reason_is_kandidat() {
        assert!(ChangeReason::Checkpoint.kandidat());
        for reason in [
            ChangeReason::MeetingCompleted,
            ChangeReason::MeetingClosed,
            ChangeReason::Exception,
            ChangeReason::NotApplicable,
            ChangeReason::ManuallyClosed,
        ] {
            assert!(!reason.kandidat(), "{} 不应为候选", reason);
        }
    }

    #[test]
    fn test_checkpoint_status_terminal() {
        assert!(!CheckpointStatus::Planned.is_terminal());
        assert!(CheckpointStatus::Candidate.is_terminal());
        assert!(CheckpointStatus::NotCandidate.is_terminal());
        assert_eq!(
            CheckpointStatus::parse("IKKE_KANDIDAT"),
            Some(CheckpointStatus::NotCandidate)
        );
    }

    #[test]
    fn test_meeting_event_type_keeps_unknown_code() {
        assert_eq!(MeetingEventType::parse("INNKALT"), Some(MeetingEventType::Invited));
        let other = MeetingEventType::parse("NYTT_TID_STED").unwrap();
        assert_eq!(other, MeetingEventType::Other("NYTT_TID_STED".to_string()));
        assert_eq!(other.as_str(), "NYTT_TID_STED");
        assert!(!other.is_tracked());
        assert_eq!(other.closing_reason(), None);
        assert_eq!(MeetingEventType::parse("  "), None);
        assert_eq!(
            MeetingEventType::Closed.closing_reason(),
            Some(ChangeReason::MeetingClosed)
        );
        assert_eq!(MeetingEventType::Invited.closing_reason(), None);
    }
}
