// ==========================================
// 对话会议候选资格 - Candidacy Core 纯函数库
// ==========================================
// 职责: 检查点日期、资格判定、候选判定、会议事件相关性
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::{CandidacyChange, FollowUpPeriod, MeetingStatus};
use chrono::{DateTime, Duration, NaiveDate, Utc};

// ==========================================
// CandidacyCore - 纯函数工具类
// ==========================================
pub struct CandidacyCore;

impl CandidacyCore {
    /// 计算随访期的检查点日期
    ///
    /// # 规则
    /// - 原始日期 = start + offset_days
    /// - start 早于历史截止日期 → 原始日期
    /// - 原始日期已过且 today 仍在随访期内 → today
    /// - 否则 → 原始日期
    pub fn checkpoint_date(
        period: &FollowUpPeriod,
        today: NaiveDate,
        historical_cutoff: NaiveDate,
        offset_days: i64,
    ) -> NaiveDate {
        let raw = period.start + Duration::days(offset_days);

        if period.start < historical_cutoff {
            return raw;
        }
        if raw < today && period.contains(today) {
            today
        } else {
            raw
        }
    }

    /// 随访期是否满足候选资格
    ///
    /// 无死亡日期 且 期末仍在职 且 期末不早于检查点日期
    pub fn is_eligible(
        period: &FollowUpPeriod,
        today: NaiveDate,
        historical_cutoff: NaiveDate,
        offset_days: i64,
    ) -> bool {
        period.death_date.is_none()
            && period.worker_at_period_end
            && period.end >= Self::checkpoint_date(period, today, historical_cutoff, offset_days)
    }

    /// 检查点是否判定为候选
    ///
    /// # 参数
    /// - period_eligible: 评估时刻随访期是否仍满足资格
    /// - latest_completed: 最近一次会议完成事件
    /// - latest_checkpoint_change: 最近一次检查点来源的候选变更
    ///
    /// 完成事件以 status_changed_at(会议被标记为完成的时刻)与随访期开始比较,
    /// 与会议相关性判断使用同一时间字段；meeting_at 只是会议计划时间,不参与判定
    pub fn is_candidate(
        period_eligible: bool,
        period_start: NaiveDate,
        latest_completed: Option<&MeetingStatus>,
        latest_checkpoint_change: Option<&CandidacyChange>,
    ) -> bool {
        let no_blocking_meeting = match latest_completed {
            None => true,
            Some(meeting) => meeting.status_changed_at.date_naive() < period_start,
        };
        let not_yet_candidate_for_period = match latest_checkpoint_change {
            None => true,
            Some(change) => change.is_before_period_start(period_start),
        };

        period_eligible && no_blocking_meeting && not_yet_candidate_for_period
    }

    /// 会议事件是否与当前候选状态相关
    ///
    /// 最新变更为 kandidat=true 且早于事件时间
    pub fn is_relevant(latest: Option<&CandidacyChange>, event_at: DateTime<Utc>) -> bool {
        matches!(latest, Some(change) if change.kandidat && change.created_at < event_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeReason, MeetingEventType};
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn period(start: NaiveDate, end: NaiveDate) -> FollowUpPeriod {
        FollowUpPeriod {
            start,
            end,
            worker_at_period_end: true,
            death_date: None,
            workplace_ids: vec![],
        }
    }

    const OFFSET: i64 = 119;

    fn cutoff() -> NaiveDate {
        d(2022, 7, 1)
    }

    #[test]
    fn test_checkpoint_date_raw_offset() {
        let p = period(d(2025, 1, 1), d(2025, 8, 1));
        let today = d(2025, 2, 1);
        assert_eq!(
            CandidacyCore::checkpoint_date(&p, today, cutoff(), OFFSET),
            d(2025, 1, 1) + Duration::days(119)
        );
    }

    #[test]
    fn test_checkpoint_date_moves_to_today_for_late_periods() {
        let p = period(d(2025, 1, 1), d(2025, 12, 1));
        let today = d(2025, 6, 15);
        assert_eq!(CandidacyCore::checkpoint_date(&p, today, cutoff(), OFFSET), today);
    }

    #[test]
    fn test_checkpoint_date_keeps_raw_when_period_closed() {
        let p = period(d(2025, 1, 1), d(2025, 5, 15));
        let today = d(2025, 6, 15);
        assert_eq!(
            CandidacyCore::checkpoint_date(&p, today, cutoff(), OFFSET),
            d(2025, 4, 30)
        );
    }

    #[test]
    fn test_checkpoint_date_before_historical_cutoff_is_raw() {
        let p = period(d(2022, 1, 1), d(2022, 12, 31));
        let today = d(2022, 10, 1);
        assert_eq!(
            CandidacyCore::checkpoint_date(&p, today, cutoff(), OFFSET),
            d(2022, 1, 1) + Duration::days(119)
        );
    }

    #[test]
    fn test_eligibility_rules() {
        let start = d(2025, 1, 1);
        let today = d(2025, 1, 10);
        let p = period(start, start + Duration::days(150));
        assert!(CandidacyCore::is_eligible(&p, today, cutoff(), OFFSET));

        let short = period(start, start + Duration::days(100));
        assert!(!CandidacyCore::is_eligible(&short, today, cutoff(), OFFSET));

        let mut dead = p.clone();
        dead.death_date = Some(d(2025, 2, 1));
        assert!(!CandidacyCore::is_eligible(&dead, today, cutoff(), OFFSET));

        let mut left = p;
        left.worker_at_period_end = false;
        assert!(!CandidacyCore::is_eligible(&left, today, cutoff(), OFFSET));
    }

    #[test]
    fn test_completed_meeting_blocks_unless_before_period() {
        let start = d(2025, 1, 1);
        let mut meeting = MeetingStatus::new(
            "12345678910",
            MeetingEventType::Completed,
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        );
        assert!(!CandidacyCore::is_candidate(true, start, Some(&meeting), None));

        meeting.status_changed_at = Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap();
        assert!(CandidacyCore::is_candidate(true, start, Some(&meeting), None));
        assert!(!CandidacyCore::is_candidate(false, start, None, None));
    }

    #[test]
    fn test_completed_meeting_uses_status_change_time_not_meeting_time() {
        let start = d(2025, 1, 1);
        // 会议计划在随访期开始前,但在随访期内才标记完成 → 阻断
        let marked_late = MeetingStatus::new(
            "12345678910",
            MeetingEventType::Completed,
            Utc.with_ymd_and_hms(2024, 12, 20, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
        );
        assert!(!CandidacyCore::is_candidate(true, start, Some(&marked_late), None));

        // 会议计划在随访期内,但完成标记早于随访期开始 → 不阻断
        let marked_early = MeetingStatus::new(
            "12345678910",
            MeetingEventType::Completed,
            Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap(),
        );
        assert!(CandidacyCore::is_candidate(true, start, Some(&marked_early), None));
    }

    #[test]
    fn test_earlier_checkpoint_change_in_same_period_blocks() {
        let start = d(2025, 1, 1);
        let same_period = CandidacyChange::at(
            "12345678910",
            ChangeReason::Checkpoint,
            Utc.with_ymd_and_hms(2025, 4, 30, 6, 0, 0).unwrap(),
        );
        assert!(!CandidacyCore::is_candidate(true, start, None, Some(&same_period)));

        let previous_period = CandidacyChange::at(
            "12345678910",
            ChangeReason::Checkpoint,
            Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap(),
        );
        assert!(CandidacyCore::is_candidate(true, start, None, Some(&previous_period)));
    }

    #[test]
    fn test_relevance_requires_candidate_before_event() {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let candidate = CandidacyChange::at("12345678910", ChangeReason::Checkpoint, at);

        assert!(CandidacyCore::is_relevant(Some(&candidate), at + Duration::hours(1)));
        assert!(!CandidacyCore::is_relevant(Some(&candidate), at));
        assert!(!CandidacyCore::is_relevant(None, at));

        let closed = CandidacyChange::at("12345678910", ChangeReason::Exception, at);
        assert!(!CandidacyCore::is_relevant(Some(&closed), at + Duration::hours(1)));
    }
}
