// ==========================================
// 对话会议候选资格 - 随访期领域模型
// ==========================================
// 说明: 随访期为瞬时输入,只用于计算检查点日期与资格
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// FollowUpPeriod - 随访期(连续病假区间)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub worker_at_period_end: bool,     // 期末是否仍为在职员工
    pub death_date: Option<NaiveDate>,  // 死亡日期
    pub workplace_ids: Vec<String>,     // 雇主单位编号
}

impl FollowUpPeriod {
    /// 日期是否落在 [start, end] 内
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 取最新的随访期(按开始日期,再按结束日期)
    pub fn latest(periods: &[FollowUpPeriod]) -> Option<&FollowUpPeriod> {
        periods.iter().max_by_key(|p| (p.start, p.end))
    }

    /// 取包含指定日期的随访期(多个时取最新)
    pub fn containing(periods: &[FollowUpPeriod], date: NaiveDate) -> Option<&FollowUpPeriod> {
        periods
            .iter()
            .filter(|p| p.contains(date))
            .max_by_key(|p| (p.start, p.end))
    }
}
