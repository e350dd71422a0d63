// ==========================================
// 对话会议候选资格 - 候选资格变更仓储
// ==========================================
// 红线: 只追加,不更新,不删除
// 红线: "最新" 一律按 created_at 排序,同时间戳按行ID稳定决胜
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::CandidacyChangeRepository;
