// ==========================================
// 对话会议候选资格 - 应用层
// ==========================================
// 职责: 组件装配与后台任务启动
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
