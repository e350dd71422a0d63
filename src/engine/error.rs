// ==========================================
// 对话会议候选资格 - 引擎层错误类型
// ==========================================
// 说明: 批处理入口把单元错误折算为 failed 计数,单条入口原样上抛
// 说明: 提交后的发布失败不是引擎错误,由 OptionalPublisher::publish_committed 记录并计数
// ==========================================

use crate::client::ClientError;
use crate::repository::error::RepositoryError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("外部服务调用失败: {0}")]
    Client(#[from] ClientError),

    /// 身份源尚未同步到事件中的当前标识,依赖事件重投
    #[error("身份源不一致: 事件中的当前标识={supplied}, 身份源返回={actual:?}")]
    UpstreamInconsistency {
        supplied: String,
        actual: Option<String>,
    },

    #[error("载荷格式错误 (offset={offset}): {message}")]
    MalformedPayload { offset: i64, message: String },
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Repository(RepositoryError::from(err))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// 获取共享连接
pub(crate) fn lock_conn(conn: &Arc<Mutex<Connection>>) -> EngineResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| EngineError::Repository(RepositoryError::LockError(e.to_string())))
}
