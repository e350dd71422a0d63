// ==========================================
// 对话会议候选资格 - 外部协作服务客户端
// ==========================================
// 职责: 随访案例查询、身份源查询
// 说明: 引擎只依赖 trait,HTTP 实现可替换为测试桩
// ==========================================

pub mod follow_up_case;
pub mod identity_source;

use thiserror::Error;

pub use follow_up_case::{FollowUpCaseQuery, HttpFollowUpCaseClient};
pub use identity_source::{HttpIdentitySourceClient, IdentitySource};

/// 外部请求头: 人员标识
pub const PERSON_IDENT_HEADER: &str = "nav-personident";

/// 外部协作服务调用错误
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("请求发送失败: {0}")]
    Transport(String),

    #[error("服务返回错误 {status}: {body}")]
    Status { status: u16, body: String },

    #[error("响应解析失败: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// 检查响应状态,非 2xx 转为 ClientError::Status
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}
