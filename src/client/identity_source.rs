//! 身份源查询客户端。

use crate::client::{ensure_success, ClientError, PERSON_IDENT_HEADER};
use crate::consumer::records::NATIONAL_ID_TYPE;
use async_trait::async_trait;
use serde::Deserialize;

const IDENTS_PATH: &str = "/api/v1/identer";

#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// 查询标识当前对应的有效国民身份号；身份源不认识该标识时返回 None
    async fn active_identifier(&self, identifier: &str) -> Result<Option<String>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct IdentResponse {
    #[serde(default)]
    identer: Vec<IdentEntry>,
}

#[derive(Debug, Deserialize)]
struct IdentEntry {
    ident: String,
    #[serde(default)]
    historisk: bool,
    gruppe: String,
}

pub struct HttpIdentitySourceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentitySourceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentitySource for HttpIdentitySourceClient {
    async fn active_identifier(&self, identifier: &str) -> Result<Option<String>, ClientError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, IDENTS_PATH))
            .header(PERSON_IDENT_HEADER, identifier)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ensure_success(resp).await?;

        let body: IdentResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok(body
            .identer
            .into_iter()
            .find(|e| e.gruppe == NATIONAL_ID_TYPE && !e.historisk)
            .map(|e| e.ident))
    }
}
