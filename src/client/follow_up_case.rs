//! 随访案例查询客户端。
//!
//! 检查点评估在评估时刻重新拉取随访期,而不是沿用入站时的快照。

use crate::client::{ensure_success, ClientError, PERSON_IDENT_HEADER};
use crate::consumer::records::FollowUpPersonRecord;
use crate::domain::FollowUpPeriod;
use async_trait::async_trait;
use chrono::NaiveDate;

const PERIODS_PATH: &str = "/api/system/v1/oppfolgingstilfelle/personident";

#[async_trait]
pub trait FollowUpCaseQuery: Send + Sync {
    /// 查询人员在 `as_of` 当天已知的随访期（开始日期不晚于 as_of）
    async fn periods(
        &self,
        person_ident: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<FollowUpPeriod>, ClientError>;

    /// 开始日期不晚于 as_of 的最新随访期
    async fn latest_period(
        &self,
        person_ident: &str,
        as_of: NaiveDate,
    ) -> Result<Option<FollowUpPeriod>, ClientError> {
        let periods = self.periods(person_ident, as_of).await?;
        Ok(periods
            .into_iter()
            .filter(|p| p.start <= as_of)
            .max_by_key(|p| (p.start, p.end)))
    }
}

pub struct HttpFollowUpCaseClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFollowUpCaseClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FollowUpCaseQuery for HttpFollowUpCaseClient {
    async fn periods(
        &self,
        person_ident: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<FollowUpPeriod>, ClientError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, PERIODS_PATH))
            .header(PERSON_IDENT_HEADER, person_ident)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        let record: FollowUpPersonRecord = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok(record
            .periods()
            .into_iter()
            .filter(|p| p.start <= as_of)
            .collect())
    }
}
