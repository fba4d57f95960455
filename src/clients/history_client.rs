/// 历史记录服务客户端
///
/// 远程历史服务的唯一持久化实现：
/// GET/POST `{history_url}`，PUT/DELETE `{history_url}/{id}`
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::HistoryError;
use crate::models::{NewRecord, WorkflowRecord};
use crate::services::HistoryStore;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    history: Vec<WorkflowRecord>,
}

#[derive(Debug, Deserialize)]
struct EntryResponse {
    entry: WorkflowRecord,
}

pub struct HttpHistoryStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpHistoryStore {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.history_url.trim_end_matches('/').to_string(),
        })
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response, HistoryError> {
        let response = request.send().await.map_err(|e| HistoryError::Request {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HistoryError> {
        response
            .json::<T>()
            .await
            .map_err(|e| HistoryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HistoryStore for HttpHistoryStore {
    async fn list(&self) -> Result<Vec<WorkflowRecord>, HistoryError> {
        let response = self.send(&self.base_url, self.http.get(&self.base_url)).await?;
        let data: ListResponse = Self::decode(response).await?;
        debug!("读取到 {} 条历史记录", data.history.len());
        Ok(data.history)
    }

    async fn create(&self, record: NewRecord) -> Result<WorkflowRecord, HistoryError> {
        let response = self
            .send(&self.base_url, self.http.post(&self.base_url).json(&record))
            .await?;
        let data: EntryResponse = Self::decode(response).await?;
        debug!("历史记录已创建: {}", data.entry.id);
        Ok(data.entry)
    }

    async fn update(&self, id: &str, record: NewRecord) -> Result<WorkflowRecord, HistoryError> {
        let url = self.record_url(id);
        let response = self.send(&url, self.http.put(&url).json(&record)).await?;
        let data: EntryResponse = Self::decode(response).await?;
        Ok(data.entry)
    }

    async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let url = self.record_url(id);
        match self.send(&url, self.http.delete(&url)).await {
            Err(HistoryError::BadResponse { status: 404, .. }) => {
                Err(HistoryError::NotFound { id: id.to_string() })
            }
            other => other.map(|_| ()),
        }
    }
}
