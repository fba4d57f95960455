//! 阶段代理客户端
//!
//! 封装四个远程生成代理的请求/响应，统一错误格式。
//! 不做重试，重试由流程控制器的调用方决定。

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AgentError, AgentFailure};
use crate::models::{
    BudgetRequest, DraftRequest, ExplainRequest, GuidanceRequest, Proposal, StageKind,
};

/// 四个生成阶段的能力
#[async_trait]
pub trait StageAgents: Send + Sync {
    /// 根据需求生成提案草稿（取第一个提案）
    async fn draft(&self, requirements: &str) -> Result<Proposal, AgentError>;

    /// 解释单个要点
    async fn explain(&self, request: &ExplainRequest) -> Result<String, AgentError>;

    /// 生成按周划分的时间线
    async fn guidance(&self, request: &GuidanceRequest) -> Result<String, AgentError>;

    /// 生成预算与结论
    async fn budget(&self, request: &BudgetRequest) -> Result<String, AgentError>;
}

// ========== 响应结构 ==========

#[derive(Debug, Deserialize)]
struct DraftResponse {
    #[serde(default)]
    proposals: Vec<Proposal>,
}

#[derive(Debug, Deserialize)]
struct ExplainResponse {
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct GuidanceResponse {
    #[serde(default)]
    guidance: String,
}

#[derive(Debug, Deserialize)]
struct BudgetResponse {
    #[serde(default)]
    budget_plan: String,
}

/// 基于 HTTP 的阶段代理客户端
pub struct HttpAgentClient {
    http: reqwest::Client,
    draft_url: String,
    explain_url: String,
    guidance_url: String,
    budget_url: String,
    timeout: Duration,
}

impl HttpAgentClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = config.request_timeout();
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            draft_url: config.draft_agent_url.clone(),
            explain_url: config.explain_agent_url.clone(),
            guidance_url: config.guidance_agent_url.clone(),
            budget_url: config.budget_agent_url.clone(),
            timeout,
        })
    }

    /// 发送 JSON 请求并解析响应
    async fn post_json<Req, Resp>(&self, stage: StageKind, url: &str, body: &Req) -> Result<Resp, AgentError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!("调用 {} 代理: {}", stage, url);

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            // 响应体读取失败时仍保留状态码
            let body = response.text().await.unwrap_or_default();
            warn!("{} 代理返回错误响应: HTTP {}", stage, status.as_u16());
            return Err(AgentError::new(
                stage,
                AgentFailure::Http {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(stage, e))?;

        serde_json::from_str(&text)
            .map_err(|e| AgentError::new(stage, AgentFailure::InvalidResponse(e.to_string())))
    }

    fn transport_error(&self, stage: StageKind, err: reqwest::Error) -> AgentError {
        let cause = if err.is_timeout() {
            AgentFailure::Timeout(self.timeout)
        } else {
            AgentFailure::Network(err.to_string())
        };
        warn!("{} 代理请求失败: {}", stage, cause);
        AgentError::new(stage, cause)
    }
}

#[async_trait]
impl StageAgents for HttpAgentClient {
    async fn draft(&self, requirements: &str) -> Result<Proposal, AgentError> {
        let request = DraftRequest {
            requirements: requirements.to_string(),
        };
        let response: DraftResponse = self
            .post_json(StageKind::Draft, &self.draft_url, &request)
            .await?;

        let proposal = response.proposals.into_iter().next().ok_or_else(|| {
            AgentError::new(
                StageKind::Draft,
                AgentFailure::InvalidResponse("proposals 为空".to_string()),
            )
        })?;

        if proposal.key_points.is_empty() {
            return Err(AgentError::new(
                StageKind::Draft,
                AgentFailure::InvalidResponse("提案没有要点".to_string()),
            ));
        }

        Ok(proposal)
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<String, AgentError> {
        let response: ExplainResponse = self
            .post_json(StageKind::Explain, &self.explain_url, request)
            .await?;
        Ok(response.explanation)
    }

    async fn guidance(&self, request: &GuidanceRequest) -> Result<String, AgentError> {
        let response: GuidanceResponse = self
            .post_json(StageKind::Guidance, &self.guidance_url, request)
            .await?;
        Ok(response.guidance)
    }

    async fn budget(&self, request: &BudgetRequest) -> Result<String, AgentError> {
        let response: BudgetResponse = self
            .post_json(StageKind::Budget, &self.budget_url, request)
            .await?;
        Ok(response.budget_plan)
    }
}
