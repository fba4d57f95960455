use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::Tier;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 阶段代理地址 ---
    pub draft_agent_url: String,
    pub explain_agent_url: String,
    pub guidance_agent_url: String,
    pub budget_agent_url: String,
    /// 历史记录服务地址
    pub history_url: String,
    /// 单次代理请求超时（秒）
    pub request_timeout_secs: u64,
    /// 逐条解释之间的间隔（毫秒）
    pub explain_delay_ms: u64,
    /// 当前订阅等级
    pub plan_tier: Tier,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            draft_agent_url: "http://127.0.0.1:8000/analyze".to_string(),
            explain_agent_url: "http://127.0.0.1:8001/explain_point".to_string(),
            guidance_agent_url: "http://127.0.0.1:8002/generate_guidance".to_string(),
            budget_agent_url: "http://127.0.0.1:8003/generate_budget".to_string(),
            history_url: "http://127.0.0.1:8004/history".to_string(),
            request_timeout_secs: 60,
            explain_delay_ms: 1000,
            plan_tier: Tier::Free,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件的镜像结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    draft_agent_url: Option<String>,
    explain_agent_url: Option<String>,
    guidance_agent_url: Option<String>,
    budget_agent_url: Option<String>,
    history_url: Option<String>,
    request_timeout_secs: Option<u64>,
    explain_delay_ms: Option<u64>,
    plan_tier: Option<Tier>,
    verbose_logging: Option<bool>,
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            draft_agent_url: std::env::var("DRAFT_AGENT_URL").unwrap_or(default.draft_agent_url),
            explain_agent_url: std::env::var("EXPLAIN_AGENT_URL").unwrap_or(default.explain_agent_url),
            guidance_agent_url: std::env::var("GUIDANCE_AGENT_URL").unwrap_or(default.guidance_agent_url),
            budget_agent_url: std::env::var("BUDGET_AGENT_URL").unwrap_or(default.budget_agent_url),
            history_url: std::env::var("HISTORY_URL").unwrap_or(default.history_url),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            explain_delay_ms: std::env::var("EXPLAIN_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.explain_delay_ms),
            plan_tier: std::env::var("PLAN_TIER").ok().and_then(|v| v.parse().ok()).unwrap_or(default.plan_tier),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺失的键使用默认值
    pub async fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            draft_agent_url: file.draft_agent_url.unwrap_or(default.draft_agent_url),
            explain_agent_url: file.explain_agent_url.unwrap_or(default.explain_agent_url),
            guidance_agent_url: file.guidance_agent_url.unwrap_or(default.guidance_agent_url),
            budget_agent_url: file.budget_agent_url.unwrap_or(default.budget_agent_url),
            history_url: file.history_url.unwrap_or(default.history_url),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(default.request_timeout_secs),
            explain_delay_ms: file.explain_delay_ms.unwrap_or(default.explain_delay_ms),
            plan_tier: file.plan_tier.unwrap_or(default.plan_tier),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn explain_delay(&self) -> Duration {
        Duration::from_millis(self.explain_delay_ms)
    }
}
