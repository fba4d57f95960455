use std::time::Duration;

use thiserror::Error;

use crate::models::{StageKind, Tier};
use crate::workflow::WorkflowStage;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 阶段代理错误
    #[error("代理错误: {0}")]
    Agent(#[from] AgentError),
    /// 历史记录持久化错误
    #[error("历史记录错误: {0}")]
    History(#[from] HistoryError),
    /// 流程错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// HTTP 客户端创建失败
    #[error("无法创建{target}客户端: {source}")]
    Client {
        target: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// 阶段代理调用错误
///
/// 只终止当前阶段，之前阶段的数据不受影响
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{stage} 阶段失败: {cause}")]
pub struct AgentError {
    pub stage: StageKind,
    pub cause: AgentFailure,
}

impl AgentError {
    pub fn new(stage: StageKind, cause: AgentFailure) -> Self {
        Self { stage, cause }
    }

    /// 是否属于网络类错误（包括超时）
    pub fn is_network(&self) -> bool {
        matches!(
            self.cause,
            AgentFailure::Network(_) | AgentFailure::Timeout(_)
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentFailure {
    /// 非 2xx 响应，携带响应体文本
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("网络错误: {0}")]
    Network(String),
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    /// 响应无法解析或缺少必要内容
    #[error("响应无效: {0}")]
    InvalidResponse(String),
}

/// 历史记录读写错误
///
/// 只记录日志，不会阻塞内存中的流程
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("历史服务请求失败 ({endpoint}): {message}")]
    Request { endpoint: String, message: String },
    #[error("历史服务返回错误响应 ({endpoint}): HTTP {status}: {body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("历史服务响应解析失败: {0}")]
    Decode(String),
    #[error("历史记录不存在: {id}")]
    NotFound { id: String },
}

/// 流程控制器拒绝的操作
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    /// 当前阶段不允许该操作
    #[error("当前阶段 {stage:?} 不允许执行 {operation}")]
    InvalidTransition {
        operation: &'static str,
        stage: WorkflowStage,
    },
    /// 订阅等级无权进入该阶段
    #[error("{tier} 套餐无权使用 {stage} 阶段，请升级套餐")]
    AccessDenied { tier: Tier, stage: StageKind },
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_counts_as_network() {
        let err = AgentError::new(
            StageKind::Explain,
            AgentFailure::Timeout(Duration::from_secs(60)),
        );
        assert!(err.is_network());

        let err = AgentError::new(
            StageKind::Explain,
            AgentFailure::Http {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert!(!err.is_network());
        assert_eq!(err.to_string(), "explain 阶段失败: HTTP 500: boom");
    }

    #[test]
    fn test_app_error_keeps_config_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = ConfigError::Read {
            path: "flow.toml".into(),
            source: io,
        }
        .into();
        assert!(matches!(err, AppError::Config(ConfigError::Read { .. })));
        assert!(err.to_string().starts_with("配置错误: 读取配置文件失败 (flow.toml)"));
    }

    #[test]
    fn test_workflow_error_wraps_agent_error() {
        let agent = AgentError::new(StageKind::Draft, AgentFailure::Network("refused".into()));
        let err: WorkflowError = agent.clone().into();
        assert_eq!(err, WorkflowError::Agent(agent));
    }
}
