//! # Proposal Flow
//!
//! 把自由文本的项目需求变成结构化的多章节商业提案
//!
//! ## 架构设计
//!
//! 四个生成阶段（草稿、逐条解释、时间线、预算）由独立的远程代理完成，
//! 本库负责在它们之间编排：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只做 HTTP 请求/响应和错误归一化
//! - `HttpAgentClient` - 四个阶段代理
//! - `HttpHistoryStore` - 远程历史服务
//!
//! ### ② 业务能力层（Services）
//! - `access_policy` - 套餐 → 可进入的阶段
//! - `ThrottledBatchRunner` - 顺序、限速、遇错即停的批量执行
//! - `HistoryStore` - 历史记录的存储抽象
//!
//! ### ③ 流程层（Workflow）
//! - `WorkflowSession` - 唯一的活跃会话
//! - `WorkflowController` - 状态机、epoch 作废、自动保存
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator::App` - 一次跑完全部阶段并输出
//!
//! `report/` 是展示用的宽松解析，不属于流程核心。

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpAgentClient, HttpHistoryStore, StageAgents};
pub use config::Config;
pub use error::{AgentError, AgentFailure, AppError, AppResult, HistoryError, WorkflowError};
pub use models::{Explanation, Proposal, StageKind, Tier, WorkflowRecord};
pub use orchestrator::{App, RunReport};
pub use services::{HistoryStore, MemoryHistoryStore, ThrottledBatchRunner};
pub use workflow::{StepOutcome, WorkflowController, WorkflowSession, WorkflowStage};
