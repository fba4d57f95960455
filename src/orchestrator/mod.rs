//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把配置、HTTP 客户端和流程控制器组装起来，一次跑完四个阶段，
//! 输出解析后的时间线和预算。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次完整运行)
//!     ↓
//! workflow::WorkflowController (状态机 / epoch / 自动保存)
//!     ↓
//! services (能力层：access_policy / batch_runner / history_store)
//!     ↓
//! clients (HTTP：阶段代理 / 历史服务)
//! ```
//!
//! 本层只做调度和汇总，不做流程判断。

pub mod app;

pub use app::{App, RunReport};
