//! 单次运行编排器
//!
//! 1. **初始化**：根据配置创建阶段代理客户端和历史服务客户端
//! 2. **顺序驱动**：draft → explain → guidance → budget
//! 3. **失败兜底**：任一阶段失败或套餐受限时，把已有进度保存为草稿
//! 4. **输出**：解析时间线与预算，打印汇总

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{HttpAgentClient, HttpHistoryStore};
use crate::config::Config;
use crate::error::{AppError, AppResult, WorkflowError};
use crate::report::{parse_budget, parse_timeline, BudgetReport, WeekBlock};
use crate::utils::logging;
use crate::workflow::{StepOutcome, WorkflowController, WorkflowSession};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub session: WorkflowSession,
    pub timeline: Vec<WeekBlock>,
    pub budget: BudgetReport,
}

/// 应用主结构
pub struct App {
    config: Config,
    controller: WorkflowController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let agents = HttpAgentClient::new(&config).map_err(|source| AppError::Client {
            target: "阶段代理",
            source,
        })?;
        let history = HttpHistoryStore::new(&config).map_err(|source| AppError::Client {
            target: "历史服务",
            source,
        })?;
        let controller = WorkflowController::from_config(&config, Arc::new(agents), Arc::new(history));

        Ok(Self::with_controller(config, controller))
    }

    pub fn with_controller(config: Config, controller: WorkflowController) -> Self {
        Self { config, controller }
    }

    pub fn controller(&self) -> &WorkflowController {
        &self.controller
    }

    /// 运行完整流程
    ///
    /// 阶段失败不会向上返回：已有进度保存为草稿，结果里带着停下时的会话
    pub async fn run(&self, requirements: &str) -> RunReport {
        logging::log_startup(&self.config, requirements);

        let history = self.controller.list_history().await;
        info!("📁 历史记录共 {} 条", history.len());

        let tier = self.config.plan_tier;
        let stages = async {
            if self.controller.start(requirements).await? == StepOutcome::Skipped {
                return Ok(false);
            }
            self.controller.explain_all().await?;
            self.controller.request_guidance(tier).await?;
            self.controller.request_budget(tier).await?;
            Ok::<bool, WorkflowError>(true)
        };

        match stages.await {
            Ok(true) => {}
            Ok(false) => {
                warn!("⚠️ 需求为空，程序结束");
                return self.report();
            }
            Err(e) => {
                match &e {
                    WorkflowError::AccessDenied { .. } => warn!("🔒 {}", e),
                    _ => error!("❌ 流程中断: {}", e),
                }
                // 保留已完成的部分
                self.controller.save_draft().await;
            }
        }

        let report = self.report();
        self.log_report(&report);
        logging::print_final_summary(&report.session);
        report
    }

    fn report(&self) -> RunReport {
        let session = self.controller.snapshot();
        RunReport {
            timeline: parse_timeline(&session.guidance),
            budget: parse_budget(&session.budget_plan),
            session,
        }
    }

    fn log_report(&self, report: &RunReport) {
        if let Some(proposal) = &report.session.proposal {
            info!("\n📄 {}", proposal.title);
            info!("{}", logging::truncate_text(&proposal.introduction, 200));
        }

        for (i, item) in report.session.explanations.iter().enumerate() {
            info!("  {}. {}", i + 1, item.point);
            if self.config.verbose_logging {
                info!("     {}", logging::truncate_text(&item.explanation, 120));
            }
        }

        for week in &report.timeline {
            info!("📅 {} ({} 项任务)", week.title, week.tasks.len());
        }

        if !report.budget.weeks.is_empty() {
            info!(
                "💰 预算共 {} 周 / {} 项任务",
                report.budget.weeks.len(),
                report.budget.task_count()
            );
        }
        if !report.budget.conclusion.is_empty() {
            info!("🏁 {}", logging::truncate_text(&report.budget.conclusion, 200));
        }
    }
}
