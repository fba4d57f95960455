//! 流程控制器 - 流程层
//!
//! 核心职责：驱动"一份提案"的完整生成流程
//!
//! 流程顺序：
//! 1. draft → 提案草稿
//! 2. explain → 逐条解释要点（限速、遇错即停）
//! 3. guidance → 时间线（受套餐限制）
//! 4. budget → 预算与结论，完成后自动保存
//!
//! 取消方式：每次开始新会话 `epoch` 加一，
//! 带着旧 `epoch` 返回的结果一律丢弃，不会修改新会话。

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clients::StageAgents;
use crate::config::Config;
use crate::error::{AgentError, AgentFailure, WorkflowError};
use crate::models::{
    BudgetRequest, ExplainRequest, Explanation, GuidanceRequest, Proposal, StageKind, Tier,
    WorkflowRecord,
};
use crate::services::{access_policy, HistoryStore, ThrottledBatchRunner};
use crate::workflow::session::{WorkflowSession, WorkflowStage};

/// 单个操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 操作完成并已写入当前会话
    Completed,
    /// 没有可做的事（空需求、已自动保存、保存失败等）
    Skipped,
    /// 会话在等待期间被替换，结果已丢弃
    Superseded,
}

/// 流程控制器
///
/// - 持有唯一的活跃会话
/// - 决定何时调用代理、何时检查套餐、何时写历史
/// - 不关心展示
pub struct WorkflowController {
    agents: Arc<dyn StageAgents>,
    history: Arc<dyn HistoryStore>,
    runner: ThrottledBatchRunner,
    session: Mutex<WorkflowSession>,
    updates: watch::Sender<WorkflowSession>,
}

impl WorkflowController {
    pub fn new(
        agents: Arc<dyn StageAgents>,
        history: Arc<dyn HistoryStore>,
        runner: ThrottledBatchRunner,
    ) -> Self {
        let (updates, _) = watch::channel(WorkflowSession::default());
        Self {
            agents,
            history,
            runner,
            session: Mutex::new(WorkflowSession::default()),
            updates,
        }
    }

    pub fn from_config(
        config: &Config,
        agents: Arc<dyn StageAgents>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self::new(agents, history, ThrottledBatchRunner::new(config.explain_delay()))
    }

    /// 当前会话的快照
    pub fn snapshot(&self) -> WorkflowSession {
        self.lock().clone()
    }

    pub fn stage(&self) -> WorkflowStage {
        self.lock().stage
    }

    /// 订阅会话变化，每次修改（包括每条新解释）都会推送
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSession> {
        self.updates.subscribe()
    }

    // ========== 流程操作 ==========

    /// 用新需求开始一个全新会话并生成草稿
    ///
    /// 需求为空时什么也不做
    pub async fn start(&self, requirements: &str) -> Result<StepOutcome, WorkflowError> {
        if requirements.trim().is_empty() {
            debug!("需求为空，忽略 start");
            return Ok(StepOutcome::Skipped);
        }

        let epoch = self.transition(|s| {
            s.renew();
            s.requirements = requirements.to_string();
            s.stage = WorkflowStage::Drafting;
            (true, s.epoch)
        });
        info!("[会话 {}] 📝 正在生成提案草稿...", epoch);

        let result = self.agents.draft(requirements).await;
        self.finish_stage(epoch, StageKind::Draft, result, |s, proposal: Proposal| {
            info!(
                "[会话 {}] ✓ 草稿完成: {} ({} 个要点)",
                s.epoch,
                proposal.title,
                proposal.key_points.len()
            );
            s.proposal = Some(proposal);
            s.stage = WorkflowStage::Drafted;
        })
        .await
    }

    /// 按顺序解释全部要点
    ///
    /// 每条结果立即追加到会话；遇到第一个失败即停止，
    /// 已完成的解释保留。重试会从第一个要点重新开始。
    pub async fn explain_all(&self) -> Result<StepOutcome, WorkflowError> {
        let (epoch, proposal) = self.transition(|s| {
            let ready = matches!(
                s.stage,
                WorkflowStage::Drafted | WorkflowStage::Error(StageKind::Explain)
            );
            match s.proposal.clone() {
                Some(proposal) if ready => {
                    s.explanations.clear();
                    s.stage = WorkflowStage::Explaining;
                    s.last_error = None;
                    (true, Ok((s.epoch, proposal)))
                }
                _ => (false, Err(invalid("explain_all", s.stage))),
            }
        })?;
        info!(
            "[会话 {}] 🔍 开始解释 {} 个要点",
            epoch,
            proposal.key_points.len()
        );

        let agents = &self.agents;
        let proposal_ref = &proposal;
        let outcome = self
            .runner
            .run(
                &proposal.key_points,
                |_| {
                    // 间隔等待期间会话可能已被替换，不再为旧会话发请求
                    if self.is_current(epoch) {
                        ControlFlow::Continue(())
                    } else {
                        ControlFlow::Break(())
                    }
                },
                |_, point| {
                    let request = ExplainRequest::for_point(proposal_ref, point);
                    let point = point.clone();
                    async move {
                        agents
                            .explain(&request)
                            .await
                            .map(|text| Explanation::new(point, text))
                    }
                },
                |index, explanation| {
                    if self.apply(epoch, |s| s.explanations.push(explanation.clone())) {
                        debug!("[会话 {}] ✓ 要点 {} 已解释", epoch, index + 1);
                        ControlFlow::Continue(())
                    } else {
                        ControlFlow::Break(())
                    }
                },
            )
            .await;

        if outcome.halted {
            debug!("[会话 {}] 会话已被替换，停止解释", epoch);
            return Ok(StepOutcome::Superseded);
        }

        match outcome.failure {
            Some(failure) => {
                warn!(
                    "[会话 {}] 要点 {} 解释失败，保留已完成的 {} 条",
                    epoch,
                    failure.index + 1,
                    outcome.completed.len()
                );
                self.finish_stage(epoch, StageKind::Explain, Err::<(), _>(failure.error), |_, _| {})
                    .await
            }
            None => {
                self.finish_stage(epoch, StageKind::Explain, Ok(()), |s, _| {
                    info!("[会话 {}] ✓ 全部 {} 个要点解释完成", s.epoch, s.explanations.len());
                    s.stage = WorkflowStage::Explained;
                })
                .await
            }
        }
    }

    /// 生成时间线
    ///
    /// 套餐不允许时进入 `GuidanceLocked`，不调用代理
    pub async fn request_guidance(&self, tier: Tier) -> Result<StepOutcome, WorkflowError> {
        let (epoch, request) = self.transition(|s| {
            let ready = matches!(
                s.stage,
                WorkflowStage::Explained
                    | WorkflowStage::GuidanceLocked
                    | WorkflowStage::Error(StageKind::Guidance)
            );
            let request = match &s.proposal {
                Some(proposal) if ready && !s.explanations.is_empty() => {
                    GuidanceRequest::from_proposal(proposal)
                }
                _ => return (false, Err(invalid("request_guidance", s.stage))),
            };

            if !access_policy::allowed(tier, StageKind::Guidance) {
                let denied = WorkflowError::AccessDenied {
                    tier,
                    stage: StageKind::Guidance,
                };
                s.stage = WorkflowStage::GuidanceLocked;
                s.last_error = Some(denied.to_string());
                return (true, Err(denied));
            }

            s.stage = WorkflowStage::GuidanceGenerating;
            s.last_error = None;
            (true, Ok((s.epoch, request)))
        })
        .map_err(|e| {
            if matches!(e, WorkflowError::AccessDenied { .. }) {
                warn!("🔒 {}", e);
            }
            e
        })?;
        info!("[会话 {}] 📅 正在生成时间线...", epoch);

        let result = self
            .agents
            .guidance(&request)
            .await
            .and_then(|text| require_text(StageKind::Guidance, text));
        self.finish_stage(epoch, StageKind::Guidance, result, |s, guidance| {
            info!("[会话 {}] ✓ 时间线完成", s.epoch);
            s.guidance = guidance;
            s.stage = WorkflowStage::GuidanceReady;
        })
        .await
    }

    /// 生成预算与结论，成功后自动保存
    pub async fn request_budget(&self, tier: Tier) -> Result<StepOutcome, WorkflowError> {
        let (epoch, request) = self.transition(|s| {
            let ready = matches!(
                s.stage,
                WorkflowStage::GuidanceReady | WorkflowStage::Error(StageKind::Budget)
            );
            let request = match &s.proposal {
                Some(proposal) if ready && !s.guidance.is_empty() => {
                    BudgetRequest::new(proposal, &s.explanations, &s.guidance)
                }
                _ => return (false, Err(invalid("request_budget", s.stage))),
            };

            if !access_policy::allowed(tier, StageKind::Budget) {
                return (
                    false,
                    Err(WorkflowError::AccessDenied {
                        tier,
                        stage: StageKind::Budget,
                    }),
                );
            }

            s.stage = WorkflowStage::BudgetGenerating;
            s.last_error = None;
            (true, Ok((s.epoch, request)))
        })?;
        info!("[会话 {}] 💰 正在生成预算...", epoch);

        let result = self
            .agents
            .budget(&request)
            .await
            .and_then(|text| require_text(StageKind::Budget, text));
        self.finish_stage(epoch, StageKind::Budget, result, |s, plan| {
            info!("[会话 {}] ✓ 预算完成，提案已完整", s.epoch);
            s.budget_plan = plan;
            s.stage = WorkflowStage::Complete;
        })
        .await
    }

    /// 手动保存当前进度
    ///
    /// 已完成的会话已自动保存，直接跳过；
    /// 已有历史记录时更新该记录，否则新建。失败只记录日志。
    pub async fn save_draft(&self) -> StepOutcome {
        let session = self.snapshot();
        if session.stage == WorkflowStage::Complete {
            debug!("会话已完成并自动保存，跳过手动保存");
            return StepOutcome::Skipped;
        }
        if session.requirements.trim().is_empty() && session.proposal.is_none() {
            return StepOutcome::Skipped;
        }

        let record = session.to_new_record(session.draft_title());
        let saved = match &session.history_id {
            Some(id) => self.history.update(id, record).await,
            None => self.history.create(record).await,
        };

        match saved {
            Ok(entry) => {
                info!("💾 草稿已保存: {} ({})", entry.title, entry.id);
                if !self.apply(session.epoch, |s| s.history_id = Some(entry.id)) {
                    return StepOutcome::Superseded;
                }
                StepOutcome::Completed
            }
            Err(e) => {
                warn!("保存草稿失败: {}", e);
                StepOutcome::Skipped
            }
        }
    }

    /// 载入历史记录作为新会话，始终标记为 `Complete`
    pub async fn load_from_history(&self, record: WorkflowRecord) -> u64 {
        let epoch = self.transition(|s| {
            s.renew();
            s.restore(record);
            (true, s.epoch)
        });
        info!("[会话 {}] 📂 已载入历史记录", epoch);
        self.auto_save_if_complete().await;
        epoch
    }

    /// 清空会话回到 `Idle`，在途结果全部作废
    pub fn reset(&self) -> u64 {
        let epoch = self.transition(|s| {
            s.renew();
            (true, s.epoch)
        });
        info!("[会话 {}] 🔄 会话已重置", epoch);
        epoch
    }

    // ========== 历史记录 ==========

    /// 读取历史列表，失败时返回空列表
    pub async fn list_history(&self) -> Vec<WorkflowRecord> {
        match self.history.list().await {
            Ok(records) => records,
            Err(e) => {
                warn!("读取历史记录失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 删除历史记录；删除的正是当前会话对应的记录时重置会话
    pub async fn delete_history(&self, id: &str) -> bool {
        if let Err(e) = self.history.delete(id).await {
            warn!("删除历史记录 {} 失败: {}", id, e);
            return false;
        }

        let active = self.lock().history_id.as_deref() == Some(id);
        if active {
            self.reset();
        }
        true
    }

    // ========== 内部方法 ==========

    fn lock(&self) -> MutexGuard<'_, WorkflowSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 原子地检查并修改会话，修改后推送给订阅者
    fn transition<R>(&self, f: impl FnOnce(&mut WorkflowSession) -> (bool, R)) -> R {
        let mut session = self.lock();
        let (changed, output) = f(&mut session);
        if changed {
            self.updates.send_replace(session.clone());
        }
        output
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    /// 仅当 `epoch` 仍是当前会话时修改
    fn apply(&self, epoch: u64, f: impl FnOnce(&mut WorkflowSession)) -> bool {
        self.transition(|s| {
            if s.epoch != epoch {
                debug!("丢弃过期结果 (epoch {} != {})", epoch, s.epoch);
                return (false, false);
            }
            f(s);
            (true, true)
        })
    }

    /// 写入阶段结果：成功则应用并检查自动保存，失败则进入 `Error`
    async fn finish_stage<T>(
        &self,
        epoch: u64,
        stage: StageKind,
        result: Result<T, AgentError>,
        on_success: impl FnOnce(&mut WorkflowSession, T),
    ) -> Result<StepOutcome, WorkflowError> {
        match result {
            Ok(value) => {
                if !self.apply(epoch, |s| on_success(s, value)) {
                    return Ok(StepOutcome::Superseded);
                }
                self.auto_save_if_complete().await;
                Ok(StepOutcome::Completed)
            }
            Err(err) => {
                let message = err.to_string();
                let applied = self.apply(epoch, |s| {
                    s.stage = WorkflowStage::Error(stage);
                    s.last_error = Some(message);
                });
                if !applied {
                    return Ok(StepOutcome::Superseded);
                }
                error!("[会话 {}] ❌ {}", epoch, err);
                Err(err.into())
            }
        }
    }

    /// 四个部分都齐了且尚未保存时写入历史，只会触发一次
    async fn auto_save_if_complete(&self) {
        let claimed = self.transition(|s| {
            if !s.needs_auto_save() {
                return (false, None);
            }
            s.completion_saved = true;
            (true, Some(s.clone()))
        });
        let Some(session) = claimed else {
            return;
        };

        let record = session.to_new_record(session.complete_title());
        let saved = match &session.history_id {
            Some(id) => self.history.update(id, record).await,
            None => self.history.create(record).await,
        };

        match saved {
            Ok(entry) => {
                info!("💾 完整提案已自动保存: {} ({})", entry.title, entry.id);
                self.apply(session.epoch, |s| s.history_id = Some(entry.id));
            }
            Err(e) => {
                warn!("自动保存失败，流程不受影响: {}", e);
                self.apply(session.epoch, |s| s.completion_saved = false);
            }
        }
    }
}

fn invalid(operation: &'static str, stage: WorkflowStage) -> WorkflowError {
    WorkflowError::InvalidTransition { operation, stage }
}

/// 时间线和预算不能为空，否则下游阶段无法进入
fn require_text(stage: StageKind, text: String) -> Result<String, AgentError> {
    if text.trim().is_empty() {
        return Err(AgentError::new(
            stage,
            AgentFailure::InvalidResponse("返回内容为空".to_string()),
        ));
    }
    Ok(text)
}
