//! 流程会话
//!
//! 同一时间只有一个活跃会话；新会话直接替换旧会话，`epoch` 加一。

use crate::models::{Explanation, NewRecord, Proposal, StageKind, WorkflowRecord};

const UNTITLED: &str = "Untitled Proposal";
const DRAFT_TITLE: &str = "Draft Proposal";
const DRAFT_TITLE_CHARS: usize = 40;

/// 流程阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowStage {
    #[default]
    Idle,
    Drafting,
    Drafted,
    Explaining,
    Explained,
    /// 套餐不允许进入时间线阶段，需要升级后才能继续
    GuidanceLocked,
    GuidanceGenerating,
    GuidanceReady,
    BudgetGenerating,
    Complete,
    /// 该阶段失败；已有数据全部保留，可重试该阶段
    Error(StageKind),
}

/// 进度指示
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub drafted: bool,
    pub explained: bool,
    pub guidance: bool,
    pub budget: bool,
    pub saved: bool,
}

/// 当前活跃会话
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowSession {
    pub epoch: u64,
    pub stage: WorkflowStage,
    pub requirements: String,
    pub proposal: Option<Proposal>,
    pub explanations: Vec<Explanation>,
    pub guidance: String,
    pub budget_plan: String,
    /// 已保存为哪条历史记录
    pub history_id: Option<String>,
    /// 完整结果是否已写入历史
    pub completion_saved: bool,
    /// 最近一次失败的描述，用于展示重试入口
    pub last_error: Option<String>,
}

impl WorkflowSession {
    /// 丢弃全部数据，开始下一代会话
    pub(crate) fn renew(&mut self) {
        *self = Self {
            epoch: self.epoch + 1,
            ..Self::default()
        };
    }

    /// 用历史记录填充会话（调用前先 `renew`）
    pub(crate) fn restore(&mut self, record: WorkflowRecord) {
        self.requirements = record.requirements;
        self.proposal = record.proposal;
        self.explanations = record.explanations;
        if let Some(proposal) = &self.proposal {
            self.explanations.truncate(proposal.key_points.len());
        }
        self.guidance = record.guidance;
        self.budget_plan = record.budget_plan;
        self.history_id = Some(record.id);
        self.completion_saved = self.is_complete();
        self.stage = WorkflowStage::Complete;
    }

    /// 四个部分是否同时存在
    pub fn is_complete(&self) -> bool {
        self.proposal.is_some()
            && !self.explanations.is_empty()
            && !self.guidance.is_empty()
            && !self.budget_plan.is_empty()
    }

    /// 自动保存条件，每次修改后都要检查
    pub fn needs_auto_save(&self) -> bool {
        self.is_complete() && !self.completion_saved
    }

    pub fn progress(&self) -> Progress {
        Progress {
            drafted: self.proposal.is_some(),
            explained: !self.explanations.is_empty(),
            guidance: !self.guidance.is_empty(),
            budget: !self.budget_plan.is_empty(),
            saved: self.history_id.is_some(),
        }
    }

    /// 完整结果的记录标题
    pub fn complete_title(&self) -> String {
        match &self.proposal {
            Some(p) if !p.title.trim().is_empty() => p.title.clone(),
            _ => UNTITLED.to_string(),
        }
    }

    /// 手动保存草稿的记录标题
    pub fn draft_title(&self) -> String {
        if let Some(p) = &self.proposal {
            if !p.title.trim().is_empty() {
                return p.title.clone();
            }
        }

        let requirements = self.requirements.trim();
        if requirements.is_empty() {
            return DRAFT_TITLE.to_string();
        }
        if requirements.chars().count() > DRAFT_TITLE_CHARS {
            requirements.chars().take(DRAFT_TITLE_CHARS).collect::<String>() + "..."
        } else {
            requirements.to_string()
        }
    }

    pub fn to_new_record(&self, title: String) -> NewRecord {
        NewRecord {
            title,
            requirements: self.requirements.clone(),
            proposal: self.proposal.clone(),
            explanations: self.explanations.clone(),
            guidance: self.guidance.clone(),
            budget_plan: self.budget_plan.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_session() -> WorkflowSession {
        WorkflowSession {
            requirements: "Build a hotel booking app".into(),
            proposal: Some(Proposal::new("Hotel Booking Platform", "Intro", ["Search rooms"])),
            explanations: vec![Explanation::new("Search rooms", "text")],
            guidance: "Week 1: plan".into(),
            budget_plan: "Week 1:\n- Task: plan".into(),
            ..WorkflowSession::default()
        }
    }

    #[test]
    fn test_renew_bumps_epoch_and_clears() {
        let mut session = complete_session();
        session.epoch = 4;
        session.history_id = Some("9".into());
        session.renew();

        assert_eq!(session.epoch, 5);
        assert_eq!(session.stage, WorkflowStage::Idle);
        assert!(session.proposal.is_none());
        assert!(session.history_id.is_none());
    }

    #[test]
    fn test_auto_save_predicate() {
        let mut session = complete_session();
        assert!(session.needs_auto_save());

        session.completion_saved = true;
        assert!(!session.needs_auto_save());

        let mut partial = complete_session();
        partial.budget_plan.clear();
        assert!(!partial.needs_auto_save());
    }

    #[test]
    fn test_draft_title_fallbacks() {
        let mut session = WorkflowSession {
            requirements: "a".repeat(45),
            ..WorkflowSession::default()
        };
        assert_eq!(session.draft_title(), format!("{}...", "a".repeat(40)));

        session.requirements = "Short brief".into();
        assert_eq!(session.draft_title(), "Short brief");

        session.requirements.clear();
        assert_eq!(session.draft_title(), "Draft Proposal");

        session.proposal = Some(Proposal::new("Hotel", "", ["x"]));
        assert_eq!(session.draft_title(), "Hotel");
    }

    #[test]
    fn test_complete_title_defaults_to_untitled() {
        let mut session = complete_session();
        assert_eq!(session.complete_title(), "Hotel Booking Platform");

        session.proposal = Some(Proposal::new("  ", "", ["x"]));
        assert_eq!(session.complete_title(), "Untitled Proposal");
    }

    #[test]
    fn test_restore_marks_complete_and_saved() {
        let record = complete_session()
            .to_new_record("Hotel".into())
            .into_record("42", "2025-01-01T00:00:00");

        let mut session = WorkflowSession::default();
        session.renew();
        session.restore(record);

        assert_eq!(session.stage, WorkflowStage::Complete);
        assert_eq!(session.history_id.as_deref(), Some("42"));
        assert!(session.completion_saved);
        assert!(!session.needs_auto_save());
        assert_eq!(
            session.progress(),
            Progress {
                drafted: true,
                explained: true,
                guidance: true,
                budget: true,
                saved: true
            }
        );
    }
}
