use super::{split_weeks, strip_bullet, week_marker};

const CONCLUSION_MARKER: &str = "Final Conclusion:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetTask {
    pub task: String,
    pub roles: String,
    pub hours: String,
    pub cost: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetWeek {
    pub title: String,
    pub tasks: Vec<BudgetTask>,
}

/// 预算与结论
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetReport {
    pub weeks: Vec<BudgetWeek>,
    pub conclusion: String,
}

impl BudgetReport {
    pub fn task_count(&self) -> usize {
        self.weeks.iter().map(|w| w.tasks.len()).sum()
    }
}

/// 解析预算文本
///
/// `Task:` 行开始一个新任务；`Roles:`、含 hour、含 cost 的行补充当前任务。
/// 缺失的字段保持为空。
pub fn parse_budget(plan: &str) -> BudgetReport {
    let (budget_part, conclusion) = match plan.split_once(CONCLUSION_MARKER) {
        Some((budget, conclusion)) => (budget, conclusion.trim().to_string()),
        None => (plan, String::new()),
    };

    let weeks = split_weeks(budget_part)
        .into_iter()
        // 只保留以 Week 标记开头的段落，跳过 "Budget & Resource Plan:" 之类的前言
        .filter(|block| week_marker().find(block).map(|m| m.start()) == Some(0))
        .filter_map(parse_week)
        .collect();

    BudgetReport { weeks, conclusion }
}

fn parse_week(block: &str) -> Option<BudgetWeek> {
    let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines.next()?.trim_end_matches(':').to_string();

    let mut tasks = Vec::new();
    let mut current: Option<BudgetTask> = None;

    for line in lines {
        let line = strip_bullet(line);
        let lower = line.to_lowercase();

        if lower.starts_with("task:") {
            if let Some(task) = current.take() {
                tasks.push(task);
            }
            current = Some(BudgetTask {
                task: after_label(line).to_string(),
                ..BudgetTask::default()
            });
            continue;
        }

        let Some(task) = current.as_mut() else {
            continue;
        };
        if lower.starts_with("roles:") {
            task.roles = after_label(line).to_string();
        } else if lower.contains("hour") {
            task.hours = after_label(line).to_string();
        } else if lower.contains("cost") {
            task.cost = after_label(line).to_string();
        }
    }

    if let Some(task) = current {
        tasks.push(task);
    }

    Some(BudgetWeek { title, tasks })
}

/// 去掉 `Label:` 前缀；没有冒号时原样返回
fn after_label(line: &str) -> &str {
    line.split_once(':')
        .map(|(_, value)| value.trim())
        .unwrap_or(line)
}
