use super::{split_weeks, strip_bullet};

/// 时间线中的一周
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekBlock {
    pub title: String,
    pub tasks: Vec<String>,
}

/// 解析时间线文本
///
/// 每段第一行是标题，其余非空行是任务
pub fn parse_timeline(guidance: &str) -> Vec<WeekBlock> {
    split_weeks(guidance)
        .into_iter()
        .filter_map(|block| {
            let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());
            let title = lines.next()?.to_string();
            let tasks = lines
                .map(strip_bullet)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            Some(WeekBlock { title, tasks })
        })
        .collect()
}
