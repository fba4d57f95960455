//! 展示层解析
//!
//! 代理返回的时间线和预算是半结构化文本，格式不是严格约定。
//! 这里宽松解析，缺字段时留空，不会报错；流程控制器只透传原文。

pub mod budget;
pub mod timeline;

pub use budget::{parse_budget, BudgetReport, BudgetTask, BudgetWeek};
pub use timeline::{parse_timeline, WeekBlock};

use regex::Regex;
use std::sync::OnceLock;

/// 匹配 `Week N:` 标记（不区分大小写）
fn week_marker() -> &'static Regex {
    static WEEK: OnceLock<Regex> = OnceLock::new();
    WEEK.get_or_init(|| Regex::new(r"(?i)week\s+\d+:").expect("week 正则是常量"))
}

/// 按 `Week N:` 标记切分，返回每段文本（标记之前的前言单独成段）
fn split_weeks(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = week_marker().find_iter(text).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .filter(|block| !block.is_empty())
        .collect()
}

/// 去掉行首的项目符号
fn strip_bullet(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('•'))
        .map(str::trim_start)
        .unwrap_or(trimmed)
}
