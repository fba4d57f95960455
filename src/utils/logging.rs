/// 日志工具模块
///
/// 初始化订阅器，以及运行开始/结束时的汇总输出
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::WorkflowSession;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`；否则默认 info，详细模式下为 debug。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, requirements: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 提案生成流程启动");
    info!("📋 需求: {}", truncate_text(requirements, 80));
    info!("🎫 套餐: {}", config.plan_tier);
    info!("⏱️ 解释间隔: {}ms", config.explain_delay_ms);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_summary(session: &WorkflowSession) {
    let progress = session.progress();
    let mark = |done: bool| if done { "✅" } else { "⬜" };

    info!("\n{}", "=".repeat(60));
    info!("📊 流程结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("阶段: {:?}", session.stage);
    info!("{} 草稿", mark(progress.drafted));
    info!(
        "{} 要点解释 ({} 条)",
        mark(progress.explained),
        session.explanations.len()
    );
    info!("{} 时间线", mark(progress.guidance));
    info!("{} 预算", mark(progress.budget));
    match &session.history_id {
        Some(id) => info!("💾 历史记录: {}", id),
        None => info!("💾 未保存到历史"),
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("酒店预订平台", 2), "酒店...");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
