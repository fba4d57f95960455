//! 限速批量执行器
//!
//! 严格按顺序逐个执行，同一时间只有一个请求在途；
//! 上一个完成后等待固定间隔再开始下一个，遇到第一个错误立即停止。

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

/// 第一个失败的条目
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure<E> {
    /// 失败条目的下标（从 0 开始）
    pub index: usize,
    pub error: E,
}

/// 批量执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T, E> {
    /// 已成功的结果，顺序与输入一致
    pub completed: Vec<T>,
    pub failure: Option<BatchFailure<E>>,
    /// 回调要求提前终止
    pub halted: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ThrottledBatchRunner {
    delay: Duration,
}

impl ThrottledBatchRunner {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// 顺序执行 `items`
    ///
    /// # 参数
    /// - `should_start`: 每个条目发出请求前调用（在间隔等待之后），返回 `Break` 时不再发出
    /// - `op`: 单个条目的异步操作
    /// - `on_item`: 每个成功条目之后立即调用，返回 `Break` 时停止后续条目
    pub async fn run<I, T, E, S, F, Fut, C>(
        &self,
        items: &[I],
        mut should_start: S,
        mut op: F,
        mut on_item: C,
    ) -> BatchOutcome<T, E>
    where
        S: FnMut(usize) -> ControlFlow<()>,
        F: FnMut(usize, &I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnMut(usize, &T) -> ControlFlow<()>,
    {
        let mut outcome = BatchOutcome {
            completed: Vec::with_capacity(items.len()),
            failure: None,
            halted: false,
        };

        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                sleep(self.delay).await;
            }

            if should_start(index).is_break() {
                debug!("批量执行在第 {} 项之前被终止", index + 1);
                outcome.halted = true;
                break;
            }

            match op(index, item).await {
                Ok(value) => {
                    let flow = on_item(index, &value);
                    outcome.completed.push(value);
                    if flow.is_break() {
                        debug!("批量执行在第 {} 项后被终止", index + 1);
                        outcome.halted = true;
                        break;
                    }
                }
                Err(error) => {
                    debug!("批量执行在第 {} 项失败，停止后续 {} 项", index + 1, items.len() - index - 1);
                    outcome.failure = Some(BatchFailure { index, error });
                    break;
                }
            }
        }

        outcome
    }
}
