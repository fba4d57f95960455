//! 历史记录存储 - 业务能力层
//!
//! 只负责列出、创建、更新、删除记录；何时保存由流程控制器决定。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::HistoryError;
use crate::models::{NewRecord, WorkflowRecord};

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 按创建时间倒序返回全部记录
    async fn list(&self) -> Result<Vec<WorkflowRecord>, HistoryError>;

    /// 创建记录，由存储端分配 id 和时间戳
    async fn create(&self, record: NewRecord) -> Result<WorkflowRecord, HistoryError>;

    /// 覆盖已有记录的内容，id 不变
    async fn update(&self, id: &str, record: NewRecord) -> Result<WorkflowRecord, HistoryError>;

    async fn delete(&self, id: &str) -> Result<(), HistoryError>;
}

/// 进程内历史存储
///
/// 与远程历史服务语义一致：新记录在最前，id 由存储分配
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<WorkflowRecord>>,
    next_id: AtomicU64,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WorkflowRecord>> {
        // 锁内不会 panic，中毒时直接沿用数据
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn now() -> String {
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn list(&self) -> Result<Vec<WorkflowRecord>, HistoryError> {
        Ok(self.lock().clone())
    }

    async fn create(&self, record: NewRecord) -> Result<WorkflowRecord, HistoryError> {
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        let stored = record.into_record(id, Self::now());
        debug!("创建历史记录 {}: {}", stored.id, stored.title);
        self.lock().insert(0, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, record: NewRecord) -> Result<WorkflowRecord, HistoryError> {
        let mut records = self.lock();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| HistoryError::NotFound { id: id.to_string() })?;
        *slot = record.into_record(id, slot.timestamp.clone());
        debug!("更新历史记录 {}", id);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(HistoryError::NotFound { id: id.to_string() });
        }
        debug!("删除历史记录 {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NewRecord {
        NewRecord {
            title: title.to_string(),
            requirements: format!("{} requirements", title),
            proposal: None,
            explanations: Vec::new(),
            guidance: String::new(),
            budget_plan: String::new(),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryHistoryStore::new();
        let first = store.create(draft("first")).await.unwrap();
        let second = store.create(draft("second")).await.unwrap();
        assert_ne!(first.id, second.id);

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_position() {
        let store = MemoryHistoryStore::new();
        let first = store.create(draft("first")).await.unwrap();
        store.create(draft("second")).await.unwrap();

        let updated = store.update(&first.id, draft("first v2")).await.unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.timestamp, first.timestamp);

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "first v2");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = MemoryHistoryStore::new();
        tokio_test::block_on(async {
            let record = tokio_test::assert_ok!(store.create(draft("only")).await);
            tokio_test::assert_ok!(store.delete(&record.id).await);
            assert!(store.list().await.unwrap().is_empty());

            let err = tokio_test::assert_err!(store.delete(&record.id).await);
            assert!(matches!(err, HistoryError::NotFound { .. }));
        });
    }
}
