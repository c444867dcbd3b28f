//! 按提交加锁
//!
//! 同一进程内对同一提交的写操作串行执行；跨进程由提交的 revision 比较并写入保证。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct SubmissionLocks {
    /// 提交 ID -> 互斥锁
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

/// 提交锁的持有凭证，释放时若没有其他任务等待该锁则移除对应条目
pub struct SubmissionGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    submission_id: i64,
    locks: &'a DashMap<i64, Arc<Mutex<()>>>,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // 只剩表内这一份引用时说明没有等待者
        self.locks
            .remove_if(&self.submission_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SubmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取提交的锁，持有期间其他任务对该提交的写操作会等待
    pub async fn acquire(&self, submission_id: i64) -> SubmissionGuard<'_> {
        let lock = self
            .locks
            .entry(submission_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SubmissionGuard {
            guard: Some(lock.lock_owned().await),
            submission_id,
            locks: &self.locks,
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
