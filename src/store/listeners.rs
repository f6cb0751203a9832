use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::path::{TreePath, value_at};

pub type ChangeCallback = Arc<dyn Fn(Option<Value>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    path: TreePath,
    callback: ChangeCallback,
    /// 已投递的最大节点版本
    delivered: Mutex<i64>,
}

impl Listener {
    /// 按版本号顺序投递，不大于已投递版本的通知直接丢弃。
    /// 回调在锁内执行，同一监听器的回调不会并发或乱序。
    fn deliver(&self, version: i64, value: Option<Value>) {
        let mut delivered = self
            .delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if version <= *delivered {
            return;
        }
        *delivered = version;
        (self.callback)(value);
    }
}

/// 监听器注册表
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: DashMap<u64, Arc<Listener>>,
}

impl ListenerRegistry {
    pub fn register(&self, path: TreePath, callback: ChangeCallback) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(
            id,
            Arc::new(Listener {
                path,
                callback,
                delivered: Mutex::new(-1),
            }),
        );
        ListenerId(id)
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// 向单个监听器投递 (订阅时的初始值)
    pub fn deliver(&self, id: ListenerId, version: i64, value: Option<Value>) {
        let listener = self.listeners.get(&id.0).map(|entry| entry.value().clone());
        if let Some(listener) = listener {
            listener.deliver(version, value);
        }
    }

    /// 顶层节点 `root` 在版本 `version` 从 `old_root` 变为 `new_root` 后，
    /// 通知路径处的值发生变化的监听器
    pub fn notify(
        &self,
        root: &str,
        old_root: Option<&Value>,
        new_root: Option<&Value>,
        version: i64,
    ) {
        // 先收集再回调: 回调中可能会注销监听器，不能持有分片锁
        let pending: Vec<(Arc<Listener>, Option<Value>)> = self
            .listeners
            .iter()
            .filter(|entry| entry.path.root == root)
            .filter_map(|entry| {
                let rest = &entry.path.rest;
                let before = old_root.and_then(|r| value_at(r, rest));
                let after = new_root.and_then(|r| value_at(r, rest));
                (before != after).then(|| (entry.value().clone(), after.cloned()))
            })
            .collect();

        for (listener, value) in pending {
            listener.deliver(version, value);
        }
    }
}
