//! 树形键值存储抽象。
//!
//! 业务层只依赖 [`Store`] trait:
//! - `get` / `set`: 点读写 (`set` 为无条件覆盖，写入 `null` 即删除子树)
//! - `transact`: 乐观事务 (读取-修改-条件写入, 仅当路径处的值被并发改动时重试)
//! - `subscribe` / `unsubscribe`: 子树变更监听，按节点版本号顺序投递
//!
//! [`TreeStore`] 在任意 [`NodeBackend`] 之上实现上述语义,
//! 目前有内存 ([`MemoryBackend`]) 与 Postgres ([`PostgresBackend`]) 两种后端。

pub mod listeners;
pub mod memory;
pub mod path;
pub mod postgres;
#[cfg(test)]
pub mod testing;
pub mod tree_store;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::error::AppResult;

pub use listeners::{ChangeCallback, ListenerId, ListenerRegistry};
pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
pub use tree_store::{NodeBackend, NodeSnapshot, NodeWrite, TreeStore, WriteCondition};

/// 事务更新函数: 输入当前值 (不存在为 None)，返回新值 (`Value::Null` 表示删除)。
/// 发生冲突时会被多次调用，调用方不应在其中产生外部副作用。
pub type UpdateFn<'a> = dyn FnMut(Option<Value>) -> Value + Send + 'a;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, path: &str) -> AppResult<Option<Value>>;

    async fn set(&self, path: &str, value: Value) -> AppResult<()>;

    /// 返回提交后的值
    async fn transact(&self, path: &str, update: &mut UpdateFn<'_>) -> AppResult<Option<Value>>;

    /// 注册监听: 注册后立即以当前值回调一次，此后每次该路径的值发生变化时回调。
    /// 同一监听器的回调不会并发，也不会收到比已投递版本更旧的值;
    /// 回调内不能同步写入存储。
    async fn subscribe(&self, path: &str, on_change: ChangeCallback) -> AppResult<ListenerId>;

    fn unsubscribe(&self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;
}

pub type SharedStore = Arc<dyn Store>;

/// 按时间排序的唯一键: 13 位十六进制毫秒时间戳 + 12 位随机后缀
pub fn generate_push_key() -> String {
    let millis = Utc::now().timestamp_millis().max(0);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{:013x}{}", millis, &suffix[..12])
}

/// 创建一个进程内存储 (默认后端，测试同样使用)
pub fn memory_store() -> SharedStore {
    Arc::new(TreeStore::new(MemoryBackend::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keys_are_unique_and_ordered() {
        let first = generate_push_key();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_push_key();

        assert_eq!(first.len(), 25);
        assert_ne!(first, second);
        assert!(first < second);
    }
}
