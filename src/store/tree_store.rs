use async_trait::async_trait;
use serde_json::Value;

use super::listeners::{ChangeCallback, ListenerId, ListenerRegistry};
use super::path::{TreePath, replace_at, value_at};
use super::{Store, UpdateFn};
use crate::error::{AppError, AppResult};

/// 单次事务最多尝试次数，超过后放弃并返回 StoreError
pub const MAX_TRANSACTION_ATTEMPTS: usize = 25;

/// 顶层节点快照: 当前值 (None 表示不存在) 与版本号 (从未写入为 0)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeSnapshot {
    pub value: Option<Value>,
    pub version: i64,
}

/// 路径写入的前置条件
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCondition {
    /// 无条件覆盖 (last-write-wins)
    Always,
    /// 仅当路径处的当前值仍等于读取时的值
    Unchanged(Option<Value>),
}

impl WriteCondition {
    pub fn holds(&self, node: Option<&Value>, rest: &[String]) -> bool {
        match self {
            WriteCondition::Always => true,
            WriteCondition::Unchanged(expected) => {
                node.and_then(|root| value_at(root, rest)) == expected.as_ref()
            }
        }
    }
}

/// 一次成功写入: 写入前后的整个顶层节点与写入后的版本号。
/// 值未变化时版本号不递增。
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWrite {
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub version: i64,
}

impl NodeWrite {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// 顶层节点的持久化后端
#[async_trait]
pub trait NodeBackend: Send + Sync {
    async fn load(&self, root: &str) -> AppResult<NodeSnapshot>;

    /// 原子地把 `root` 下 `rest` 处替换为 `value`。
    /// 同一顶层节点上的写入必须串行，值变化时版本号加一;
    /// 条件不满足时返回 `None`。
    async fn write_path(
        &self,
        root: &str,
        rest: &[String],
        value: Value,
        condition: WriteCondition,
    ) -> AppResult<Option<NodeWrite>>;
}

/// 在任意 [`NodeBackend`] 之上实现完整的 [`Store`] 语义
pub struct TreeStore<B> {
    backend: B,
    listeners: ListenerRegistry,
}

impl<B: NodeBackend> TreeStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            listeners: ListenerRegistry::default(),
        }
    }

    /// 写入并通知监听器; 条件不满足时返回 `None`，否则返回路径处提交后的值
    async fn write(
        &self,
        path: &TreePath,
        value: Value,
        condition: WriteCondition,
    ) -> AppResult<Option<Option<Value>>> {
        let Some(write) = self
            .backend
            .write_path(&path.root, &path.rest, value, condition)
            .await?
        else {
            return Ok(None);
        };

        if write.changed() {
            self.listeners.notify(
                &path.root,
                write.before.as_ref(),
                write.after.as_ref(),
                write.version,
            );
        }
        Ok(Some(
            write
                .after
                .as_ref()
                .and_then(|root| value_at(root, &path.rest))
                .cloned(),
        ))
    }

    /// 乐观事务循环:
    /// 1. 读取路径处的当前值
    /// 2. 用更新函数计算新值
    /// 3. 仅当路径处的值未被改动时写入，否则从 1 重试
    ///
    /// 只与改动同一路径 (或其祖先/子孙) 的写入冲突
    async fn commit(&self, path: &TreePath, update: &mut UpdateFn<'_>) -> AppResult<Option<Value>> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let snapshot = self.backend.load(&path.root).await?;
            let current = snapshot
                .value
                .as_ref()
                .and_then(|root| value_at(root, &path.rest))
                .cloned();

            let updated = update(current.clone());
            if replace_at(snapshot.value.clone(), &path.rest, updated.clone()) == snapshot.value {
                return Ok(current);
            }

            if let Some(committed) = self
                .write(path, updated, WriteCondition::Unchanged(current))
                .await?
            {
                return Ok(committed);
            }

            log::debug!(
                "Transaction conflict on {} (attempt {attempt}/{MAX_TRANSACTION_ATTEMPTS})",
                path.full()
            );
            tokio::task::yield_now().await;
        }

        Err(AppError::StoreError(format!(
            "Transaction on {} aborted after {MAX_TRANSACTION_ATTEMPTS} conflicting attempts",
            path.full()
        )))
    }
}

#[async_trait]
impl<B: NodeBackend> Store for TreeStore<B> {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        let path = TreePath::parse(path)?;
        let snapshot = self.backend.load(&path.root).await?;
        Ok(snapshot
            .value
            .as_ref()
            .and_then(|root| value_at(root, &path.rest))
            .cloned())
    }

    async fn set(&self, path: &str, value: Value) -> AppResult<()> {
        let path = TreePath::parse(path)?;
        self.write(&path, value, WriteCondition::Always).await?;
        Ok(())
    }

    async fn transact(&self, path: &str, update: &mut UpdateFn<'_>) -> AppResult<Option<Value>> {
        let path = TreePath::parse(path)?;
        self.commit(&path, update).await
    }

    async fn subscribe(&self, path: &str, on_change: ChangeCallback) -> AppResult<ListenerId> {
        let path = TreePath::parse(path)?;
        // 先注册再读取; 注册期间的写入与初始值按版本号排序，旧版本会被丢弃
        let id = self.listeners.register(path.clone(), on_change);
        match self.backend.load(&path.root).await {
            Ok(snapshot) => {
                let current = snapshot
                    .value
                    .as_ref()
                    .and_then(|root| value_at(root, &path.rest))
                    .cloned();
                self.listeners.deliver(id, snapshot.version, current);
                Ok(id)
            }
            Err(e) => {
                self.listeners.remove(id);
                Err(e)
            }
        }
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
