//! 测试用后端: 可注入延迟与故障的内存存储

use async_trait::async_trait;
use dashmap::DashSet;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::memory::MemoryBackend;
use super::tree_store::{NodeBackend, NodeSnapshot, NodeWrite, TreeStore, WriteCondition};
use super::SharedStore;
use crate::error::{AppError, AppResult};

/// 按顶层节点注入的故障
#[derive(Default)]
pub struct Faults {
    loads: DashSet<String>,
    writes: DashSet<String>,
}

impl Faults {
    pub fn fail_loads(&self, root: &str) {
        self.loads.insert(root.to_string());
    }

    pub fn fail_writes(&self, root: &str) {
        self.writes.insert(root.to_string());
    }

    pub fn heal(&self) {
        self.loads.clear();
        self.writes.clear();
    }
}

pub struct FaultyBackend {
    inner: MemoryBackend,
    faults: Arc<Faults>,
    delay: Duration,
}

impl FaultyBackend {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl NodeBackend for FaultyBackend {
    async fn load(&self, root: &str) -> AppResult<NodeSnapshot> {
        self.pause().await;
        if self.faults.loads.contains(root) {
            return Err(AppError::StoreError(format!("injected load failure on {root}")));
        }
        self.inner.load(root).await
    }

    async fn write_path(
        &self,
        root: &str,
        rest: &[String],
        value: Value,
        condition: WriteCondition,
    ) -> AppResult<Option<NodeWrite>> {
        self.pause().await;
        if self.faults.writes.contains(root) {
            return Err(AppError::StoreError(format!("injected write failure on {root}")));
        }
        self.inner.write_path(root, rest, value, condition).await
    }
}

fn build(delay: Duration) -> (SharedStore, Arc<Faults>) {
    let faults = Arc::new(Faults::default());
    let backend = FaultyBackend {
        inner: MemoryBackend::default(),
        faults: faults.clone(),
        delay,
    };
    (Arc::new(TreeStore::new(backend)), faults)
}

/// 可按节点注入读写故障的存储
pub fn faulty_store() -> (SharedStore, Arc<Faults>) {
    build(Duration::ZERO)
}

/// 每次后端读写前等待 `delay` 的存储
pub fn slow_store(delay: Duration) -> SharedStore {
    build(delay).0
}
