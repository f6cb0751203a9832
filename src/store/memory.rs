use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::path::replace_at;
use super::tree_store::{NodeBackend, NodeSnapshot, NodeWrite, WriteCondition};
use crate::error::AppResult;

/// 进程内后端: 每个顶层节点一个带版本号的条目。
/// 同一顶层节点上的写入由 DashMap 的条目锁串行化。
#[derive(Default)]
pub struct MemoryBackend {
    nodes: DashMap<String, NodeSnapshot>,
}

#[async_trait]
impl NodeBackend for MemoryBackend {
    async fn load(&self, root: &str) -> AppResult<NodeSnapshot> {
        Ok(self
            .nodes
            .get(root)
            .map(|node| node.value().clone())
            .unwrap_or_default())
    }

    async fn write_path(
        &self,
        root: &str,
        rest: &[String],
        value: Value,
        condition: WriteCondition,
    ) -> AppResult<Option<NodeWrite>> {
        let mut node = self.nodes.entry(root.to_string()).or_default();
        if !condition.holds(node.value.as_ref(), rest) {
            return Ok(None);
        }

        let before = node.value.clone();
        let after = replace_at(before.clone(), rest, value);
        if after != before {
            node.value = after.clone();
            node.version += 1;
        }
        Ok(Some(NodeWrite {
            before,
            after,
            version: node.version,
        }))
    }
}
