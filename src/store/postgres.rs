use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde_json::Value;

use super::path::replace_at;
use super::tree_store::{NodeBackend, NodeSnapshot, NodeWrite, WriteCondition};
use crate::entities::store_node_entity as nodes;
use crate::error::{AppError, AppResult};

/// Postgres 后端 (sea-orm): 每个顶层节点一行 JSONB。
/// 写入在事务内对该行加 `FOR UPDATE` 锁，同一节点的写入因此串行。
#[derive(Clone)]
pub struct PostgresBackend {
    pool: DatabaseConnection,
}

impl PostgresBackend {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NodeBackend for PostgresBackend {
    async fn load(&self, root: &str) -> AppResult<NodeSnapshot> {
        let row = nodes::Entity::find_by_id(root.to_string())
            .one(&self.pool)
            .await?;
        Ok(row
            .map(|m| NodeSnapshot {
                value: m.value,
                version: m.version,
            })
            .unwrap_or_default())
    }

    async fn write_path(
        &self,
        root: &str,
        rest: &[String],
        value: Value,
        condition: WriteCondition,
    ) -> AppResult<Option<NodeWrite>> {
        let txn = self.pool.begin().await?;

        // 确保行存在，之后才能加行锁
        nodes::Entity::insert(nodes::ActiveModel {
            path: Set(root.to_string()),
            value: Set(None),
            version: Set(0),
            updated_at: Set(Some(Utc::now())),
        })
        .on_conflict(
            OnConflict::column(nodes::Column::Path)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let row = nodes::Entity::find_by_id(root.to_string())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::StoreError(format!("Node {root} vanished under lock")))?;

        if !condition.holds(row.value.as_ref(), rest) {
            txn.rollback().await?;
            return Ok(None);
        }

        let before = row.value;
        let after = replace_at(before.clone(), rest, value);
        if after == before {
            txn.commit().await?;
            return Ok(Some(NodeWrite {
                before,
                after,
                version: row.version,
            }));
        }

        let version = row.version + 1;
        nodes::Entity::update_many()
            .col_expr(nodes::Column::Value, Expr::value(after.clone()))
            .col_expr(nodes::Column::Version, Expr::value(version))
            .col_expr(nodes::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(nodes::Column::Path.eq(root))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(Some(NodeWrite {
            before,
            after,
            version,
        }))
    }
}
