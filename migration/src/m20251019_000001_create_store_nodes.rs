use sea_orm_migration::prelude::*;

/// Store Nodes (树形存储的顶层节点)
/// 每个顶层路径段 (submissions / participants / prizes) 对应一行,
/// 整棵子树以 JSONB 保存, version 在值变化时递增，用于监听器按序投递
#[derive(DeriveIden)]
enum StoreNodes {
    Table,
    Path,
    Value,
    Version,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StoreNodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoreNodes::Path)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    // NULL 表示节点已被删除 (行保留, 版本号继续递增以避免 ABA)
                    .col(ColumnDef::new(StoreNodes::Value).json_binary().null())
                    .col(
                        ColumnDef::new(StoreNodes::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StoreNodes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoreNodes::Table).to_owned())
            .await
    }
}
