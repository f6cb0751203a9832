use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 奖池剩余数量 (整数)
pub const PRIZES_REMAINING_PATH: &str = "prizes/remaining";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetPrizeCountRequest {
    #[schema(example = 30)]
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrizeCountResponse {
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurgeRequest {
    /// 确认文本，必须与配置一致
    #[schema(example = "LIMPAR")]
    pub confirm: String,
}

/// 解释奖池节点: 不存在时为初始数量，非整数按 0 处理，永不为负
pub fn pool_remaining(value: Option<&serde_json::Value>, initial_prizes: i64) -> i64 {
    match value {
        None => initial_prizes.max(0),
        Some(v) => v.as_i64().unwrap_or(0).max(0),
    }
}
