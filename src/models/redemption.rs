use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateCodeRequest {
    #[schema(example = "k7mx")]
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Redeemed,
    InvalidCode,
    AlreadyRedeemed,
}

impl RedemptionStatus {
    pub fn message(self) -> &'static str {
        match self {
            RedemptionStatus::Redeemed => "Prize redeemed successfully",
            RedemptionStatus::InvalidCode => "Invalid code",
            RedemptionStatus::AlreadyRedeemed => "This code was already redeemed",
        }
    }
}

/// 兑换码核销结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationResult {
    pub success: bool,
    pub status: RedemptionStatus,
    pub message: String,
    /// 中奖者姓名 (取其最近一次表单提交)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
}

impl ValidationResult {
    pub fn new(status: RedemptionStatus, participant_name: Option<String>) -> Self {
        Self {
            success: status == RedemptionStatus::Redeemed,
            status,
            message: status.message().to_string(),
            participant_name,
        }
    }
}
