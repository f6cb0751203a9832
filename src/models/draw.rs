use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const WIN_MESSAGE: &str = "Congratulations! You won a prize. Show your redeem code at the booth.";
pub const LOSS_MESSAGE: &str = "Not this time. Thanks for participating!";
pub const EXHAUSTED_MESSAGE: &str = "All prizes have been claimed. Thanks for participating!";
pub const ALREADY_WON_MESSAGE: &str = "You already won! Here is your redeem code again.";
pub const ALREADY_REDEEMED_MESSAGE: &str = "You already won and your prize has been redeemed.";
pub const ALREADY_LOST_MESSAGE: &str = "You have already participated in this raffle.";

/// 抽奖结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DrawResult {
    pub won: bool,
    pub already_played: bool,
    /// 仅在 already_played 且中奖时返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "K7MX")]
    pub redeem_code: Option<String>,
    pub message: String,
}

impl DrawResult {
    pub fn won(redeem_code: String) -> Self {
        Self {
            won: true,
            already_played: false,
            redeemed: None,
            redeem_code: Some(redeem_code),
            message: WIN_MESSAGE.to_string(),
        }
    }

    pub fn lost() -> Self {
        Self {
            won: false,
            already_played: false,
            redeemed: None,
            redeem_code: None,
            message: LOSS_MESSAGE.to_string(),
        }
    }

    pub fn exhausted() -> Self {
        Self {
            message: EXHAUSTED_MESSAGE.to_string(),
            ..Self::lost()
        }
    }

    pub fn already_won(redeem_code: Option<String>, redeemed: bool) -> Self {
        let message = if redeemed {
            ALREADY_REDEEMED_MESSAGE
        } else {
            ALREADY_WON_MESSAGE
        };
        Self {
            won: true,
            already_played: true,
            redeemed: Some(redeemed),
            redeem_code,
            message: message.to_string(),
        }
    }

    pub fn already_lost() -> Self {
        Self {
            won: false,
            already_played: true,
            redeemed: None,
            redeem_code: None,
            message: ALREADY_LOST_MESSAGE.to_string(),
        }
    }
}
