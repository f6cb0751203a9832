use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Identity;

pub const PARTICIPANTS_PATH: &str = "participants";

pub fn participant_path(identity: &Identity) -> String {
    format!("{PARTICIPANTS_PATH}/{identity}")
}

/// 抽奖参与记录 (存储格式，键为匿名身份)
/// 说明:
/// - 记录存在即表示已参与，无论是否中奖
/// - redeem_code / redeemed 仅中奖时存在
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub played_at: DateTime<Utc>,
    pub won_prize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeem_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn loser(played_at: DateTime<Utc>) -> Self {
        Self {
            played_at,
            won_prize: false,
            redeem_code: None,
            redeemed: None,
            redeemed_at: None,
        }
    }

    pub fn winner(played_at: DateTime<Utc>, redeem_code: String) -> Self {
        Self {
            played_at,
            won_prize: true,
            redeem_code: Some(redeem_code),
            redeemed: Some(false),
            redeemed_at: None,
        }
    }

    pub fn is_redeemed(&self) -> bool {
        self.redeemed.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loser_has_no_redeem_fields() {
        let now = Utc::now();
        let value = serde_json::to_value(Participant::loser(now)).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("wonPrize"), Some(&json!(false)));
        assert!(!obj.contains_key("redeemCode"));
        assert!(!obj.contains_key("redeemed"));
    }

    #[test]
    fn test_reads_stored_winner() {
        let stored = json!({
            "playedAt": "2025-08-01T12:00:00.000Z",
            "wonPrize": true,
            "redeemCode": "AB2C",
            "redeemed": true,
            "redeemedAt": "2025-08-01T13:00:00.000Z"
        });
        let participant: Participant = serde_json::from_value(stored).unwrap();
        assert!(participant.is_redeemed());
        assert_eq!(participant.redeem_code.as_deref(), Some("AB2C"));
    }
}
