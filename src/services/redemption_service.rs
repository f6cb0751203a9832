use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::error::AppResult;
use crate::models::{
    PARTICIPANTS_PATH, Participant, RedemptionStatus, SUBMISSIONS_PATH, Submission,
    ValidationResult, decode_children,
};
use crate::store::SharedStore;
use crate::utils::normalize_redeem_code;

/// 找不到提交记录时展示的名字
pub const FALLBACK_PARTICIPANT_NAME: &str = "Participant";

#[derive(Clone)]
pub struct RedemptionService {
    store: SharedStore,
}

impl RedemptionService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// 核销兑换码。
    /// 无效码与已核销属于正常的否定结果，只有存储故障才返回错误。
    pub async fn validate(&self, raw_code: &str) -> AppResult<ValidationResult> {
        let code = normalize_redeem_code(raw_code)?;

        let participants = decode_children::<Participant>(
            self.store.get(PARTICIPANTS_PATH).await?,
            "participant",
        );
        let Some((identity, participant)) = participants
            .into_iter()
            .find(|(_, p)| p.won_prize && p.redeem_code.as_deref() == Some(code.as_str()))
        else {
            log::info!("Redeem code {code} not found");
            return Ok(ValidationResult::new(RedemptionStatus::InvalidCode, None));
        };

        if participant.is_redeemed() {
            log::info!("Redeem code {code} was already redeemed");
            return Ok(ValidationResult::new(RedemptionStatus::AlreadyRedeemed, None));
        }

        let participant_name = self.display_name(&identity).await?;
        let status = self.mark_redeemed(&identity, &code).await?;

        if status == RedemptionStatus::Redeemed {
            log::info!("Redeem code {code} redeemed by {identity}");
            Ok(ValidationResult::new(status, Some(participant_name)))
        } else {
            log::info!("Redeem code {code} changed before redemption: {status:?}");
            Ok(ValidationResult::new(status, None))
        }
    }

    /// 在参与记录上重新检查并置位，保证同一兑换码只会被核销一次
    async fn mark_redeemed(&self, identity: &str, code: &str) -> AppResult<RedemptionStatus> {
        let path = format!("{PARTICIPANTS_PATH}/{identity}");
        let redeemed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut status = RedemptionStatus::InvalidCode;

        let mut update = |current: Option<Value>| -> Value {
            let mut record = match current {
                Some(Value::Object(record)) => record,
                other => {
                    status = RedemptionStatus::InvalidCode;
                    return other.unwrap_or(Value::Null);
                }
            };

            if record.get("redeemCode").and_then(Value::as_str) != Some(code) {
                status = RedemptionStatus::InvalidCode;
            } else if record.get("redeemed").and_then(Value::as_bool) == Some(true) {
                status = RedemptionStatus::AlreadyRedeemed;
            } else {
                record.insert("redeemed".to_string(), json!(true));
                record.insert("redeemedAt".to_string(), json!(redeemed_at));
                status = RedemptionStatus::Redeemed;
            }
            Value::Object(record)
        };
        self.store.transact(&path, &mut update).await?;

        Ok(status)
    }

    /// 取该身份最近一次提交的姓名
    async fn display_name(&self, identity: &str) -> AppResult<String> {
        let submissions = decode_children::<Submission>(
            self.store.get(SUBMISSIONS_PATH).await?,
            "submission",
        );

        Ok(submissions
            .into_iter()
            .filter(|(_, s)| s.user_id == identity)
            .max_by(|(a_id, a), (b_id, b)| a.timestamp.cmp(&b.timestamp).then_with(|| a_id.cmp(b_id)))
            .map(|(_, s)| s.name)
            .unwrap_or_else(|| FALLBACK_PARTICIPANT_NAME.to_string()))
    }
}
