use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;
use serde_json::{Value, json};

use crate::config::RaffleConfig;
use crate::error::AppResult;
use crate::models::{
    DrawResult, Identity, PARTICIPANTS_PATH, PRIZES_REMAINING_PATH, Participant, decode_children,
    participant_path, pool_remaining,
};
use crate::store::SharedStore;
use crate::utils::generate_redeem_code;

/// 生成兑换码时与已有中奖码去重的最大尝试次数
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// 奖池事务内的抽奖结果 (每次重试都会重新计算)
#[derive(Debug, Clone, PartialEq, Eq)]
enum PoolOutcome {
    Won(String),
    Lost,
    Exhausted,
}

#[derive(Clone)]
pub struct DrawService {
    store: SharedStore,
    raffle: RaffleConfig,
}

impl DrawService {
    pub fn new(store: SharedStore, raffle: RaffleConfig) -> Self {
        Self { store, raffle }
    }

    /// 每个身份仅可抽奖一次，重复调用返回首次结果
    pub async fn draw(&self, identity: &Identity) -> AppResult<DrawResult> {
        let path = participant_path(identity);

        if let Some(existing) = self.store.get(&path).await? {
            let participant: Participant = serde_json::from_value(existing)?;
            log::info!("Identity {identity} already played (won: {})", participant.won_prize);
            return Ok(if participant.won_prize {
                DrawResult::already_won(participant.redeem_code.clone(), participant.is_redeemed())
            } else {
                DrawResult::already_lost()
            });
        }

        let outcome = self.draw_from_pool().await?;
        let won = matches!(outcome, PoolOutcome::Won(_));

        match self.record_outcome(&path, outcome).await {
            Ok(result) => {
                log::info!(
                    "Draw for {identity}: won={} code={}",
                    result.won,
                    result.redeem_code.as_deref().unwrap_or("-")
                );
                Ok(result)
            }
            Err(e) => {
                log::error!("Failed to record participation for {identity}: {e}");
                if won {
                    self.return_prize(identity).await;
                }
                Err(e)
            }
        }
    }

    /// 写入参与记录; 失败时身份仍可再次抽奖
    async fn record_outcome(&self, path: &str, outcome: PoolOutcome) -> AppResult<DrawResult> {
        let now = Utc::now();
        let (participant, result) = match outcome {
            PoolOutcome::Won(code) => {
                let code = self.unique_code(code).await?;
                (Participant::winner(now, code.clone()), DrawResult::won(code))
            }
            PoolOutcome::Lost => (Participant::loser(now), DrawResult::lost()),
            PoolOutcome::Exhausted => (Participant::loser(now), DrawResult::exhausted()),
        };

        self.store.set(path, serde_json::to_value(&participant)?).await?;
        Ok(result)
    }

    /// 把已扣减的奖品放回奖池
    async fn return_prize(&self, identity: &Identity) {
        let initial_prizes = self.raffle.initial_prizes;
        let mut refund = |current: Option<Value>| -> Value {
            json!(pool_remaining(current.as_ref(), initial_prizes) + 1)
        };
        match self.store.transact(PRIZES_REMAINING_PATH, &mut refund).await {
            Ok(remaining) => log::warn!(
                "Returned prize of {identity} to the pool (remaining: {})",
                remaining.and_then(|v| v.as_i64()).unwrap_or_default()
            ),
            Err(e) => log::error!("Failed to return prize of {identity} to the pool: {e}"),
        }
    }

    /// 在奖池上做乐观事务: 不存在则按初始数量初始化后继续抽奖
    async fn draw_from_pool(&self) -> AppResult<PoolOutcome> {
        let initial_prizes = self.raffle.initial_prizes;
        let win_probability = self.raffle.win_probability;
        let mut outcome = PoolOutcome::Exhausted;

        let mut update = |current: Option<Value>| -> Value {
            let remaining = pool_remaining(current.as_ref(), initial_prizes);
            if remaining <= 0 {
                outcome = PoolOutcome::Exhausted;
                return json!(0);
            }
            if rand::thread_rng().gen_bool(win_probability) {
                outcome = PoolOutcome::Won(generate_redeem_code());
                json!(remaining - 1)
            } else {
                outcome = PoolOutcome::Lost;
                json!(remaining)
            }
        };
        self.store.transact(PRIZES_REMAINING_PATH, &mut update).await?;

        Ok(outcome)
    }

    async fn unique_code(&self, mut code: String) -> AppResult<String> {
        let participants = decode_children::<Participant>(
            self.store.get(PARTICIPANTS_PATH).await?,
            "participant",
        );
        let taken: HashSet<String> = participants
            .into_iter()
            .filter_map(|(_, p)| p.redeem_code)
            .collect();

        for _ in 1..MAX_CODE_ATTEMPTS {
            if !taken.contains(&code) {
                return Ok(code);
            }
            code = generate_redeem_code();
        }

        if taken.contains(&code) {
            log::warn!("Redeem code {code} collides after {MAX_CODE_ATTEMPTS} attempts, keeping it");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::memory_store;
    use crate::store::testing::faulty_store;
    use crate::utils::{REDEEM_CODE_ALPHABET, REDEEM_CODE_LENGTH};

    fn service(store: &SharedStore, win_probability: f64) -> DrawService {
        DrawService::new(
            store.clone(),
            RaffleConfig {
                win_probability,
                ..RaffleConfig::default()
            },
        )
    }

    fn identity(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    async fn remaining(store: &SharedStore) -> Option<i64> {
        store
            .get(PRIZES_REMAINING_PATH)
            .await
            .unwrap()
            .and_then(|v| v.as_i64())
    }

    #[tokio::test]
    async fn test_first_draw_initializes_pool() {
        let store = memory_store();
        let result = service(&store, 0.0).draw(&identity("alice")).await.unwrap();

        assert!(!result.won);
        assert!(!result.already_played);
        assert_eq!(remaining(&store).await, Some(30));
    }

    #[tokio::test]
    async fn test_second_draw_is_already_played() {
        let store = memory_store();
        let draws = service(&store, 1.0);

        let first = draws.draw(&identity("alice")).await.unwrap();
        assert!(first.won);
        let code = first.redeem_code.clone().unwrap();
        assert_eq!(code.len(), REDEEM_CODE_LENGTH);
        assert!(code.bytes().all(|b| REDEEM_CODE_ALPHABET.contains(&b)));

        let second = draws.draw(&identity("alice")).await.unwrap();
        assert!(second.already_played);
        assert!(second.won);
        assert_eq!(second.redeemed, Some(false));
        assert_eq!(second.redeem_code, Some(code));
        assert_eq!(remaining(&store).await, Some(29));
    }

    #[tokio::test]
    async fn test_loser_second_draw() {
        let store = memory_store();
        let draws = service(&store, 0.0);

        draws.draw(&identity("bob")).await.unwrap();
        let second = draws.draw(&identity("bob")).await.unwrap();
        assert!(second.already_played);
        assert!(!second.won);
        assert_eq!(second.redeem_code, None);
    }

    #[tokio::test]
    async fn test_last_prize_then_exhausted() {
        let store = memory_store();
        store.set(PRIZES_REMAINING_PATH, json!(1)).await.unwrap();
        let draws = service(&store, 1.0);

        let a = draws.draw(&identity("a")).await.unwrap();
        assert!(a.won);
        assert_eq!(remaining(&store).await, Some(0));

        let b = draws.draw(&identity("b")).await.unwrap();
        assert!(!b.won);
        assert!(!b.already_played);
        assert_eq!(remaining(&store).await, Some(0));

        let stored = store.get("participants/b").await.unwrap().unwrap();
        assert_eq!(stored["wonPrize"], json!(false));
    }

    #[tokio::test]
    async fn test_admin_count_then_winning_draw() {
        let store = memory_store();
        store.set(PRIZES_REMAINING_PATH, json!(5)).await.unwrap();

        let result = service(&store, 1.0).draw(&identity("c")).await.unwrap();
        assert!(result.won);
        assert_eq!(remaining(&store).await, Some(4));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_draws_never_oversell() {
        let store = memory_store();
        store.set(PRIZES_REMAINING_PATH, json!(3)).await.unwrap();
        let draws = service(&store, 1.0);

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let draws = draws.clone();
                tokio::spawn(async move { draws.draw(&identity(&format!("user{i}"))).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().won {
                winners += 1;
            }
        }

        assert_eq!(winners, 3);
        assert_eq!(remaining(&store).await, Some(0));
    }

    #[tokio::test]
    async fn test_participant_lookup_failure_leaves_pool_untouched() {
        let (store, faults) = faulty_store();
        store.set(PRIZES_REMAINING_PATH, json!(5)).await.unwrap();
        faults.fail_loads("participants");

        let err = service(&store, 1.0).draw(&identity("dave")).await.unwrap_err();
        assert!(matches!(err, AppError::StoreError(_)));
        assert_eq!(remaining(&store).await, Some(5));
    }

    #[tokio::test]
    async fn test_failed_participant_write_returns_prize() {
        let (store, faults) = faulty_store();
        store.set(PRIZES_REMAINING_PATH, json!(5)).await.unwrap();
        let draws = service(&store, 1.0);
        faults.fail_writes("participants");

        let err = draws.draw(&identity("erin")).await.unwrap_err();
        assert!(matches!(err, AppError::StoreError(_)));
        assert_eq!(remaining(&store).await, Some(5));

        faults.heal();
        assert_eq!(store.get("participants/erin").await.unwrap(), None);

        // 未留下参与记录，可以重新抽奖
        let retry = draws.draw(&identity("erin")).await.unwrap();
        assert!(retry.won);
        assert!(!retry.already_played);
        assert_eq!(remaining(&store).await, Some(4));
    }

    #[tokio::test]
    async fn test_pool_failure_records_nothing() {
        let (store, faults) = faulty_store();
        faults.fail_writes("prizes");

        let err = service(&store, 1.0).draw(&identity("finn")).await.unwrap_err();
        assert!(matches!(err, AppError::StoreError(_)));

        faults.heal();
        assert_eq!(store.get("participants/finn").await.unwrap(), None);
        assert_eq!(remaining(&store).await, None);
    }
}
