use serde_json::{Value, json};

use crate::config::{AdminConfig, RaffleConfig};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminLoginResponse, PARTICIPANTS_PATH, PRIZES_REMAINING_PATH, PrizeCountResponse,
    SUBMISSIONS_PATH,
};
use crate::store::SharedStore;
use crate::utils::{JwtService, verify_password};

#[derive(Clone)]
pub struct AdminService {
    store: SharedStore,
    jwt_service: JwtService,
    password_hash: String,
    purge_confirmation: String,
}

impl AdminService {
    pub fn new(
        store: SharedStore,
        jwt_service: JwtService,
        admin: &AdminConfig,
        raffle: &RaffleConfig,
    ) -> Self {
        Self {
            store,
            jwt_service,
            password_hash: admin.password_hash.clone(),
            purge_confirmation: raffle.purge_confirmation.clone(),
        }
    }

    /// 管理员共享密码登录
    pub fn login(&self, password: &str) -> AppResult<AdminLoginResponse> {
        if !verify_password(password, &self.password_hash)? {
            log::warn!("Admin login rejected");
            return Err(AppError::AuthError("Invalid admin password".to_string()));
        }

        let token = self.jwt_service.generate_admin_token()?;
        log::info!("Admin logged in");
        Ok(AdminLoginResponse {
            token,
            expires_in: self.jwt_service.get_admin_expires_in(),
        })
    }

    /// 直接覆盖奖池数量 (不经过事务)
    pub async fn set_prize_count(&self, remaining: i64) -> AppResult<PrizeCountResponse> {
        if remaining < 0 {
            return Err(AppError::ValidationError(
                "Prize count must not be negative".to_string(),
            ));
        }

        self.store.set(PRIZES_REMAINING_PATH, json!(remaining)).await?;
        log::info!("Prize pool set to {remaining}");
        Ok(PrizeCountResponse { remaining })
    }

    /// 删除全部提交与参与记录，奖池保持不变
    pub async fn purge_all_data(&self, confirm: &str) -> AppResult<()> {
        if confirm.trim() != self.purge_confirmation {
            return Err(AppError::ValidationError(format!(
                "Type {} to confirm the purge",
                self.purge_confirmation
            )));
        }

        self.store.set(SUBMISSIONS_PATH, Value::Null).await?;
        self.store.set(PARTICIPANTS_PATH, Value::Null).await?;
        log::warn!("All submissions and participants were purged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DashboardService;
    use crate::store::memory_store;

    fn service(store: &SharedStore) -> AdminService {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        AdminService::new(
            store.clone(),
            JwtService::new("secret", 3600, 600),
            &AdminConfig {
                password_hash: hash,
            },
            &RaffleConfig::default(),
        )
    }

    #[test]
    fn test_login() {
        let admin = service(&memory_store());
        let resp = admin.login("hunter2").unwrap();
        assert_eq!(resp.expires_in, 600);
        assert!(matches!(admin.login("wrong"), Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_set_prize_count() {
        let store = memory_store();
        let admin = service(&store);

        admin.set_prize_count(5).await.unwrap();
        assert_eq!(store.get(PRIZES_REMAINING_PATH).await.unwrap(), Some(json!(5)));
        assert!(matches!(
            admin.set_prize_count(-1).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_keeps_pool() {
        let store = memory_store();
        let admin = service(&store);
        store.set(PRIZES_REMAINING_PATH, json!(12)).await.unwrap();
        store
            .set(
                "submissions/s1",
                json!({"name": "Ana", "email": "ana@example.com", "userId": "u1", "timestamp": "2025-08-01T12:00:00Z"}),
            )
            .await
            .unwrap();
        store
            .set("participants/u1", json!({"playedAt": "2025-08-01T12:00:00Z", "wonPrize": false}))
            .await
            .unwrap();

        assert!(matches!(
            admin.purge_all_data("yes").await,
            Err(AppError::ValidationError(_))
        ));
        admin.purge_all_data("LIMPAR").await.unwrap();

        let view = DashboardService::new(store.clone(), 30).get_dashboard().await.unwrap();
        assert!(view.submissions.is_empty());
        assert_eq!(view.remaining_prizes, 12);
        assert_eq!(store.get(PARTICIPANTS_PATH).await.unwrap(), None);
    }
}
