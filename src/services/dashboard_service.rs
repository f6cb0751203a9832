use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::AppResult;
use crate::models::{
    DashboardView, PARTICIPANTS_PATH, PRIZES_REMAINING_PATH, Participant, SUBMISSIONS_PATH,
    Submission, decode_children, pool_remaining,
};
use crate::store::{ChangeCallback, ListenerId, SharedStore};

pub type DashboardCallback = Arc<dyn Fn(DashboardView) + Send + Sync>;

/// 三个子树各自最近一次的快照; 外层 None 表示尚未收到首次回调
#[derive(Default)]
struct CachedSnapshots {
    submissions: Option<Option<Value>>,
    participants: Option<Option<Value>>,
    prizes: Option<Option<Value>>,
}

#[derive(Clone, Copy)]
enum Source {
    Submissions,
    Participants,
    Prizes,
}

impl Source {
    fn path(self) -> &'static str {
        match self {
            Source::Submissions => SUBMISSIONS_PATH,
            Source::Participants => PARTICIPANTS_PATH,
            Source::Prizes => PRIZES_REMAINING_PATH,
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    store: SharedStore,
    initial_prizes: i64,
}

impl DashboardService {
    pub fn new(store: SharedStore, initial_prizes: i64) -> Self {
        Self {
            store,
            initial_prizes,
        }
    }

    /// 一次性读取三个子树并合成视图
    pub async fn get_dashboard(&self) -> AppResult<DashboardView> {
        let (submissions, participants, prizes) = tokio::try_join!(
            self.store.get(SUBMISSIONS_PATH),
            self.store.get(PARTICIPANTS_PATH),
            self.store.get(PRIZES_REMAINING_PATH),
        )?;

        Ok(build_view(submissions, participants, prizes.as_ref(), self.initial_prizes))
    }

    /// 实时订阅: 任一子树变化时用缓存的最新快照整体重算并回调。
    /// 三个监听都完成首次回调之前不会推送不完整的视图。
    /// 回调在内部锁内执行，不应在其中同步写入存储。
    pub async fn subscribe(&self, on_view: DashboardCallback) -> AppResult<DashboardSubscription> {
        let cache = Arc::new(Mutex::new(CachedSnapshots::default()));
        let mut subscription = DashboardSubscription {
            store: self.store.clone(),
            ids: Vec::with_capacity(3),
        };

        for source in [Source::Submissions, Source::Participants, Source::Prizes] {
            let callback = self.listener(source, cache.clone(), on_view.clone());
            // 失败时 subscription 被丢弃，已注册的监听随之注销
            let id = self.store.subscribe(source.path(), callback).await?;
            subscription.ids.push(id);
        }

        log::debug!("Dashboard subscription opened ({} listeners)", subscription.ids.len());
        Ok(subscription)
    }

    fn listener(
        &self,
        source: Source,
        cache: Arc<Mutex<CachedSnapshots>>,
        on_view: DashboardCallback,
    ) -> ChangeCallback {
        let initial_prizes = self.initial_prizes;

        Arc::new(move |value: Option<Value>| {
            let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match source {
                Source::Submissions => cache.submissions = Some(value),
                Source::Participants => cache.participants = Some(value),
                Source::Prizes => cache.prizes = Some(value),
            }

            if let (Some(submissions), Some(participants), Some(prizes)) =
                (&cache.submissions, &cache.participants, &cache.prizes)
            {
                let view = build_view(
                    submissions.clone(),
                    participants.clone(),
                    prizes.as_ref(),
                    initial_prizes,
                );
                on_view(view);
            }
        })
    }
}

fn build_view(
    submissions: Option<Value>,
    participants: Option<Value>,
    prizes: Option<&Value>,
    initial_prizes: i64,
) -> DashboardView {
    DashboardView::build(
        decode_children::<Submission>(submissions, "submission"),
        decode_children::<Participant>(participants, "participant"),
        pool_remaining(prizes, initial_prizes),
    )
}

/// 仪表盘订阅句柄: `close` 或 drop 时注销全部监听
pub struct DashboardSubscription {
    store: SharedStore,
    ids: Vec<ListenerId>,
}

impl DashboardSubscription {
    pub fn close(&mut self) {
        for id in self.ids.drain(..) {
            self.store.unsubscribe(id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Drop for DashboardSubscription {
    fn drop(&mut self) {
        if !self.is_closed() {
            log::debug!("Dashboard subscription closed");
        }
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory_store;
    use serde_json::json;

    fn collector() -> (DashboardCallback, Arc<Mutex<Vec<DashboardView>>>) {
        let views = Arc::new(Mutex::new(Vec::new()));
        let sink = views.clone();
        let callback: DashboardCallback = Arc::new(move |view| sink.lock().unwrap().push(view));
        (callback, views)
    }

    async fn submit(store: &SharedStore, id: &str, user: &str, ts: &str) {
        store
            .set(
                &format!("submissions/{id}"),
                json!({"name": user, "email": format!("{user}@example.com"), "userId": user, "timestamp": ts}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_dashboard_joins_and_defaults_pool() {
        let store = memory_store();
        submit(&store, "s1", "ana", "2025-08-01T12:00:00Z").await;
        submit(&store, "s2", "bia", "2025-08-01T12:05:00Z").await;
        store
            .set(
                "participants/ana",
                json!({"playedAt": "2025-08-01T12:01:00Z", "wonPrize": true, "redeemCode": "AB2C", "redeemed": false}),
            )
            .await
            .unwrap();

        let view = DashboardService::new(store, 30).get_dashboard().await.unwrap();
        assert_eq!(view.remaining_prizes, 30);
        assert_eq!(view.submissions.len(), 2);
        assert_eq!(view.submissions[0].id, "s2");
        assert!(!view.submissions[0].won_prize);
        assert_eq!(view.submissions[0].redeem_code, None);
        assert_eq!(view.submissions[1].redeem_code.as_deref(), Some("AB2C"));
    }

    #[tokio::test]
    async fn test_subscription_emits_complete_views() {
        let store = memory_store();
        store.set(PRIZES_REMAINING_PATH, json!(10)).await.unwrap();
        let service = DashboardService::new(store.clone(), 30);
        let (callback, views) = collector();

        let subscription = service.subscribe(callback).await.unwrap();
        assert_eq!(store.listener_count(), 3);
        {
            let views = views.lock().unwrap();
            assert_eq!(views.len(), 1);
            assert_eq!(views[0].remaining_prizes, 10);
        }

        submit(&store, "s1", "ana", "2025-08-01T12:00:00Z").await;
        store.set(PRIZES_REMAINING_PATH, json!(9)).await.unwrap();
        {
            let views = views.lock().unwrap();
            assert_eq!(views.len(), 3);
            let last = views.last().unwrap();
            assert_eq!(last.submissions.len(), 1);
            assert_eq!(last.remaining_prizes, 9);
        }

        drop(subscription);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_close_detaches_all_listeners() {
        let store = memory_store();
        let service = DashboardService::new(store.clone(), 30);
        let (callback, views) = collector();

        let mut subscription = service.subscribe(callback).await.unwrap();
        subscription.close();
        assert!(subscription.is_closed());
        assert_eq!(store.listener_count(), 0);

        submit(&store, "s1", "ana", "2025-08-01T12:00:00Z").await;
        assert_eq!(views.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscription_shows_initial_count_for_absent_pool() {
        let store = memory_store();
        let service = DashboardService::new(store.clone(), 30);
        let (callback, views) = collector();

        let _subscription = service.subscribe(callback).await.unwrap();
        assert_eq!(views.lock().unwrap().last().unwrap().remaining_prizes, 30);

        store.set(PRIZES_REMAINING_PATH, json!(7)).await.unwrap();
        assert_eq!(views.lock().unwrap().last().unwrap().remaining_prizes, 7);

        // 删除奖池节点后回到初始数量
        store.set(PRIZES_REMAINING_PATH, Value::Null).await.unwrap();
        let views = views.lock().unwrap();
        assert_eq!(views.len(), 3);
        assert_eq!(views.last().unwrap().remaining_prizes, 30);
    }
}
