use super::SessionCacheTrait;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::debug;
use utils::AppResult;

/// 后台清理周期
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

type MemoryStore = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// 清理所有已过期条目, 返回清理数量
async fn purge(store: &RwLock<HashMap<String, CacheEntry>>) -> usize {
    let now = Instant::now();
    let mut store = store.write().await;
    let before = store.len();
    store.retain(|_, entry| !entry.is_expired(now));
    before - store.len()
}

/// 进程内缓存，过期条目在读取时惰性删除, 其余由 `start_purge` 定期清理
#[derive(Clone, Default)]
pub struct MemorySessionCache {
    store: MemoryStore,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动定期清理任务, 缓存被释放后任务自行退出
    pub fn start_purge(&self, period: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(&self.store);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };

                let purged = purge(&store).await;
                if purged > 0 {
                    debug!("🧹 purged {} expired cache entries", purged);
                }
            }
        })
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl SessionCacheTrait for MemorySessionCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // 已过期
        let mut store = self.store.write().await;
        if store.get(key).map(|entry| entry.is_expired(now)).unwrap_or(false) {
            store.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> AppResult<()> {
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.store.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.write().await.remove(key);
        Ok(())
    }
}
