////////////////////////////////////////////////////////////////////////
//
// 会话缓存: key -> 序列化后的 JSON 记录, 可选过期时间
// 配置了 REDIS_URL 时使用 Redis, 否则退化为进程内存
//
//////////////////////////////////////////////////////////////////////

pub mod memory;
pub mod redis_cache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::info;
use utils::AppResult;

pub use memory::{MemorySessionCache, PURGE_INTERVAL};
pub use redis_cache::RedisSessionCache;

pub type DynSessionCache = Arc<dyn SessionCacheTrait + Send + Sync>;

#[async_trait]
pub trait SessionCacheTrait {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// `ttl` 为 None 时永不过期
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// 读取并反序列化缓存记录
pub async fn get_json<T>(cache: &DynSessionCache, key: &str) -> AppResult<Option<T>>
where
    T: DeserializeOwned,
{
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// 序列化并写入缓存记录
pub async fn set_json<T>(cache: &DynSessionCache, key: &str, value: &T, ttl: Option<Duration>) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}

/// Redis 优先, 未配置时使用内存缓存
pub async fn connect(redis_url: Option<&str>) -> AppResult<DynSessionCache> {
    match redis_url {
        Some(url) if !url.trim().is_empty() => {
            let cache = RedisSessionCache::connect(url).await?;
            info!("🧰 session cache: redis");
            Ok(Arc::new(cache))
        }
        _ => {
            info!("🧰 session cache: in-memory (REDIS_URL not set)");
            let cache = MemorySessionCache::new();
            cache.start_purge(PURGE_INTERVAL);
            Ok(Arc::new(cache))
        }
    }
}
