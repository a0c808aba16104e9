use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::CacheError, schema::IngredientHint};

// Caching - keys

/// Rotated whenever the ingredient table changes. Entries stored under an older value are stale.
pub const INGREDIENT_BIND_KEY: &str = "ingredient-cache-key";

pub fn ingredient_search_key(prefix: &str) -> String {
    format!("ingredient-search-{prefix}")
}

// Cache - wrappers

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone, Debug, PartialEq)]
pub struct CachedIngredients {
    pub rows: Vec<IngredientHint>,
    bind: Option<String>,
}

impl CachedIngredients {
    pub fn new(rows: Vec<IngredientHint>, bind: Option<String>) -> Self {
        Self { rows, bind }
    }

    pub fn is_current(&self, bind: &Option<String>) -> bool {
        &self.bind == bind
    }
}

/// Ingredient prefix lookup through the cache. `callback` runs on a miss or a stale entry.
pub async fn get_or_search<F, Fut>(
    prefix: &str,
    cache: &mut MultiplexedConnection,
    callback: F,
) -> Result<Vec<IngredientHint>, potion::Error>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<Vec<IngredientHint>, potion::Error>> + Send,
{
    let key = ingredient_search_key(prefix);
    let bind = get_cache_value::<&str, String>(INGREDIENT_BIND_KEY, cache).await?;

    let value = get_cache_value::<&str, CachedIngredients>(&key, cache)
        .await
        .unwrap_or_else(|_| {
            let mut c = cache.clone();
            let k = key.to_owned();
            tokio::spawn(async move {
                log::error!("> Failed to deserialize cached value. Deleting {}", &k);
                if let Err(e) = delete_cache_value(k, &mut c).await {
                    log::error!("> Failed to delete cached value! {e:?}");
                }
            });
            None
        });

    match value {
        Some(value) if value.is_current(&bind) => {
            log::trace!("> Found {key}");
            Ok(value.rows)
        }
        stale => {
            if stale.is_some() {
                log::trace!("> Invalidated {key}");
            }
            log::trace!("> Fetching {key}");

            let rows = callback().await?;
            let value = CachedIngredients::new(rows, bind);
            if let Err(e) = set_cache_value(&key, value.clone(), cache).await {
                log::error!("{e:?}");
            }

            Ok(value.rows)
        }
    }
}

/// Makes every cached ingredient lookup stale.
pub async fn invalidate_ingredient_cache(
    cache: &mut MultiplexedConnection,
) -> Result<(), potion::Error> {
    let bind = Uuid::new_v4().simple().to_string();
    set_cache_value(INGREDIENT_BIND_KEY, bind, cache).await?;

    log::debug!("> Rotated {INGREDIENT_BIND_KEY}");
    Ok(())
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), potion::Error> {
    let _: () = cache.set(key, value).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), potion::Error> {
    let _: () = cache.del(key).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, potion::Error> {
    let value: Option<V> = cache.get(key).await.map_err(CacheError::from)?;

    Ok(value)
}
