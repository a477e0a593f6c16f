use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Returns the cached JSON for `key`, or runs `load` and caches its result.
/// Errors are not cached.
pub async fn cached_json<T, F, Fut>(
    cache: &moka::sync::Cache<String, Value>,
    key: &str,
    load: F,
) -> Result<Value, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if let Some(hit) = cache.get(key) {
        tracing::debug!(key, "response cache hit");
        return Ok(hit);
    }

    let value = serde_json::to_value(load().await?)?;
    cache.insert(key.to_string(), value.clone());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn cache() -> moka::sync::Cache<String, Value> {
        moka::sync::Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(60))
            .build()
    }

    #[tokio::test]
    async fn loads_once_per_key() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cached_json(&cache, "packages", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ApiError>(vec!["basic", "pro"])
            })
            .await
            .unwrap();
            assert_eq!(value, serde_json::json!(["basic", "pro"]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = cache();
        let failed = cached_json(&cache, "reviews", || async {
            Err::<Vec<i32>, _>(ApiError::internal("db down"))
        })
        .await;
        assert!(failed.is_err());
        assert!(cache.get("reviews").is_none());

        let value = cached_json(&cache, "reviews", || async { Ok::<_, ApiError>(7) })
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!(7));
    }
}
