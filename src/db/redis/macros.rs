/// Read-through caching around an async computation.
///
/// Returns the cached value when `$cache` is `Some` and holds `$key`.
/// Otherwise awaits `$block`, queues the result for storage with `$ttl`
/// seconds and returns it. A failed cache read is logged and treated as a
/// miss, so the cache can never fail a request.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`; `None` disables caching.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: a future resolving to `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let response = cached!(state.cache.as_ref(), key, ttl, async move {
///     compute_response()
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: Option<&$crate::db::Cache> = $cache;
        let hit = match cache {
            Some(cache) => match cache.get_from_cache(&$key).await {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::warn!(key = %$key, error = %e, "Cache read failed, computing value");
                    None
                }
            },
            None => None,
        };

        match hit {
            Some(value) => Ok(value),
            None => match $block.await {
                Ok(value) => {
                    if let Some(cache) = cache {
                        cache.set_in_background(&$key, &value, $ttl);
                    }
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
