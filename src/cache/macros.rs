/// Read-through caching around an async computation.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues the result for a background write with `$ttl` seconds to live, and
/// returns it. Errors from `$block` are propagated and never cached.
///
/// # Example
/// ```rust,ignore
/// let places: Vec<Candidate> = cached!(
///     self.cache,
///     CacheKey::PlaceSearch(keyword.to_string()),
///     PLACE_CACHE_TTL,
///     async move { fetch_places(keyword).await }
/// );
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
