mod common;

use common::{guard_with, MockResolver};
use proxy_guard::dns::{DnsCache, DnsError, ProxyUrlResolver};
use proxy_guard::observability::metrics::MetricsCollector;
use proxy_guard::{GuardConfig, ProxyGuard};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_warmup_then_first_request_hits() {
    let resolver = MockResolver::new();
    resolver.answer("registry.npmjs.org", "104.16.0.34");
    resolver.answer("registry.yarnpkg.com", "104.16.1.35");
    let guard = guard_with(resolver.clone());

    // Two default sets; an even seed picks the npm/yarn set.
    let report = guard.warmup("0x00000002").await.unwrap();
    assert_eq!(report.set_index, 0);
    assert!(report.is_complete());
    assert_eq!(resolver.calls(), 2);

    let stats = guard.dns_stats();
    assert_eq!((stats.size, stats.hits, stats.misses), (2, 0, 0));

    let url = guard
        .resolve_proxy_url("https://registry.npmjs.org/left-pad")
        .await
        .unwrap();
    assert_eq!(url, "https://104.16.0.34/left-pad");
    assert_eq!(resolver.calls(), 2);
    assert_eq!(guard.dns_stats().hits, 1);
}

#[tokio::test]
async fn test_warmup_failures_are_reported_not_cached() {
    let resolver = MockResolver::new();
    resolver.answer("github.com", "140.82.112.3");
    let guard = guard_with(resolver.clone());

    let report = guard.warmup("0x1").await.unwrap();
    assert_eq!(report.set_index, 1);
    assert_eq!(report.resolved, vec!["github.com".to_string()]);
    assert_eq!(report.failed, vec!["objects.githubusercontent.com".to_string()]);
    assert_eq!(guard.dns_stats().size, 1);
}

#[tokio::test]
async fn test_warmup_rejects_bad_seed() {
    let guard = guard_with(MockResolver::new());
    assert!(matches!(
        guard.warmup("registry").await,
        Err(DnsError::InvalidSeed(_))
    ));
}

#[tokio::test]
async fn test_entries_expire_after_ttl() {
    let mock = MockResolver::new();
    mock.answer("registry.example", "192.0.2.1");
    let resolver = ProxyUrlResolver::new(
        Arc::new(DnsCache::new(Duration::from_millis(50))),
        mock.clone(),
        Arc::new(MetricsCollector::new()),
        Duration::from_millis(500),
    );

    resolver.resolve("registry.example").await.unwrap();
    resolver.resolve("registry.example").await.unwrap();
    assert_eq!(mock.calls(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    mock.answer("registry.example", "192.0.2.2");

    let address = resolver.resolve("registry.example").await.unwrap();
    assert_eq!(address.to_string(), "192.0.2.2");
    assert_eq!(mock.calls(), 2);

    let stats = resolver.cache().stats();
    assert_eq!((stats.hits, stats.misses), (1, 2));
}

#[tokio::test]
async fn test_failed_lookup_retried_next_time() {
    let mock = MockResolver::new();
    let guard = guard_with(mock.clone());

    let err = guard
        .resolve_proxy_url("http://flaky.example/pkg")
        .await
        .unwrap_err();
    assert!(err.is_resolution_failure());
    assert_eq!(guard.dns_stats().size, 0);

    mock.answer("flaky.example", "198.51.100.9");
    assert_eq!(
        guard.resolve_proxy_url("http://flaky.example/pkg").await.unwrap(),
        "http://198.51.100.9/pkg"
    );
    assert_eq!(mock.calls(), 2);
    assert_eq!(guard.resolution_stats().total_failures, 1);
}

#[tokio::test]
async fn test_shutdown_clears_cache() {
    let mock = MockResolver::new();
    mock.answer("registry.example", "192.0.2.1");
    let guard = guard_with(mock);

    guard.resolve_proxy_url("http://registry.example/").await.unwrap();
    assert_eq!(guard.dns_stats().size, 1);

    guard.shutdown();
    guard.shutdown();
    assert!(guard.is_shut_down());
    assert_eq!(guard.dns_stats().size, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_converge() {
    let mock = MockResolver::new();
    mock.answer("registry.example", "192.0.2.1");
    let guard = Arc::new(guard_with(mock.clone()));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..64 {
        let guard = guard.clone();
        tasks.spawn(async move { guard.resolve_proxy_url("http://registry.example/pkg").await });
    }
    while let Some(joined) = tasks.join_next().await {
        assert_eq!(joined.unwrap().unwrap(), "http://192.0.2.1/pkg");
    }

    let stats = guard.dns_stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits + stats.misses, 64);
    assert_eq!(stats.misses as usize, mock.calls());
}

#[tokio::test]
async fn test_expired_hosts_do_not_accumulate() {
    let mock = MockResolver::new();
    let resolver = ProxyUrlResolver::new(
        Arc::new(DnsCache::with_sweep_threshold(Duration::from_millis(1), 32)),
        mock.clone(),
        Arc::new(MetricsCollector::new()),
        Duration::from_millis(500),
    );

    for i in 0..300 {
        let host = format!("pkg-{}.example", i);
        mock.answer(&host, "192.0.2.1");
        resolver.resolve(&host).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    for i in 0..400 {
        let host = format!("later-{}.example", i);
        mock.answer(&host, "192.0.2.2");
        resolver.resolve(&host).await.unwrap();
    }

    let cache = resolver.cache();
    assert!(cache.peek("pkg-0.example").is_none());
    assert!(cache.len() < 700, "cache kept {} entries", cache.len());
}

#[tokio::test]
async fn test_oversized_ttl_does_not_panic() {
    let mock = MockResolver::new();
    mock.answer("registry.example", "192.0.2.1");
    let mut config = GuardConfig::default();
    config.dns.ttl_secs = i64::MAX as u64;
    let guard = ProxyGuard::with_resolver(config, mock);

    assert_eq!(
        guard.resolve_proxy_url("http://registry.example/").await.unwrap(),
        "http://192.0.2.1/"
    );
    assert_eq!(guard.dns_stats().size, 1);
}
