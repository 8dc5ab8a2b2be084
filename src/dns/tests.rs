// DNS engine tests.
//
// Every test runs against a `MockClient`, so no network access is needed.

use super::*;
use crate::config::EngineConfig;
use crate::error_handling::{EngineError, QueryError, StatKind};
use futures::StreamExt;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Builds mock zone data from `(host, type, values)` triples.
fn zone(entries: &[(&str, &str, &[&str])]) -> MockData {
    let mut data = MockData::new();
    for (host, rdtype, values) in entries {
        data.entry(host.to_string())
            .or_insert_with(HashMap::new)
            .insert(
                rdtype.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            );
    }
    data
}

fn engine_with(config: EngineConfig, client: MockClient) -> (DnsEngine, Arc<MockClient>) {
    let client = Arc::new(client);
    (DnsEngine::new(config, client.clone()), client)
}

fn mock_engine(entries: &[(&str, &str, &[&str])]) -> (DnsEngine, Arc<MockClient>) {
    engine_with(
        EngineConfig::default(),
        MockClient::new(zone(entries)).unwrap(),
    )
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

const GITHUB_IO: &[(&str, &str, &[&str])] = &[("*.github.io", "A", &["185.199.108.153"])];

#[tokio::test]
async fn test_resolve_populates_cache() {
    let (engine, _) = mock_engine(&[("one.one.one.one", "A", &["1.1.1.1"])]);
    let key = cache_key("one.one.one.one", RecordType::A);

    let ips = engine
        .resolve("one.one.one.one", RecordTypeSelector::Default)
        .await
        .unwrap();
    assert!(ips.contains("1.1.1.1"));
    assert!(engine.record_cache().contains(key));

    engine.clear_caches();
    assert!(!engine.record_cache().contains(key));
    engine
        .resolve_with(
            "one.one.one.one",
            RecordType::A.into(),
            ResolveOptions::no_cache(),
        )
        .await
        .unwrap();
    assert!(!engine.record_cache().contains(key));
}

#[tokio::test]
async fn test_cache_hit_skips_client() {
    let (engine, client) = mock_engine(&[("one.one.one.one", "A", &["1.1.1.1"])]);
    engine.resolve("one.one.one.one", RecordType::A.into()).await.unwrap();
    engine.resolve("One.One.One.One.", RecordType::A.into()).await.unwrap();
    assert_eq!(client.queries(), 1);
    assert_eq!(engine.stats().get(StatKind::CacheHit), 1);
    assert_eq!(engine.stats().get(StatKind::CacheMiss), 1);
}

#[tokio::test]
async fn test_empty_answers_are_not_cache_hits() {
    let (engine, client) = mock_engine(&[]);
    engine.resolve("nothing.evilcorp.com", Default::default()).await.unwrap();
    engine.resolve("nothing.evilcorp.com", Default::default()).await.unwrap();
    assert_eq!(client.queries(), 2);
    assert_eq!(engine.stats().get(StatKind::CacheHit), 0);
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let (engine, _) = mock_engine(&[]);
    let result = engine.resolve("  ", Default::default()).await;
    assert!(matches!(result, Err(EngineError::InvalidQuery(_))));
}

#[tokio::test]
async fn test_type_isolation() {
    let (engine, _) = mock_engine(&[
        ("dual.evilcorp.com", "A", &["1.2.3.4"]),
        ("dual.evilcorp.com", "AAAA", &["dead::beef"]),
    ]);
    let a = engine.resolve("dual.evilcorp.com", RecordType::A.into()).await.unwrap();
    let aaaa = engine
        .resolve("dual.evilcorp.com", RecordType::AAAA.into())
        .await
        .unwrap();
    assert_eq!(a, set(&["1.2.3.4"]));
    assert_eq!(aaaa, set(&["dead::beef"]));
}

#[tokio::test]
async fn test_resolve_all_types() {
    let (engine, _) = mock_engine(&[
        ("evilcorp.com", "A", &["1.2.3.4"]),
        ("evilcorp.com", "MX", &["10 Mail.Evilcorp.com."]),
        ("evilcorp.com", "NS", &["ns1.evilcorp.com."]),
    ]);
    let values = engine
        .resolve("evilcorp.com", "any".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(values, set(&["1.2.3.4", "mail.evilcorp.com", "ns1.evilcorp.com"]));
}

#[tokio::test]
async fn test_reverse_lookup() {
    let (engine, _) = mock_engine(&[("1.1.1.1", "PTR", &["one.one.one.one."])]);
    let names = engine.resolve("1.1.1.1", RecordType::A.into()).await.unwrap();
    assert_eq!(names, set(&["one.one.one.one"]));
    assert!(engine
        .record_cache()
        .contains(cache_key("1.1.1.1", RecordType::PTR)));
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let client = MockClient::default().fail_with("slow.evilcorp.com", QueryError::Timeout);
    let config = EngineConfig {
        dns_retries: 2,
        ..Default::default()
    };
    let (engine, client) = engine_with(config, client);
    let raw = engine
        .resolve_raw("slow.evilcorp.com", Default::default(), ResolveOptions::default())
        .await
        .unwrap();
    assert!(!raw.has_answers());
    assert_eq!(raw.errors.len(), 3);
    assert_eq!(client.queries(), 3);
    assert_eq!(engine.stats().get(StatKind::Timeout), 3);
}

#[tokio::test]
async fn test_retry_override_is_honored() {
    let client = MockClient::default().fail_with("slow.evilcorp.com", QueryError::Timeout);
    let config = EngineConfig {
        dns_retries: 0,
        ..Default::default()
    };
    let (engine, client) = engine_with(config, client);
    let options = ResolveOptions {
        use_cache: true,
        retries: Some(3),
    };
    let raw = engine
        .resolve_raw("slow.evilcorp.com", Default::default(), options)
        .await
        .unwrap();
    assert_eq!(raw.errors.len(), 4);
    assert_eq!(client.queries(), 4);
}

#[tokio::test]
async fn test_breaker_stops_pending_retries() {
    let client = MockClient::default().fail_with("dead.com", QueryError::Timeout);
    let config = EngineConfig {
        dns_abort_threshold: 2,
        dns_retries: 5,
        ..Default::default()
    };
    let (engine, client) = engine_with(config, client);
    let raw = engine
        .resolve_raw("www.dead.com", Default::default(), ResolveOptions::default())
        .await
        .unwrap();
    // Two failed attempts trip the breaker, the connectivity check finds nothing
    assert_eq!(raw.errors.len(), 2);
    assert_eq!(client.queries(), 3);
    assert_eq!(engine.stats().get(StatKind::Aborted), 1);
}

#[tokio::test]
async fn test_oversized_timeout_does_not_panic() {
    let config = EngineConfig {
        dns_timeout: 1e30,
        ..Default::default()
    };
    let client = MockClient::new(zone(&[("one.one.one.one", "A", &["1.1.1.1"])])).unwrap();
    let (engine, _) = engine_with(config, client);
    let ips = engine.resolve("one.one.one.one", Default::default()).await.unwrap();
    assert_eq!(ips, set(&["1.1.1.1"]));
}

#[tokio::test]
async fn test_no_nameservers_is_not_retried() {
    let client = MockClient::default().fail_with(
        "broken.evilcorp.com",
        QueryError::NoNameservers("SERVFAIL".into()),
    );
    let (engine, client) = engine_with(EngineConfig::default(), client);
    let raw = engine
        .resolve_raw("broken.evilcorp.com", Default::default(), ResolveOptions::default())
        .await
        .unwrap();
    assert_eq!(raw.errors.len(), 1);
    assert_eq!(client.queries(), 1);
}

#[tokio::test]
async fn test_protocol_error_is_soft() {
    let client = MockClient::default()
        .fail_with("weird.evilcorp.com", QueryError::Protocol("truncated".into()));
    let (engine, client) = engine_with(EngineConfig::default(), client);
    let raw = engine
        .resolve_raw("weird.evilcorp.com", Default::default(), ResolveOptions::default())
        .await
        .unwrap();
    assert!(!raw.has_answers());
    assert!(raw.errors.is_empty());
    assert_eq!(client.queries(), 1);
    assert_eq!(engine.stats().get(StatKind::ProtocolError), 1);
}

#[tokio::test]
async fn test_omitted_queries_are_skipped() {
    let config = EngineConfig {
        dns_omit_queries: vec!["MX:evilcorp.com".to_string()],
        ..Default::default()
    };
    let client = MockClient::new(zone(&[("evilcorp.com", "MX", &["10 mail.evilcorp.com"])])).unwrap();
    let (engine, client) = engine_with(config, client);
    let values = engine.resolve("evilcorp.com", RecordType::MX.into()).await.unwrap();
    assert!(values.is_empty());
    assert_eq!(client.queries(), 0);
    assert_eq!(engine.stats().get(StatKind::Omitted), 1);
}

#[tokio::test]
async fn test_circuit_breaker_aborts_after_threshold() {
    let client = MockClient::new(zone(&[("www.evilcorp.com", "A", &["1.2.3.4"])]))
        .unwrap()
        .fail_with("dead.com", QueryError::Timeout);
    let config = EngineConfig {
        dns_abort_threshold: 3,
        dns_retries: 0,
        ..Default::default()
    };
    let (engine, client) = engine_with(config, client);

    // A recent success elsewhere means DNS itself works
    engine.resolve("www.evilcorp.com", Default::default()).await.unwrap();
    for i in 0..3 {
        engine
            .resolve(&format!("host{i}.dead.com"), Default::default())
            .await
            .unwrap();
    }
    let before = client.queries();
    let values = engine.resolve("host9.dead.com", Default::default()).await.unwrap();
    assert!(values.is_empty());
    assert_eq!(client.queries(), before);
    assert_eq!(engine.stats().get(StatKind::Aborted), 1);

    // Other parents are unaffected
    let values = engine
        .resolve("www.evilcorp.com", RecordType::A.into())
        .await
        .unwrap();
    assert_eq!(values, set(&["1.2.3.4"]));
}

#[tokio::test]
async fn test_connectivity_check_resets_breaker() {
    let client = MockClient::new(zone(&[("www.google.com", "A", &["142.250.0.1"])]))
        .unwrap()
        .fail_with("dead.com", QueryError::Timeout);
    let config = EngineConfig {
        dns_abort_threshold: 2,
        dns_retries: 0,
        ..Default::default()
    };
    let (engine, client) = engine_with(config, client);
    for i in 0..2 {
        engine
            .resolve(&format!("host{i}.dead.com"), Default::default())
            .await
            .unwrap();
    }
    let key = ErrorTracker::error_key("dead.com", RecordType::A);
    assert!(engine.error_tracker().should_abort(key));

    // No success yet, so the breaker checks connectivity, the check succeeds and the query goes through
    engine.resolve("host2.dead.com", Default::default()).await.unwrap();
    assert_eq!(client.queries(), 4);
    assert_eq!(engine.error_tracker().error_count(key), 1);
    assert_eq!(engine.stats().get(StatKind::Aborted), 0);
}

#[tokio::test]
async fn test_breaker_aborts_when_offline() {
    let client = MockClient::default().fail_with("com", QueryError::Timeout);
    let config = EngineConfig {
        dns_abort_threshold: 1,
        dns_retries: 0,
        ..Default::default()
    };
    let (engine, client) = engine_with(config, client);
    engine.resolve("a.dead.com", Default::default()).await.unwrap();
    engine.resolve("b.dead.com", Default::default()).await.unwrap();
    // One failed query, one failed connectivity check, no second query
    assert_eq!(client.queries(), 2);
    assert_eq!(engine.stats().get(StatKind::Aborted), 1);
    assert!(!engine.connectivity_check().await);
}

#[tokio::test]
async fn test_resolve_batch_yields_every_query() {
    let entries: Vec<(String, String)> = (0..25)
        .map(|i| (format!("host{i}.evilcorp.com"), format!("10.0.0.{i}")))
        .collect();
    let mut data = MockData::new();
    for (host, ip) in &entries {
        data.insert(
            host.clone(),
            HashMap::from([("A".to_string(), vec![ip.clone()])]),
        );
    }
    let (engine, _) = engine_with(EngineConfig::default(), MockClient::new(data).unwrap());

    let queries: Vec<String> = entries.iter().map(|(h, _)| h.clone()).collect();
    let results: BTreeMap<String, BTreeSet<String>> = engine
        .resolve_batch(queries, Default::default())
        .collect()
        .await;
    assert_eq!(results.len(), 25);
    for (host, ip) in &entries {
        assert_eq!(results[host], set(&[ip.as_str()]));
    }
}

#[tokio::test]
async fn test_resolve_batch_skips_empty_results() {
    let (engine, _) = mock_engine(&[("www.evilcorp.com", "A", &["1.2.3.4"])]);
    let results: Vec<_> = engine
        .resolve_batch(
            vec!["www.evilcorp.com".to_string(), "nope.evilcorp.com".to_string()],
            Default::default(),
        )
        .collect()
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "www.evilcorp.com");
}

#[tokio::test]
async fn test_resolve_raw_batch_reports_errors() {
    let client = MockClient::new(zone(&[("evilcorp.com", "MX", &["10 mail.evilcorp.com."])]))
        .unwrap()
        .fail_with("down.evilcorp.com", QueryError::NoNameservers("REFUSED".into()));
    let (engine, _) = engine_with(EngineConfig::default(), client);
    let results: HashMap<Query, ExtractedResolution> = engine
        .resolve_raw_batch(vec![
            Query::new("evilcorp.com", RecordType::MX),
            Query::new("down.evilcorp.com", RecordType::A),
            Query::new("empty.evilcorp.com", RecordType::A),
        ])
        .collect()
        .await;
    assert_eq!(results.len(), 2);
    let mx = &results[&Query::new("evilcorp.com", RecordType::MX)];
    assert!(mx
        .targets
        .contains(&(RecordType::MX, "mail.evilcorp.com".to_string())));
    let down = &results[&Query::new("down.evilcorp.com", RecordType::A)];
    assert!(down.targets.is_empty());
    assert_eq!(down.errors.len(), 1);
}

#[tokio::test]
async fn test_txt_targets_extracted() {
    let (engine, _) = mock_engine(&[(
        "evilcorp.com",
        "TXT",
        &["\"v=spf1 include:spf.protection.outlook.com include:mail.evilcorp.com -all\""],
    )]);
    let values = engine.resolve("evilcorp.com", RecordType::TXT.into()).await.unwrap();
    assert_eq!(
        values,
        set(&["spf.protection.outlook.com", "mail.evilcorp.com"])
    );
}

#[tokio::test]
async fn test_is_wildcard_domain_queries_once() {
    let (engine, client) = mock_engine(GITHUB_IO);
    let first = engine.is_wildcard_domain("github.io", false).await;
    assert_eq!(first["github.io"][&RecordType::A], set(&["185.199.108.153"]));
    let sent = client.queries();
    assert_eq!(sent, crate::config::ALL_RECORD_TYPES.len() * 5);
    assert_eq!(engine.stats().get(StatKind::WildcardProbe), sent);

    let second = engine.is_wildcard_domain("github.io", false).await;
    assert_eq!(first, second);
    assert_eq!(client.queries(), sent);
    assert_eq!(engine.host_locks().len(), 0);
}

#[tokio::test]
async fn test_is_wildcard_domain_concurrent_callers_query_once() {
    let (engine, client) = mock_engine(GITHUB_IO);
    let (a, b) = tokio::join!(
        engine.is_wildcard_domain("github.io", false),
        engine.is_wildcard_domain("github.io", false)
    );
    assert_eq!(a, b);
    assert_eq!(client.queries(), crate::config::ALL_RECORD_TYPES.len() * 5);
}

#[tokio::test]
async fn test_is_wildcard_domain_walks_parents() {
    let (engine, _) = mock_engine(GITHUB_IO);
    let results = engine.is_wildcard_domain("www.blacklanternsecurity.github.io", false).await;
    let hosts: Vec<&String> = results.keys().collect();
    assert_eq!(
        hosts,
        vec![
            "blacklanternsecurity.github.io",
            "github.io",
            "www.blacklanternsecurity.github.io"
        ]
    );
    // Types confirmed at github.io are not checked again deeper down
    assert!(results["blacklanternsecurity.github.io"].is_empty());
    assert!(!results["github.io"].is_empty());
}

#[tokio::test]
async fn test_is_wildcard_domain_rejects_invalid_and_ignored() {
    let config = EngineConfig {
        dns_wildcard_ignore: vec!["github.io".to_string()],
        ..Default::default()
    };
    let (engine, client) = engine_with(config, MockClient::new(zone(GITHUB_IO)).unwrap());
    assert!(engine.is_wildcard_domain("sub.github.io", false).await.is_empty());
    assert!(engine.is_wildcard_domain("not a domain", false).await.is_empty());
    assert!(engine.is_wildcard_domain("1.2.3.4", false).await.is_empty());
    assert_eq!(client.queries(), 0);
}

#[tokio::test]
async fn test_is_wildcard_attributes_shallow_parent() {
    let (engine, _) = mock_engine(GITHUB_IO);
    let result = engine
        .is_wildcard("sub.sub.sub.github.io", None, None)
        .await
        .unwrap();
    assert_eq!(
        result[&RecordType::A],
        WildcardStatus {
            is_wildcard: Some(true),
            parent: "github.io".to_string()
        }
    );
    assert!(engine.wildcard_cache().contains(host_key("github.io")));
    assert!(!engine.wildcard_cache().contains(host_key("sub.github.io")));
    assert!(!engine.wildcard_cache().contains(host_key("sub.sub.github.io")));
}

#[tokio::test]
async fn test_is_wildcard_real_record() {
    let (engine, _) = mock_engine(&[("www.evilcorp.com", "A", &["1.2.3.4"])]);
    let result = engine.is_wildcard("www.evilcorp.com", None, None).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
        result[&RecordType::A],
        WildcardStatus {
            is_wildcard: Some(false),
            parent: "evilcorp.com".to_string()
        }
    );
}

#[tokio::test]
async fn test_is_wildcard_with_supplied_ips() {
    let (engine, client) = mock_engine(GITHUB_IO);
    let ips = vec!["185.199.108.153".to_string()];
    let result = engine
        .is_wildcard("asdf.github.io", Some(&ips), Some(RecordType::A))
        .await
        .unwrap();
    assert_eq!(result[&RecordType::A].is_wildcard, Some(true));
    // Only the wildcard lookups hit the client, not the query itself
    assert_eq!(client.queries(), crate::config::ALL_RECORD_TYPES.len() * 5);
}

#[tokio::test]
async fn test_is_wildcard_argument_errors() {
    let (engine, _) = mock_engine(&[]);
    let ips = vec!["1.2.3.4".to_string()];
    let result = engine.is_wildcard("www.evilcorp.com", Some(&ips), None).await;
    assert!(matches!(result, Err(EngineError::InvalidArgument(_))));

    let blank = vec![" ".to_string()];
    let result = engine
        .is_wildcard("www.evilcorp.com", Some(&blank), Some(RecordType::A))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_is_wildcard_inconclusive_on_failure() {
    let client = MockClient::default().fail_with("down.evilcorp.com", QueryError::Timeout);
    let (engine, _) = engine_with(EngineConfig::default(), client);
    let result = engine
        .is_wildcard("down.evilcorp.com", None, Some(RecordType::A))
        .await
        .unwrap();
    assert_eq!(
        result[&RecordType::A],
        WildcardStatus {
            is_wildcard: None,
            parent: "evilcorp.com".to_string()
        }
    );
}

#[tokio::test]
async fn test_resolve_event_dns_name() {
    let (engine, _) = mock_engine(&[
        ("evilcorp.com", "A", &["1.2.3.4"]),
        ("evilcorp.com", "MX", &["10 mail.evilcorp.com."]),
        ("evilcorp.com", "NS", &["ns1.evilcorp.com."]),
    ]);
    let resolution = engine
        .resolve_event("evilcorp.com", EventKind::DnsName, false)
        .await;
    assert_eq!(
        resolution.tags,
        set(&["resolved", "a-record", "mx-record", "ns-record"])
    );
    assert_eq!(resolution.children[&RecordType::A], set(&["1.2.3.4"]));
    assert_eq!(
        resolution.children[&RecordType::MX],
        set(&["mail.evilcorp.com"])
    );
}

#[tokio::test]
async fn test_resolve_event_minimal_and_private() {
    let (engine, client) = mock_engine(&[
        ("intranet.evilcorp.com", "A", &["10.0.0.5"]),
        ("intranet.evilcorp.com", "MX", &["10 mail.evilcorp.com."]),
    ]);
    let resolution = engine
        .resolve_event("intranet.evilcorp.com", EventKind::DnsName, true)
        .await;
    assert!(resolution.tags.contains("private-ip"));
    assert!(resolution.tags.contains("a-record"));
    assert!(!resolution.tags.contains("mx-record"));
    assert_eq!(client.queries(), 2);
}

#[tokio::test]
async fn test_resolve_event_unresolved_and_errors() {
    let client = MockClient::default().fail_with("down.evilcorp.com", QueryError::Timeout);
    let (engine, _) = engine_with(EngineConfig::default(), client);
    let resolution = engine
        .resolve_event("down.evilcorp.com", EventKind::DnsName, true)
        .await;
    assert_eq!(
        resolution.tags,
        set(&["a-error", "aaaa-error", "unresolved"])
    );
    assert!(resolution.children.is_empty());
}

#[tokio::test]
async fn test_resolve_event_filters_bad_ptrs() {
    let (engine, _) = mock_engine(&[(
        "8.8.4.4",
        "PTR",
        &["8-8-4-4.dynamic.isp.net.", "dns.google."],
    )]);
    let resolution = engine
        .resolve_event("8.8.4.4", EventKind::IpAddress, false)
        .await;
    assert_eq!(resolution.children[&RecordType::PTR], set(&["dns.google"]));
    assert!(resolution.tags.contains("ptr-record"));
    assert!(!resolution.tags.contains("unresolved"));
}

#[tokio::test]
async fn test_full_wildcard_is_rewritten() {
    let (engine, _) = mock_engine(GITHUB_IO);
    let event = EventRef::dns_name("asdf.github.io");
    let children = BTreeMap::from([(RecordType::A, set(&["185.199.108.153"]))]);
    let verdict = engine.handle_wildcard_event(&event, &children).await.unwrap();
    assert_eq!(verdict.tags, set(&["wildcard", "a-wildcard"]));
    assert_eq!(verdict.data.as_deref(), Some("_wildcard.github.io"));
}

#[tokio::test]
async fn test_collapsed_event_is_not_rewritten_again() {
    let (engine, _) = mock_engine(GITHUB_IO);
    let event = EventRef {
        host: "asdf.github.io".to_string(),
        data: "_wildcard.github.io".to_string(),
        kind: EventKind::DnsName,
        is_target: false,
    };
    let children = BTreeMap::from([(RecordType::A, set(&["185.199.108.153"]))]);
    let verdict = engine.handle_wildcard_event(&event, &children).await.unwrap();
    assert!(verdict.tags.contains("a-wildcard"));
    assert_eq!(verdict.data, None);
}

#[tokio::test]
async fn test_partial_wildcard_is_tagged_not_rewritten() {
    let (engine, _) = mock_engine(&[
        ("*.evilcorp.com", "A", &["1.2.3.4"]),
        ("www.evilcorp.com", "A", &["1.2.3.4"]),
        ("www.evilcorp.com", "MX", &["10 mail.evilcorp.com."]),
    ]);
    let event = EventRef::dns_name("www.evilcorp.com");
    let children = BTreeMap::from([
        (RecordType::A, set(&["1.2.3.4"])),
        (RecordType::MX, set(&["mail.evilcorp.com"])),
    ]);
    let verdict = engine.handle_wildcard_event(&event, &children).await.unwrap();
    assert_eq!(verdict.tags, set(&["wildcard", "a-wildcard"]));
    assert_eq!(verdict.data, None);
}

#[tokio::test]
async fn test_wildcard_domain_tags() {
    let (engine, _) = mock_engine(GITHUB_IO);
    let event = EventRef::dns_name("github.io");
    let verdict = engine
        .handle_wildcard_event(&event, &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(verdict.tags, set(&["wildcard-domain", "a-wildcard-domain"]));
    assert_eq!(verdict.data, None);
}

#[tokio::test]
async fn test_ip_event_is_left_alone() {
    let (engine, client) = mock_engine(GITHUB_IO);
    let event = EventRef {
        host: "185.199.108.153".to_string(),
        data: "185.199.108.153".to_string(),
        kind: EventKind::IpAddress,
        is_target: false,
    };
    let children = BTreeMap::from([(RecordType::PTR, set(&["cdn.github.io"]))]);
    let verdict = engine.handle_wildcard_event(&event, &children).await.unwrap();
    assert_eq!(verdict, WildcardVerdict::default());
    assert_eq!(client.queries(), 0);
}

#[tokio::test]
async fn test_inject_mock_resolver_swaps_client() {
    let (engine, old) = mock_engine(&[]);
    let new = engine
        .inject_mock_resolver(zone(&[("evilcorp.com", "A", &["1.2.3.4"])]))
        .unwrap();
    let values = engine.resolve("evilcorp.com", Default::default()).await.unwrap();
    assert_eq!(values, set(&["1.2.3.4"]));
    assert_eq!(old.queries(), 0);
    assert_eq!(new.queries(), 1);

    let bad = engine.inject_mock_resolver(zone(&[("evilcorp.com", "BOGUS", &["x"])]));
    assert!(matches!(bad, Err(EngineError::InvalidRecordType(_))));
}
