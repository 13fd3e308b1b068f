#[path = "../common/mod.rs"]
mod common;
use common::{
    answer_for_query, hosts_of, status, test_config, ScriptedService, TestClient, SERVER_A,
    SERVER_B,
};
use httpdns_application::use_cases::ResolveState;
use httpdns_domain::{DomainError, IpList, NetStackType, QueryType, ResolveResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Server failover
// ============================================================================

#[tokio::test]
async fn test_failing_server_is_penalised_and_avoided() {
    let mut config = test_config();
    config.using_cache = false;
    let test = TestClient::with_config(
        config,
        NetStackType::Dual,
        ScriptedService::new(|req| {
            if req.server == SERVER_A {
                status(500)
            } else {
                answer_for_query(req, 60)
            }
        }),
    );

    let first = test.client.resolve_host("a.example", QueryType::A).await.unwrap();
    let second = test.client.resolve_host("b.example", QueryType::A).await.unwrap();
    assert!(first.is_some());
    assert!(second.is_some());

    let servers: Vec<_> = test
        .service
        .resolve_requests()
        .into_iter()
        .map(|r| r.server)
        .collect();
    assert_eq!(servers, vec![SERVER_A, SERVER_B, SERVER_B]);

    let (ipv4, _) = test.client.scheduler().servers();
    assert_eq!(ipv4.find(SERVER_A).and_then(|ip| ip.rtt_ms), Some(2500));
    assert_eq!(ipv4.find(SERVER_B).and_then(|ip| ip.rtt_ms), Some(8));
}

#[tokio::test]
async fn test_exhausted_resolution_returns_none() {
    let test = TestClient::new(ScriptedService::new(|_| status(500)));

    let result = test.client.resolve_host("a.example", QueryType::A).await;

    assert!(matches!(result, Ok(None)));
    assert_eq!(test.service.resolve_requests().len(), 2);
    assert!(test.client.cache().is_empty());
}

#[tokio::test]
async fn test_failed_bootstrap_means_no_resolver() {
    let test = TestClient::new(
        ScriptedService::new(|req| answer_for_query(req, 60)).with_schedule_status(503),
    );

    assert!(matches!(
        test.client.bootstrap().await,
        Err(DomainError::BootstrapFailed(1))
    ));
    let result = test.client.resolve_host("a.example", QueryType::A).await;

    assert!(matches!(result, Err(DomainError::NoResolverAvailable)));
    assert!(test.service.resolve_requests().is_empty());
}

#[tokio::test]
async fn test_exhaustion_falls_back_to_system_resolver() {
    let test = TestClient::new(ScriptedService::new(|_| status(500)));

    let result = test
        .client
        .resolve_with_fallback("127.0.0.1", QueryType::A)
        .await
        .unwrap()
        .expect("system resolver answer");

    assert_eq!(result.ips.addrs(), vec!["127.0.0.1"]);
    assert_eq!(result.ttl, test.client.config().local_fallback_ttl);
    assert!(test.client.cache().is_empty());
}

#[tokio::test]
async fn test_missing_servers_fall_back_to_system_resolver() {
    let test = TestClient::new(ScriptedService::new(|_| status(500)).with_schedule_status(500));

    let result = test
        .client
        .resolve_with_fallback("127.0.0.1", QueryType::Both)
        .await
        .unwrap();

    assert!(result.is_some());
    assert!(test.service.resolve_requests().is_empty());
}

#[test]
fn test_client_rejects_invalid_config() {
    let mut missing_account = test_config();
    missing_account.account_id.clear();
    let mut no_boot_servers = test_config();
    no_boot_servers.boot_servers_ipv4.clear();

    for config in [missing_account, no_boot_servers] {
        let result = TestClient::try_with_config(
            config,
            NetStackType::Dual,
            ScriptedService::new(|_| status(500)),
        );
        assert!(matches!(result, Err(DomainError::Config(_))));
    }
}

// ============================================================================
// Completion accounting
// ============================================================================

#[tokio::test]
async fn test_task_with_failing_request_settles_every_request() {
    let test = TestClient::new(ScriptedService::new(|req| {
        if hosts_of(&req.url)[0] == "bad.example" {
            status(500)
        } else {
            answer_for_query(req, 60)
        }
    }));
    test.client.bootstrap().await.unwrap();

    let mut task = test.client.task();
    let counters: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    for (host, counter) in ["a.example", "bad.example", "c.example"]
        .into_iter()
        .zip(&counters)
    {
        let counter = Arc::clone(counter);
        task.add_request(
            test.client.request(host, QueryType::A),
            Some(Box::new(move |_: &[ResolveResult]| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
    }

    task.execute().await.unwrap();

    let states: Vec<_> = task.contexts().iter().map(|c| c.state()).collect();
    assert_eq!(
        states,
        vec![
            ResolveState::Completed,
            ResolveState::Exhausted,
            ResolveState::Completed
        ]
    );
    let fired: Vec<_> = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    assert_eq!(fired, vec![1, 0, 1]);
}

#[tokio::test]
async fn test_spawned_resolve_never_calls_back_on_exhaustion() {
    let test = TestClient::new(ScriptedService::new(|_| status(500)));
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let handle = test
        .client
        .spawn_resolve(
            test.client.request("a.example", QueryType::A),
            Box::new(move |_: &[ResolveResult]| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    assert!(handle.await.unwrap().is_ok());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
