//! End-to-end pipeline tests using the in-memory collaborators
//!
//! These exercise the whole driver - credential resolution, pagination,
//! extraction, aggregation, persistence - without touching the network or
//! AWS, by wiring MockTransport, MemorySecrets and MemoryStore together.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use stackscan::github::MockTransport;
use stackscan::pipeline::TransportFactory;
use stackscan::{
    ApiError, GithubTransport, MemorySecrets, MemoryStore, PipelineError, RetryPolicy, RunMode,
    ScanConfig, ScanDriver, Stage,
};

fn config(batch_size: u32) -> ScanConfig {
    ScanConfig {
        organization: "acme".to_string(),
        client_id: "Iv1.test".to_string(),
        secret_name: "github/credentials".to_string(),
        batch_size,
        max_retries: 5,
        run_mode: RunMode::Development,
        bucket: None,
        key: None,
        output_path: PathBuf::from("repositories.json"),
        request_timeout_secs: 30,
        deadline_secs: None,
        log_level: "info".to_string(),
    }
}

fn secrets() -> Arc<MemorySecrets> {
    Arc::new(MemorySecrets::with_secret(
        "github/credentials",
        r#"{"token": "ghs_test_token"}"#,
    ))
}

fn driver(
    transport: Arc<MockTransport>,
    store: Arc<MemoryStore>,
    batch_size: u32,
) -> ScanDriver {
    let factory: TransportFactory = {
        let transport = transport.clone();
        Box::new(move |_credentials| transport.clone() as Arc<dyn GithubTransport>)
    };

    ScanDriver::new(config(batch_size), secrets(), store, factory)
        .with_retry_policy(RetryPolicy::zero_delay(5))
}

fn language(name: &str, size: u64) -> Value {
    json!({ "size": size, "node": { "name": name } })
}

fn repo(name: &str, languages: Vec<Value>, total_size: u64) -> Value {
    json!({
        "name": name,
        "url": format!("https://github.com/acme/{name}"),
        "visibility": "PRIVATE",
        "isArchived": false,
        "languages": { "edges": languages, "totalSize": total_size }
    })
}

fn page(nodes: Vec<Value>, end_cursor: Option<&str>, has_next: bool) -> Value {
    json!({
        "data": {
            "organization": {
                "repositories": {
                    "pageInfo": { "hasNextPage": has_next, "endCursor": end_cursor },
                    "nodes": nodes
                }
            }
        }
    })
}

fn stored_document(store: &MemoryStore) -> Value {
    serde_json::from_slice(&store.last_write().expect("no artifact written")).unwrap()
}

#[tokio::test]
async fn acme_three_repos_across_two_pages() {
    let transport = Arc::new(MockTransport::new());
    transport.push_ok(page(
        vec![
            repo("repo-a", vec![language("Python", 60), language("Go", 40)], 100),
            repo("repo-b", vec![language("Python", 100)], 100),
        ],
        Some("CUR1"),
        true,
    ));
    transport.push_ok(page(vec![repo("repo-c", vec![], 0)], None, false));

    let store = Arc::new(MemoryStore::new());
    let outcome = driver(transport.clone(), store.clone(), 2)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.repositories, 3);
    assert_eq!(outcome.pages, 2);
    // Exactly one upstream request per page.
    assert_eq!(transport.call_count(), 2);

    // The batch size bound holds on every request, and the second request
    // resumes from the first page's cursor.
    for i in 0..2 {
        assert_eq!(transport.call_variables(i).unwrap()["limit"], 2);
    }
    assert_eq!(transport.call_variables(0).unwrap()["cursor"], Value::Null);
    assert_eq!(transport.call_variables(1).unwrap()["cursor"], "CUR1");

    let document = stored_document(&store);
    assert_eq!(document["organization"], "acme");
    assert_eq!(document["batch_size"], 2);

    let repos = document["repositories"].as_array().unwrap();
    assert_eq!(repos.len(), 3);
    assert_eq!(repos[0]["name"], "repo-a");
    assert_eq!(repos[1]["name"], "repo-b");
    assert_eq!(repos[2]["name"], "repo-c");

    let techs_a: Vec<&str> = repos[0]["technologies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(techs_a, vec!["Python", "Go"]);

    let techs_b: Vec<&str> = repos[1]["technologies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(techs_b, vec!["Python"]);

    assert!(repos[2]["technologies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rerun_is_idempotent_modulo_timestamp() {
    let run = || async {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(page(
            vec![
                repo("beta", vec![language("Rust", 90), language("Shell", 10)], 100),
                repo("alpha", vec![language("Python", 50)], 50),
            ],
            None,
            false,
        ));
        let store = Arc::new(MemoryStore::new());
        driver(transport, store.clone(), 30).run().await.unwrap();
        stored_document(&store)
    };

    let mut first = run().await;
    let mut second = run().await;

    first.as_object_mut().unwrap().remove("generated_at");
    second.as_object_mut().unwrap().remove("generated_at");
    assert_eq!(first, second);
}

#[tokio::test]
async fn transient_failures_below_cap_recover() {
    let transport = Arc::new(MockTransport::new());
    transport.push_err(ApiError::Upstream {
        status: 503,
        message: "unavailable".to_string(),
    });
    transport.push_err(ApiError::Timeout { seconds: 30 });
    transport.push_ok(page(vec![repo("only", vec![], 0)], None, false));

    let store = Arc::new(MemoryStore::new());
    let outcome = driver(transport.clone(), store.clone(), 30)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.repositories, 1);
    assert_eq!(transport.call_count(), 3);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn exhausted_retries_fail_without_artifact() {
    let transport = Arc::new(MockTransport::new());
    for _ in 0..5 {
        transport.push_err(ApiError::Upstream {
            status: 500,
            message: "boom".to_string(),
        });
    }

    let store = Arc::new(MemoryStore::new());
    let err = driver(transport.clone(), store.clone(), 30)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Fetching);
    assert!(matches!(
        err,
        PipelineError::Api {
            source: ApiError::UpstreamUnavailable { attempts: 5, .. },
            ..
        }
    ));
    assert_eq!(transport.call_count(), 5);
    // No partial inventory on the failure path.
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn rate_limit_hint_is_honored_and_recovers() {
    let transport = Arc::new(MockTransport::new());
    transport.push_err(ApiError::RateLimited {
        retry_after: Some(0),
    });
    transport.push_ok(page(vec![repo("only", vec![], 0)], None, false));

    let store = Arc::new(MemoryStore::new());
    let outcome = driver(transport.clone(), store.clone(), 30)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.repositories, 1);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn auth_rejection_fails_fast() {
    let transport = Arc::new(MockTransport::new());
    transport.push_err(ApiError::AuthRejected {
        status: 401,
        message: "bad credentials".to_string(),
    });

    let store = Arc::new(MemoryStore::new());
    let err = driver(transport.clone(), store.clone(), 30)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Api {
            source: ApiError::AuthRejected { .. },
            ..
        }
    ));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn missing_secret_fails_in_init_stage() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());

    let factory: TransportFactory = {
        let transport = transport.clone();
        Box::new(move |_| transport.clone() as Arc<dyn GithubTransport>)
    };
    let driver = ScanDriver::new(
        config(30),
        Arc::new(MemorySecrets::new()),
        store.clone(),
        factory,
    );

    let err = driver.run().await.unwrap_err();
    assert_eq!(err.stage(), Stage::Init);
    assert!(matches!(err, PipelineError::Auth(_)));
    assert_eq!(transport.call_count(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn malformed_record_does_not_poison_the_page() {
    let transport = Arc::new(MockTransport::new());
    transport.push_ok(page(
        vec![
            json!({ "languages": null, "defaultBranchRef": null }),
            repo("survivor-1", vec![language("Python", 10)], 10),
        ],
        Some("CUR1"),
        true,
    ));
    transport.push_ok(page(vec![repo("survivor-2", vec![], 0)], None, false));

    let store = Arc::new(MemoryStore::new());
    let outcome = driver(transport, store.clone(), 2).run().await.unwrap();

    // The nameless node is skipped; everything else survives.
    assert_eq!(outcome.repositories, 2);
    let document = stored_document(&store);
    let names: Vec<&str> = document["repositories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["survivor-1", "survivor-2"]);
}

#[tokio::test]
async fn invalid_batch_size_is_rejected_before_any_request() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());

    let err = driver(transport.clone(), store.clone(), 0)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Api {
            source: ApiError::InvalidBatchSize { given: 0, .. },
            ..
        }
    ));
    assert_eq!(transport.call_count(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn write_failure_fails_the_run_after_compute() {
    let transport = Arc::new(MockTransport::new());
    transport.push_ok(page(vec![repo("only", vec![], 0)], None, false));

    let store = Arc::new(MemoryStore::new());
    store.fail_writes("access denied");

    let err = driver(transport.clone(), store.clone(), 30)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Writing);
    assert!(matches!(err, PipelineError::Persist { .. }));
    // The fetch phase completed; only persistence failed.
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn summary_statistics_are_present_in_the_artifact() {
    let transport = Arc::new(MockTransport::new());
    transport.push_ok(page(
        vec![
            repo("app", vec![language("Python", 80), language("HCL", 20)], 100),
            json!({
                "name": "museum",
                "visibility": "PUBLIC",
                "isArchived": true,
                "languages": { "edges": [language("Perl", 10)], "totalSize": 10 }
            }),
        ],
        None,
        false,
    ));

    let store = Arc::new(MemoryStore::new());
    driver(transport, store.clone(), 30).run().await.unwrap();

    let document = stored_document(&store);
    let summary = &document["summary"];

    assert_eq!(summary["unarchived"]["total"], 1);
    assert_eq!(summary["unarchived"]["private"], 1);
    assert_eq!(summary["archived"]["total"], 1);
    assert_eq!(summary["archived"]["public"], 1);

    assert_eq!(summary["languages_unarchived"]["Python"]["repo_count"], 1);
    assert_eq!(summary["languages_unarchived"]["Python"]["total_size"], 80);
    assert_eq!(summary["languages_archived"]["Perl"]["repo_count"], 1);
    assert!(summary["languages_unarchived"].get("Perl").is_none());

    // HCL shows up both as a language and as Terraform under IaC.
    let app = &document["repositories"][0];
    let techs: Vec<(&str, &str)> = app["technologies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| {
            (
                t["name"].as_str().unwrap(),
                t["category"].as_str().unwrap(),
            )
        })
        .collect();
    assert!(techs.contains(&("Terraform", "infrastructure_as_code")));
    assert!(techs.contains(&("HCL", "language")));
}
