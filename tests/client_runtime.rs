mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use remote_client::codec::{Arguments, MethodMetadata};
use remote_client::config::parse_config;
use remote_client::fallback::{Fallback, FallbackSpec};
use remote_client::registry::{CandidateType, ClientAttributes, TypeDescriptor};
use remote_client::{Bootstrap, ClientError, ClientResult, RemoteClient, Target};

use common::{start_mock_backend, start_programmable_backend, unused_addr};

fn manifest(billing_instances: &[String]) -> String {
    let mut manifest = String::from(
        r#"
        [environment]
        "billing.path" = "api"

        [client.config.billing]
        request_interceptors = ["request-id"]
        decode404 = true
        "#,
    );
    for addr in billing_instances {
        manifest.push_str(&format!(
            "\n[[services]]\nservice = \"billing\"\naddress = \"{}\"\n",
            addr
        ));
    }
    manifest.push_str(
        r#"
        [[clients]]
        contract = "app::BillingApi"
        value = "billing"
        path = "${billing.path}"
        "#,
    );
    manifest
}

#[derive(Debug, Default)]
struct CachedInventory;

#[async_trait]
impl Fallback for CachedInventory {
    async fn invoke(&self, method: &MethodMetadata, _args: &Arguments) -> ClientResult<Value> {
        Ok(json!({ "source": "fallback", "method": method.name }))
    }
}

fn inventory_candidate(url: String) -> CandidateType {
    CandidateType::client(
        TypeDescriptor::interface("app::InventoryApi"),
        ClientAttributes::named("inventory")
            .url(url)
            .fallback(FallbackSpec::of::<CachedInventory>("app::CachedInventory")),
    )
}

#[derive(Debug, Deserialize, PartialEq)]
struct Invoice {
    id: u64,
    path: String,
}

struct BillingClient {
    target: Arc<Target>,
}

impl RemoteClient for BillingClient {
    const CONTRACT: &'static str = "app::BillingApi";

    fn from_target(target: Arc<Target>) -> Self {
        Self { target }
    }
}

impl BillingClient {
    async fn invoice(&self, id: u64) -> ClientResult<Invoice> {
        let method = MethodMetadata::get("invoice", "/invoices/{id}");
        self.target.invoke_as(&method, &Arguments::new().path("id", id)).await
    }
}

#[tokio::test]
async fn test_load_balanced_calls_rotate_instances() {
    let a = start_mock_backend(r#"{"instance":"a"}"#).await;
    let b = start_mock_backend(r#"{"instance":"b"}"#).await;
    let config = parse_config(&manifest(&[a.to_string(), b.to_string()])).unwrap();
    let runtime = Bootstrap::new(config).start().unwrap();

    let target = runtime.get_target("billingClient").unwrap();
    assert_eq!(target.url(), "http://billing/api");

    let method = MethodMetadata::get("ping", "/ping");
    let mut seen = HashSet::new();
    for _ in 0..4 {
        let value = target.invoke(&method, &Arguments::new()).await.unwrap();
        seen.insert(value["instance"].as_str().unwrap().to_string());
    }
    assert_eq!(seen.len(), 2);
}

#[tokio::test]
async fn test_typed_client_expands_path_and_applies_interceptors() {
    let backend = start_programmable_backend(|request| async move {
        let id = if request.header("x-request-id").is_some() { 7 } else { 0 };
        (200, json!({ "id": id, "path": request.target }).to_string())
    })
    .await;
    let config = parse_config(&manifest(&[backend.to_string()])).unwrap();
    let runtime = Bootstrap::new(config).start().unwrap();

    let client: BillingClient = runtime.client().unwrap();
    let invoice = client.invoice(7).await.unwrap();
    assert_eq!(
        invoice,
        Invoice {
            id: 7,
            path: "/api/invoices/7".to_string()
        }
    );
}

#[tokio::test]
async fn test_decode404_from_properties() {
    let backend = start_programmable_backend(|_| async { (404, r#"{"missing":true}"#.to_string()) }).await;
    let config = parse_config(&manifest(&[backend.to_string()])).unwrap();
    let runtime = Bootstrap::new(config).start().unwrap();

    let target = runtime.get_target("app::BillingApi").unwrap();
    assert!(target.config().decode404);
    let value = target
        .invoke(&MethodMetadata::get("find", "/invoices/1"), &Arguments::new())
        .await
        .unwrap();
    assert_eq!(value, json!({ "missing": true }));
}

#[tokio::test]
async fn test_fallback_answers_connection_failures() {
    let dead = unused_addr().await;
    let config = parse_config(&manifest(&[])).unwrap();
    let runtime = Bootstrap::new(config)
        .with_candidate(inventory_candidate(format!("http://{}", dead)))
        .start()
        .unwrap();

    let target = runtime.get_target("inventory").unwrap();
    assert!(target.has_fallback());
    let value = target
        .invoke(&MethodMetadata::get("stock", "/stock"), &Arguments::new())
        .await
        .unwrap();
    assert_eq!(value, json!({ "source": "fallback", "method": "stock" }));
}

#[tokio::test]
async fn test_status_errors_bypass_fallback() {
    let backend = start_programmable_backend(|_| async { (500, "boom".to_string()) }).await;
    let config = parse_config(&manifest(&[])).unwrap();
    let runtime = Bootstrap::new(config)
        .with_candidate(inventory_candidate(format!("http://{}", backend)))
        .start()
        .unwrap();

    let target = runtime.get_target("app::InventoryApi").unwrap();
    let err = target
        .invoke(&MethodMetadata::get("stock", "/stock"), &Arguments::new())
        .await
        .unwrap_err();
    match err {
        ClientError::Status { status, method_key, body } => {
            assert_eq!(status, 500);
            assert_eq!(method_key, "InventoryApi#stock");
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_no_instances_without_fallback_is_transport_error() {
    let config = parse_config(&manifest(&[])).unwrap();
    let runtime = Bootstrap::new(config).start().unwrap();

    let err = runtime
        .get_target("billing")
        .unwrap()
        .invoke(&MethodMetadata::get("ping", "/ping"), &Arguments::new())
        .await
        .unwrap_err();
    assert!(err.as_transport().is_some(), "unexpected error: {err}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_share_one_target() {
    let config = parse_config(&manifest(&["127.0.0.1:7001".to_string()])).unwrap();
    let runtime = Arc::new(Bootstrap::new(config).lazy().start().unwrap());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let runtime = runtime.clone();
            let key = if i % 2 == 0 { "billing" } else { "app::BillingApi" };
            tokio::spawn(async move { runtime.get_target(key).unwrap() })
        })
        .collect();

    let mut targets = Vec::new();
    for handle in handles {
        targets.push(handle.await.unwrap());
    }
    assert!(targets.iter().all(|t| Arc::ptr_eq(t, &targets[0])));
    assert_eq!(runtime.factory().built_targets(), vec!["billing"]);
}
