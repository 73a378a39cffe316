//! HTTP inspection API over a loopback listener.

use dockcrab::inventory::{ContainerSnapshot, InMemoryInventory, NetworkAttachment};
use dockcrab::zone::synthesize;
use dockcrab::{Config, Refresher, Resolver, SharedZone};
use hyper::{Body, Client, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;

fn foo() -> ContainerSnapshot {
    ContainerSnapshot {
        name: "foo".to_string(),
        networks: vec![NetworkAttachment {
            network: "bridge".to_string(),
            addresses: vec![Ipv4Addr::new(10, 0, 0, 5)],
        }],
    }
}

fn start_api(inventory: &InMemoryInventory) -> SocketAddr {
    let config = Arc::new(Config::default());
    let zone = SharedZone::new(synthesize(&[], &config));
    let refresher = Refresher::new(config.clone(), Arc::new(inventory.clone()), zone.clone());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server =
        dockcrab::api::server::from_tcp(&config, listener, Resolver::new(zone), refresher).unwrap();
    tokio::spawn(server);
    addr
}

async fn call(method: Method, addr: SocketAddr, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(format!("http://{addr}{path}"))
        .body(Body::empty())
        .unwrap();
    let response = Client::new().request(request).await.unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn healthcheck_reports_zone_version() {
    let addr = start_api(&InMemoryInventory::default());
    let (status, body) = call(Method::GET, addr, "/healthcheck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": "healthy", "version": 0}));
}

#[tokio::test]
async fn refresh_then_inspect_and_resolve() {
    let inventory = InMemoryInventory::new(vec![foo()]);
    let addr = start_api(&inventory);

    let (status, body) = call(Method::POST, addr, "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": "published", "version": 1, "entries": 4}));

    let (status, body) = call(Method::GET, addr, "/zone").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(
        body["entries"][3]["records"],
        json!([
            {"name": "foo", "type": "CNAME", "data": "foo.docker.lan", "ttl": 1800},
            {"type": "A", "data": "10.0.0.5", "ttl": 1800},
        ])
    );

    let (status, body) = call(Method::GET, addr, "/resolve?name=foo.docker.lan&type=A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "version": 1,
            "answers": [{"name": "foo.docker.lan", "type": "A", "data": "10.0.0.5", "ttl": 1800}],
        })
    );
}

#[tokio::test]
async fn refresh_outcomes_for_empty_and_failed_inventory() {
    let inventory = InMemoryInventory::default();
    let addr = start_api(&inventory);

    let (status, body) = call(Method::POST, addr, "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": "retained", "version": 0}));

    inventory.fail("daemon not running").await;
    let (status, body) = call(Method::POST, addr, "/refresh").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "inventory unavailable: daemon not running"}));
}
