//! PortalClient against a live apx-stub, without the controller.
//!
//! The stub answers each list endpoint with a different envelope, so these
//! tests also cover envelope unwrapping over real HTTP. Calls that bypass
//! the controller hit the server-side one-active rule directly.

mod common;

use apx_core::{PageRequest, PublishRecordId};
use apx_publish::{GatewayType, PublishAction, PublishRequest, RecordStatus};
use common::{api_id, form, StubServer};

fn request(gateway: &str, base_path: &str) -> PublishRequest {
    form(gateway, base_path).parse().unwrap().into_request()
}

#[tokio::test]
async fn gateways_list_includes_defaults() {
    let server = StubServer::start().await;
    let gateways = server.client().gateways().list(100).await.unwrap();

    assert_eq!(gateways.len(), apx_stub::default_gateways().len());
    let higress = gateways
        .iter()
        .find(|g| g.gateway_id.as_str() == "gw-higress")
        .unwrap();
    assert_eq!(higress.gateway_type, GatewayType::Higress);
    assert_eq!(higress.gateway_name, "Higress Edge");
}

#[tokio::test]
async fn publish_returns_active_record() {
    let server = StubServer::start().await;
    let client = server.client();

    let record = client
        .records()
        .publish(&api_id("api-1"), &request("gw-higress", "/v1"))
        .await
        .unwrap()
        .expect("record in response");
    assert_eq!(record.status, RecordStatus::Active);
    assert_eq!(record.config().unwrap().base_path, "/v1");
}

#[tokio::test]
async fn direct_second_publish_gets_conflict() {
    let server = StubServer::start().await;
    let client = server.client();
    let api = api_id("api-1");

    client.records().publish(&api, &request("gw-higress", "/")).await.unwrap();
    let err = client
        .records()
        .publish(&api, &request("gw-apig", "/"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("already published to Higress Edge"));
}

#[tokio::test]
async fn records_page_through_wrapped_envelope() {
    let server = StubServer::start().await;
    let client = server.client();
    let api = api_id("api-1");

    // Three records: two failed attempts on distinct failing gateways and one success.
    server.state.add_gateway(apx_publish::Gateway {
        gateway_id: apx_core::GatewayId::new("fail-second").unwrap(),
        gateway_name: "Second Failing".into(),
        gateway_type: GatewayType::ApigAi,
    });
    let _ = client.records().publish(&api, &request("fail-gateway", "/")).await;
    let _ = client.records().publish(&api, &request("fail-second", "/")).await;
    client.records().publish(&api, &request("gw-higress", "/")).await.unwrap();

    let first = client.records().list(&api, PageRequest::new(1, 2).unwrap()).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.items.len(), 2);
    assert!(first.items.iter().all(|r| r.status == RecordStatus::Failed));

    let second = client.records().list(&api, PageRequest::new(2, 2).unwrap()).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].status, RecordStatus::Active);
}

#[tokio::test]
async fn history_reads_bare_envelope() {
    let server = StubServer::start().await;
    let client = server.client();
    let api = api_id("api-1");

    let record = client
        .records()
        .publish(&api, &request("gw-higress", "/"))
        .await
        .unwrap()
        .unwrap();
    client.records().unpublish(&api, &record.record_id).await.unwrap();

    let page = client.history().list(&api, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].action, PublishAction::Unpublish);
    assert_eq!(page.items[1].action, PublishAction::Publish);
    assert!(page.items[0].created_at > page.items[1].created_at);
}

#[tokio::test]
async fn unpublish_unknown_record_is_not_found() {
    let server = StubServer::start().await;
    let missing = PublishRecordId::new("nope").unwrap();
    let err = server
        .client()
        .records()
        .unpublish(&api_id("api-1"), &missing)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn api_definitions_are_isolated() {
    let server = StubServer::start().await;
    let client = server.client();

    client
        .records()
        .publish(&api_id("api-1"), &request("gw-higress", "/"))
        .await
        .unwrap();
    // A different definition may use another gateway concurrently.
    client
        .records()
        .publish(&api_id("api-2"), &request("gw-apig", "/"))
        .await
        .unwrap();

    let other = client.records().list(&api_id("api-2"), PageRequest::default()).await.unwrap();
    assert_eq!(other.total, 1);
    assert_eq!(other.items[0].gateway_id.as_str(), "gw-apig");
}
