//! Host-does-IO usage: the core builds and decodes, the test executes.
//!
//! # Design
//! Starts the mock server on a random port, then runs calls through
//! `LakehouseClient::prepare` and `LakehouseClient::decode` with ureq as the
//! HTTP executor. No async runtime is involved on the client side.

use lakehouse_core::operations::{buckets, catalog, engines};
use lakehouse_core::types::{
    BucketDetails, BucketRegistration, BucketRegistrationCollection, CatalogCollection,
    CreateBucketRegistration, Empty, EngineKind, TableSnapshotCollection,
};
use lakehouse_core::{
    ApiError, BearerTokenAuthenticator, ClientConfig, HttpMethod, HttpRequest, HttpResponse,
    LakehouseClient, RequestBuilder, ResponseEnvelope, SchemaRef,
};
use serde::de::DeserializeOwned;

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// handle status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let url = req.url.as_str();
    let headers = req.headers.iter();
    let mut response = match (req.method, &req.body) {
        (HttpMethod::Get, _) => headers
            .fold(agent.get(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
            .call(),
        (HttpMethod::Delete, _) => headers
            .fold(agent.delete(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
            .call(),
        (HttpMethod::Post, body) => headers
            .fold(agent.post(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
            .send(body.as_deref().unwrap_or_default()),
        (HttpMethod::Put, body) => headers
            .fold(agent.put(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
            .send(body.as_deref().unwrap_or_default()),
        (HttpMethod::Patch, body) => headers
            .fold(agent.patch(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
            .send(body.as_deref().unwrap_or_default()),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_vec().unwrap_or_default();

    HttpResponse {
        status,
        headers,
        body: body.into(),
    }
}

fn call<R: DeserializeOwned>(
    client: &LakehouseClient,
    builder: RequestBuilder,
) -> Result<ResponseEnvelope<R>, ApiError> {
    let operation = *builder.operation();
    let request = client.prepare(builder)?;
    client.decode(&operation, execute(request))
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> LakehouseClient {
    let config = ClientConfig::builder(base_url)
        .instance_id("crn:v1:host")
        .build()
        .unwrap();
    LakehouseClient::new(config, BearerTokenAuthenticator::new("host-token")).unwrap()
}

#[test]
fn bucket_lifecycle_over_ureq() {
    let client = client(&start_server());

    // Step 1: list, should be empty.
    let listed: ResponseEnvelope<BucketRegistrationCollection> =
        call(&client, buckets::list_bucket_registrations()).unwrap();
    assert!(listed.payload.unwrap().bucket_registrations.is_empty());

    // Step 2: create.
    let input = CreateBucketRegistration {
        bucket_type: "ibm_cos".to_string(),
        bucket_details: BucketDetails {
            bucket_name: "host-io".to_string(),
            ..Default::default()
        },
        bucket_display_name: Some("Host IO".to_string()),
        description: None,
        managed_by: "ibm".to_string(),
        associated_catalog: None,
        region: None,
        tags: Vec::new(),
    };
    let created: ResponseEnvelope<BucketRegistration> =
        call(&client, buckets::create_bucket_registration(&input)).unwrap();
    assert_eq!(created.status, 201);
    assert!(created.header("content-type").is_some_and(|v| v.starts_with("application/json")));
    let id = created.payload.unwrap().bucket_id;

    // Step 3: get.
    let fetched: ResponseEnvelope<BucketRegistration> =
        call(&client, buckets::get_bucket_registration(&id)).unwrap();
    assert_eq!(fetched.payload.unwrap().bucket_display_name.as_deref(), Some("Host IO"));

    // Step 4: delete.
    let deleted: ResponseEnvelope<Empty> =
        call(&client, buckets::delete_bucket_registration(&id)).unwrap();
    assert_eq!(deleted.status, 204);
    assert!(deleted.payload.is_none());

    // Step 5: get after delete, should be not found.
    let err = call::<BucketRegistration>(&client, buckets::get_bucket_registration(&id))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn catalog_reads_over_ureq() {
    let client = client(&start_server());

    let catalogs: ResponseEnvelope<CatalogCollection> =
        call(&client, catalog::list_catalogs()).unwrap();
    assert_eq!(catalogs.payload.unwrap().catalogs.len(), 1);

    let orders = SchemaRef::new("presto01", "iceberg_data", "sales").table("orders");
    let snapshots: ResponseEnvelope<TableSnapshotCollection> =
        call(&client, catalog::list_table_snapshots(orders)).unwrap();
    let snapshots = snapshots.payload.unwrap().snapshots;
    assert_eq!(snapshots[0].snapshot_id, "1001");
    assert_eq!(snapshots[1].summary.get("deleted-records").map(String::as_str), Some("5"));
}

#[test]
fn engine_list_over_ureq() {
    let client = client(&start_server());

    let builder = engines::list_engines(EngineKind::Milvus);
    let operation = *builder.operation();
    let request = client.prepare(builder).unwrap();
    assert_eq!(request.header("Authorization"), Some("Bearer host-token"));
    assert_eq!(request.header("AuthInstanceId"), Some("crn:v1:host"));

    let raw = client.decode(&operation, execute(request)).unwrap();
    let listed = engines::engines_from_collection(EngineKind::Milvus, raw).unwrap();
    assert!(listed.payload.unwrap().is_empty());
}

#[test]
fn malformed_request_never_reaches_host() {
    let client = client("http://127.0.0.1:9");

    let err = client
        .prepare(catalog::list_schemas("", "iceberg_data"))
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedRequest { operation: "list_schemas", .. }));
}
