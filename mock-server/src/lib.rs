//! In-memory lakehouse service used by the client's integration tests.
//!
//! Records are stored as JSON objects so JSON Patch documents apply to them
//! directly. Every route requires a bearer token.

use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub type Record = Map<String, Value>;
pub type Shared = Arc<RwLock<Lakehouse>>;
type ApiResult<T> = Result<T, MockError>;

/// Engine collections served, with the engine type each reports.
pub const ENGINE_COLLECTIONS: [(&str, &str); 6] = [
    ("presto_engines", "presto"),
    ("prestissimo_engines", "prestissimo"),
    ("db2_engines", "db2"),
    ("netezza_engines", "netezza"),
    ("spark_engines", "spark"),
    ("milvus_services", "milvus"),
];

/// Object keys reported for every bucket.
pub const BUCKET_OBJECTS: [&str; 3] = [
    "data/orders/part-00000.parquet",
    "data/orders/part-00001.parquet",
    "metadata/v2.metadata.json",
];

pub const SEED_CATALOG: &str = "iceberg_data";
pub const SEED_SCHEMA: &str = "sales";
pub const SEED_TABLE: &str = "orders";

#[derive(Debug, Default)]
pub struct Lakehouse {
    pub buckets: BTreeMap<String, Record>,
    pub databases: BTreeMap<String, Record>,
    pub drivers: BTreeMap<String, Record>,
    pub engines: BTreeMap<&'static str, BTreeMap<String, Record>>,
    pub catalogs: BTreeMap<String, Catalog>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub record: Record,
    pub schemas: BTreeMap<String, Schema>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub record: Record,
    pub columns: Vec<Record>,
    pub snapshots: Vec<Record>,
}

impl Table {
    fn to_json(&self, include_columns: bool) -> Value {
        let mut record = self.record.clone();
        if include_columns {
            record.insert("columns".into(), Value::from(self.columns.clone()));
        }
        Value::Object(record)
    }
}

impl Lakehouse {
    /// One catalog holding `sales.orders` with two snapshots.
    pub fn seeded() -> Self {
        let orders = Table {
            record: object(json!({
                "table_name": SEED_TABLE,
                "table_type": "iceberg",
                "tags": ["pii"],
                "current_snapshot_id": "1002",
            })),
            columns: vec![
                object(json!({"column_name": "order_id", "type": "bigint"})),
                object(json!({"column_name": "amount", "type": "decimal", "precision": 10, "scale": 2})),
            ],
            snapshots: vec![
                object(json!({
                    "snapshot_id": "1001",
                    "committed_at": 1_700_000_000_000_i64,
                    "operation": "append",
                    "summary": {"added-records": "100"},
                })),
                object(json!({
                    "snapshot_id": "1002",
                    "parent_snapshot_id": "1001",
                    "committed_at": 1_700_000_600_000_i64,
                    "operation": "overwrite",
                    "summary": {"added-records": "20", "deleted-records": "5"},
                })),
            ],
        };
        let sales = Schema {
            tables: BTreeMap::from([(SEED_TABLE.to_string(), orders)]),
        };
        let catalog = Catalog {
            record: object(json!({
                "catalog_name": SEED_CATALOG,
                "catalog_type": "iceberg",
                "managed_by": "ibm",
                "sync_status": "ok",
                "associated_engines": [],
            })),
            schemas: BTreeMap::from([(SEED_SCHEMA.to_string(), sales)]),
        };

        Self {
            engines: ENGINE_COLLECTIONS
                .iter()
                .map(|(collection, _)| (*collection, BTreeMap::new()))
                .collect(),
            catalogs: BTreeMap::from([(SEED_CATALOG.to_string(), catalog)]),
            ..Self::default()
        }
    }

    fn catalog(&self, catalog_id: &str) -> ApiResult<&Catalog> {
        self.catalogs
            .get(catalog_id)
            .ok_or_else(|| MockError::not_found("catalog_not_found", catalog_id))
    }

    fn catalog_mut(&mut self, catalog_id: &str) -> ApiResult<&mut Catalog> {
        self.catalogs
            .get_mut(catalog_id)
            .ok_or_else(|| MockError::not_found("catalog_not_found", catalog_id))
    }

    fn schema(&self, catalog_id: &str, schema_id: &str) -> ApiResult<&Schema> {
        self.catalog(catalog_id)?
            .schemas
            .get(schema_id)
            .ok_or_else(|| MockError::not_found("schema_not_found", schema_id))
    }

    fn schema_mut(&mut self, catalog_id: &str, schema_id: &str) -> ApiResult<&mut Schema> {
        self.catalog_mut(catalog_id)?
            .schemas
            .get_mut(schema_id)
            .ok_or_else(|| MockError::not_found("schema_not_found", schema_id))
    }

    fn table(&self, catalog_id: &str, schema_id: &str, table_id: &str) -> ApiResult<&Table> {
        self.schema(catalog_id, schema_id)?
            .tables
            .get(table_id)
            .ok_or_else(|| MockError::not_found("table_not_found", table_id))
    }

    fn table_mut(
        &mut self,
        catalog_id: &str,
        schema_id: &str,
        table_id: &str,
    ) -> ApiResult<&mut Table> {
        self.schema_mut(catalog_id, schema_id)?
            .tables
            .get_mut(table_id)
            .ok_or_else(|| MockError::not_found("table_not_found", table_id))
    }

    fn engines_mut(&mut self, collection: &'static str) -> &mut BTreeMap<String, Record> {
        self.engines.entry(collection).or_default()
    }
}

/// Error response in the service's `{code, message, errors}` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl MockError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn not_found(code: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, format!("{id} does not exist"))
    }

    fn conflict(code: &str, id: &str) -> Self {
        Self::new(StatusCode::CONFLICT, code, format!("{id} already exists"))
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.code,
            "message": self.message,
            "errors": [{"code": self.code, "message": self.message}],
        });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Which members of a resource a patch may touch.
#[derive(Debug, Clone, Copy)]
pub struct PatchRules {
    /// Top-level members that cannot change.
    pub immutable: &'static [&'static str],
    /// Schema members that count as present (null) when the stored record
    /// lacks them, such as unset optional fields and write-only secrets.
    pub optional: &'static [&'static str],
}

const BUCKET_RULES: PatchRules = PatchRules {
    immutable: &["bucket_id", "bucket_type", "created_by", "created_on"],
    optional: &[
        "/bucket_display_name",
        "/description",
        "/region",
        "/tags",
        "/associated_catalog",
        "/bucket_details/endpoint",
        "/bucket_details/access_key",
        "/bucket_details/secret_key",
    ],
};

const DATABASE_RULES: PatchRules = PatchRules {
    immutable: &["database_id", "database_type", "created_by", "created_on"],
    optional: &[
        "/description",
        "/tags",
        "/database_details/username",
        "/database_details/password",
    ],
};

const ENGINE_RULES: PatchRules = PatchRules {
    immutable: &["engine_id", "type", "status", "created_by", "created_on"],
    optional: &["/engine_display_name", "/description", "/tags"],
};

const TABLE_RULES: PatchRules = PatchRules {
    immutable: &["table_type", "current_snapshot_id"],
    optional: &["/tags", "/description"],
};

const COLUMN_RULES: PatchRules = PatchRules {
    immutable: &["type"],
    optional: &["/comment", "/length", "/precision", "/scale"],
};

/// Apply `add`, `replace` and `remove` operations as one unit. `replace`
/// and `remove` need an existing target; `replace` also accepts the
/// optional members named in `rules`.
pub fn apply_patch(
    record: &mut Record,
    ops: &[PatchOperation],
    rules: &PatchRules,
) -> Result<(), MockError> {
    let mut patched = record.clone();
    for op in ops {
        let tokens = pointer_tokens(&op.path)?;
        let Some((last, parents)) = tokens.split_last() else {
            return Err(MockError::bad_request("invalid_patch", "cannot patch the whole document"));
        };
        if rules.immutable.contains(&tokens[0].as_str()) {
            return Err(MockError::bad_request(
                "invalid_patch",
                format!("{} cannot be changed", op.path),
            ));
        }
        let missing = || MockError::bad_request("invalid_patch", format!("{} does not exist", op.path));

        let mut target = &mut patched;
        for token in parents {
            target = target
                .get_mut(token)
                .and_then(Value::as_object_mut)
                .ok_or_else(missing)?;
        }

        match op.op.as_str() {
            "add" | "replace" => {
                let value = op.value.clone().ok_or_else(|| {
                    MockError::bad_request("invalid_patch", format!("{} needs a value", op.op))
                })?;
                if op.op == "replace"
                    && !target.contains_key(last)
                    && !rules.optional.contains(&op.path.as_str())
                {
                    return Err(missing());
                }
                target.insert(last.clone(), value);
            }
            "remove" => {
                if target.remove(last).is_none() {
                    return Err(missing());
                }
            }
            other => {
                return Err(MockError::bad_request(
                    "invalid_patch",
                    format!("unsupported operation {other}"),
                ))
            }
        }
    }
    *record = patched;
    Ok(())
}

fn pointer_tokens(path: &str) -> Result<Vec<String>, MockError> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| MockError::bad_request("invalid_patch", format!("invalid path {path:?}")))?;
    Ok(rest
        .split('/')
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn object(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn success(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({"message": message.into(), "message_code": "success"})),
    )
}

fn required_str<'a>(record: &'a Record, field: &str) -> ApiResult<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| MockError::bad_request("missing_field", format!("{field} is required")))
}

pub fn app() -> Router {
    app_with_state(Arc::new(RwLock::new(Lakehouse::seeded())))
}

pub fn app_with_state(state: Shared) -> Router {
    let router = Router::new()
        .route("/bucket_registrations", get(list_buckets).post(create_bucket))
        .route(
            "/bucket_registrations/{bucket_id}",
            get(get_bucket).patch(update_bucket).delete(delete_bucket),
        )
        .route("/bucket_registrations/{bucket_id}/objects", get(list_bucket_objects))
        .route(
            "/bucket_registrations/{bucket_id}/activate",
            post(activate_bucket).delete(deactivate_bucket),
        )
        .route("/database_registrations", get(list_databases).post(create_database))
        .route(
            "/database_registrations/{database_id}",
            get(get_database).patch(update_database).delete(delete_database),
        )
        .route("/driver_registrations", get(list_drivers).post(create_driver))
        .route("/catalogs", get(list_catalogs))
        .route("/catalogs/{catalog_id}", get(get_catalog))
        .route(
            "/catalogs/{catalog_id}/schemas",
            get(list_schemas).post(create_schema),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}",
            delete(delete_schema),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}/tables",
            get(list_tables),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}",
            get(get_table).patch(update_table).delete(delete_table),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/columns",
            get(list_columns).post(add_columns),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/columns/{column_id}",
            patch(update_column).delete(delete_column),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/snapshots",
            get(list_snapshots),
        )
        .route(
            "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/rollback",
            post(rollback_table),
        );

    engine_routes(router)
        .layer(middleware::from_fn(require_bearer))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_bearer(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty());
    if !authorized {
        return MockError::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "a bearer token is required",
        )
        .into_response();
    }
    next.run(request).await
}

// --- buckets ---

fn redact_bucket(record: &mut Record) {
    if let Some(Value::Object(details)) = record.get_mut("bucket_details") {
        details.remove("access_key");
        details.remove("secret_key");
    }
}

async fn list_buckets(State(state): State<Shared>) -> Json<Value> {
    let lake = state.read().await;
    let buckets: Vec<&Record> = lake.buckets.values().collect();
    Json(json!({"bucket_registrations": buckets}))
}

async fn create_bucket(
    State(state): State<Shared>,
    Json(input): Json<Record>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    required_str(&input, "bucket_type")?;
    let bucket_name = input
        .get("bucket_details")
        .and_then(Value::as_object)
        .map(|details| required_str(details, "bucket_name"))
        .unwrap_or_else(|| Err(MockError::bad_request("missing_field", "bucket_details is required")))?
        .to_string();

    let id = Uuid::new_v4().to_string();
    let mut record = input;
    record.insert("bucket_id".into(), id.clone().into());
    record
        .entry("bucket_display_name")
        .or_insert_with(|| bucket_name.clone().into());
    record.insert("state".into(), "active".into());
    record.insert("created_by".into(), "mock".into());
    record.insert("created_on".into(), now_secs().to_string().into());
    redact_bucket(&mut record);

    debug!(bucket_id = %id, bucket_name = %bucket_name, "created bucket registration");
    state.write().await.buckets.insert(id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_bucket(
    State(state): State<Shared>,
    Path(bucket_id): Path<String>,
) -> ApiResult<Json<Record>> {
    let lake = state.read().await;
    lake.buckets
        .get(&bucket_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| MockError::not_found("bucket_not_found", &bucket_id))
}

async fn update_bucket(
    State(state): State<Shared>,
    Path(bucket_id): Path<String>,
    Json(ops): Json<Vec<PatchOperation>>,
) -> ApiResult<Json<Record>> {
    let mut lake = state.write().await;
    let record = lake
        .buckets
        .get_mut(&bucket_id)
        .ok_or_else(|| MockError::not_found("bucket_not_found", &bucket_id))?;
    apply_patch(record, &ops, &BUCKET_RULES)?;
    redact_bucket(record);
    Ok(Json(record.clone()))
}

async fn delete_bucket(
    State(state): State<Shared>,
    Path(bucket_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut lake = state.write().await;
    lake.buckets
        .remove(&bucket_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| MockError::not_found("bucket_not_found", &bucket_id))
}

#[derive(Debug, Deserialize)]
struct ObjectFilter {
    path: Option<String>,
}

async fn list_bucket_objects(
    State(state): State<Shared>,
    Path(bucket_id): Path<String>,
    Query(filter): Query<ObjectFilter>,
) -> ApiResult<Json<Value>> {
    let lake = state.read().await;
    if !lake.buckets.contains_key(&bucket_id) {
        return Err(MockError::not_found("bucket_not_found", &bucket_id));
    }
    let prefix = filter.path.unwrap_or_default();
    let objects: Vec<&str> = BUCKET_OBJECTS
        .iter()
        .copied()
        .filter(|key| key.starts_with(prefix.as_str()))
        .collect();
    Ok(Json(json!({"objects": objects})))
}

async fn set_bucket_state(state: &Shared, bucket_id: &str, value: &str) -> ApiResult<()> {
    let mut lake = state.write().await;
    let record = lake
        .buckets
        .get_mut(bucket_id)
        .ok_or_else(|| MockError::not_found("bucket_not_found", bucket_id))?;
    record.insert("state".into(), value.into());
    Ok(())
}

async fn activate_bucket(
    State(state): State<Shared>,
    Path(bucket_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    set_bucket_state(&state, &bucket_id, "active").await?;
    Ok(success(format!("bucket {bucket_id} activated")))
}

async fn deactivate_bucket(
    State(state): State<Shared>,
    Path(bucket_id): Path<String>,
) -> ApiResult<StatusCode> {
    set_bucket_state(&state, &bucket_id, "inactive").await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- databases and drivers ---

fn redact_database(record: &mut Record) {
    if let Some(Value::Object(details)) = record.get_mut("database_details") {
        details.remove("password");
    }
}

async fn list_databases(State(state): State<Shared>) -> Json<Value> {
    let lake = state.read().await;
    let databases: Vec<&Record> = lake.databases.values().collect();
    Json(json!({"database_registrations": databases}))
}

async fn create_database(
    State(state): State<Shared>,
    Json(input): Json<Record>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    required_str(&input, "database_type")?;
    required_str(&input, "database_display_name")?;
    input
        .get("database_details")
        .and_then(Value::as_object)
        .map(|details| required_str(details, "hostname").map(|_| ()))
        .unwrap_or_else(|| Err(MockError::bad_request("missing_field", "database_details is required")))?;

    let id = Uuid::new_v4().to_string();
    let mut record = input;
    record.insert("database_id".into(), id.clone().into());
    record.insert("created_by".into(), "mock".into());
    record.insert("created_on".into(), now_secs().to_string().into());
    redact_database(&mut record);

    debug!(database_id = %id, "created database registration");
    state.write().await.databases.insert(id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_database(
    State(state): State<Shared>,
    Path(database_id): Path<String>,
) -> ApiResult<Json<Record>> {
    let lake = state.read().await;
    lake.databases
        .get(&database_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| MockError::not_found("database_not_found", &database_id))
}

async fn update_database(
    State(state): State<Shared>,
    Path(database_id): Path<String>,
    Json(ops): Json<Vec<PatchOperation>>,
) -> ApiResult<Json<Record>> {
    let mut lake = state.write().await;
    let record = lake
        .databases
        .get_mut(&database_id)
        .ok_or_else(|| MockError::not_found("database_not_found", &database_id))?;
    apply_patch(record, &ops, &DATABASE_RULES)?;
    redact_database(record);
    Ok(Json(record.clone()))
}

async fn delete_database(
    State(state): State<Shared>,
    Path(database_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut lake = state.write().await;
    lake.databases
        .remove(&database_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| MockError::not_found("database_not_found", &database_id))
}

async fn list_drivers(State(state): State<Shared>) -> Json<Value> {
    let lake = state.read().await;
    let drivers: Vec<&Record> = lake.drivers.values().collect();
    Json(json!({"driver_registrations": drivers}))
}

async fn create_driver(
    State(state): State<Shared>,
    mut form: Multipart,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let mut record = Record::new();
    let mut driver_size = 0usize;
    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| MockError::bad_request("invalid_form", e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "driver" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| MockError::bad_request("invalid_form", e.body_text()))?;
            driver_size = data.len();
            record.insert("driver_file_name".into(), file_name.into());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| MockError::bad_request("invalid_form", e.body_text()))?;
            record.insert(name, text.into());
        }
    }

    if driver_size == 0 {
        return Err(MockError::bad_request("missing_field", "driver is required"));
    }
    required_str(&record, "driver_name")?;
    required_str(&record, "connection_type")?;

    let id = Uuid::new_v4().to_string();
    record.insert("driver_id".into(), id.clone().into());
    record.insert("driver_size".into(), driver_size.into());
    record.insert("status".into(), "ready".into());
    record.insert("associated_engines".into(), json!([]));

    debug!(driver_id = %id, driver_size, "registered driver");
    state.write().await.drivers.insert(id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

// --- engines ---

fn engine_routes(router: Router<Shared>) -> Router<Shared> {
    ENGINE_COLLECTIONS
        .iter()
        .fold(router, |router, &(collection, engine_type)| {
            router
                .route(
                    &format!("/{collection}"),
                    get(move |state: State<Shared>| list_engines(state, collection)).post(
                        move |state: State<Shared>, input: Json<Record>| {
                            create_engine(state, collection, engine_type, input)
                        },
                    ),
                )
                .route(
                    &format!("/{collection}/{{engine_id}}"),
                    get(move |state: State<Shared>, id: Path<String>| {
                        get_engine(state, collection, id)
                    })
                    .patch(
                        move |state: State<Shared>, id: Path<String>, ops: Json<Vec<PatchOperation>>| {
                            update_engine(state, collection, id, ops)
                        },
                    )
                    .delete(move |state: State<Shared>, id: Path<String>| {
                        delete_engine(state, collection, id)
                    }),
                )
                .route(
                    &format!("/{collection}/{{engine_id}}/pause"),
                    post(move |state: State<Shared>, id: Path<String>| {
                        set_engine_status(state, collection, id, "paused")
                    }),
                )
                .route(
                    &format!("/{collection}/{{engine_id}}/resume"),
                    post(move |state: State<Shared>, id: Path<String>| {
                        set_engine_status(state, collection, id, "running")
                    }),
                )
        })
}

async fn list_engines(State(state): State<Shared>, collection: &'static str) -> Json<Value> {
    let lake = state.read().await;
    let engines: Vec<&Record> = lake
        .engines
        .get(collection)
        .map(|engines| engines.values().collect())
        .unwrap_or_default();
    let mut body = Map::new();
    body.insert(collection.to_string(), json!(engines));
    Json(Value::Object(body))
}

async fn create_engine(
    State(state): State<Shared>,
    collection: &'static str,
    engine_type: &'static str,
    Json(input): Json<Record>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    required_str(&input, "origin")?;

    let id = format!("{engine_type}{}", &Uuid::new_v4().simple().to_string()[..8]);
    let mut record = input;
    record.insert("engine_id".into(), id.clone().into());
    record.insert("type".into(), engine_type.into());
    record.insert("status".into(), "running".into());
    record.insert("created_by".into(), "mock".into());
    record.insert("created_on".into(), now_secs().into());

    debug!(engine_id = %id, collection, "created engine");
    state
        .write()
        .await
        .engines_mut(collection)
        .insert(id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_engine(
    State(state): State<Shared>,
    collection: &'static str,
    Path(engine_id): Path<String>,
) -> ApiResult<Json<Record>> {
    let lake = state.read().await;
    lake.engines
        .get(collection)
        .and_then(|engines| engines.get(&engine_id))
        .cloned()
        .map(Json)
        .ok_or_else(|| MockError::not_found("engine_not_found", &engine_id))
}

async fn update_engine(
    State(state): State<Shared>,
    collection: &'static str,
    Path(engine_id): Path<String>,
    Json(ops): Json<Vec<PatchOperation>>,
) -> ApiResult<Json<Record>> {
    let mut lake = state.write().await;
    let record = lake
        .engines_mut(collection)
        .get_mut(&engine_id)
        .ok_or_else(|| MockError::not_found("engine_not_found", &engine_id))?;
    apply_patch(record, &ops, &ENGINE_RULES)?;
    Ok(Json(record.clone()))
}

async fn delete_engine(
    State(state): State<Shared>,
    collection: &'static str,
    Path(engine_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut lake = state.write().await;
    lake.engines_mut(collection)
        .remove(&engine_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| MockError::not_found("engine_not_found", &engine_id))
}

async fn set_engine_status(
    State(state): State<Shared>,
    collection: &'static str,
    Path(engine_id): Path<String>,
    status: &'static str,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut lake = state.write().await;
    let record = lake
        .engines_mut(collection)
        .get_mut(&engine_id)
        .ok_or_else(|| MockError::not_found("engine_not_found", &engine_id))?;
    record.insert("status".into(), status.into());
    Ok(success(format!("engine {engine_id} {status}")))
}

// --- catalogs ---

/// Query string of calls below a catalog. Pairs are kept as sent so that
/// repeated keys survive.
type ScopeQuery = Query<Vec<(String, String)>>;

fn engine_scope(params: &[(String, String)]) -> ApiResult<&str> {
    params
        .iter()
        .find(|(k, _)| k == "engine_id")
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MockError::bad_request("missing_engine_id", "engine_id is required"))
}

async fn list_catalogs(State(state): State<Shared>) -> Json<Value> {
    let lake = state.read().await;
    let catalogs: Vec<&Record> = lake.catalogs.values().map(|c| &c.record).collect();
    Json(json!({"catalogs": catalogs}))
}

async fn get_catalog(
    State(state): State<Shared>,
    Path(catalog_id): Path<String>,
) -> ApiResult<Json<Record>> {
    let lake = state.read().await;
    Ok(Json(lake.catalog(&catalog_id)?.record.clone()))
}

async fn list_schemas(
    State(state): State<Shared>,
    Path(catalog_id): Path<String>,
    Query(params): ScopeQuery,
) -> ApiResult<Json<Value>> {
    engine_scope(&params)?;
    let lake = state.read().await;
    let schemas: Vec<&String> = lake.catalog(&catalog_id)?.schemas.keys().collect();
    Ok(Json(json!({"schemas": schemas})))
}

async fn create_schema(
    State(state): State<Shared>,
    Path(catalog_id): Path<String>,
    Query(params): ScopeQuery,
    Json(input): Json<Record>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    engine_scope(&params)?;
    let name = required_str(&input, "schema_name")?.to_string();
    let mut lake = state.write().await;
    let catalog = lake.catalog_mut(&catalog_id)?;
    if catalog.schemas.contains_key(&name) {
        return Err(MockError::conflict("schema_exists", &name));
    }
    catalog.schemas.insert(name.clone(), Schema::default());
    Ok(success(format!("schema {name} created")))
}

async fn delete_schema(
    State(state): State<Shared>,
    Path((catalog_id, schema_id)): Path<(String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<StatusCode> {
    engine_scope(&params)?;
    let mut lake = state.write().await;
    lake.catalog_mut(&catalog_id)?
        .schemas
        .remove(&schema_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| MockError::not_found("schema_not_found", &schema_id))
}

async fn list_tables(
    State(state): State<Shared>,
    Path((catalog_id, schema_id)): Path<(String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<Json<Value>> {
    engine_scope(&params)?;
    let wanted: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "tags")
        .map(|(_, v)| v.as_str())
        .collect();
    let include_columns = params
        .iter()
        .any(|(k, v)| k == "include_columns" && v == "true");

    let lake = state.read().await;
    let tables: Vec<Value> = lake
        .schema(&catalog_id, &schema_id)?
        .tables
        .values()
        .filter(|table| {
            let tags = table.record.get("tags").and_then(Value::as_array);
            wanted.iter().all(|tag| {
                tags.is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(*tag)))
            })
        })
        .map(|table| table.to_json(include_columns))
        .collect();
    Ok(Json(json!({"tables": tables})))
}

async fn get_table(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<Json<Value>> {
    engine_scope(&params)?;
    let lake = state.read().await;
    Ok(Json(lake.table(&catalog_id, &schema_id, &table_id)?.to_json(true)))
}

async fn update_table(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
    Json(ops): Json<Vec<PatchOperation>>,
) -> ApiResult<Json<Value>> {
    engine_scope(&params)?;
    let mut lake = state.write().await;
    let schema = lake.schema_mut(&catalog_id, &schema_id)?;
    let mut table = schema
        .tables
        .get(&table_id)
        .cloned()
        .ok_or_else(|| MockError::not_found("table_not_found", &table_id))?;
    apply_patch(&mut table.record, &ops, &TABLE_RULES)?;

    let new_name = required_str(&table.record, "table_name")?.to_string();
    if new_name != table_id && schema.tables.contains_key(&new_name) {
        return Err(MockError::conflict("table_exists", &new_name));
    }
    schema.tables.remove(&table_id);
    let body = table.to_json(true);
    schema.tables.insert(new_name, table);
    Ok(Json(body))
}

async fn delete_table(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<StatusCode> {
    engine_scope(&params)?;
    let mut lake = state.write().await;
    lake.schema_mut(&catalog_id, &schema_id)?
        .tables
        .remove(&table_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| MockError::not_found("table_not_found", &table_id))
}

async fn list_columns(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<Json<Value>> {
    engine_scope(&params)?;
    let lake = state.read().await;
    let table = lake.table(&catalog_id, &schema_id, &table_id)?;
    Ok(Json(json!({"columns": table.columns})))
}

#[derive(Debug, Deserialize)]
struct AddColumns {
    columns: Vec<Record>,
}

async fn add_columns(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
    Json(input): Json<AddColumns>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    engine_scope(&params)?;
    let mut lake = state.write().await;
    let table = lake.table_mut(&catalog_id, &schema_id, &table_id)?;
    for column in &input.columns {
        let name = required_str(column, "column_name")?;
        required_str(column, "type")?;
        if table.columns.iter().any(|c| c.get("column_name").and_then(Value::as_str) == Some(name)) {
            return Err(MockError::conflict("column_exists", name));
        }
    }
    table.columns.extend(input.columns.iter().cloned());
    Ok((StatusCode::CREATED, Json(json!({"columns": input.columns}))))
}

fn column_index(table: &Table, column_id: &str) -> ApiResult<usize> {
    table
        .columns
        .iter()
        .position(|c| c.get("column_name").and_then(Value::as_str) == Some(column_id))
        .ok_or_else(|| MockError::not_found("column_not_found", column_id))
}

async fn update_column(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id, column_id)): Path<(String, String, String, String)>,
    Query(params): ScopeQuery,
    Json(ops): Json<Vec<PatchOperation>>,
) -> ApiResult<Json<Record>> {
    engine_scope(&params)?;
    let mut lake = state.write().await;
    let table = lake.table_mut(&catalog_id, &schema_id, &table_id)?;
    let index = column_index(table, &column_id)?;
    let column = &mut table.columns[index];
    apply_patch(column, &ops, &COLUMN_RULES)?;
    Ok(Json(column.clone()))
}

async fn delete_column(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id, column_id)): Path<(String, String, String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<StatusCode> {
    engine_scope(&params)?;
    let mut lake = state.write().await;
    let table = lake.table_mut(&catalog_id, &schema_id, &table_id)?;
    let index = column_index(table, &column_id)?;
    table.columns.remove(index);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_snapshots(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
) -> ApiResult<Json<Value>> {
    engine_scope(&params)?;
    let lake = state.read().await;
    let table = lake.table(&catalog_id, &schema_id, &table_id)?;
    Ok(Json(json!({"snapshots": table.snapshots})))
}

async fn rollback_table(
    State(state): State<Shared>,
    Path((catalog_id, schema_id, table_id)): Path<(String, String, String)>,
    Query(params): ScopeQuery,
    Json(input): Json<Record>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    engine_scope(&params)?;
    let snapshot_id = required_str(&input, "snapshot_id")?.to_string();
    let mut lake = state.write().await;
    let table = lake.table_mut(&catalog_id, &schema_id, &table_id)?;
    let known = table
        .snapshots
        .iter()
        .any(|s| s.get("snapshot_id").and_then(Value::as_str) == Some(snapshot_id.as_str()));
    if !known {
        return Err(MockError::not_found("snapshot_not_found", &snapshot_id));
    }
    table
        .record
        .insert("current_snapshot_id".into(), snapshot_id.clone().into());
    Ok(success(format!("table {table_id} rolled back to {snapshot_id}")))
}
