//! Catalog, schema, table, column and snapshot operations.
//!
//! Everything below a catalog runs through an engine, named by the required
//! `engine_id` query parameter.

use super::ENGINE_ID;
use crate::operation::{Operation, RequestBuilder};
use crate::patch::JsonPatchOperation;
use crate::types::{Column, CreateSchema, ListTablesOptions, RollbackTable};

pub const LIST_CATALOGS: Operation = Operation::get("list_catalogs", "/catalogs");
pub const GET_CATALOG: Operation = Operation::get("get_catalog", "/catalogs/{catalog_id}");

pub const LIST_SCHEMAS: Operation =
    Operation::get("list_schemas", "/catalogs/{catalog_id}/schemas");
pub const CREATE_SCHEMA: Operation =
    Operation::post("create_schema", "/catalogs/{catalog_id}/schemas", 201);
pub const DELETE_SCHEMA: Operation =
    Operation::delete("delete_schema", "/catalogs/{catalog_id}/schemas/{schema_id}").idempotent();

pub const LIST_TABLES: Operation =
    Operation::get("list_tables", "/catalogs/{catalog_id}/schemas/{schema_id}/tables");
pub const GET_TABLE: Operation = Operation::get(
    "get_table",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}",
);
pub const UPDATE_TABLE: Operation = Operation::patch(
    "update_table",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}",
);
pub const DELETE_TABLE: Operation = Operation::delete(
    "delete_table",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}",
)
.idempotent();

pub const LIST_COLUMNS: Operation = Operation::get(
    "list_columns",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/columns",
);
pub const ADD_COLUMNS: Operation = Operation::post(
    "add_columns",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/columns",
    201,
);
pub const UPDATE_COLUMN: Operation = Operation::patch(
    "update_column",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/columns/{column_id}",
);
pub const DELETE_COLUMN: Operation = Operation::delete(
    "delete_column",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/columns/{column_id}",
)
.idempotent();

pub const LIST_TABLE_SNAPSHOTS: Operation = Operation::get(
    "list_table_snapshots",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/snapshots",
);
pub const ROLLBACK_TABLE: Operation = Operation::post(
    "rollback_table",
    "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}/rollback",
    201,
);

/// A schema as seen through one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaRef<'a> {
    pub engine_id: &'a str,
    pub catalog_id: &'a str,
    pub schema_id: &'a str,
}

impl<'a> SchemaRef<'a> {
    pub fn new(engine_id: &'a str, catalog_id: &'a str, schema_id: &'a str) -> Self {
        Self {
            engine_id,
            catalog_id,
            schema_id,
        }
    }

    pub fn table(self, table_id: &'a str) -> TableRef<'a> {
        TableRef {
            schema: self,
            table_id,
        }
    }

    fn scope(&self, operation: Operation) -> RequestBuilder {
        operation
            .builder()
            .path_param("catalog_id", self.catalog_id)
            .path_param("schema_id", self.schema_id)
            .required_query(ENGINE_ID, self.engine_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub schema: SchemaRef<'a>,
    pub table_id: &'a str,
}

impl TableRef<'_> {
    fn scope(&self, operation: Operation) -> RequestBuilder {
        self.schema
            .scope(operation)
            .path_param("table_id", self.table_id)
    }
}

pub fn list_catalogs() -> RequestBuilder {
    LIST_CATALOGS.builder()
}

pub fn get_catalog(catalog_id: &str) -> RequestBuilder {
    GET_CATALOG.builder().path_param("catalog_id", catalog_id)
}

pub fn list_schemas(engine_id: &str, catalog_id: &str) -> RequestBuilder {
    LIST_SCHEMAS
        .builder()
        .path_param("catalog_id", catalog_id)
        .required_query(ENGINE_ID, engine_id)
}

pub fn create_schema(engine_id: &str, catalog_id: &str, input: &CreateSchema) -> RequestBuilder {
    let builder = CREATE_SCHEMA
        .builder()
        .path_param("catalog_id", catalog_id)
        .required_query(ENGINE_ID, engine_id);
    if input.schema_name.trim().is_empty() {
        return builder.reject("schema_name is required");
    }
    builder.json(input)
}

pub fn delete_schema(schema: SchemaRef<'_>) -> RequestBuilder {
    schema.scope(DELETE_SCHEMA)
}

pub fn list_tables(schema: SchemaRef<'_>, options: &ListTablesOptions) -> RequestBuilder {
    schema
        .scope(LIST_TABLES)
        .query_all("tags", &options.tags)
        .query_opt("include_columns", options.include_columns)
}

pub fn get_table(table: TableRef<'_>) -> RequestBuilder {
    table.scope(GET_TABLE)
}

pub fn update_table(table: TableRef<'_>, patch: &[JsonPatchOperation]) -> RequestBuilder {
    table.scope(UPDATE_TABLE).json_patch(patch)
}

pub fn delete_table(table: TableRef<'_>) -> RequestBuilder {
    table.scope(DELETE_TABLE)
}

pub fn list_columns(table: TableRef<'_>) -> RequestBuilder {
    table.scope(LIST_COLUMNS)
}

pub fn add_columns(table: TableRef<'_>, columns: &[Column]) -> RequestBuilder {
    let builder = table.scope(ADD_COLUMNS);
    if columns.is_empty() {
        return builder.reject("at least one column is required");
    }
    builder.json(&serde_json::json!({ "columns": columns }))
}

pub fn update_column(
    table: TableRef<'_>,
    column_id: &str,
    patch: &[JsonPatchOperation],
) -> RequestBuilder {
    table
        .scope(UPDATE_COLUMN)
        .path_param("column_id", column_id)
        .json_patch(patch)
}

pub fn delete_column(table: TableRef<'_>, column_id: &str) -> RequestBuilder {
    table.scope(DELETE_COLUMN).path_param("column_id", column_id)
}

pub fn list_table_snapshots(table: TableRef<'_>) -> RequestBuilder {
    table.scope(LIST_TABLE_SNAPSHOTS)
}

pub fn rollback_table(table: TableRef<'_>, snapshot_id: &str) -> RequestBuilder {
    let builder = table.scope(ROLLBACK_TABLE);
    if snapshot_id.trim().is_empty() {
        return builder.reject("snapshot_id is required");
    }
    builder.json(&RollbackTable {
        snapshot_id: snapshot_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::http::HttpMethod;

    const BASE: &str = "http://localhost:3000";

    fn orders() -> TableRef<'static> {
        SchemaRef::new("presto01", "iceberg_data", "sales").table("orders")
    }

    #[test]
    fn table_calls_carry_engine_id() {
        let req = get_table(orders()).build(BASE, &[]).unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/catalogs/iceberg_data/schemas/sales/tables/orders?engine_id=presto01"
        );
    }

    #[test]
    fn list_tables_repeats_tags_in_order() {
        let options = ListTablesOptions {
            tags: vec!["pii".to_string(), "finance".to_string()],
            include_columns: Some(true),
        };
        let schema = SchemaRef::new("presto01", "iceberg_data", "sales");
        let req = list_tables(schema, &options).build(BASE, &[]).unwrap();
        assert!(
            req.url.ends_with("?engine_id=presto01&tags=pii&tags=finance&include_columns=true"),
            "{}",
            req.url
        );
    }

    #[test]
    fn missing_engine_id_is_malformed() {
        let err = list_schemas("", "iceberg_data").build(BASE, &[]).unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { operation: "list_schemas", .. }));

        let table = SchemaRef::new(" ", "iceberg_data", "sales").table("orders");
        let err = delete_table(table).build(BASE, &[]).unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { .. }));
    }

    #[test]
    fn column_paths() {
        let req = update_column(orders(), "amount", &[JsonPatchOperation::replace("/comment", "usd")])
            .build(BASE, &[])
            .unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert!(req.url.contains("/tables/orders/columns/amount?engine_id=presto01"));

        let err = add_columns(orders(), &[]).build(BASE, &[]).unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { .. }));
    }

    #[test]
    fn rollback_body() {
        let req = rollback_table(orders(), "8817").build(BASE, &[]).unwrap();
        assert!(req.url.contains("/tables/orders/rollback"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"snapshot_id": "8817"}));
    }
}
