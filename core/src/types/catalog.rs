//! Catalogs and the schema, table, column and snapshot tree beneath them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::{replace_present, JsonPatchOperation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub catalog_name: String,
    #[serde(default)]
    pub catalog_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub managed_by: Option<String>,
    #[serde(default)]
    pub sync_status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub associated_engines: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCollection {
    #[serde(default)]
    pub catalogs: Vec<Catalog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCollection {
    #[serde(default)]
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSchema {
    pub schema_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub table_name: String,
    #[serde(default)]
    pub table_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCollection {
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// Filters for listing tables. Each tag is sent as its own `tags` parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesOptions {
    pub tags: Vec<String>,
    pub include_columns: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePatch {
    pub table_name: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<TablePatch> for Vec<JsonPatchOperation> {
    fn from(patch: TablePatch) -> Self {
        replace_present([
            ("table_name", patch.table_name.map(Value::from)),
            ("tags", patch.tags.map(Value::from)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub column_name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl Column {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            comment: None,
            length: None,
            precision: None,
            scale: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCollection {
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPatch {
    pub column_name: Option<String>,
    pub comment: Option<String>,
}

impl From<ColumnPatch> for Vec<JsonPatchOperation> {
    fn from(patch: ColumnPatch) -> Self {
        replace_present([
            ("column_name", patch.column_name.map(Value::from)),
            ("comment", patch.comment.map(Value::from)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub snapshot_id: String,
    #[serde(default)]
    pub parent_snapshot_id: Option<String>,
    #[serde(default)]
    pub committed_at: Option<i64>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub summary: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshotCollection {
    #[serde(default)]
    pub snapshots: Vec<TableSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackTable {
    pub snapshot_id: String,
}
