use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::{replace_present, JsonPatchOperation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRegistration {
    pub database_id: String,
    #[serde(default)]
    pub database_display_name: Option<String>,
    pub database_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub database_details: Option<DatabaseDetails>,
    #[serde(default)]
    pub associated_catalog: Option<DatabaseCatalog>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    pub hostname: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCatalog {
    pub catalog_name: String,
    pub catalog_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRegistrationCollection {
    #[serde(default)]
    pub database_registrations: Vec<DatabaseRegistration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatabaseRegistration {
    pub database_type: String,
    pub database_display_name: String,
    pub database_details: DatabaseDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_catalog: Option<DatabaseCatalog>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseRegistrationPatch {
    pub database_display_name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl From<DatabaseRegistrationPatch> for Vec<JsonPatchOperation> {
    fn from(patch: DatabaseRegistrationPatch) -> Self {
        let mut ops = replace_present([
            ("database_display_name", patch.database_display_name.map(Value::from)),
            ("description", patch.description.map(Value::from)),
            ("tags", patch.tags.map(Value::from)),
        ]);
        for (field, value) in [("username", patch.username), ("password", patch.password)] {
            if let Some(value) = value {
                ops.push(JsonPatchOperation::replace(
                    format!("/database_details/{field}"),
                    value,
                ));
            }
        }
        ops
    }
}

/// A JDBC driver uploaded for use by engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRegistration {
    pub driver_id: String,
    pub driver_name: String,
    pub connection_type: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub associated_engines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRegistrationCollection {
    #[serde(default)]
    pub driver_registrations: Vec<DriverRegistration>,
}

/// Upload of a driver archive, sent as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDriverRegistration {
    pub driver: Bytes,
    pub driver_file_name: String,
    pub driver_name: String,
    pub connection_type: String,
    pub version: Option<String>,
}
