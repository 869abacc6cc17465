use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::{replace_present, JsonPatchOperation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRegistration {
    pub bucket_id: String,
    #[serde(default)]
    pub bucket_display_name: Option<String>,
    pub bucket_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub managed_by: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub associated_catalog: Option<BucketCatalog>,
    #[serde(default)]
    pub bucket_details: Option<BucketDetails>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCatalog {
    pub catalog_name: String,
    pub catalog_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_tags: Vec<String>,
}

/// Storage location and credentials. The service never echoes secrets back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDetails {
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRegistrationCollection {
    #[serde(default)]
    pub bucket_registrations: Vec<BucketRegistration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketRegistration {
    pub bucket_type: String,
    pub bucket_details: BucketDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub managed_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_catalog: Option<BucketCatalog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Fields of a bucket registration that can be updated. `None` leaves a
/// field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketRegistrationPatch {
    pub bucket_display_name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl From<BucketRegistrationPatch> for Vec<JsonPatchOperation> {
    fn from(patch: BucketRegistrationPatch) -> Self {
        let credentials = [
            ("access_key", patch.access_key),
            ("secret_key", patch.secret_key),
        ];
        let mut ops = replace_present([
            ("bucket_display_name", patch.bucket_display_name.map(Value::from)),
            ("description", patch.description.map(Value::from)),
            ("tags", patch.tags.map(Value::from)),
        ]);
        ops.extend(credentials.into_iter().filter_map(|(field, value)| {
            value.map(|v| JsonPatchOperation::replace(format!("/bucket_details/{field}"), v))
        }));
        ops
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketObjects {
    #[serde(default)]
    pub objects: Vec<String>,
}
