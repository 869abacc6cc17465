use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::{replace_present, JsonPatchOperation};

/// Query engine families managed by the service. Each lives under its own
/// collection path with the same request shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Presto,
    Prestissimo,
    Db2,
    Netezza,
    Spark,
    Milvus,
}

impl EngineKind {
    pub const ALL: [EngineKind; 6] = [
        EngineKind::Presto,
        EngineKind::Prestissimo,
        EngineKind::Db2,
        EngineKind::Netezza,
        EngineKind::Spark,
        EngineKind::Milvus,
    ];

    /// Collection path segment, also the key of the list response.
    pub fn collection(&self) -> &'static str {
        match self {
            EngineKind::Presto => "presto_engines",
            EngineKind::Prestissimo => "prestissimo_engines",
            EngineKind::Db2 => "db2_engines",
            EngineKind::Netezza => "netezza_engines",
            EngineKind::Spark => "spark_engines",
            EngineKind::Milvus => "milvus_services",
        }
    }

    /// Db2 and Netezza engines are external registrations and cannot be
    /// paused.
    pub fn supports_pause(&self) -> bool {
        !matches!(self, EngineKind::Db2 | EngineKind::Netezza)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engine {
    pub engine_id: String,
    #[serde(default)]
    pub engine_display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub engine_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub associated_catalogs: Vec<String>,
    #[serde(default)]
    pub engine_details: Option<EngineDetails>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_on: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_config: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<NodeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<NodeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEngine {
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_catalogs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_details: Option<EngineDetails>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnginePatch {
    pub engine_display_name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<EnginePatch> for Vec<JsonPatchOperation> {
    fn from(patch: EnginePatch) -> Self {
        replace_present([
            ("engine_display_name", patch.engine_display_name.map(Value::from)),
            ("description", patch.description.map(Value::from)),
            ("tags", patch.tags.map(Value::from)),
        ])
    }
}
