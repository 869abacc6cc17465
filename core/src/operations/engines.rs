//! Engine operations. Every engine family shares one set of descriptors; the
//! family is substituted into the `{engine_kind}` segment.

use serde_json::{Map, Value};

use crate::error::{ApiError, Result};
use crate::operation::{Operation, RequestBuilder};
use crate::patch::JsonPatchOperation;
use crate::pipeline::ResponseEnvelope;
use crate::types::{CreateEngine, Engine, EngineKind};

pub const LIST_ENGINES: Operation = Operation::get("list_engines", "/{engine_kind}");
pub const CREATE_ENGINE: Operation = Operation::post("create_engine", "/{engine_kind}", 201);
pub const GET_ENGINE: Operation = Operation::get("get_engine", "/{engine_kind}/{engine_id}");
pub const UPDATE_ENGINE: Operation = Operation::patch("update_engine", "/{engine_kind}/{engine_id}");
pub const DELETE_ENGINE: Operation =
    Operation::delete("delete_engine", "/{engine_kind}/{engine_id}").idempotent();
pub const PAUSE_ENGINE: Operation =
    Operation::post("pause_engine", "/{engine_kind}/{engine_id}/pause", 201);
pub const RESUME_ENGINE: Operation =
    Operation::post("resume_engine", "/{engine_kind}/{engine_id}/resume", 201);

fn scoped(operation: Operation, kind: EngineKind) -> RequestBuilder {
    operation.builder().path_param("engine_kind", kind.collection())
}

fn engine(operation: Operation, kind: EngineKind, engine_id: &str) -> RequestBuilder {
    scoped(operation, kind).path_param("engine_id", engine_id)
}

pub fn list_engines(kind: EngineKind) -> RequestBuilder {
    scoped(LIST_ENGINES, kind)
}

pub fn create_engine(kind: EngineKind, input: &CreateEngine) -> RequestBuilder {
    scoped(CREATE_ENGINE, kind).json(input)
}

pub fn get_engine(kind: EngineKind, engine_id: &str) -> RequestBuilder {
    engine(GET_ENGINE, kind, engine_id)
}

pub fn update_engine(kind: EngineKind, engine_id: &str, patch: &[JsonPatchOperation]) -> RequestBuilder {
    engine(UPDATE_ENGINE, kind, engine_id).json_patch(patch)
}

pub fn delete_engine(kind: EngineKind, engine_id: &str) -> RequestBuilder {
    engine(DELETE_ENGINE, kind, engine_id)
}

pub fn pause_engine(kind: EngineKind, engine_id: &str) -> RequestBuilder {
    pausable(PAUSE_ENGINE, kind, engine_id)
}

pub fn resume_engine(kind: EngineKind, engine_id: &str) -> RequestBuilder {
    pausable(RESUME_ENGINE, kind, engine_id)
}

fn pausable(operation: Operation, kind: EngineKind, engine_id: &str) -> RequestBuilder {
    let builder = engine(operation, kind, engine_id);
    if kind.supports_pause() {
        builder
    } else {
        builder.reject(format!("{kind} cannot be paused or resumed"))
    }
}

/// Pull the engine list out of a list response, which keys it by collection
/// name (`{"presto_engines": [...]}`).
pub fn engines_from_collection(
    kind: EngineKind,
    envelope: ResponseEnvelope<Map<String, Value>>,
) -> Result<ResponseEnvelope<Vec<Engine>>> {
    let status = envelope.status;
    let payload = match envelope.payload {
        None => None,
        Some(mut body) => {
            let list = body.remove(kind.collection()).ok_or_else(|| ApiError::DecodeFailure {
                status,
                reason: format!("list_engines response has no {} member", kind.collection()),
            })?;
            let engines = serde_json::from_value(list).map_err(|e| ApiError::DecodeFailure {
                status,
                reason: format!("list_engines response: {e}"),
            })?;
            Some(engines)
        }
    };
    Ok(ResponseEnvelope {
        status,
        headers: envelope.headers,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;

    const BASE: &str = "http://localhost:3000";

    fn envelope(body: Value) -> ResponseEnvelope<Map<String, Value>> {
        ResponseEnvelope {
            status: 200,
            headers: Vec::new(),
            payload: body.as_object().cloned(),
        }
    }

    #[test]
    fn kind_selects_collection_path() {
        let req = get_engine(EngineKind::Milvus, "milvus01").build(BASE, &[]).unwrap();
        assert_eq!(req.url, "http://localhost:3000/milvus_services/milvus01");

        let req = pause_engine(EngineKind::Prestissimo, "p1").build(BASE, &[]).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/prestissimo_engines/p1/pause");
    }

    #[test]
    fn external_engines_cannot_pause() {
        for kind in [EngineKind::Db2, EngineKind::Netezza] {
            let err = resume_engine(kind, "e1").build(BASE, &[]).unwrap_err();
            assert!(matches!(err, ApiError::MalformedRequest { operation: "resume_engine", .. }));
        }
    }

    #[test]
    fn collection_is_unwrapped_by_kind() {
        let body = json!({"spark_engines": [{"engine_id": "spark01", "status": "running"}]});
        let engines = engines_from_collection(EngineKind::Spark, envelope(body)).unwrap();
        let engines = engines.payload.unwrap();
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].engine_id, "spark01");
    }

    #[test]
    fn wrong_collection_key_is_decode_failure() {
        let body = json!({"presto_engines": []});
        let err = engines_from_collection(EngineKind::Spark, envelope(body)).unwrap_err();
        assert!(matches!(err, ApiError::DecodeFailure { status: 200, .. }));
    }
}
