use serde_json::{Map, Value};

use super::LakehouseClient;
use crate::error::Result;
use crate::operations::engines;
use crate::patch::JsonPatchOperation;
use crate::pipeline::ResponseEnvelope;
use crate::transport::Transport;
use crate::types::{CreateEngine, Empty, Engine, EngineKind, SuccessResponse};

impl<T: Transport> LakehouseClient<T> {
    pub async fn list_engines(&self, kind: EngineKind) -> Result<ResponseEnvelope<Vec<Engine>>> {
        let envelope: ResponseEnvelope<Map<String, Value>> =
            self.execute(engines::list_engines(kind)).await?;
        engines::engines_from_collection(kind, envelope)
    }

    pub async fn create_engine(
        &self,
        kind: EngineKind,
        input: &CreateEngine,
    ) -> Result<ResponseEnvelope<Engine>> {
        self.execute(engines::create_engine(kind, input)).await
    }

    pub async fn get_engine(
        &self,
        kind: EngineKind,
        engine_id: &str,
    ) -> Result<ResponseEnvelope<Engine>> {
        self.execute(engines::get_engine(kind, engine_id)).await
    }

    pub async fn update_engine(
        &self,
        kind: EngineKind,
        engine_id: &str,
        patch: impl Into<Vec<JsonPatchOperation>>,
    ) -> Result<ResponseEnvelope<Engine>> {
        let patch = patch.into();
        self.execute(engines::update_engine(kind, engine_id, &patch))
            .await
    }

    pub async fn delete_engine(
        &self,
        kind: EngineKind,
        engine_id: &str,
    ) -> Result<ResponseEnvelope<Empty>> {
        self.execute(engines::delete_engine(kind, engine_id)).await
    }

    pub async fn pause_engine(
        &self,
        kind: EngineKind,
        engine_id: &str,
    ) -> Result<ResponseEnvelope<SuccessResponse>> {
        self.execute(engines::pause_engine(kind, engine_id)).await
    }

    pub async fn resume_engine(
        &self,
        kind: EngineKind,
        engine_id: &str,
    ) -> Result<ResponseEnvelope<SuccessResponse>> {
        self.execute(engines::resume_engine(kind, engine_id)).await
    }
}
