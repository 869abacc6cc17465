use super::LakehouseClient;
use crate::error::Result;
use crate::operations::databases;
use crate::patch::JsonPatchOperation;
use crate::pipeline::ResponseEnvelope;
use crate::transport::Transport;
use crate::types::{
    CreateDatabaseRegistration, CreateDriverRegistration, DatabaseRegistration,
    DatabaseRegistrationCollection, DriverRegistration, DriverRegistrationCollection, Empty,
};

impl<T: Transport> LakehouseClient<T> {
    pub async fn list_database_registrations(
        &self,
    ) -> Result<ResponseEnvelope<DatabaseRegistrationCollection>> {
        self.execute(databases::list_database_registrations()).await
    }

    pub async fn create_database_registration(
        &self,
        input: &CreateDatabaseRegistration,
    ) -> Result<ResponseEnvelope<DatabaseRegistration>> {
        self.execute(databases::create_database_registration(input)).await
    }

    pub async fn get_database_registration(
        &self,
        database_id: &str,
    ) -> Result<ResponseEnvelope<DatabaseRegistration>> {
        self.execute(databases::get_database_registration(database_id)).await
    }

    pub async fn update_database_registration(
        &self,
        database_id: &str,
        patch: impl Into<Vec<JsonPatchOperation>>,
    ) -> Result<ResponseEnvelope<DatabaseRegistration>> {
        let patch = patch.into();
        self.execute(databases::update_database_registration(database_id, &patch))
            .await
    }

    pub async fn delete_database_registration(
        &self,
        database_id: &str,
    ) -> Result<ResponseEnvelope<Empty>> {
        self.execute(databases::delete_database_registration(database_id)).await
    }

    pub async fn list_driver_registrations(
        &self,
    ) -> Result<ResponseEnvelope<DriverRegistrationCollection>> {
        self.execute(databases::list_driver_registrations()).await
    }

    pub async fn create_driver_registration(
        &self,
        input: &CreateDriverRegistration,
    ) -> Result<ResponseEnvelope<DriverRegistration>> {
        self.execute(databases::create_driver_registration(input)).await
    }
}
