use super::LakehouseClient;
use crate::error::Result;
use crate::operations::buckets;
use crate::patch::JsonPatchOperation;
use crate::pipeline::ResponseEnvelope;
use crate::transport::Transport;
use crate::types::{
    BucketObjects, BucketRegistration, BucketRegistrationCollection, CreateBucketRegistration,
    Empty, SuccessResponse,
};

impl<T: Transport> LakehouseClient<T> {
    pub async fn list_bucket_registrations(
        &self,
    ) -> Result<ResponseEnvelope<BucketRegistrationCollection>> {
        self.execute(buckets::list_bucket_registrations()).await
    }

    pub async fn create_bucket_registration(
        &self,
        input: &CreateBucketRegistration,
    ) -> Result<ResponseEnvelope<BucketRegistration>> {
        self.execute(buckets::create_bucket_registration(input)).await
    }

    pub async fn get_bucket_registration(
        &self,
        bucket_id: &str,
    ) -> Result<ResponseEnvelope<BucketRegistration>> {
        self.execute(buckets::get_bucket_registration(bucket_id)).await
    }

    /// Apply a partial update. Accepts a `BucketRegistrationPatch` or raw
    /// JSON Patch operations.
    pub async fn update_bucket_registration(
        &self,
        bucket_id: &str,
        patch: impl Into<Vec<JsonPatchOperation>>,
    ) -> Result<ResponseEnvelope<BucketRegistration>> {
        let patch = patch.into();
        self.execute(buckets::update_bucket_registration(bucket_id, &patch))
            .await
    }

    pub async fn delete_bucket_registration(
        &self,
        bucket_id: &str,
    ) -> Result<ResponseEnvelope<Empty>> {
        self.execute(buckets::delete_bucket_registration(bucket_id)).await
    }

    pub async fn list_bucket_objects(
        &self,
        bucket_id: &str,
        path: Option<&str>,
    ) -> Result<ResponseEnvelope<BucketObjects>> {
        self.execute(buckets::list_bucket_objects(bucket_id, path)).await
    }

    pub async fn activate_bucket(&self, bucket_id: &str) -> Result<ResponseEnvelope<SuccessResponse>> {
        self.execute(buckets::activate_bucket(bucket_id)).await
    }

    pub async fn deactivate_bucket(&self, bucket_id: &str) -> Result<ResponseEnvelope<Empty>> {
        self.execute(buckets::deactivate_bucket(bucket_id)).await
    }
}
