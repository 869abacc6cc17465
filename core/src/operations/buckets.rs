use crate::operation::{Operation, RequestBuilder};
use crate::patch::JsonPatchOperation;
use crate::types::CreateBucketRegistration;

pub const LIST_BUCKET_REGISTRATIONS: Operation =
    Operation::get("list_bucket_registrations", "/bucket_registrations");
pub const CREATE_BUCKET_REGISTRATION: Operation =
    Operation::post("create_bucket_registration", "/bucket_registrations", 201);
pub const GET_BUCKET_REGISTRATION: Operation =
    Operation::get("get_bucket_registration", "/bucket_registrations/{bucket_id}");
pub const UPDATE_BUCKET_REGISTRATION: Operation =
    Operation::patch("update_bucket_registration", "/bucket_registrations/{bucket_id}");
pub const DELETE_BUCKET_REGISTRATION: Operation =
    Operation::delete("delete_bucket_registration", "/bucket_registrations/{bucket_id}").idempotent();
pub const LIST_BUCKET_OBJECTS: Operation =
    Operation::get("list_bucket_objects", "/bucket_registrations/{bucket_id}/objects");
pub const ACTIVATE_BUCKET: Operation =
    Operation::post("activate_bucket", "/bucket_registrations/{bucket_id}/activate", 201);
pub const DEACTIVATE_BUCKET: Operation =
    Operation::delete("deactivate_bucket", "/bucket_registrations/{bucket_id}/activate").idempotent();

const BUCKET_ID: &str = "bucket_id";

pub fn list_bucket_registrations() -> RequestBuilder {
    LIST_BUCKET_REGISTRATIONS.builder()
}

pub fn create_bucket_registration(input: &CreateBucketRegistration) -> RequestBuilder {
    let builder = CREATE_BUCKET_REGISTRATION.builder();
    if input.bucket_details.bucket_name.trim().is_empty() {
        return builder.reject("bucket_details.bucket_name is required");
    }
    builder.json(input)
}

pub fn get_bucket_registration(bucket_id: &str) -> RequestBuilder {
    GET_BUCKET_REGISTRATION.builder().path_param(BUCKET_ID, bucket_id)
}

pub fn update_bucket_registration(bucket_id: &str, patch: &[JsonPatchOperation]) -> RequestBuilder {
    UPDATE_BUCKET_REGISTRATION
        .builder()
        .path_param(BUCKET_ID, bucket_id)
        .json_patch(patch)
}

pub fn delete_bucket_registration(bucket_id: &str) -> RequestBuilder {
    DELETE_BUCKET_REGISTRATION.builder().path_param(BUCKET_ID, bucket_id)
}

/// List object keys, optionally below `path`.
pub fn list_bucket_objects(bucket_id: &str, path: Option<&str>) -> RequestBuilder {
    LIST_BUCKET_OBJECTS
        .builder()
        .path_param(BUCKET_ID, bucket_id)
        .query_opt("path", path)
}

pub fn activate_bucket(bucket_id: &str) -> RequestBuilder {
    ACTIVATE_BUCKET.builder().path_param(BUCKET_ID, bucket_id)
}

pub fn deactivate_bucket(bucket_id: &str) -> RequestBuilder {
    DEACTIVATE_BUCKET.builder().path_param(BUCKET_ID, bucket_id)
}
