use crate::multipart::{Multipart, Part};
use crate::operation::{Operation, RequestBuilder};
use crate::patch::JsonPatchOperation;
use crate::types::{CreateDatabaseRegistration, CreateDriverRegistration};

pub const LIST_DATABASE_REGISTRATIONS: Operation =
    Operation::get("list_database_registrations", "/database_registrations");
pub const CREATE_DATABASE_REGISTRATION: Operation =
    Operation::post("create_database_registration", "/database_registrations", 201);
pub const GET_DATABASE_REGISTRATION: Operation =
    Operation::get("get_database_registration", "/database_registrations/{database_id}");
pub const UPDATE_DATABASE_REGISTRATION: Operation =
    Operation::patch("update_database_registration", "/database_registrations/{database_id}");
pub const DELETE_DATABASE_REGISTRATION: Operation =
    Operation::delete("delete_database_registration", "/database_registrations/{database_id}")
        .idempotent();
pub const LIST_DRIVER_REGISTRATIONS: Operation =
    Operation::get("list_driver_registrations", "/driver_registrations");
pub const CREATE_DRIVER_REGISTRATION: Operation =
    Operation::post("create_driver_registration", "/driver_registrations", 201);

const DATABASE_ID: &str = "database_id";
const JAR: &str = "application/java-archive";

pub fn list_database_registrations() -> RequestBuilder {
    LIST_DATABASE_REGISTRATIONS.builder()
}

pub fn create_database_registration(input: &CreateDatabaseRegistration) -> RequestBuilder {
    let builder = CREATE_DATABASE_REGISTRATION.builder();
    if input.database_details.hostname.trim().is_empty() {
        return builder.reject("database_details.hostname is required");
    }
    if input.database_details.port == 0 {
        return builder.reject("database_details.port must be non-zero");
    }
    builder.json(input)
}

pub fn get_database_registration(database_id: &str) -> RequestBuilder {
    GET_DATABASE_REGISTRATION
        .builder()
        .path_param(DATABASE_ID, database_id)
}

pub fn update_database_registration(
    database_id: &str,
    patch: &[JsonPatchOperation],
) -> RequestBuilder {
    UPDATE_DATABASE_REGISTRATION
        .builder()
        .path_param(DATABASE_ID, database_id)
        .json_patch(patch)
}

pub fn delete_database_registration(database_id: &str) -> RequestBuilder {
    DELETE_DATABASE_REGISTRATION
        .builder()
        .path_param(DATABASE_ID, database_id)
}

pub fn list_driver_registrations() -> RequestBuilder {
    LIST_DRIVER_REGISTRATIONS.builder()
}

/// Upload a driver archive as `multipart/form-data`.
pub fn create_driver_registration(input: &CreateDriverRegistration) -> RequestBuilder {
    let builder = CREATE_DRIVER_REGISTRATION.builder();
    if input.driver.is_empty() {
        return builder.reject("driver archive is empty");
    }
    if input.driver_name.trim().is_empty() {
        return builder.reject("driver_name is required");
    }
    let form = Multipart::new()
        .part(Part::file(
            "driver",
            input.driver_file_name.clone(),
            JAR,
            input.driver.clone(),
        ))
        .text("driver_name", input.driver_name.clone())
        .text("connection_type", input.connection_type.clone())
        .text_opt("version", input.version.clone());
    builder.multipart(form)
}
