//! Operation descriptors and the per-call request builder.
//!
//! # Design
//! An [`Operation`] is a `const` description of one remote call. Each call
//! site turns it into a [`RequestBuilder`], fills in path parameters, query
//! parameters, headers and a body, and hands the builder to the pipeline. The
//! builder does no I/O. [`RequestBuilder::build`] either produces a complete
//! [`HttpRequest`] or fails with `MalformedRequest`, so an unresolved
//! placeholder never reaches the network.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::auth::is_token_char;
use crate::error::{ApiError, Result};
use crate::http::{set_header, HttpMethod, HttpRequest};
use crate::multipart::Multipart;
use crate::patch::JsonPatchOperation;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const INSTANCE_ID_HEADER: &str = "AuthInstanceId";

pub const JSON: &str = "application/json";
pub const JSON_PATCH: &str = "application/json-patch+json";

/// RFC 3986 unreserved characters stay literal, everything else is encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Immutable description of one API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path relative to the base URL, with `{name}` placeholders.
    pub path: &'static str,
    /// Status the service documents for success.
    pub success_status: u16,
    /// Whether a retry can never apply the call twice. GETs always are.
    pub idempotent: bool,
}

impl Operation {
    pub const fn new(
        name: &'static str,
        method: HttpMethod,
        path: &'static str,
        success_status: u16,
    ) -> Self {
        Self {
            name,
            method,
            path,
            success_status,
            idempotent: matches!(method, HttpMethod::Get),
        }
    }

    pub const fn get(name: &'static str, path: &'static str) -> Self {
        Self::new(name, HttpMethod::Get, path, 200)
    }

    pub const fn post(name: &'static str, path: &'static str, success_status: u16) -> Self {
        Self::new(name, HttpMethod::Post, path, success_status)
    }

    pub const fn patch(name: &'static str, path: &'static str) -> Self {
        Self::new(name, HttpMethod::Patch, path, 200)
    }

    pub const fn delete(name: &'static str, path: &'static str) -> Self {
        Self::new(name, HttpMethod::Delete, path, 204)
    }

    /// Mark the operation safe to retry regardless of method.
    pub const fn idempotent(self) -> Self {
        Self {
            idempotent: true,
            ..self
        }
    }

    pub fn builder(self) -> RequestBuilder {
        RequestBuilder::new(self)
    }
}

#[derive(Debug, Clone)]
enum Body {
    Json(Bytes),
    JsonPatch(Bytes),
    Raw { content_type: String, data: Bytes },
    Multipart(Multipart),
}

/// Mutable accumulator for one call. Consumed by `build`.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    operation: Operation,
    path_params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    retry_opt_in: bool,
    // Body serialization errors surface from `build`, keeping the chain fluent.
    deferred: Option<ApiError>,
}

impl RequestBuilder {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            path_params: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            retry_opt_in: false,
            deferred: None,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Substitute the `{name}` placeholder. Setting the same name twice keeps
    /// the last value.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.path_params.retain(|(k, _)| *k != name);
        self.path_params.push((name, value.into()));
        self
    }

    /// Append a query parameter. Repeated keys are kept in call order.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present. `Some("")` is
    /// still sent, as an empty value.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Append a query parameter the call cannot run without. A blank value
    /// makes `build` fail with `MalformedRequest`.
    pub fn required_query(self, key: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            let reason = format!("missing required query parameter {key}");
            return self.reject(reason);
        }
        self.query(key, value)
    }

    /// Make `build` fail with `MalformedRequest`. The first rejection wins.
    pub fn reject(mut self, reason: impl Into<String>) -> Self {
        if self.deferred.is_none() {
            self.deferred = Some(ApiError::malformed(self.operation.name, reason));
        }
        self
    }

    /// Append one `key=value` pair per item, preserving order.
    pub fn query_all<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        for value in values {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Set a header, replacing defaults and earlier values of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// Scope the call to a service instance. Overrides the configured default.
    pub fn instance_id(self, instance_id: impl Into<String>) -> Self {
        self.header(INSTANCE_ID_HEADER, instance_id)
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Some(Body::Json(bytes.into())),
            Err(e) => self.deferred = Some(ApiError::Serialization(e.to_string())),
        }
        self
    }

    /// Use a JSON Patch document as the body.
    pub fn json_patch(mut self, operations: &[JsonPatchOperation]) -> Self {
        match serde_json::to_vec(operations) {
            Ok(bytes) => self.body = Some(Body::JsonPatch(bytes.into())),
            Err(e) => self.deferred = Some(ApiError::Serialization(e.to_string())),
        }
        self
    }

    pub fn bytes(mut self, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.body = Some(Body::Raw {
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    pub fn multipart(mut self, form: Multipart) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Allow retries for this call even if the operation is not idempotent.
    pub fn retry_non_idempotent(mut self) -> Self {
        self.retry_opt_in = true;
        self
    }

    /// Whether a failed attempt of this call may be retried.
    pub fn is_retryable(&self, retry_all_methods: bool) -> bool {
        self.operation.idempotent || self.retry_opt_in || retry_all_methods
    }

    /// Produce the final request. `default_headers` lose to operation headers,
    /// which lose to headers set on the builder.
    pub fn build(self, base_url: &str, default_headers: &[(String, String)]) -> Result<HttpRequest> {
        if let Some(err) = self.deferred {
            return Err(err);
        }
        let op = self.operation;
        let path = render_path(&op, &self.path_params)?;

        let mut url = String::with_capacity(base_url.len() + path.len());
        url.push_str(base_url.trim_end_matches('/'));
        url.push_str(&path);
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        let mut headers = Vec::new();
        for (name, value) in default_headers {
            set_header(&mut headers, name.clone(), value.clone());
        }
        set_header(&mut headers, ACCEPT, JSON);

        let body = match self.body {
            None => None,
            Some(Body::Json(data)) => {
                set_header(&mut headers, CONTENT_TYPE, JSON);
                Some(data)
            }
            Some(Body::JsonPatch(data)) => {
                set_header(&mut headers, CONTENT_TYPE, JSON_PATCH);
                Some(data)
            }
            Some(Body::Raw { content_type, data }) => {
                set_header(&mut headers, CONTENT_TYPE, content_type);
                Some(data)
            }
            Some(Body::Multipart(form)) => {
                set_header(&mut headers, CONTENT_TYPE, form.content_type());
                Some(form.encode())
            }
        };

        for (name, value) in self.headers {
            set_header(&mut headers, name, value);
        }
        check_headers(&op, &headers)?;

        Ok(HttpRequest {
            method: op.method,
            url,
            headers,
            body,
        })
    }
}

/// Substitute every placeholder in the operation's path template.
fn render_path(op: &Operation, params: &[(String, String)]) -> Result<String> {
    let template = op.path;
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(['{', '}']) {
        if rest.as_bytes()[open] == b'}' {
            return Err(ApiError::malformed(op.name, format!("unbalanced '}}' in path template {template}")));
        }
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| ApiError::malformed(op.name, format!("unterminated placeholder in path template {template}")))?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err(ApiError::malformed(op.name, format!("invalid placeholder in path template {template}")));
        }
        let value = params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| ApiError::malformed(op.name, format!("unresolved path placeholder {{{name}}}")))?;
        if value.is_empty() {
            return Err(ApiError::malformed(op.name, format!("empty value for path placeholder {{{name}}}")));
        }
        // URL parsing collapses dot segments, encoded or not.
        if value == "." || value == ".." {
            return Err(ApiError::malformed(op.name, format!("{value:?} is not a valid value for path placeholder {{{name}}}")));
        }
        rendered.extend(utf8_percent_encode(value, PATH_SEGMENT));
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);

    let unknown: Vec<&str> = params
        .iter()
        .map(|(k, _)| k.as_str())
        .filter(|k| !template.contains(&format!("{{{k}}}")))
        .collect();
    if !unknown.is_empty() {
        return Err(ApiError::malformed(op.name, format!("unknown path parameter(s): {}", unknown.join(", "))));
    }
    Ok(rendered)
}

/// Header names must be RFC 7230 tokens and values free of control
/// characters other than tab.
fn check_headers(op: &Operation, headers: &[(String, String)]) -> Result<()> {
    for (name, value) in headers {
        if name.is_empty() || !name.bytes().all(is_token_char) {
            return Err(ApiError::malformed(op.name, format!("invalid header name {name:?}")));
        }
        if value.bytes().any(|b| b.is_ascii_control() && b != b'\t') {
            return Err(ApiError::malformed(op.name, format!("header {name} contains a control character")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::JsonPatchOperation;

    const BASE: &str = "https://lakehouse.example.com/api/v2/";
    const GET_TABLE: Operation = Operation::get(
        "get_table",
        "/catalogs/{catalog_id}/schemas/{schema_id}/tables/{table_id}",
    );
    const CREATE_BUCKET: Operation = Operation::post("create_bucket", "/bucket_registrations", 201);
    const DELETE_BUCKET: Operation =
        Operation::delete("delete_bucket", "/bucket_registrations/{bucket_id}").idempotent();

    fn table_builder() -> RequestBuilder {
        GET_TABLE
            .builder()
            .path_param("table_id", "orders")
            .path_param("catalog_id", "iceberg_data")
            .path_param("schema_id", "sales")
    }

    #[test]
    fn descriptors_default_idempotency_by_method() {
        assert!(GET_TABLE.idempotent);
        assert!(!CREATE_BUCKET.idempotent);
        assert!(DELETE_BUCKET.idempotent);
        assert_eq!(DELETE_BUCKET.success_status, 204);
    }

    #[test]
    fn path_params_are_order_independent() {
        let req = table_builder().build(BASE, &[]).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://lakehouse.example.com/api/v2/catalogs/iceberg_data/schemas/sales/tables/orders"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn reserved_characters_are_encoded() {
        let req = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "a/b c?d#e%")
            .build(BASE, &[])
            .unwrap();
        assert_eq!(
            req.url,
            "https://lakehouse.example.com/api/v2/bucket_registrations/a%2Fb%20c%3Fd%23e%25"
        );
        let encoded = req.url.rsplit('/').next().unwrap();
        let decoded = percent_encoding::percent_decode_str(encoded)
            .decode_utf8()
            .unwrap();
        assert_eq!(decoded, "a/b c?d#e%");
    }

    #[test]
    fn unresolved_placeholder_is_malformed() {
        let err = GET_TABLE
            .builder()
            .path_param("catalog_id", "c")
            .path_param("schema_id", "s")
            .build(BASE, &[])
            .unwrap_err();
        match err {
            ApiError::MalformedRequest { operation, reason } => {
                assert_eq!(operation, "get_table");
                assert!(reason.contains("{table_id}"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_and_empty_params_are_malformed() {
        let err = table_builder()
            .path_param("column_id", "x")
            .build(BASE, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { ref reason, .. } if reason.contains("column_id")));

        let err = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "")
            .build(BASE, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { .. }));
    }

    #[test]
    fn broken_templates_are_malformed() {
        for path in ["/a/{id", "/a/id}", "/a/{}", "/a/{{id}}"] {
            let op = Operation::get("broken", path);
            let err = op.builder().path_param("id", "1").build(BASE, &[]).unwrap_err();
            assert!(matches!(err, ApiError::MalformedRequest { .. }), "{path}");
        }
    }

    #[test]
    fn repeated_query_keys_keep_order() {
        let req = Operation::get("list_tables", "/tables")
            .builder()
            .query_all("tags", ["b", "a"])
            .query("engine_id", "presto01")
            .query_all("tags", ["b"])
            .build(BASE, &[])
            .unwrap();
        assert!(req.url.ends_with("/tables?tags=b&tags=a&engine_id=presto01&tags=b"), "{}", req.url);
    }

    #[test]
    fn absent_query_values_are_omitted_but_empty_ones_kept() {
        let req = Operation::get("list_objects", "/objects")
            .builder()
            .query_opt("path", None::<&str>)
            .query_opt("prefix", Some(""))
            .query("name", "a b&c")
            .build(BASE, &[])
            .unwrap();
        assert!(req.url.ends_with("/objects?prefix=&name=a+b%26c"), "{}", req.url);
    }

    #[test]
    fn blank_required_query_is_malformed() {
        let err = Operation::get("list_schemas", "/catalogs/{catalog_id}/schemas")
            .builder()
            .path_param("catalog_id", "iceberg_data")
            .required_query("engine_id", " ")
            .build(BASE, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { ref reason, .. } if reason.contains("engine_id")));
    }

    #[test]
    fn first_rejection_wins() {
        let err = CREATE_BUCKET
            .builder()
            .reject("first")
            .reject("second")
            .build(BASE, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { ref reason, .. } if reason == "first"));
    }

    #[test]
    fn header_precedence() {
        let defaults = vec![
            ("accept".to_string(), "text/plain".to_string()),
            ("X-Client".to_string(), "default".to_string()),
            (INSTANCE_ID_HEADER.to_string(), "crn:default".to_string()),
        ];
        let req = CREATE_BUCKET
            .builder()
            .json(&serde_json::json!({"bucket_display_name": "b"}))
            .header("x-client", "caller")
            .instance_id("crn:caller")
            .build(BASE, &defaults)
            .unwrap();
        assert_eq!(req.header("Accept"), Some(JSON));
        assert_eq!(req.header("Content-Type"), Some(JSON));
        assert_eq!(req.header("X-Client"), Some("caller"));
        assert_eq!(req.header(INSTANCE_ID_HEADER), Some("crn:caller"));
        assert_eq!(req.headers.len(), 4);
    }

    #[test]
    fn dot_segments_are_malformed() {
        for value in [".", ".."] {
            let err = DELETE_BUCKET
                .builder()
                .path_param("bucket_id", value)
                .build(BASE, &[])
                .unwrap_err();
            assert!(matches!(err, ApiError::MalformedRequest { operation: "delete_bucket", .. }));
        }

        let req = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "...")
            .build(BASE, &[])
            .unwrap();
        assert!(req.url.ends_with("/bucket_registrations/..."));
    }

    #[test]
    fn invalid_headers_are_malformed() {
        let err = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "b1")
            .header("X-Trace", "a\r\nX-Injected: 1")
            .build(BASE, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { operation: "delete_bucket", .. }));

        let err = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "b1")
            .header("X Trace", "1")
            .build(BASE, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { .. }));

        let defaults = vec![(INSTANCE_ID_HEADER.to_string(), "crn:v1\u{7f}".to_string())];
        let err = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "b1")
            .build(BASE, &defaults)
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest { .. }));

        let req = DELETE_BUCKET
            .builder()
            .path_param("bucket_id", "b1")
            .header("X-Note", "tab\tseparated")
            .build(BASE, &[])
            .unwrap();
        assert_eq!(req.header("x-note"), Some("tab\tseparated"));
    }

    #[test]
    fn json_patch_body_keeps_explicit_null() {
        let ops = vec![
            JsonPatchOperation::replace("/description", serde_json::Value::Null),
            JsonPatchOperation::remove("/tags"),
        ];
        let req = Operation::patch("update_bucket", "/bucket_registrations/{bucket_id}")
            .builder()
            .path_param("bucket_id", "b1")
            .json_patch(&ops)
            .build(BASE, &[])
            .unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.header(CONTENT_TYPE), Some(JSON_PATCH));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!([
                {"op": "replace", "path": "/description", "value": null},
                {"op": "remove", "path": "/tags"}
            ])
        );
    }

    #[test]
    fn raw_bytes_body() {
        let req = CREATE_BUCKET
            .builder()
            .bytes("application/octet-stream", vec![1u8, 2, 3])
            .build(BASE, &[])
            .unwrap();
        assert_eq!(req.header(CONTENT_TYPE), Some("application/octet-stream"));
        assert_eq!(req.body.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn serialization_failure_surfaces_from_build() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], "non-string keys cannot be JSON");
        let err = CREATE_BUCKET.builder().json(&map).build(BASE, &[]).unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn retry_eligibility() {
        assert!(GET_TABLE.builder().is_retryable(false));
        assert!(DELETE_BUCKET.builder().is_retryable(false));
        assert!(!CREATE_BUCKET.builder().is_retryable(false));
        assert!(CREATE_BUCKET.builder().is_retryable(true));
        assert!(CREATE_BUCKET.builder().retry_non_idempotent().is_retryable(false));
    }
}
