//! Generic CRUD endpoint over a [`ResourceStore`].
//!
//! Every v1 endpoint shares these semantics and differs only in its
//! [`ResourceSpec`]:
//!
//! | Request | Success | Failures |
//! |---------|---------|----------|
//! | `GET /{endpoint}` | 200, records sorted by id | 400 unknown filter column |
//! | `GET /{endpoint}/{id}` | 200 | 404 |
//! | `POST /{endpoint}` | 201 + `Location` | 415, 422, 409 |
//! | `PUT /{endpoint}/{id}` | 204 replaced, 201 created | 415, 422 |
//! | `DELETE /{endpoint}/{id}` | 204 | 404 |
//!
//! Collection filters compare top-level string fields for equality, so
//! `?full_name=Jane%20Doe` matches records whose `full_name` is exactly
//! `Jane Doe`.

use http::header::{HeaderValue, LOCATION};
use http::StatusCode;
use noma_core::{
    identifier, ApiError, ApiRequest, ApiResult, BoxFuture, EndpointHandler, HttpMethod, Response,
    ResponseExt,
};
use serde_json::Value;

use crate::store::{Record, ResourceStore};

/// Static description of one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Endpoint name as it appears in the URL.
    pub endpoint: &'static str,
    /// Singular display name used in messages, e.g. `Contact`.
    pub entity: &'static str,
    /// Accepted methods, in `Allow` header order.
    pub methods: &'static [HttpMethod],
    /// Known top-level fields. Bodies and filters may only use these.
    pub columns: &'static [&'static str],
    /// Fields that must be non-empty strings on write.
    pub required: &'static [&'static str],
}

/// A CRUD endpoint backed by an in-memory store.
#[derive(Debug, Clone)]
pub struct ResourceEndpoint {
    spec: ResourceSpec,
    store: ResourceStore,
    collection_path: String,
}

impl ResourceEndpoint {
    /// Creates an endpoint serving `store`.
    ///
    /// `collection_path` is the public URL of the collection, e.g.
    /// `/api/v1/contacts`; `Location` headers are built from it.
    pub fn new(spec: ResourceSpec, store: ResourceStore, collection_path: impl Into<String>) -> Self {
        Self {
            spec,
            store,
            collection_path: collection_path.into(),
        }
    }

    /// Returns the resource description.
    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    /// Returns the backing store.
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    fn not_found(&self) -> ApiError {
        ApiError::not_found(format!("{} not found", self.spec.entity))
    }

    fn list(&self, request: &ApiRequest) -> ApiResult<Response> {
        let filters = request.query_pairs()?;
        if let Some((column, _)) = filters
            .iter()
            .find(|(column, _)| !self.spec.columns.contains(&column.as_str()))
        {
            return Err(ApiError::bad_request(format!(
                "Invalid request: Unknown filter column {column}"
            )));
        }

        let records = self.store.list(|record| {
            filters
                .iter()
                .all(|(column, value)| record.get(column).and_then(Value::as_str) == Some(value.as_str()))
        });
        Response::data(StatusCode::OK, &records)
    }

    fn fetch(&self, id: &str) -> ApiResult<Response> {
        let record = self.store.get(id).ok_or_else(|| self.not_found())?;
        Response::data(StatusCode::OK, &record)
    }

    fn create(&self, request: &ApiRequest) -> ApiResult<Response> {
        let mut record = self.body_record(request)?;

        let id = match record.get("id") {
            None => return Err(ApiError::unprocessable("Invalid request body: id is required")),
            Some(value) => body_id(value)?,
        };
        if let Some(path_id) = request.identifier() {
            if path_id != id {
                return Err(ApiError::unprocessable("Identifier mismatch"));
            }
        }
        record.insert("id".to_string(), Value::String(id.clone()));

        if !self.store.insert_new(&id, record.clone()) {
            return Err(ApiError::conflict(format!("{} already exists", self.spec.entity)));
        }

        tracing::debug!(endpoint = self.spec.endpoint, id = %id, "Created resource");
        self.created(&id, &record)
    }

    fn replace(&self, request: &ApiRequest, id: &str) -> ApiResult<Response> {
        let mut record = self.body_record(request)?;

        if let Some(value) = record.get("id") {
            if body_id(value)? != id {
                return Err(ApiError::unprocessable("Identifier mismatch"));
            }
        }
        record.insert("id".to_string(), Value::String(id.to_string()));

        if self.store.upsert(id, record.clone()) {
            tracing::debug!(endpoint = self.spec.endpoint, id = %id, "Replaced resource");
            Ok(Response::empty(StatusCode::NO_CONTENT))
        } else {
            tracing::debug!(endpoint = self.spec.endpoint, id = %id, "Created resource");
            self.created(id, &record)
        }
    }

    fn delete(&self, id: &str) -> ApiResult<Response> {
        if !self.store.remove(id) {
            return Err(self.not_found());
        }
        tracing::debug!(endpoint = self.spec.endpoint, id = %id, "Deleted resource");
        Ok(Response::empty(StatusCode::NO_CONTENT))
    }

    fn created(&self, id: &str, record: &Record) -> ApiResult<Response> {
        let location = format!("{}/{id}", self.collection_path.trim_end_matches('/'));
        let location = HeaderValue::from_str(&location)
            .map_err(|e| ApiError::internal_with_source("Failed to build Location header", e))?;

        let mut response = Response::data(StatusCode::CREATED, record)?;
        response.headers_mut().insert(LOCATION, location);
        Ok(response)
    }

    fn body_record(&self, request: &ApiRequest) -> ApiResult<Record> {
        if !request.has_json_content_type() {
            return Err(ApiError::unsupported_media_type(
                "Content type must be application/json",
            ));
        }

        let Some(Value::Object(body)) = request.parsed_body() else {
            return Err(ApiError::unprocessable(
                "Invalid request body: expected a JSON object",
            ));
        };

        if let Some(field) = body
            .keys()
            .find(|key| !self.spec.columns.contains(&key.as_str()))
        {
            return Err(ApiError::unprocessable(format!(
                "Invalid request body: unknown field {field}"
            )));
        }

        for field in self.spec.required {
            match body.get(*field) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                _ => {
                    return Err(ApiError::unprocessable(format!(
                        "Invalid request body: {field} must be a non-empty string"
                    )))
                }
            }
        }

        Ok(body.clone())
    }
}

/// Reads a body `id`, accepting either case.
fn body_id(value: &Value) -> ApiResult<String> {
    value
        .as_str()
        .map(str::to_lowercase)
        .filter(|id| identifier::is_valid(id))
        .ok_or_else(|| ApiError::unprocessable("Invalid request body: id must be a valid UUID"))
}

impl EndpointHandler for ResourceEndpoint {
    fn endpoint(&self) -> &str {
        self.spec.endpoint
    }

    fn allowed_methods(&self) -> &[HttpMethod] {
        self.spec.methods
    }

    fn handle<'a>(&'a self, request: ApiRequest) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let method = match request.http_method() {
                Some(method) => method,
                None => HttpMethod::try_from(request.method())?,
            };
            if !self.allows(method) {
                return Err(ApiError::method_not_allowed(format!(
                    "Method {method} is not allowed for endpoint {}",
                    self.spec.endpoint
                ))
                .with_allow(self.spec.methods));
            }

            match (method, request.identifier()) {
                (HttpMethod::Get, None) => self.list(&request),
                (HttpMethod::Get, Some(id)) => self.fetch(id),
                (HttpMethod::Post, _) => self.create(&request),
                (HttpMethod::Put, Some(id)) => self.replace(&request, id),
                (HttpMethod::Delete, Some(id)) => self.delete(id),
                (HttpMethod::Put | HttpMethod::Delete, None) => Err(ApiError::bad_request(
                    "Invalid request: Identifier is required",
                )),
            }
        })
    }
}
