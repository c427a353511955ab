//! Response type and JSON helpers.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// The HTTP response type produced by the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Media type of every JSON body the API produces or accepts.
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Serialize)]
struct DataEnvelope<'a, T> {
    data: &'a T,
}

/// Extension trait for building API responses.
pub trait ResponseExt: Sized {
    /// Creates a response whose body is `{"data": <data>}`.
    fn data<T: Serialize>(status: StatusCode, data: &T) -> ApiResult<Self>;

    /// Creates a response whose body is `{"message": <message>}`.
    fn message(status: StatusCode, message: &str) -> Self;

    /// Creates a response without a body.
    fn empty(status: StatusCode) -> Self;

    /// Renders an error as its JSON envelope, merging the error's headers.
    fn from_error(error: &ApiError) -> Self;
}

impl ResponseExt for Response {
    fn data<T: Serialize>(status: StatusCode, data: &T) -> ApiResult<Self> {
        let body = serde_json::to_vec(&DataEnvelope { data })
            .map_err(|e| ApiError::internal_with_source("Failed to encode response", e))?;
        Ok(json(status, body))
    }

    fn message(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "message": message }).to_string();
        json(status, body.into_bytes())
    }

    fn empty(status: StatusCode) -> Self {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn from_error(error: &ApiError) -> Self {
        let mut response = Self::message(error.status_code(), error.message());
        for (name, value) in error.headers() {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

fn json(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

/// Collects the body of a response.
pub async fn read_body(response: Response) -> Bytes {
    use http_body_util::BodyExt;

    match response.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&read_body(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_data_envelope() {
        let response = Response::data(StatusCode::OK, &vec!["a", "b"]).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
        assert_eq!(body_json(response).await, serde_json::json!({ "data": ["a", "b"] }));
    }

    #[tokio::test]
    async fn test_message_envelope() {
        let response = Response::message(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, serde_json::json!({ "message": "Not Found" }));
    }

    #[tokio::test]
    async fn test_empty_has_no_content_type() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_from_error_merges_headers() {
        let error = ApiError::method_not_allowed("Method PATCH is not allowed for endpoint Contacts")
            .with_allow(&[HttpMethod::Get]);
        let response = Response::from_error(&error);

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(http::header::ALLOW).unwrap(), "GET");
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Method PATCH is not allowed for endpoint Contacts" })
        );
    }
}
