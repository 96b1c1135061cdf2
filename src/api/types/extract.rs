//! JSON body and query extractors whose rejections use the API error format

use axum::{
    extract::{rejection, FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::{ApiErrorDetail, ApiErrorResponse, ApiErrorType};

/// JSON body extractor and responder
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

/// Query string extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

/// Extractor rejection rendered as an API error body
#[derive(Debug)]
pub struct ExtractRejection {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl IntoResponse for ExtractRejection {
    fn into_response(self) -> Response {
        let response = ApiErrorResponse {
            error: ApiErrorDetail {
                message: self.message,
                error_type: ApiErrorType::InvalidRequestError,
                param: None,
                code: Some(self.code.to_string()),
            },
        };

        (self.status, AxumJson(response)).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ExtractRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(ExtractRejection {
                status: rejection.status(),
                message: json_rejection_message(&rejection),
                code: "json_parse_error",
            }),
        }
    }
}

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ExtractRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(ExtractRejection {
                status: StatusCode::BAD_REQUEST,
                message: format!("Invalid query string: {}", rejection.body_text()),
                code: "query_parse_error",
            }),
        }
    }
}

fn json_rejection_message(rejection: &rejection::JsonRejection) -> String {
    use rejection::JsonRejection::*;

    match rejection {
        JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        BytesRejection(err) => format!("Failed to read request body: {}", err.body_text()),
        _ => "Invalid JSON request".to_string(),
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Params {
        q: String,
    }

    #[derive(Debug, Deserialize)]
    struct AddressBody {
        address: String,
    }

    #[tokio::test]
    async fn test_query_extracts() {
        let request = Request::builder().uri("/x?q=pune").body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();

        let Query(params) = Query::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(params.q, "pune");
    }

    #[tokio::test]
    async fn test_query_rejection_is_bad_request() {
        let request = Request::builder().uri("/x").body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();

        let rejection = Query::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_syntax_error_body() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let rejection = Json::<AddressBody>::from_request(request, &()).await.unwrap_err();
        let response = rejection.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "json_parse_error");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON syntax"));
    }

    #[tokio::test]
    async fn test_json_extracts() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"address": "FC Road"}"#))
            .unwrap();

        let Json(body) = Json::<AddressBody>::from_request(request, &()).await.unwrap();

        assert_eq!(body.address, "FC Road");
    }
}
