//! JSON body extractor with `validator` checks
//!
//! Malformed JSON is answered with 400, field violations with 422 and a
//! `field: message` list in the envelope's `error`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiError;

/// ```ignore
/// async fn start(ValidatedJson(body): ValidatedJson<StartSessionRequest>) { .. }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Invalid(ValidationErrors),
}

fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    fields.sort();

    if fields.is_empty() {
        "Validation failed".to_string()
    } else {
        fields.join("; ")
    }
}

impl From<ValidatedJsonRejection> for ApiError {
    fn from(rejection: ValidatedJsonRejection) -> Self {
        match rejection {
            ValidatedJsonRejection::Json(e) => ApiError::bad_request(format!("Invalid JSON: {}", e)),
            ValidatedJsonRejection::Invalid(errors) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, describe(&errors))
            }
        }
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct PackageBody {
        #[validate(length(min = 1, max = 40))]
        name: String,
        #[validate(range(min = 1))]
        minutes: i64,
    }

    async fn handler(ValidatedJson(body): ValidatedJson<PackageBody>) -> String {
        format!("{}:{}", body.name, body.minutes)
    }

    async fn send(body: &'static str) -> StatusCode {
        let app = Router::new().route("/packages", post(handler));
        let req = Request::builder()
            .method("POST")
            .uri("/packages")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn valid_body_passes() {
        assert_eq!(send(r#"{"name":"1 hour","minutes":60}"#).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        assert_eq!(send("{name").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_fields_are_422() {
        assert_eq!(
            send(r#"{"name":"","minutes":0}"#).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
