//! Request extractors that validate their input.
//!
//! All of them reject with the standard error envelope instead of axum's
//! plain-text rejections, so clients see a `VALIDATION_ERROR` for malformed
//! JSON, bad path segments, wrong types, and failed field rules alike.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body deserialized and checked with [`Validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string deserialized and checked with [`Validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters, e.g. a resource id.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// A `multipart/form-data` body carrying an upload.
#[derive(Debug)]
pub struct UploadForm(pub Multipart);

impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(Self)
            .map_err(|rejection| ApiError::validation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct NewCategory {
        #[validate(length(min = 1, max = 100))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Listing {
        #[validate(range(min = 1))]
        page: Option<u32>,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json_is_accepted() {
        let ValidatedJson(category) =
            ValidatedJson::<NewCategory>::from_request(json_request(r#"{"name":"Tilapia"}"#), &())
                .await
                .unwrap();
        assert_eq!(category.name, "Tilapia");
    }

    #[tokio::test]
    async fn test_field_rule_failure_is_validation_error() {
        let err = ValidatedJson::<NewCategory>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.0.error_code(), "VALIDATION_ERROR");
        assert!(err.0.public_message().contains("name"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let err = ValidatedJson::<NewCategory>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }

    #[tokio::test]
    async fn test_query_rules_apply() {
        let request = Request::builder().uri("/?page=0").body(()).unwrap();
        let (mut parts, ()) = request.into_parts();
        let err = ValidatedQuery::<Listing>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }

    #[tokio::test]
    async fn test_upload_form_requires_multipart() {
        let err = UploadForm::from_request(json_request(r#"{"file":"x"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.0.status_code(), 400);
        assert_eq!(err.0.error_code(), "VALIDATION_ERROR");
    }
}
