mod delete;
mod landing;
mod list;
mod retrieve;
mod upload;

pub use delete::delete;
pub use landing::landing;
pub use list::list;
pub use retrieve::{retrieve_any, retrieve_id, retrieve_temp, thumbnail};
pub use upload::{anon_upload, upload};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::response::ApiError;

/// Scheme and host the client reached us on, for building the URLs echoed
/// back in upload responses. Scheme comes from the reverse proxy's
/// `x-forwarded-proto` when present.
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestOrigin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
            .to_string();
        let host = parts
            .headers
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::bad_request("Host header is required"))?
            .to_string();

        Ok(RequestOrigin { scheme, host })
    }
}

/// Uniform JSON 404 for unmatched routes.
pub async fn not_found_fallback() -> ApiError {
    ApiError::not_found("Not Found")
}
