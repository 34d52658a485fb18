use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::errors::RequestError;

mod about;
mod admin;
mod posts;
mod users;

pub use about::*;
pub use admin::*;
pub use posts::*;
pub use users::*;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> RequestError {
    tracing::debug!("No route for {}", uri);
    RequestError::NotFound
}

/// A plain `302 Found` redirect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// A `302 Found` redirect that also sets a cookie.
pub fn found_with_cookie(location: &str, cookie: String) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_owned()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}
