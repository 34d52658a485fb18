use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};

use crate::JsonResponse;

const NOT_FOUND_PAGE: &str = include_str!("../templates/core/404.html");
const SERVER_ERROR_PAGE: &str = include_str!("../templates/core/500.html");

#[derive(Debug)]
pub enum RequestError {
    NotFound,
    NotAuthorized(&'static str),
    Forbidden,
    RunTimeError(&'static str),
    ServerError,
    DatabaseError(sqlx::Error),
    TemplateError(tera::Error),
}

#[derive(serde::Serialize)]
pub struct RequestErrorJsonWrapper {
    errors: RequestErrorJson,
}

#[derive(serde::Serialize)]
pub struct RequestErrorJson {
    body: Vec<String>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: RequestErrorJson {
                body: vec![error.to_string()],
            },
        }
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl From<tera::Error> for RequestError {
    fn from(value: tera::Error) -> Self {
        Self::TemplateError(value)
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::DatabaseError(e) => write!(f, "database error: {}", e),
            RequestError::TemplateError(e) => write!(f, "template error: {}", e),
            other => f.write_str(other.status_and_message().1),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    /// True when the database rejected a write because of a UNIQUE index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                e.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }

    fn status_and_message(&self) -> (StatusCode, &str) {
        match self {
            RequestError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            RequestError::NotAuthorized(message) => (StatusCode::UNAUTHORIZED, message),
            RequestError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            RequestError::RunTimeError(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            RequestError::ServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            RequestError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            RequestError::TemplateError(e) => {
                tracing::error!("Template error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, message) = self.status_and_message();
        (status_code, Json(RequestErrorJsonWrapper::new(message)))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, message) = self.status_and_message();
        match status_code {
            StatusCode::NOT_FOUND => (status_code, Html(NOT_FOUND_PAGE)).into_response(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                (status_code, Html(SERVER_ERROR_PAGE)).into_response()
            }
            _ => (status_code, message.to_owned()).into_response(),
        }
    }
}
