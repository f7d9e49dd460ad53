use std::convert::Infallible;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use crate::domain::errors::DomainError;

/// JSON body of every registry reply
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(status: StatusCode, text: impl Into<String>) -> Response {
    let body = MessageResponse {
        message: text.into(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Error reply: a status plus a user-facing message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_response(self) -> Response {
        message(self.status, self.message)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match &error {
            DomainError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, error.to_string()),
            DomainError::Duplicate { .. } | DomainError::Validation(_) => {
                Self::new(StatusCode::BAD_REQUEST, error.to_string())
            }
            DomainError::Open(_) => {
                tracing::warn!("Source unavailable: {}", error);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Unable to open source")
            }
            DomainError::Decode(_) | DomainError::Encode(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Unable to fetch frame")
            }
            _ => {
                tracing::error!("Request failed: {}", error);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Turn warp's own rejections into JSON replies
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, text) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e))
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON body".to_string(),
        )
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        tracing::error!("Unhandled rejection: {:?}", rejection);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(message(status, text))
}
