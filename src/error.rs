//! Error handling

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::generator::GenerationFailure;

/// Errors surfaced by the poster studio web handlers.
#[derive(Debug)]
pub enum StudioError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid CSRF token
    Unauthorized,
    /// When a requested resource is not found
    NotFound(String),
    /// Form input that failed validation
    Validation(String),
    /// A generation is already running for this session
    Busy,
    /// The image service gave us nothing usable
    Generation(GenerationFailure),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl StudioError {
    /// Status code the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            StudioError::BadRequest => StatusCode::BAD_REQUEST,
            StudioError::Unauthorized => StatusCode::UNAUTHORIZED,
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StudioError::Busy => StatusCode::CONFLICT,
            StudioError::Generation(_) => StatusCode::BAD_GATEWAY,
            StudioError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown on the form when a submission cannot be completed.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Validation(message) => message.clone(),
            StudioError::Busy => {
                "Still working on your last design, please wait for it to finish.".to_string()
            }
            StudioError::Generation(failure) => {
                format!("Image generation failed: {failure}. Please try again in a moment.")
            }
            StudioError::BadRequest => "Bad Request".to_string(),
            StudioError::Unauthorized => "Your form expired, please submit it again.".to_string(),
            StudioError::NotFound(_) => "Not Found".to_string(),
            StudioError::InternalServerError(_) => "Internal server error".to_string(),
        }
    }
}

impl From<GenerationFailure> for StudioError {
    fn from(err: GenerationFailure) -> Self {
        StudioError::Generation(err)
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for StudioError {
    fn from(err: axum::http::Error) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for StudioError {
    fn from(err: tower_sessions::session::Error) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl From<image::ImageError> for StudioError {
    fn from(err: image::ImageError) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StudioError {
    fn from(err: tokio::task::JoinError) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            StudioError::BadRequest => info!("Bad request received"),
            StudioError::Unauthorized => info!("Unauthorized request received"),
            StudioError::NotFound(what) => info!("404 {what}"),
            StudioError::Validation(reason) => info!("Validation failed: {reason}"),
            StudioError::Busy => info!("Generation already running"),
            StudioError::Generation(failure) => tracing::warn!("Generation failed: {failure}"),
            StudioError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message)
            }
        }
        let mut response =
            axum::response::Response::new(axum::body::Body::from(self.user_message()));
        *response.status_mut() = self.status();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (StudioError::BadRequest, 400),
            (StudioError::Unauthorized, 401),
            (StudioError::NotFound("design 9".to_string()), 404),
            (StudioError::Validation("nope".to_string()), 422),
            (StudioError::Busy, 409),
            (
                StudioError::Generation(GenerationFailure::Timeout),
                502,
            ),
            (StudioError::InternalServerError("boom".to_string()), 500),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status().as_u16(), expected);
        }
    }

    #[test]
    fn generation_message_suggests_retry() {
        let message = StudioError::Generation(GenerationFailure::Timeout).user_message();
        assert!(message.contains("try again"));
    }
}
