pub(crate) use super::csrf::{csrf_token, validate_csrf};
pub(crate) use super::flash;
pub(crate) use super::middleware::CurrentStudio;
pub(crate) use crate::error::StudioError;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Path, State};
pub(crate) use axum::http::{HeaderValue, header::CONTENT_TYPE};
pub(crate) use axum::response::{IntoResponse, Redirect, Response};
pub(crate) use serde::Deserialize;
pub(crate) use std::sync::Arc;
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::{debug, info, instrument};
