use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error;

/// Failures the SPA fallback cannot recover from locally.
///
/// A missing index file is not an error; it is reported as
/// [`IndexRead::NotFound`](crate::fallback::IndexRead::NotFound).
#[derive(Error, Debug)]
pub enum FallbackError {
    #[error("failed to read index file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntoResponse for FallbackError {
    fn into_response(self) -> Response {
        tracing::error!(error = %crate::unpack_error(&self), "spa fallback failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
