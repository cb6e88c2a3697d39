//! SPA Fallback Middleware
//!
//! Lets the API server also host a compiled single-page application. Any
//! request that the router answers with `404 Not Found`, and whose path is
//! outside the API prefix, is answered with the SPA's `index.html` instead so
//! the frontend's client-side router can take over.
//!
//! # Behaviour
//!
//! - Responses other than 404 pass through untouched
//! - Paths starting with the API prefix (`/api` by default) pass through untouched
//! - A missing index file leaves the original 404 in place
//! - Any other I/O failure becomes a 500
//!
//! The index file is read from disk on every qualifying request; nothing is cached.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spa_fallback::fallback::SpaFallback;
//!
//! let fallback = Arc::new(SpaFallback::new(&base_dir));
//! let app = fallback.mount(Router::new().nest("/api", api_routes()));
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::config::{self, DEFAULT_API_PREFIX, DEFAULT_INDEX_PATH};
use crate::error::FallbackError;

/// Outcome of a single attempt to read the SPA index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRead {
    Contents(Bytes),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct SpaFallback {
    index_path: PathBuf,
    api_prefix: String,
}

impl SpaFallback {
    /// Serves `<base_dir>/../Frontend/build/index.html` for non-`/api` 404s.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            index_path: base_dir.as_ref().join(DEFAULT_INDEX_PATH),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }

    pub fn from_config(app: &config::App) -> Self {
        Self {
            index_path: app.get_base_dir().join(&app.index_path),
            api_prefix: app.api_prefix.clone(),
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// The prefix match is literal, so `/apiary` counts as an API path too.
    pub fn should_fallback(&self, path: &str, status: StatusCode) -> bool {
        status == StatusCode::NOT_FOUND && !path.starts_with(&self.api_prefix)
    }

    pub async fn read_index(&self) -> Result<IndexRead, FallbackError> {
        match tokio::fs::read(&self.index_path).await {
            Ok(contents) => Ok(IndexRead::Contents(Bytes::from(contents))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(IndexRead::NotFound),
            Err(e) => Err(FallbackError::Io {
                path: self.index_path.clone(),
                source: e,
            }),
        }
    }

    /// Decides what to send back for `path`, given what the downstream handler produced.
    pub async fn handle(&self, path: &str, response: Response) -> Response {
        if !self.should_fallback(path, response.status()) {
            return response;
        }

        match self.read_index().await {
            Ok(IndexRead::Contents(body)) => {
                tracing::debug!(path = %path, "serving spa index for unmatched route");
                (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], body).into_response()
            }
            Ok(IndexRead::NotFound) => {
                tracing::debug!(path = %path, index = ?self.index_path, "spa index missing, keeping 404");
                response
            }
            Err(e) => e.into_response(),
        }
    }

    /// Wraps every route and the fallback of `router` with [`spa_fallback`].
    ///
    /// Call this after all routes and the router's own fallback are registered.
    pub fn mount<S>(self: Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, spa_fallback))
    }
}

pub async fn spa_fallback(
    State(fallback): State<Arc<SpaFallback>>,
    request: Request,
    next: Next,
) -> Response {
    let path = decoded_path(request.uri().path());
    let response = next.run(request).await;
    fallback.handle(&path, response).await
}

/// Percent-decodes a request path; invalid UTF-8 is replaced rather than rejected.
fn decoded_path(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}
