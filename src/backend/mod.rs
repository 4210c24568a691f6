//! backend
//!
//! Remote platform abstraction layer.
//!
//! # Architecture
//!
//! The `Backend` trait abstracts the remote build and runtime platform so
//! the deploy workflow never depends on a transport. Implementations:
//!
//! - [`http::HttpBackend`]: the platform's HTTP API (reqwest)
//! - [`mock::MockBackend`]: in-memory, with fail-injection for tests
//!
//! # Example
//!
//! ```ignore
//! use skyway::backend::{Backend, http::HttpBackend};
//!
//! let backend: Box<dyn Backend> = Box::new(HttpBackend::new(api_url, credentials));
//! let project = backend.get_project(&project_id).await?;
//! ```

pub mod http;
pub mod mock;
mod traits;

pub use traits::{
    render_public_url, Backend, BackendError, LogLine, LogSink, LogTarget, UploadRequest,
    UploadResult,
};
