//! Document transport.
//!
//! The engine only needs `fetch(url) -> content`. [`HttpTransport`] is the
//! reference implementation; tests use the stubs in [`crate::testing`].

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::TransportError;

/// Fetches raw document content by URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        (**self).fetch(url).await
    }
}
