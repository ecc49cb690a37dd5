//! Remote document store boundary.
//!
//! The reconciler depends only on the [`RemoteGateway`] capability trait;
//! the Confluence REST client in [`confluence`] is the production
//! implementation.

pub mod confluence;

pub use confluence::ConfluenceClient;

/// A page as seen on the remote side.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage {
    pub id: String,
    pub title: String,
    pub version: i64,
    /// Direct parent page, when the page sits under one.
    pub parent_id: Option<String>,
}

/// Identity and version assigned by a successful create.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPage {
    pub id: String,
    pub version: i64,
}

/// Capability interface for the remote document store.
///
/// Titles are the only identity available for documents with no ledger
/// entry; under duplicate titles `find_by_title` returns an arbitrary
/// first match, a known limitation of title-based lookup.
#[allow(async_fn_in_trait)]
pub trait RemoteGateway {
    /// Finds a page by exact title within a space.
    async fn find_by_title(
        &self,
        title: &str,
        space: &str,
    ) -> Result<Option<RemotePage>, GatewayError>;

    /// Fetches a page by id. Deleted pages surface as [`GatewayError::NotFound`].
    async fn get_by_id(&self, id: &str) -> Result<RemotePage, GatewayError>;

    /// Creates a page, optionally under a parent.
    async fn create(
        &self,
        space: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedPage, GatewayError>;

    /// Updates a page if and only if its current version equals
    /// `expected_version`; returns the new version. A stale expectation
    /// surfaces as [`GatewayError::VersionConflict`].
    async fn update(
        &self,
        id: &str,
        title: &str,
        body: &str,
        expected_version: i64,
    ) -> Result<i64, GatewayError>;
}

/// Errors from the remote gateway.
#[derive(Debug)]
pub enum GatewayError {
    /// Base URL or credentials are missing.
    NotConfigured,
    /// The requested page does not exist.
    NotFound(String),
    /// The expected version no longer matches the remote page.
    VersionConflict { id: String, expected_version: i64 },
    /// The request did not complete in time.
    Timeout(String),
    /// Transport-level failure.
    HttpError(String),
    /// The remote API rejected the request.
    ApiError { status: u16, message: String },
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::NotConfigured => write!(
                f,
                "Remote store not configured. Add base_url, user_email and api_token to config."
            ),
            GatewayError::NotFound(id) => write!(f, "Page not found: {}", id),
            GatewayError::VersionConflict {
                id,
                expected_version,
            } => write!(
                f,
                "Version conflict updating page {}: expected version {} is stale",
                id, expected_version
            ),
            GatewayError::Timeout(e) => write!(f, "Request timed out: {}", e),
            GatewayError::HttpError(e) => write!(f, "HTTP error: {}", e),
            GatewayError::ApiError { status, message } => {
                write!(f, "Remote API error {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}
