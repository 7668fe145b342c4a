//! Seam between the traversal and the remote listing endpoint.

use async_trait::async_trait;
use drive_tree_domain::RemoteEntry;
use thiserror::Error;

/// One page request for the children of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest<'a> {
    pub folder_id: &'a str,
    pub page_token: Option<&'a str>,
    pub page_size: u32,
    pub include_trashed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub entries: Vec<RemoteEntry>,
    /// Continuation token; `None` once the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Listing failure. `transient` marks failures worth retrying (rate limits,
/// server errors, dropped connections).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ListingError {
    pub message: String,
    pub transient: bool,
}

impl ListingError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// Paginated "list children of a folder" operation.
#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn list_children(&self, request: &ListRequest<'_>) -> Result<ListPage, ListingError>;
}
