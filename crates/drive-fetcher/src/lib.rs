pub mod listing;
pub mod fetcher;
pub mod drive_api;
pub mod auth;

pub use listing::{ListPage, ListRequest, ListingApi, ListingError};
pub use fetcher::{ProgressCb, TreeFetcher};
pub use drive_api::{http_client, DriveClient, DRIVE_API_BASE};
pub use auth::{fetch_access_token, AccessToken, ServiceAccountKey, DRIVE_READONLY_SCOPE};
pub use drive_tree_domain::RemoteEntry;
