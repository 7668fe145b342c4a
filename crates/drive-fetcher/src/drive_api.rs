use async_trait::async_trait;
use drive_tree_common::{DriveTreeError, FetchConfig};
use drive_tree_domain::{EntryKind, RemoteEntry};
use log::debug;
use serde::Deserialize;

use crate::listing::{ListPage, ListRequest, ListingApi, ListingError};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, parents, webViewLink)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl From<DriveFile> for RemoteEntry {
    fn from(file: DriveFile) -> Self {
        RemoteEntry {
            kind: EntryKind::from_mime_type(&file.mime_type),
            id: file.id,
            name: file.name,
            parents: file.parents,
            link: file.web_view_link,
        }
    }
}

/// Drive v3 `files.list` client authenticated with a bearer token.
pub struct DriveClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    all_drives: bool,
}

/// HTTP client shared by token exchange and listing calls, with the optional per-request timeout.
pub fn http_client(config: &FetchConfig) -> Result<reqwest::Client, DriveTreeError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| DriveTreeError::Config(format!("failed to create HTTP client: {}", e)))
}

impl DriveClient {
    pub fn new(access_token: impl Into<String>, config: &FetchConfig) -> Result<Self, DriveTreeError> {
        Ok(Self::with_client(http_client(config)?, access_token, config))
    }

    /// Reuse an existing client, e.g. the one that fetched the access token.
    pub fn with_client(
        client: reqwest::Client,
        access_token: impl Into<String>,
        config: &FetchConfig,
    ) -> Self {
        Self {
            client,
            base_url: DRIVE_API_BASE.to_string(),
            access_token: access_token.into(),
            all_drives: config.all_drives,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn list_url(&self, request: &ListRequest<'_>) -> String {
        let mut query = format!("'{}' in parents", escape_query_value(request.folder_id));
        if !request.include_trashed {
            query.push_str(" and trashed=false");
        }

        let mut url = format!(
            "{}/drive/v3/files?q={}&fields={}&pageSize={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&query),
            urlencoding::encode(LIST_FIELDS),
            request.page_size
        );
        if let Some(token) = request.page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }
        if self.all_drives {
            url.push_str("&supportsAllDrives=true&includeItemsFromAllDrives=true");
        }
        url
    }
}

/// Escapes a value for use inside a single-quoted Drive query string.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl ListingApi for DriveClient {
    async fn list_children(&self, request: &ListRequest<'_>) -> Result<ListPage, ListingError> {
        let url = self.list_url(request);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                let message = format!("list request failed: {}", e);
                if e.is_timeout() || e.is_connect() {
                    ListingError::transient(message)
                } else {
                    ListingError::permanent(message)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = format!("list request failed ({}): {}", status, error_text);
            return Err(if is_transient_status(status) {
                ListingError::transient(message)
            } else {
                ListingError::permanent(message)
            });
        }

        let body: FileListResponse = response
            .json()
            .await
            .map_err(|e| ListingError::permanent(format!("failed to parse list response: {}", e)))?;

        Ok(ListPage {
            entries: body.files.into_iter().map(RemoteEntry::from).collect(),
            next_page_token: body.next_page_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(all_drives: bool) -> DriveClient {
        let config = FetchConfig {
            all_drives,
            ..FetchConfig::default()
        };
        DriveClient::new("token", &config)
            .unwrap()
            .with_base_url("http://drive.test/")
    }

    #[test]
    fn test_list_url_first_page() {
        let request = ListRequest {
            folder_id: "abc",
            page_token: None,
            page_size: 1000,
            include_trashed: false,
        };
        let url = client(false).list_url(&request);
        assert!(url.starts_with("http://drive.test/drive/v3/files?q="));
        assert!(url.contains("q=%27abc%27%20in%20parents%20and%20trashed%3Dfalse"));
        assert!(url.contains("&pageSize=1000"));
        assert!(!url.contains("pageToken"));
        assert!(!url.contains("supportsAllDrives"));
    }

    #[test]
    fn test_list_url_with_token_trash_and_all_drives() {
        let request = ListRequest {
            folder_id: "abc",
            page_token: Some("next/page"),
            page_size: 10,
            include_trashed: true,
        };
        let url = client(true).list_url(&request);
        assert!(!url.contains("trashed"));
        assert!(url.contains("&pageToken=next%2Fpage"));
        assert!(url.ends_with("&supportsAllDrives=true&includeItemsFromAllDrives=true"));
    }

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("it's"), "it\\'s");
        assert_eq!(escape_query_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_drive_file_conversion() {
        let file: DriveFile = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Docs",
            "mimeType": "application/vnd.google-apps.folder",
            "parents": ["root"],
            "webViewLink": "https://drive.google.com/drive/folders/1"
        }))
        .unwrap();
        let entry = RemoteEntry::from(file);
        assert_eq!(entry.kind, EntryKind::Folder);
        assert_eq!(entry.parent_id(), Some("root"));
        assert_eq!(entry.link.as_deref(), Some("https://drive.google.com/drive/folders/1"));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(reqwest::StatusCode::FORBIDDEN));
        assert!(!is_transient_status(reqwest::StatusCode::NOT_FOUND));
    }
}
