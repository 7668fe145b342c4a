use std::collections::HashSet;
use std::time::Duration;

use drive_tree_common::{DriveTreeError, FetchConfig, RetryPolicy};
use drive_tree_domain::RemoteEntry;
use futures::future::BoxFuture;
use log::{debug, warn};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::listing::{ListPage, ListRequest, ListingApi, ListingError};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Called after each folder is fully listed with (items so far, folder id).
pub type ProgressCb = Box<dyn Fn(u64, &str) + Send + Sync>;

struct Traversal {
    entries: Vec<RemoteEntry>,
    seen: HashSet<String>,
}

/// Depth-first, page-draining walk of a remote folder.
pub struct TreeFetcher<A> {
    api: A,
    page_size: u32,
    include_trashed: bool,
    retry: RetryPolicy,
    progress: Option<ProgressCb>,
}

impl<A: ListingApi> TreeFetcher<A> {
    pub fn new(api: A, config: &FetchConfig) -> Self {
        Self {
            api,
            page_size: config.effective_page_size(),
            include_trashed: config.include_trashed,
            retry: config.retry,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCb) -> Self {
        self.progress = Some(progress);
        self
    }

    #[cfg(test)]
    fn api(&self) -> &A {
        &self.api
    }

    /// Every descendant of `root_id`, each exactly once, in pre-order: a folder
    /// precedes its subtree, and its subtree precedes its later siblings.
    ///
    /// The first listing failure aborts the whole walk; nothing fetched so far is returned.
    pub async fn fetch_all(&self, root_id: &str) -> Result<Vec<RemoteEntry>, DriveTreeError> {
        let mut state = Traversal {
            entries: Vec::new(),
            seen: HashSet::from([root_id.to_string()]),
        };
        self.walk(root_id, &mut state).await?;
        Ok(state.entries)
    }

    fn walk<'a>(
        &'a self,
        folder_id: &'a str,
        state: &'a mut Traversal,
    ) -> BoxFuture<'a, Result<(), DriveTreeError>> {
        Box::pin(async move {
            let mut page_token: Option<String> = None;
            loop {
                let page = self.list_page(folder_id, page_token.as_deref()).await?;

                for entry in page.entries {
                    if !state.seen.insert(entry.id.clone()) {
                        debug!("Skipping {} ({}): already fetched", entry.name, entry.id);
                        continue;
                    }
                    let subfolder = entry.is_folder().then(|| entry.id.clone());
                    state.entries.push(entry);
                    if let Some(id) = subfolder {
                        self.walk(&id, state).await?;
                    }
                }

                page_token = page.next_page_token.filter(|t| !t.is_empty());
                if page_token.is_none() {
                    break;
                }
            }

            let total = state.entries.len() as u64;
            debug!("Folder {} done, {} items so far", folder_id, total);
            if let Some(ref cb) = self.progress {
                cb(total, folder_id);
            }
            Ok(())
        })
    }

    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage, DriveTreeError> {
        let request = ListRequest {
            folder_id,
            page_token,
            page_size: self.page_size,
            include_trashed: self.include_trashed,
        };

        let result = if self.retry.is_enabled() {
            let strategy = ExponentialBackoff::from_millis(2)
                .factor((self.retry.base_delay_ms / 2).max(1))
                .max_delay(MAX_BACKOFF)
                .map(jitter)
                .take(self.retry.max_retries);
            RetryIf::start(
                strategy,
                || self.api.list_children(&request),
                |e: &ListingError| {
                    if e.is_transient() {
                        warn!("Listing {} failed, retrying: {}", folder_id, e);
                    }
                    e.is_transient()
                },
            )
            .await
        } else {
            self.api.list_children(&request).await
        };

        result.map_err(|e| {
            DriveTreeError::RemoteAccess(format!("listing folder {} failed: {}", folder_id, e))
        })
    }
}
