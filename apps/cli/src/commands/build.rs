//! The one-shot export: resolve configuration, fetch the flat listing, rebuild
//! the tree, write it out.

use std::path::{Path, PathBuf};

use drive_tree_builder::{count_nodes, TreeBuilder};
use drive_tree_common::{
    program_dir, resolve_credentials, resolve_output_dir, DriveTreeError, FetchConfig, Timer,
};
use drive_tree_domain::CollisionPolicy;
use drive_tree_fetcher::{
    fetch_access_token, http_client, DriveClient, ListingApi, ServiceAccountKey, TreeFetcher,
    DRIVE_READONLY_SCOPE,
};
use log::{debug, info};

use crate::cli::Args;
use crate::commands::output::write_tree;

fn root_id(args: &Args) -> Result<&str, DriveTreeError> {
    args.root_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            DriveTreeError::Config(
                "root folder id is not set (use --root-id or DRIVE_ROOT_FOLDER_ID)".to_string(),
            )
        })
}

/// Fetch everything under `root_id` through `api`, rebuild the tree and write it to `output_path`.
/// Nothing is written unless every step succeeds.
pub async fn export_tree<A: ListingApi>(
    api: A,
    root_id: &str,
    config: &FetchConfig,
    collision_policy: CollisionPolicy,
    output_path: &Path,
) -> Result<usize, DriveTreeError> {
    let fetcher = TreeFetcher::new(api, config).with_progress(Box::new(|count: u64, folder: &str| {
        debug!("Listed folder {} ({} items so far)", folder, count);
    }));

    info!("Fetching files from Google Drive…");
    let timer = Timer::start("FetchDrive");
    let entries = fetcher.fetch_all(root_id).await?;
    timer.finish();
    info!("Total items fetched: {}", entries.len());

    let tree = TreeBuilder::new(root_id)
        .with_collision_policy(collision_policy)
        .build(&entries)?;
    debug!(
        "Tree has {} top-level entries, {} nodes in total",
        tree.len(),
        count_nodes(&tree)
    );

    write_tree(&tree, output_path)?;
    Ok(entries.len())
}

/// Run a full build from command-line arguments. Returns the path written.
pub async fn run(args: &Args) -> Result<PathBuf, DriveTreeError> {
    let root_id = root_id(args)?;

    let program_dir = program_dir();
    let cwd = std::env::current_dir().ok();
    let credentials = resolve_credentials(
        args.credentials.clone(),
        program_dir.as_deref(),
        cwd.as_deref(),
    )?;
    let output_dir = resolve_output_dir(
        args.output_dir.clone(),
        program_dir.as_deref(),
        cwd.as_deref(),
    );
    let output_path = output_dir.join(&args.output_file);

    info!("=== DriveToTree Build ===");
    info!("Root folder id: {}", root_id);
    info!("Using credentials: {}", credentials.display());
    info!("Output dir: {}", output_dir.display());
    info!("Output file: {}", output_path.display());

    let config = args.fetch_config();
    let key = ServiceAccountKey::from_file(&credentials)?;
    let http = http_client(&config)?;
    let token = fetch_access_token(&http, &key, DRIVE_READONLY_SCOPE).await?;
    debug!("Authenticated as {}", key.client_email);

    let client = DriveClient::with_client(http, token.access_token, &config);
    export_tree(client, root_id, &config, args.on_collision, &output_path).await?;

    info!("✅ Successfully generated: {}", output_path.display());
    Ok(output_path)
}
