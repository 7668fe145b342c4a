use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use drive_tree_common::{DriveTreeError, FetchConfig, RetryPolicy, MAX_PAGE_SIZE, OUTPUT_FILE_NAME};
use drive_tree_domain::CollisionPolicy;

#[derive(Debug, Clone, Parser)]
#[command(name = "drive-to-tree", version, about = "Export a Google Drive folder hierarchy as a JSON tree")]
pub struct Args {
    /// Id of the folder whose descendants are exported
    #[arg(long, env = "DRIVE_ROOT_FOLDER_ID")]
    pub root_id: Option<String>,

    /// Service account key file; tried before the default locations
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Directory for the output file (default: ./public next to the program, else /project/public)
    #[arg(long, env = "DRIVE_TREE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value = OUTPUT_FILE_NAME)]
    pub output_file: String,

    /// Entries per listing call, at most 1000
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: u32,

    #[arg(long)]
    pub include_trashed: bool,

    /// Also list items that live in shared drives
    #[arg(long)]
    pub all_drives: bool,

    /// Per-request timeout; no timeout when unset
    #[arg(long, env = "DRIVE_TREE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Retries for rate-limited or failed-upstream listing calls (0 = fail fast)
    #[arg(long, env = "DRIVE_TREE_RETRIES", default_value_t = 0)]
    pub retries: usize,

    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Same-name entries in one folder: last-write-wins or error
    #[arg(long, env = "DRIVE_TREE_ON_COLLISION", default_value_t = CollisionPolicy::LastWriteWins)]
    pub on_collision: CollisionPolicy,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            page_size: self.page_size,
            include_trashed: self.include_trashed,
            all_drives: self.all_drives,
            timeout: self.timeout_secs.map(Duration::from_secs),
            retry: RetryPolicy {
                max_retries: self.retries,
                base_delay_ms: self.retry_delay_ms,
            },
        }
    }
}

/// Outcome of reading the command line.
#[derive(Debug)]
pub enum Invocation {
    Run(Args),
    /// `--help` or `--version`; the caller prints it and exits successfully.
    Info(clap::Error),
}

/// Parse arguments (and their env fallbacks). Anything clap rejects becomes a
/// configuration error instead of exiting the process.
pub fn parse_invocation<I, T>(args: I) -> Result<Invocation, DriveTreeError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => Ok(Invocation::Run(args)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Ok(Invocation::Info(e))
        }
        Err(e) => Err(DriveTreeError::Config(e.to_string().trim_end().to_string())),
    }
}
