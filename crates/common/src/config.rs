use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::DriveTreeError;

/// Largest page the listing API accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";
pub const PUBLIC_DIR_NAME: &str = "public";
pub const OUTPUT_FILE_NAME: &str = "tree_data.json";
/// Mount point used when running inside the automation container.
pub const CONTAINER_PROJECT_DIR: &str = "/project";

/// Retry behavior for transient listing failures. `max_retries == 0` means fail fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }
}

/// Options for one traversal of the remote tree.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub page_size: u32,
    pub include_trashed: bool,
    pub all_drives: bool,
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            include_trashed: false,
            all_drives: false,
            timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Page size clamped into the range the API accepts.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Returns the first candidate that exists on disk. `None` and empty entries are skipped.
pub fn resolve_existing_path<I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = Option<PathBuf>>,
{
    candidates
        .into_iter()
        .flatten()
        .filter(|p| !p.as_os_str().is_empty())
        .find(|p| p.exists())
}

/// Directory holding the running executable.
pub fn program_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Credential file candidates in priority order: explicit path, next to the
/// program, current directory, container mount.
pub fn credential_candidates(
    explicit: Option<PathBuf>,
    program_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> Vec<Option<PathBuf>> {
    vec![
        explicit,
        program_dir.map(|d| d.join(CREDENTIALS_FILE_NAME)),
        cwd.map(|d| d.join(CREDENTIALS_FILE_NAME)),
        Some(Path::new(CONTAINER_PROJECT_DIR).join(CREDENTIALS_FILE_NAME)),
    ]
}

pub fn resolve_credentials(
    explicit: Option<PathBuf>,
    program_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> Result<PathBuf, DriveTreeError> {
    let candidates = credential_candidates(explicit, program_dir, cwd);
    let searched: Vec<String> = candidates
        .iter()
        .flatten()
        .map(|p| p.display().to_string())
        .collect();

    resolve_existing_path(candidates).ok_or_else(|| {
        DriveTreeError::Config(format!(
            "{} not found. Set GOOGLE_APPLICATION_CREDENTIALS or place it at one of: {}",
            CREDENTIALS_FILE_NAME,
            searched.join(", ")
        ))
    })
}

/// Output directory: explicit path if given, else an existing `public/` next to
/// the program or in the current directory, else the container mount.
/// The returned directory may not exist yet.
pub fn resolve_output_dir(
    explicit: Option<PathBuf>,
    program_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> PathBuf {
    if let Some(dir) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return dir;
    }

    resolve_existing_path([
        program_dir.map(|d| d.join(PUBLIC_DIR_NAME)),
        cwd.map(|d| d.join(PUBLIC_DIR_NAME)),
    ])
    .unwrap_or_else(|| Path::new(CONTAINER_PROJECT_DIR).join(PUBLIC_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_existing_path_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(&a, "{}").unwrap();
        fs::write(&b, "{}").unwrap();

        let found = resolve_existing_path([None, Some(dir.path().join("missing")), Some(b.clone()), Some(a)]);
        assert_eq!(found, Some(b));
    }

    #[test]
    fn test_resolve_existing_path_skips_empty() {
        assert_eq!(resolve_existing_path([Some(PathBuf::new()), None]), None);
    }

    #[test]
    fn test_resolve_credentials_prefers_explicit() {
        let explicit_dir = tempfile::tempdir().unwrap();
        let program = tempfile::tempdir().unwrap();
        let explicit = explicit_dir.path().join("sa.json");
        fs::write(&explicit, "{}").unwrap();
        fs::write(program.path().join(CREDENTIALS_FILE_NAME), "{}").unwrap();

        let found = resolve_credentials(Some(explicit.clone()), Some(program.path()), None).unwrap();
        assert_eq!(found, explicit);
    }

    #[test]
    fn test_resolve_credentials_falls_back_to_program_dir() {
        let program = tempfile::tempdir().unwrap();
        let colocated = program.path().join(CREDENTIALS_FILE_NAME);
        fs::write(&colocated, "{}").unwrap();

        let found = resolve_credentials(
            Some(program.path().join("does-not-exist.json")),
            Some(program.path()),
            None,
        )
        .unwrap();
        assert_eq!(found, colocated);
    }

    #[test]
    fn test_resolve_credentials_missing_is_config_error() {
        let empty = tempfile::tempdir().unwrap();
        let err = resolve_credentials(None, Some(empty.path()), Some(empty.path())).unwrap_err();
        match err {
            DriveTreeError::Config(msg) => assert!(msg.contains(CREDENTIALS_FILE_NAME)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_output_dir_order() {
        let program = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();

        assert_eq!(
            resolve_output_dir(None, Some(program.path()), Some(cwd.path())),
            Path::new(CONTAINER_PROJECT_DIR).join(PUBLIC_DIR_NAME)
        );

        fs::create_dir(cwd.path().join(PUBLIC_DIR_NAME)).unwrap();
        assert_eq!(
            resolve_output_dir(None, Some(program.path()), Some(cwd.path())),
            cwd.path().join(PUBLIC_DIR_NAME)
        );

        fs::create_dir(program.path().join(PUBLIC_DIR_NAME)).unwrap();
        assert_eq!(
            resolve_output_dir(None, Some(program.path()), Some(cwd.path())),
            program.path().join(PUBLIC_DIR_NAME)
        );

        let explicit = cwd.path().join("out");
        assert_eq!(
            resolve_output_dir(Some(explicit.clone()), Some(program.path()), Some(cwd.path())),
            explicit
        );
    }

    #[test]
    fn test_effective_page_size_is_clamped() {
        let mut config = FetchConfig::default();
        assert_eq!(config.effective_page_size(), 1000);
        config.page_size = 5000;
        assert_eq!(config.effective_page_size(), 1000);
        config.page_size = 0;
        assert_eq!(config.effective_page_size(), 1);
    }

    #[test]
    fn test_retry_disabled_by_default() {
        assert!(!RetryPolicy::default().is_enabled());
    }
}
