use std::fmt;
use std::str::FromStr;

/// What to do when two entries with the same name land at the same tree level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The later entry in iteration order replaces the earlier one.
    #[default]
    LastWriteWins,
    /// Abort the build.
    Error,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::LastWriteWins => f.write_str("last-write-wins"),
            CollisionPolicy::Error => f.write_str("error"),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "overwrite" => Ok(CollisionPolicy::LastWriteWins),
            "error" => Ok(CollisionPolicy::Error),
            other => Err(format!(
                "unknown collision policy '{other}' (expected 'last-write-wins' or 'error')"
            )),
        }
    }
}
