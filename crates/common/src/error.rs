use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveTreeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote access error: {0}")]
    RemoteAccess(String),

    #[error("Name collision under {parent}: {name}")]
    NameCollision { parent: String, name: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
