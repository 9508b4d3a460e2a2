use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] repotree_core::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] repotree_http::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {source}", path.display())]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid property: {0}")]
    InvalidProperty(String),
}
