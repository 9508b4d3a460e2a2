use repotree_core::Error as CoreError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("base URL '{url}' cannot carry a node path")]
    InvalidBaseUrl { url: String },

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("unexpected response from {url}: {message}")]
    UnexpectedBody { url: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<Error> for CoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::Core(inner) => inner,
            other => CoreError::Transport {
                message: other.to_string(),
            },
        }
    }
}
