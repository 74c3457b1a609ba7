use thiserror::Error;

/// Problems found while merging the host configuration with the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no selector configured for the search input (field `search`)")]
    MissingSearchSelector,

    #[error("unknown transform `{0}`")]
    UnknownTransform(String),

    #[error("invalid transform `{name}`: {reason}")]
    InvalidTransform { name: String, reason: String },

    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("configuration is not a valid JSON object: {0}")]
    Malformed(String),
}

/// Reasons a widget could not be attached to the page. The widget stays inert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("search input selector `{0}` matches no element")]
    SearchInputNotFound(String),

    #[error("no async runtime available to drive lookups")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("address API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode address API response: {0}")]
    Decode(String),

    #[error("invalid reference link `{0}`")]
    InvalidLink(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transform `{name}` failed: {reason}")]
pub struct TransformError {
    pub name: String,
    pub reason: String,
}

impl TransformError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("could not load full address record: {0}")]
    Detail(#[from] ApiError),

    #[error("suggestion index {index} out of range ({count} shown)")]
    OutOfRange { index: usize, count: usize },

    #[error("widget has been detached")]
    Detached,
}
