#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MedLensError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{entity} '{id}' not found.\n\n{suggestion}")]
    NotFound {
        entity: String,
        id: String,
        suggestion: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Selection is full: at most {limit} medications can be compared at once")]
    SelectionFull { limit: usize },

    #[error("Compound {cid} is already in the watch list ({category})")]
    DuplicateEntry { cid: u64, category: String },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MedLensError {
    pub(crate) fn compound_not_found(cid: u64) -> Self {
        Self::NotFound {
            entity: "compound".into(),
            id: cid.to_string(),
            suggestion: "Try searching by name: medlens search <name>".into(),
        }
    }
}
