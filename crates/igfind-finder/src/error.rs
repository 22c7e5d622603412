use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error(transparent)]
    Search(#[from] igfind_search::SearchError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input is missing required column {0:?}")]
    MissingColumn(&'static str),
}

impl FinderError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        FinderError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
