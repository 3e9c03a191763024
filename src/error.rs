use thiserror::Error;

/// Failure to retrieve a page for recipe import.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Could not fetch the URL. The site may be blocking access.")]
    Exhausted { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },
}

/// Failure of a single reference-data lookup. Always recovered by the caller.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Food database request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Food database returned HTTP {status}")]
    Api { status: u16 },

    #[error("Reference sheet unavailable: {0}")]
    Sheet(String),
}

#[derive(Error, Debug)]
pub enum NutritionError {
    #[error("Failed to fetch nutrition data. Try again later.")]
    SourcesUnavailable { failed: usize },
}
