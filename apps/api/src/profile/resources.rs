use reqwest::Url;

use crate::errors::AppError;

pub const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results";
/// Substring every generated search link carries.
pub const YOUTUBE_SEARCH_MARKER: &str = "youtube.com/results?search_query=";

/// YouTube search link for `query`, form-encoded.
pub fn youtube_search_url(query: &str) -> Result<String, AppError> {
    let url = Url::parse_with_params(YOUTUBE_SEARCH_URL, &[("search_query", query.trim())])
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid search url: {e}")))?;
    Ok(url.into())
}

pub fn is_youtube_search(link: &str) -> bool {
    link.contains(YOUTUBE_SEARCH_MARKER)
}
