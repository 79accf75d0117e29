use reqwest::Client;
use tracing::debug;

use sluice_core::{Dataset, PipelineError};

use crate::json::dataset_from_json;

/// Longest slice of an error body kept in a `Remote` message.
const MAX_BODY_IN_ERROR: usize = 200;

fn remote(url: &str, status: Option<u16>, message: impl Into<String>) -> PipelineError {
    PipelineError::Remote {
        url: url.to_string(),
        status,
        message: message.into(),
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_BODY_IN_ERROR {
        return body;
    }
    let mut end = MAX_BODY_IN_ERROR;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// GET `url` and decode the JSON body into a dataset.
pub(crate) async fn fetch_json(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
) -> Result<Dataset, PipelineError> {
    let mut request = client.get(url);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| remote(url, e.status().map(|s| s.as_u16()), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let reason = status.canonical_reason().unwrap_or("request failed");
        let message = match truncate(body.trim()) {
            "" => reason.to_string(),
            body => format!("{reason}: {body}"),
        };
        return Err(remote(url, Some(status.as_u16()), message));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| remote(url, Some(status.as_u16()), format!("invalid JSON body: {e}")))?;
    let ds = dataset_from_json(body).map_err(|e| remote(url, Some(status.as_u16()), e.to_string()))?;

    debug!(url, rows = ds.num_rows(), columns = ds.num_columns(), "fetched json");
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        let body = "é".repeat(150);
        let cut = truncate(&body);
        assert!(cut.len() <= MAX_BODY_IN_ERROR);
        assert!(cut.chars().all(|c| c == 'é'));
        assert_eq!(truncate("short"), "short");
    }
}
