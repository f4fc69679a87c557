use crate::transport::{SlurpError, SlurpResult};
use chain_err_handle::prelude::*;
use common::log::debug;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Builds a client that attaches `default_headers` to every request and aborts requests
/// running longer than `timeout`.
pub fn build_client(timeout: Duration, default_headers: HeaderMap) -> ChainResult<Client, SlurpError> {
    Client::builder()
        .default_headers(default_headers)
        .timeout(timeout)
        .build()
        .map_to_chain(|e| SlurpError::Internal(format!("Error building HTTP client: {}", e)))
}

pub async fn slurp_get(client: &Client, uri: &str) -> SlurpResult {
    debug!("GET {}", uri);
    slurp_req(client.get(uri), uri).await
}

pub async fn slurp_post_json(client: &Client, uri: &str, body: Vec<u8>) -> SlurpResult {
    debug!("POST {} ({} bytes)", uri, body.len());
    let request = client
        .post(uri)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body);
    slurp_req(request, uri).await
}

async fn slurp_req(request: RequestBuilder, uri: &str) -> SlurpResult {
    let response = request.send().await.map_to_chain(|e| map_reqwest_error(e, uri))?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_to_chain(|e| map_reqwest_error(e, uri))?;
    Ok((status, headers, body.to_vec()))
}

fn map_reqwest_error(e: reqwest::Error, uri: &str) -> SlurpError {
    let error = e.to_string();
    if e.is_timeout() {
        SlurpError::Timeout {
            uri: uri.to_owned(),
            error,
        }
    } else if e.is_builder() {
        SlurpError::InvalidRequest(error)
    } else {
        SlurpError::Transport {
            uri: uri.to_owned(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::block_on;

    #[test]
    fn test_build_client() {
        let mut headers = HeaderMap::new();
        headers.insert("tron-pro-api-key", HeaderValue::from_static("test-key"));
        assert!(build_client(Duration::from_secs(5), headers).is_ok());
    }

    #[test]
    fn test_slurp_get_invalid_uri() {
        let client = build_client(Duration::from_secs(5), HeaderMap::new()).unwrap();
        let err = block_on(slurp_get(&client, "not a url")).unwrap_err();
        assert!(matches!(err.into_inner(), SlurpError::InvalidRequest(_)));
    }
}
